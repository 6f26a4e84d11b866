//! Recursive-descent parser for rule expressions
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, comparisons and `in`,
//! `+ -`, `* / %`, unary `! -`, then member access, indexing and calls.

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::CompileError;
use crate::lexer::{Spanned, Token, Tokenizer};

/// Longest accepted expression, in tokens
pub(crate) const MAX_TOKENS: usize = 2048;

/// Deepest accepted nesting of the syntax tree
pub(crate) const MAX_DEPTH: usize = 64;

pub(crate) fn parse(input: &str) -> Result<Expr, CompileError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    loop {
        let spanned = tokenizer.next_token()?;
        let done = spanned.0 == Token::Eof;
        tokens.push(spanned);
        if done {
            break;
        }
        if tokens.len() > MAX_TOKENS {
            return Err(CompileError::TooLong(tokens.len()));
        }
    }

    if tokens.len() == 1 {
        return Err(CompileError::Empty);
    }

    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    parser.expect(Token::Eof)?;

    let depth = expr.depth();
    if depth > MAX_DEPTH {
        return Err(CompileError::TooDeep(MAX_DEPTH));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // the token list always ends with Eof and the parser never moves past it
        self.tokens
            .get(self.position)
            .map_or(&Token::Eof, |(token, _)| token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or(0, |(_, offset)| *offset)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token != Token::Eof {
            self.position += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            message: message.into(),
            position: self.offset(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), CompileError> {
        if *self.current() == expected {
            self.advance();
            Ok(())
        } else if *self.current() == Token::Eof {
            Err(self.error(format!("Expected {expected:?}, found end of input")))
        } else {
            Err(self.error(format!("Expected {:?}, found {:?}", expected, self.current())))
        }
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CompileError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.enter()?;
        let expr = self.parse_conditional();
        self.leave();
        expr
    }

    fn parse_conditional(&mut self) -> Result<Expr, CompileError> {
        let condition = self.parse_or()?;
        if *self.current() != Token::Question {
            return Ok(condition);
        }
        self.advance();
        let then = self.parse_or()?;
        self.expect(Token::Colon)?;
        // right-associative: `a ? b : c ? d : e`
        let otherwise = self.parse_expr()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_and()?;
        while *self.current() == Token::Or {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_relation()?;
        while *self.current() == Token::And {
            self.advance();
            let rhs = self.parse_relation()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_relation(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.current() {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                Token::In => BinaryOp::In,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.current() {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance();

        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;

        // fold `-<number>` into one literal; the magnitude must fit in i64,
        // so i64::MIN is written `-9223372036854775807 - 1`
        match (op, operand) {
            (UnaryOp::Neg, Expr::Literal(Literal::Int(n))) => Ok(Expr::Literal(Literal::Int(-n))),
            (UnaryOp::Neg, Expr::Literal(Literal::Double(d))) => {
                Ok(Expr::Literal(Literal::Double(-d)))
            }
            (op, operand) => Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            }),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current() {
                Token::Dot => {
                    self.advance();
                    let name = self.parse_ident()?;
                    if *self.current() == Token::LeftParen {
                        let args = self.parse_args()?;
                        expr = Expr::Call {
                            function: name,
                            receiver: Some(Box::new(expr)),
                            args,
                        };
                    } else {
                        expr = Expr::Member {
                            target: Box::new(expr),
                            field: name,
                        };
                    }
                }
                Token::LeftBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RightBracket)?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let offset = self.offset();
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Literal::Int(n))),
            Token::Double(d) => Ok(Expr::Literal(Literal::Double(d))),
            Token::Str(s) => Ok(Expr::Literal(Literal::Str(s))),
            Token::True => Ok(Expr::Literal(Literal::Bool(true))),
            Token::False => Ok(Expr::Literal(Literal::Bool(false))),
            Token::Ident(name) => {
                if *self.current() == Token::LeftParen {
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        function: name,
                        receiver: None,
                        args,
                    })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::LeftParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            Token::LeftBracket => {
                let items = self.parse_list(Token::RightBracket)?;
                Ok(Expr::List(items))
            }
            Token::Eof => Err(CompileError::Syntax {
                message: "Unexpected end of input".to_string(),
                position: offset,
            }),
            other => Err(CompileError::Syntax {
                message: format!("Unexpected token {other:?}"),
                position: offset,
            }),
        }
    }

    fn parse_ident(&mut self) -> Result<String, CompileError> {
        match self.current().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            // `in` is reserved but still valid after a dot
            Token::In => {
                self.advance();
                Ok("in".to_string())
            }
            other => Err(self.error(format!("Expected field name, found {other:?}"))),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        self.expect(Token::LeftParen)?;
        self.parse_list(Token::RightParen)
    }

    /// Comma-separated expressions up to and including `close`
    fn parse_list(&mut self, close: Token) -> Result<Vec<Expr>, CompileError> {
        let mut items = Vec::new();
        if *self.current() == close {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if *self.current() == Token::Comma {
                self.advance();
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    fn int(n: i64) -> Expr {
        Expr::Literal(Literal::Int(n))
    }

    #[test]
    fn test_member_chain() {
        let expr = parse("track.last_box.b").unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                target: Box::new(Expr::Member {
                    target: Box::new(ident("track")),
                    field: "last_box".to_string(),
                }),
                field: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 == 7 parses as (1 + (2 * 3)) == 7
        let expr = parse("1 + 2 * 3 == 7").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Eq,
                binary(BinaryOp::Add, int(1), binary(BinaryOp::Mul, int(2), int(3))),
                int(7)
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("a || b && c").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Or,
                ident("a"),
                binary(BinaryOp::And, ident("b"), ident("c"))
            )
        );
    }

    #[test]
    fn test_left_associative_subtraction() {
        let expr = parse("5 - 2 - 1").unwrap();
        assert_eq!(
            expr,
            binary(BinaryOp::Sub, binary(BinaryOp::Sub, int(5), int(2)), int(1))
        );
    }

    #[test]
    fn test_conditional_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        match expr {
            Expr::Conditional { otherwise, .. } => {
                assert!(matches!(*otherwise, Expr::Conditional { .. }))
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_literal_folding() {
        assert_eq!(
            parse("-9223372036854775807 - 1").unwrap(),
            binary(BinaryOp::Sub, int(-9223372036854775807), int(1))
        );
        assert_eq!(parse("-0.5").unwrap(), Expr::Literal(Literal::Double(-0.5)));
        assert!(matches!(
            parse("-9223372036854775808"),
            Err(CompileError::Syntax { position: 1, .. })
        ));
    }

    #[test]
    fn test_calls_and_lists() {
        assert_eq!(
            parse("size(track.predictions)").unwrap(),
            Expr::Call {
                function: "size".to_string(),
                receiver: None,
                args: vec![Expr::Member {
                    target: Box::new(ident("track")),
                    field: "predictions".to_string(),
                }],
            }
        );
        assert!(matches!(
            parse("track.predictions.size()").unwrap(),
            Expr::Call { receiver: Some(_), .. }
        ));
        assert_eq!(
            parse("['car', 'truck']").unwrap(),
            Expr::List(vec![
                Expr::Literal(Literal::Str("car".into())),
                Expr::Literal(Literal::Str("truck".into())),
            ])
        );
        assert_eq!(parse("[]").unwrap(), Expr::List(vec![]));
    }

    #[test]
    fn test_index() {
        assert!(matches!(
            parse("track.predictions[0].t").unwrap(),
            Expr::Member { .. }
        ));
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["track.", "1 +", "(1", "a ? b", "1 2", "[1, 2", "track.[0]", ")"] {
            assert!(
                matches!(parse(input), Err(CompileError::Syntax { .. })),
                "{input} should be a syntax error"
            );
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), Err(CompileError::Empty));
        assert_eq!(parse("   \n "), Err(CompileError::Empty));
    }

    #[test]
    fn test_too_long() {
        let input = vec!["1"; MAX_TOKENS].join("+");
        assert!(matches!(parse(&input), Err(CompileError::TooLong(_))));
    }

    #[test]
    fn test_too_deep() {
        let input = format!("{}true{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse(&input), Err(CompileError::TooDeep(MAX_DEPTH)));

        let input = format!("{}true", "!".repeat(200));
        assert_eq!(parse(&input), Err(CompileError::TooDeep(MAX_DEPTH)));

        let input = vec!["true"; 100].join(" && ");
        assert_eq!(parse(&input), Err(CompileError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let input = format!("{}true{}", "(".repeat(20), ")".repeat(20));
        assert!(parse(&input).is_ok());
        let input = vec!["true"; 30].join(" && ");
        assert!(parse(&input).is_ok());
    }
}
