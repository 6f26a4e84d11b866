//! Tokenizer for rule expressions

use crate::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    // Literals
    Int(i64),
    Double(f64),
    Str(String),
    True,
    False,
    Ident(String),

    // Keywords
    In,

    // Operators
    And,
    Or,
    Not,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Question,
    Colon,

    // Delimiters
    Dot,
    Comma,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    Eof,
}

/// A token and the character offset it starts at
pub(crate) type Spanned = (Token, usize);

pub(crate) struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    pub(crate) fn new(input: &str) -> Self {
        Tokenizer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            message: message.into(),
            position: self.position,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, CompileError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Skip opening quote

        while let Some(ch) = self.current() {
            self.advance();
            match ch {
                c if c == quote => return Ok(result),
                '\\' => {
                    let escaped = match self.current() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some(other) => {
                            return Err(self.error(format!("Unknown escape sequence \\{other}")))
                        }
                        None => break,
                    };
                    result.push(escaped);
                    self.advance();
                }
                c => result.push(c),
            }
        }

        Err(CompileError::Syntax {
            message: "Unterminated string literal".to_string(),
            position: start,
        })
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let start = self.position;
        let mut text = String::new();
        let mut is_double = false;

        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '.' && !is_double && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_double = true;
                text.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !text.contains(['e', 'E']) {
                is_double = true;
                text.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current() {
                    text.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = |message: String| CompileError::Syntax {
            message,
            position: start,
        };
        if is_double {
            text.parse::<f64>()
                .map(Token::Double)
                .map_err(|_| invalid(format!("Invalid number literal '{text}'")))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| invalid(format!("Integer literal '{text}' is out of range")))
        }
    }

    /// Consume `second` if it follows, producing `double`; otherwise `single`
    fn one_or_two(&mut self, second: char, double: Token, single: Option<Token>) -> Result<Token, CompileError> {
        let first = self.current();
        self.advance();
        if self.current() == Some(second) {
            self.advance();
            return Ok(double);
        }
        single.ok_or_else(|| CompileError::Syntax {
            message: format!(
                "Unexpected character '{}' (did you mean '{}{}'?)",
                first.unwrap_or(' '),
                first.unwrap_or(' '),
                second
            ),
            position: self.position - 1,
        })
    }

    pub(crate) fn next_token(&mut self) -> Result<Spanned, CompileError> {
        self.skip_whitespace();
        let start = self.position;

        let ch = match self.current() {
            Some(c) => c,
            None => return Ok((Token::Eof, start)),
        };

        let token = match ch {
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            '[' => {
                self.advance();
                Token::LeftBracket
            }
            ']' => {
                self.advance();
                Token::RightBracket
            }
            '.' => {
                self.advance();
                Token::Dot
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                Token::Minus
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '/' => {
                self.advance();
                Token::Slash
            }
            '%' => {
                self.advance();
                Token::Percent
            }
            '?' => {
                self.advance();
                Token::Question
            }
            ':' => {
                self.advance();
                Token::Colon
            }
            '&' => self.one_or_two('&', Token::And, None)?,
            '|' => self.one_or_two('|', Token::Or, None)?,
            '=' => self.one_or_two('=', Token::Eq, None)?,
            '!' => self.one_or_two('=', Token::NotEq, Some(Token::Not))?,
            '<' => self.one_or_two('=', Token::LtEq, Some(Token::Lt))?,
            '>' => self.one_or_two('=', Token::GtEq, Some(Token::Gt))?,
            '"' | '\'' => Token::Str(self.read_string(ch)?),
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                match ident.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "in" => Token::In,
                    _ => Token::Ident(ident),
                }
            }
            _ => return Err(self.error(format!("Unexpected character '{ch}'"))),
        };

        Ok((token, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(input);
        let mut out = Vec::new();
        loop {
            let (token, _) = tokenizer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        out
    }

    #[test]
    fn test_member_path() {
        assert_eq!(
            tokens("track.last_box.b.y"),
            vec![
                Token::Ident("track".into()),
                Token::Dot,
                Token::Ident("last_box".into()),
                Token::Dot,
                Token::Ident("b".into()),
                Token::Dot,
                Token::Ident("y".into()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("&& || ! != == < <= > >= ? :"),
            vec![
                Token::And,
                Token::Or,
                Token::Not,
                Token::NotEq,
                Token::Eq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::Question,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("42"), vec![Token::Int(42)]);
        assert_eq!(tokens("0.5"), vec![Token::Double(0.5)]);
        assert_eq!(tokens("1e3"), vec![Token::Double(1000.0)]);
        assert_eq!(tokens("2.5e-1"), vec![Token::Double(0.25)]);
    }

    #[test]
    fn test_number_followed_by_member() {
        // `1.size` is not a double
        assert_eq!(
            tokens("1.x"),
            vec![Token::Int(1), Token::Dot, Token::Ident("x".into())]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(tokens("'car'"), vec![Token::Str("car".into())]);
        assert_eq!(tokens("\"a\\\"b\""), vec![Token::Str("a\"b".into())]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("true false in inside"),
            vec![
                Token::True,
                Token::False,
                Token::In,
                Token::Ident("inside".into())
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(Tokenizer::new("'open").next_token().is_err());
        assert!(Tokenizer::new("a & b").next_token().is_ok());
        let mut t = Tokenizer::new("& b");
        assert!(matches!(
            t.next_token(),
            Err(CompileError::Syntax { position: 0, .. })
        ));
        assert!(Tokenizer::new("#").next_token().is_err());
        assert!(Tokenizer::new("99999999999999999999").next_token().is_err());
    }
}
