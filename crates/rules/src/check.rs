//! Type checking: lowers the syntax tree to an evaluable, fully resolved form
//!
//! Every identifier, field and function is resolved here so evaluation never
//! has to look anything up by name.

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::CompileError;
use crate::types::{Field, Type};

/// Root identifier that rules are evaluated against
pub(crate) const ROOT: &str = "track";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Size,
    Double,
    Int,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Literal(Literal),
    Root,
    List(Vec<Node>),
    Field(Box<Node>, Field),
    Index(Box<Node>, Box<Node>),
    Call(Function, Box<Node>),
    Not(Box<Node>),
    Neg(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Arith(ArithOp, Box<Node>, Box<Node>),
    Compare(CompareOp, Box<Node>, Box<Node>),
    In(Box<Node>, Box<Node>),
    Conditional(Box<Node>, Box<Node>, Box<Node>),
}

/// Check `expr` and lower it to a [`Node`] along with its static type
pub(crate) fn check(expr: &Expr) -> Result<(Node, Type), CompileError> {
    match expr {
        Expr::Literal(literal) => {
            let ty = match literal {
                Literal::Bool(_) => Type::Bool,
                Literal::Int(_) => Type::Int,
                Literal::Double(_) => Type::Double,
                Literal::Str(_) => Type::String,
            };
            Ok((Node::Literal(literal.clone()), ty))
        }

        Expr::Ident(name) if name == ROOT => Ok((Node::Root, Type::Track)),
        Expr::Ident(name) => Err(CompileError::UnknownIdentifier(name.clone())),

        Expr::List(items) => check_list(items),

        Expr::Member { target, field } => {
            let (node, ty) = check(target)?;
            let (resolved, field_ty) =
                ty.field(field)
                    .ok_or_else(|| CompileError::UnknownField {
                        ty: ty.clone(),
                        field: field.clone(),
                    })?;
            Ok((Node::Field(Box::new(node), resolved), field_ty))
        }

        Expr::Index { target, index } => {
            let (target, target_ty) = check(target)?;
            let (index, index_ty) = check(index)?;
            let element = match target_ty {
                Type::List(element) => *element,
                other => {
                    return Err(CompileError::Type(format!("cannot index into {other}")));
                }
            };
            if index_ty != Type::Int {
                return Err(CompileError::Type(format!(
                    "list index must be int, not {index_ty}"
                )));
            }
            Ok((Node::Index(Box::new(target), Box::new(index)), element))
        }

        Expr::Call {
            function,
            receiver,
            args,
        } => {
            let function_kind = match function.as_str() {
                "size" => Function::Size,
                "double" => Function::Double,
                "int" => Function::Int,
                _ => return Err(CompileError::UnknownFunction(function.clone())),
            };
            let args: Vec<&Expr> = receiver.iter().map(|r| r.as_ref()).chain(args).collect();
            if args.len() != 1 {
                return Err(CompileError::Arity {
                    function: function.clone(),
                    expected: 1,
                    got: args.len(),
                });
            }
            let (arg, arg_ty) = check(args[0])?;
            let result_ty = match (function_kind, &arg_ty) {
                (Function::Size, Type::List(_) | Type::String) => Type::Int,
                (Function::Double, Type::Int | Type::Double) => Type::Double,
                (Function::Int, Type::Int | Type::Double) => Type::Int,
                _ => {
                    return Err(CompileError::Type(format!(
                        "{function}() is not defined for {arg_ty}"
                    )))
                }
            };
            Ok((Node::Call(function_kind, Box::new(arg)), result_ty))
        }

        Expr::Unary { op, operand } => {
            let (node, ty) = check(operand)?;
            match (op, &ty) {
                (UnaryOp::Not, Type::Bool) => Ok((Node::Not(Box::new(node)), Type::Bool)),
                (UnaryOp::Neg, Type::Int | Type::Double) => Ok((Node::Neg(Box::new(node)), ty)),
                (UnaryOp::Not, _) => Err(CompileError::Type(format!("cannot apply '!' to {ty}"))),
                (UnaryOp::Neg, _) => Err(CompileError::Type(format!("cannot negate {ty}"))),
            }
        }

        Expr::Binary { op, lhs, rhs } => {
            let (lhs, lhs_ty) = check(lhs)?;
            let (rhs, rhs_ty) = check(rhs)?;
            check_binary(*op, lhs, lhs_ty, rhs, rhs_ty)
        }

        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let (condition, condition_ty) = check(condition)?;
            if condition_ty != Type::Bool {
                return Err(CompileError::Type(format!(
                    "condition must be bool, not {condition_ty}"
                )));
            }
            let (then, then_ty) = check(then)?;
            let (otherwise, otherwise_ty) = check(otherwise)?;
            let ty = unify(&then_ty, &otherwise_ty).ok_or_else(|| {
                CompileError::Type(format!(
                    "conditional branches differ: {then_ty} and {otherwise_ty}"
                ))
            })?;
            let then = coerce(then, &then_ty, &ty);
            let otherwise = coerce(otherwise, &otherwise_ty, &ty);
            Ok((
                Node::Conditional(Box::new(condition), Box::new(then), Box::new(otherwise)),
                ty,
            ))
        }
    }
}

fn check_list(items: &[Expr]) -> Result<(Node, Type), CompileError> {
    let mut checked = Vec::with_capacity(items.len());
    let mut element: Option<Type> = None;
    for item in items {
        let (node, ty) = check(item)?;
        element = Some(match element {
            None => ty.clone(),
            Some(current) => unify(&current, &ty).ok_or_else(|| {
                CompileError::Type(format!("list mixes {current} and {ty}"))
            })?,
        });
        checked.push((node, ty));
    }
    let element = element.ok_or_else(|| {
        CompileError::Type("empty list literal has no element type".to_string())
    })?;
    let nodes = checked
        .into_iter()
        .map(|(node, ty)| coerce(node, &ty, &element))
        .collect();
    Ok((Node::List(nodes), Type::List(Box::new(element))))
}

/// Widen an int-typed node where a double is expected
fn coerce(node: Node, from: &Type, to: &Type) -> Node {
    match (from, to) {
        (Type::Int, Type::Double) => Node::Call(Function::Double, Box::new(node)),
        _ => node,
    }
}

/// Common type of two operands; int and double meet at double
fn unify(a: &Type, b: &Type) -> Option<Type> {
    match (a, b) {
        _ if a == b => Some(a.clone()),
        (Type::Int, Type::Double) | (Type::Double, Type::Int) => Some(Type::Double),
        _ => None,
    }
}

fn check_binary(
    op: BinaryOp,
    lhs: Node,
    lhs_ty: Type,
    rhs: Node,
    rhs_ty: Type,
) -> Result<(Node, Type), CompileError> {
    let mismatch = || {
        CompileError::Type(format!(
            "operator '{}' is not defined for {lhs_ty} and {rhs_ty}",
            op.symbol()
        ))
    };

    let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
    match op {
        BinaryOp::And | BinaryOp::Or => {
            if lhs_ty != Type::Bool || rhs_ty != Type::Bool {
                return Err(mismatch());
            }
            let node = if op == BinaryOp::And {
                Node::And(lhs, rhs)
            } else {
                Node::Or(lhs, rhs)
            };
            Ok((node, Type::Bool))
        }

        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordered = !matches!(op, BinaryOp::Eq | BinaryOp::NotEq);
            let comparable = match unify(&lhs_ty, &rhs_ty) {
                Some(Type::Int | Type::Double | Type::String) => true,
                Some(Type::Bool) => !ordered,
                _ => false,
            };
            if !comparable {
                return Err(mismatch());
            }
            let compare = match op {
                BinaryOp::Eq => CompareOp::Eq,
                BinaryOp::NotEq => CompareOp::NotEq,
                BinaryOp::Lt => CompareOp::Lt,
                BinaryOp::LtEq => CompareOp::LtEq,
                BinaryOp::Gt => CompareOp::Gt,
                _ => CompareOp::GtEq,
            };
            Ok((Node::Compare(compare, lhs, rhs), Type::Bool))
        }

        BinaryOp::In => match &rhs_ty {
            Type::List(element)
                if matches!(
                    unify(&lhs_ty, element),
                    Some(Type::Bool | Type::Int | Type::Double | Type::String)
                ) =>
            {
                Ok((Node::In(lhs, rhs), Type::Bool))
            }
            _ => Err(mismatch()),
        },

        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let ty = match unify(&lhs_ty, &rhs_ty) {
                Some(ty) if ty.is_numeric() => ty,
                Some(Type::String) if op == BinaryOp::Add => Type::String,
                _ => return Err(mismatch()),
            };
            let arith = match op {
                BinaryOp::Add => ArithOp::Add,
                BinaryOp::Sub => ArithOp::Sub,
                BinaryOp::Mul => ArithOp::Mul,
                BinaryOp::Div => ArithOp::Div,
                _ => ArithOp::Mod,
            };
            Ok((Node::Arith(arith, lhs, rhs), ty))
        }
    }
}
