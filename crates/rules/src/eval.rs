//! Evaluation of checked rules against a track view

use std::borrow::Cow;
use std::cmp::Ordering;

use driveway_tracking::{BoundingBox, MovementVector, Point, Prediction, TrackView};

use crate::ast::Literal;
use crate::check::{ArithOp, CompareOp, Function, Node};
use crate::error::EvalError;
use crate::types::Field;

/// Runtime value; borrows from the view and the compiled rule where it can
#[derive(Debug, Clone)]
pub(crate) enum Value<'a> {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(Cow<'a, str>),
    Point(Point),
    Box(BoundingBox),
    Vector(MovementVector),
    Prediction(&'a Prediction),
    Track(&'a TrackView),
    List(Vec<Value<'a>>),
}

impl<'a> Value<'a> {
    fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Point(_) => "point",
            Value::Box(_) => "box",
            Value::Vector(_) => "vector",
            Value::Prediction(_) => "prediction",
            Value::Track(_) => "track",
            Value::List(_) => "list",
        }
    }

    pub(crate) fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }
}

fn mismatch(expected: &str, got: &Value<'_>) -> EvalError {
    EvalError::TypeMismatch(format!("expected {expected}, got {}", got.kind()))
}

pub(crate) fn eval<'a>(node: &'a Node, track: &'a TrackView) -> Result<Value<'a>, EvalError> {
    match node {
        Node::Literal(literal) => Ok(match literal {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Double(d) => Value::Double(*d),
            Literal::Str(s) => Value::Str(Cow::Borrowed(s.as_str())),
        }),

        Node::Root => Ok(Value::Track(track)),

        Node::List(items) => items
            .iter()
            .map(|item| eval(item, track))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        Node::Field(target, field) => field_of(eval(target, track)?, *field),

        Node::Index(target, index) => {
            let items = match eval(target, track)? {
                Value::List(items) => items,
                other => return Err(mismatch("list", &other)),
            };
            let index = match eval(index, track)? {
                Value::Int(n) => n,
                other => return Err(mismatch("int", &other)),
            };
            let len = items.len();
            usize::try_from(index)
                .ok()
                .filter(|i| *i < len)
                .and_then(|i| items.into_iter().nth(i))
                .ok_or(EvalError::IndexOutOfRange { index, len })
        }

        Node::Call(function, arg) => call(*function, eval(arg, track)?),

        Node::Not(operand) => Ok(Value::Bool(!eval(operand, track)?.as_bool()?)),

        Node::Neg(operand) => match eval(operand, track)? {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::Overflow("negation")),
            Value::Double(d) => Ok(Value::Double(-d)),
            other => Err(mismatch("number", &other)),
        },

        // A side that decides the result wins over an error on the other side
        Node::And(lhs, rhs) => {
            let lhs = eval(lhs, track).and_then(|v| v.as_bool());
            if let Ok(false) = lhs {
                return Ok(Value::Bool(false));
            }
            let rhs = eval(rhs, track).and_then(|v| v.as_bool());
            match (lhs, rhs) {
                (_, Ok(false)) | (Ok(false), _) => Ok(Value::Bool(false)),
                (Ok(true), Ok(true)) => Ok(Value::Bool(true)),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }

        Node::Or(lhs, rhs) => {
            let lhs = eval(lhs, track).and_then(|v| v.as_bool());
            if let Ok(true) = lhs {
                return Ok(Value::Bool(true));
            }
            let rhs = eval(rhs, track).and_then(|v| v.as_bool());
            match (lhs, rhs) {
                (_, Ok(true)) | (Ok(true), _) => Ok(Value::Bool(true)),
                (Ok(false), Ok(false)) => Ok(Value::Bool(false)),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }

        Node::Arith(op, lhs, rhs) => arith(*op, eval(lhs, track)?, eval(rhs, track)?),

        Node::Compare(op, lhs, rhs) => {
            let lhs = eval(lhs, track)?;
            let rhs = eval(rhs, track)?;
            let ordering = compare(&lhs, &rhs)?;
            let result = match op {
                CompareOp::Eq => ordering == Some(Ordering::Equal),
                CompareOp::NotEq => ordering != Some(Ordering::Equal),
                CompareOp::Lt => ordering == Some(Ordering::Less),
                CompareOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                CompareOp::Gt => ordering == Some(Ordering::Greater),
                CompareOp::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Bool(result))
        }

        Node::In(needle, haystack) => {
            let needle = eval(needle, track)?;
            let items = match eval(haystack, track)? {
                Value::List(items) => items,
                other => return Err(mismatch("list", &other)),
            };
            for item in &items {
                if compare(&needle, item)? == Some(Ordering::Equal) {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }

        Node::Conditional(condition, then, otherwise) => {
            if eval(condition, track)?.as_bool()? {
                eval(then, track)
            } else {
                eval(otherwise, track)
            }
        }
    }
}

fn field_of(value: Value<'_>, field: Field) -> Result<Value<'_>, EvalError> {
    let kind = value.kind();
    let result = match (value, field) {
        (Value::Track(view), Field::Classification) => {
            Value::Str(Cow::Borrowed(view.classification.as_str()))
        }
        (Value::Track(view), Field::Predictions) => {
            Value::List(view.predictions.iter().map(Value::Prediction).collect())
        }
        (Value::Track(view), Field::FirstT) => Value::Double(view.first_t),
        (Value::Track(view), Field::LastT) => Value::Double(view.last_t),
        (Value::Track(view), Field::LengthT) => Value::Double(view.length_t),
        (Value::Track(view), Field::FirstBox) => Value::Box(view.first_box),
        (Value::Track(view), Field::LastBox) => Value::Box(view.last_box),
        (Value::Track(view), Field::TotalBox) => Value::Box(view.total_box),
        (Value::Track(view), Field::AverageBox) => Value::Box(view.average_box),
        (Value::Track(view), Field::BestBox) => Value::Box(view.best_box),
        (Value::Track(view), Field::MovementVector) => Value::Vector(view.movement_vector),

        (Value::Prediction(p), Field::PredictionClassification) => {
            Value::Str(Cow::Borrowed(p.classification.as_str()))
        }
        (Value::Prediction(p), Field::PredictionBox) => Value::Box(p.bbox),
        (Value::Prediction(p), Field::PredictionT) => Value::Double(p.t),

        (Value::Box(b), Field::A) => Value::Point(b.a),
        (Value::Box(b), Field::B) => Value::Point(b.b),
        (Value::Box(b), Field::W) => Value::Double(b.w()),
        (Value::Box(b), Field::H) => Value::Double(b.h()),
        (Value::Box(b), Field::Center) => Value::Point(b.center()),
        (Value::Box(b), Field::Area) => Value::Double(b.area()),

        (Value::Point(p), Field::X) => Value::Double(p.x),
        (Value::Point(p), Field::Y) => Value::Double(p.y),

        (Value::Vector(v), Field::Length) => Value::Double(v.length),
        (Value::Vector(v), Field::Direction) => Value::Double(v.direction),
        (Value::Vector(v), Field::Direction360) => Value::Double(v.direction360),

        _ => {
            return Err(EvalError::TypeMismatch(format!(
                "{kind} has no field {field:?}"
            )))
        }
    };
    Ok(result)
}

fn call(function: Function, arg: Value<'_>) -> Result<Value<'_>, EvalError> {
    match (function, arg) {
        (Function::Size, Value::List(items)) => i64::try_from(items.len())
            .map(Value::Int)
            .map_err(|_| EvalError::Overflow("size")),
        (Function::Size, Value::Str(s)) => i64::try_from(s.chars().count())
            .map(Value::Int)
            .map_err(|_| EvalError::Overflow("size")),
        (Function::Double, Value::Int(n)) => Ok(Value::Double(n as f64)),
        (Function::Double, Value::Double(d)) => Ok(Value::Double(d)),
        (Function::Int, Value::Int(n)) => Ok(Value::Int(n)),
        (Function::Int, Value::Double(d)) => {
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            const LIMIT: f64 = 9_223_372_036_854_775_808.0;
            if d.is_finite() && d >= -LIMIT && d < LIMIT {
                Ok(Value::Int(d.trunc() as i64))
            } else {
                Err(EvalError::InvalidConversion(d))
            }
        }
        (_, other) => Err(mismatch("argument of matching type", &other)),
    }
}

fn arith<'a>(op: ArithOp, lhs: Value<'a>, rhs: Value<'a>) -> Result<Value<'a>, EvalError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let result = match op {
                ArithOp::Add => a.checked_add(b).ok_or(EvalError::Overflow("addition")),
                ArithOp::Sub => a.checked_sub(b).ok_or(EvalError::Overflow("subtraction")),
                ArithOp::Mul => a.checked_mul(b).ok_or(EvalError::Overflow("multiplication")),
                ArithOp::Div if b == 0 => Err(EvalError::DivisionByZero),
                ArithOp::Div => a.checked_div(b).ok_or(EvalError::Overflow("division")),
                ArithOp::Mod if b == 0 => Err(EvalError::DivisionByZero),
                ArithOp::Mod => a.checked_rem(b).ok_or(EvalError::Overflow("modulo")),
            };
            result.map(Value::Int)
        }
        (Value::Str(a), Value::Str(b)) if op == ArithOp::Add => {
            Ok(Value::Str(Cow::Owned(format!("{a}{b}"))))
        }
        (lhs, rhs) => {
            let (a, b) = match (lhs.as_f64(), rhs.as_f64()) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(EvalError::TypeMismatch(format!(
                        "cannot combine {} and {}",
                        lhs.kind(),
                        rhs.kind()
                    )))
                }
            };
            let result = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div | ArithOp::Mod if b == 0.0 => return Err(EvalError::DivisionByZero),
                ArithOp::Div => a / b,
                ArithOp::Mod => a % b,
            };
            Ok(Value::Double(result))
        }
    }
}

/// `None` when the operands are unordered (a NaN is involved)
fn compare(lhs: &Value<'_>, rhs: &Value<'_>) -> Result<Option<Ordering>, EvalError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(EvalError::TypeMismatch(format!(
                "cannot compare {} and {}",
                lhs.kind(),
                rhs.kind()
            ))),
        },
    }
}
