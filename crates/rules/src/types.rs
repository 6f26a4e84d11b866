//! Static types and the field schema rules are checked against

use std::fmt;

/// Type of a rule sub-expression, known at compile time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Bool,
    Int,
    Double,
    String,
    Point,
    BoundingBox,
    Vector,
    Prediction,
    Track,
    List(Box<Type>),
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    /// Resolve `self.name` against the schema
    pub(crate) fn field(&self, name: &str) -> Option<(Field, Type)> {
        let resolved = match (self, name) {
            (Type::Track, "classification") => (Field::Classification, Type::String),
            (Type::Track, "predictions") => {
                (Field::Predictions, Type::List(Box::new(Type::Prediction)))
            }
            (Type::Track, "first_t") => (Field::FirstT, Type::Double),
            (Type::Track, "last_t") => (Field::LastT, Type::Double),
            (Type::Track, "length_t") => (Field::LengthT, Type::Double),
            (Type::Track, "first_box") => (Field::FirstBox, Type::BoundingBox),
            (Type::Track, "last_box") => (Field::LastBox, Type::BoundingBox),
            (Type::Track, "total_box") => (Field::TotalBox, Type::BoundingBox),
            (Type::Track, "average_box") => (Field::AverageBox, Type::BoundingBox),
            (Type::Track, "best_box") => (Field::BestBox, Type::BoundingBox),
            (Type::Track, "movement_vector") => (Field::MovementVector, Type::Vector),

            (Type::Prediction, "classification") => {
                (Field::PredictionClassification, Type::String)
            }
            (Type::Prediction, "box") => (Field::PredictionBox, Type::BoundingBox),
            (Type::Prediction, "t") => (Field::PredictionT, Type::Double),

            (Type::BoundingBox, "a") => (Field::A, Type::Point),
            (Type::BoundingBox, "b") => (Field::B, Type::Point),
            (Type::BoundingBox, "w") => (Field::W, Type::Double),
            (Type::BoundingBox, "h") => (Field::H, Type::Double),
            (Type::BoundingBox, "center") => (Field::Center, Type::Point),
            (Type::BoundingBox, "area") => (Field::Area, Type::Double),

            (Type::Point, "x") => (Field::X, Type::Double),
            (Type::Point, "y") => (Field::Y, Type::Double),

            (Type::Vector, "length") => (Field::Length, Type::Double),
            (Type::Vector, "direction") => (Field::Direction, Type::Double),
            (Type::Vector, "direction360") => (Field::Direction360, Type::Double),

            _ => return None,
        };
        Some(resolved)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Double => write!(f, "double"),
            Type::String => write!(f, "string"),
            Type::Point => write!(f, "point"),
            Type::BoundingBox => write!(f, "box"),
            Type::Vector => write!(f, "vector"),
            Type::Prediction => write!(f, "prediction"),
            Type::Track => write!(f, "track"),
            Type::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

/// A schema field, resolved once at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    // track
    Classification,
    Predictions,
    FirstT,
    LastT,
    LengthT,
    FirstBox,
    LastBox,
    TotalBox,
    AverageBox,
    BestBox,
    MovementVector,

    // prediction
    PredictionClassification,
    PredictionBox,
    PredictionT,

    // box
    A,
    B,
    W,
    H,
    Center,
    Area,

    // point
    X,
    Y,

    // vector
    Length,
    Direction,
    Direction360,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_fields() {
        assert_eq!(
            Type::Track.field("last_box"),
            Some((Field::LastBox, Type::BoundingBox))
        );
        assert_eq!(
            Type::Track.field("predictions").map(|(_, ty)| ty),
            Some(Type::List(Box::new(Type::Prediction)))
        );
        assert!(Type::Track.field("speed").is_none());
    }

    #[test]
    fn test_fields_are_scoped_by_type() {
        assert!(Type::Point.field("x").is_some());
        assert!(Type::BoundingBox.field("x").is_none());
        assert!(Type::Double.field("x").is_none());
        assert_eq!(
            Type::Prediction.field("box"),
            Some((Field::PredictionBox, Type::BoundingBox))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::BoundingBox.to_string(), "box");
        assert_eq!(
            Type::List(Box::new(Type::Prediction)).to_string(),
            "list<prediction>"
        );
    }
}
