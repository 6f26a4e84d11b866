//! Notification rule language
//!
//! A small, statically typed expression language (CEL-like) evaluated
//! against a [`TrackView`] bound to the identifier `track`. Rules are
//! compiled once at startup: syntax, unknown names and type mismatches are
//! all reported as a [`CompileError`] before the first detection arrives.
//!
//! # Example
//! ```
//! use driveway_rules::Rule;
//!
//! let rule = Rule::compile("track.classification in ['car', 'truck'] && track.length_t > 2.0")?;
//! assert_eq!(rule.source(), "track.classification in ['car', 'truck'] && track.length_t > 2.0");
//! # Ok::<(), driveway_rules::CompileError>(())
//! ```

mod ast;
mod check;
pub mod error;
mod eval;
mod lexer;
mod parser;
pub mod types;

use std::fmt;
use std::str::FromStr;

use driveway_tracking::TrackView;
use tracing::debug;

pub use error::{CompileError, EvalError};
pub use types::Type;

/// A compiled, type-checked rule
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    root: check::Node,
}

impl Rule {
    /// Parse and type-check `source`. The expression must produce a bool.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let expr = parser::parse(source)?;
        let (root, ty) = check::check(&expr)?;
        if ty != Type::Bool {
            return Err(CompileError::NotBoolean(ty));
        }
        debug!("Compiled rule: {}", source);
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one view. Never mutates the view.
    pub fn evaluate(&self, view: &TrackView) -> Result<bool, EvalError> {
        eval::eval(&self.root, view)?.as_bool()
    }
}

impl FromStr for Rule {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
