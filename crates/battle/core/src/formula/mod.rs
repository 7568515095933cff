//! Sandboxed damage formula evaluator.
//!
//! Damage formulas are short expressions over the subject (`a`), the target
//! (`b`) and game variables (`v[n]`), e.g. `a.atk * 4 - b.def * 2`. They are
//! parsed once when the data is loaded and evaluated against a
//! [`FormulaScope`] at damage time. Nothing outside the fixed grammar and the
//! exposed battler accessors is reachable.
mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, Operand, UnaryOp};
pub use eval::FormulaScope;

use crate::error::{ErrorSeverity, GameError};

/// Parse or evaluation failure. Resolution maps any of these to 0 damage.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("syntax error at {position}: {message}")]
    Parse {
        position: usize,
        message: &'static str,
    },

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("unknown battler member `{0}`")]
    UnknownMember(String),

    #[error("unknown Math function `{0}`")]
    UnknownFunction(String),
}

impl GameError for FormulaError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "FORMULA_PARSE",
            Self::UnknownIdentifier(_) => "FORMULA_UNKNOWN_IDENTIFIER",
            Self::UnknownMember(_) => "FORMULA_UNKNOWN_MEMBER",
            Self::UnknownFunction(_) => "FORMULA_UNKNOWN_FUNCTION",
        }
    }
}

/// A damage formula with its source text and compiled form.
///
/// Serializes as the plain source string.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct DamageFormula {
    source: String,
    compiled: Result<Expr, FormulaError>,
}

impl DamageFormula {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let trimmed = source.trim();
        let compiled = if trimmed.is_empty() {
            Ok(Expr::Number(0.0))
        } else {
            parser::parse(trimmed)
        };
        Self { source, compiled }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> Result<&Expr, &FormulaError> {
        self.compiled.as_ref()
    }

    /// Evaluates the formula. The raw value may be negative, NaN or infinite;
    /// clamping and sign handling belong to the caller.
    pub fn evaluate(&self, scope: &dyn FormulaScope) -> Result<f64, FormulaError> {
        match &self.compiled {
            Ok(expr) => eval::eval(expr, scope),
            Err(err) => Err(err.clone()),
        }
    }
}

impl Default for DamageFormula {
    fn default() -> Self {
        Self::new("0")
    }
}

impl PartialEq for DamageFormula {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl From<String> for DamageFormula {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for DamageFormula {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<DamageFormula> for String {
    fn from(formula: DamageFormula) -> Self {
        formula.source
    }
}
