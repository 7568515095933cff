//! Common error infrastructure for battle-core.
//!
//! Combat itself never fails: misses, resists and invalid actions are normal
//! outcomes recorded in [`crate::battler::ActionResult`]. Errors exist only
//! for structural problems (unknown troop or actor data at setup) and for
//! misuse of the player-input API.
//!
//! # Design Principles
//!
//! - **Type Safety**: each failure domain has its own enum
//! - **Rich Context**: errors carry the battler and turn they relate to
//! - **Severity Classification**: errors are categorized for recovery strategies

use crate::battler::BattlerId;
use crate::manager::Phase;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: may succeed later without changing the request
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: corrupted game data, the battle cannot start
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates broken data or a bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Battler the error relates to (if applicable).
    pub battler: Option<BattlerId>,

    /// Troop turn counter at the time of the error.
    pub turn: u32,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context for the given turn.
    #[must_use]
    pub const fn new(turn: u32) -> Self {
        Self {
            battler: None,
            turn,
            message: None,
        }
    }

    /// Attaches a battler to this context (builder pattern).
    #[must_use]
    pub const fn with_battler(mut self, battler: BattlerId) -> Self {
        self.battler = Some(battler);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Common trait for all battle-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Structural data errors raised while building battlers or a troop.
///
/// These mean the database does not match what the caller asked for. The
/// battle must not start with a partially built roster.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetupError {
    #[error("troop {0} does not exist")]
    TroopNotFound(u32),

    #[error("actor {0} does not exist")]
    ActorNotFound(u32),

    #[error("class {class_id} of actor {actor_id} does not exist")]
    ClassNotFound { actor_id: u32, class_id: u32 },

    #[error("enemy {0} does not exist")]
    EnemyNotFound(u32),

    #[error("party has no members")]
    EmptyParty,
}

impl GameError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EmptyParty => ErrorSeverity::Validation,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TroopNotFound(_) => "SETUP_TROOP_NOT_FOUND",
            Self::ActorNotFound(_) => "SETUP_ACTOR_NOT_FOUND",
            Self::ClassNotFound { .. } => "SETUP_CLASS_NOT_FOUND",
            Self::EnemyNotFound(_) => "SETUP_ENEMY_NOT_FOUND",
            Self::EmptyParty => "SETUP_EMPTY_PARTY",
        }
    }
}

/// Player-input operations called at the wrong time.
///
/// A game shell only offers commands while the controller waits for input,
/// so these point at a sequencing bug in the caller.
///
/// Serialize-only: the context's `&'static str` message cannot be read back.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum InputError {
    #[error("command input is closed during the {phase:?} phase")]
    NotInputPhase { phase: Phase, context: ErrorContext },

    #[error("no actor is choosing a command")]
    NoInputtingActor { context: ErrorContext },

    #[error("this battle cannot be escaped")]
    EscapeForbidden { context: ErrorContext },
}

impl InputError {
    pub fn not_input_phase(phase: Phase, turn: u32) -> Self {
        Self::NotInputPhase {
            phase,
            context: ErrorContext::new(turn),
        }
    }

    pub fn no_inputting_actor(turn: u32) -> Self {
        Self::NoInputtingActor {
            context: ErrorContext::new(turn),
        }
    }

    pub fn escape_forbidden(turn: u32) -> Self {
        Self::EscapeForbidden {
            context: ErrorContext::new(turn).with_message("troop forbids escape"),
        }
    }
}

impl GameError for InputError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::NotInputPhase { context, .. }
            | Self::NoInputtingActor { context }
            | Self::EscapeForbidden { context } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotInputPhase { .. } => "INPUT_NOT_INPUT_PHASE",
            Self::NoInputtingActor { .. } => "INPUT_NO_ACTOR",
            Self::EscapeForbidden { .. } => "INPUT_ESCAPE_FORBIDDEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_is_fatal() {
        assert_eq!(SetupError::TroopNotFound(4).severity(), ErrorSeverity::Fatal);
        assert!(SetupError::ActorNotFound(1).severity().is_internal());
        assert_eq!(SetupError::EmptyParty.severity(), ErrorSeverity::Validation);
    }

    #[test]
    fn context_builder_keeps_fields() {
        let ctx = ErrorContext::new(3)
            .with_battler(BattlerId::Enemy(1))
            .with_message("escape refused");
        assert_eq!(ctx.turn, 3);
        assert_eq!(ctx.battler, Some(BattlerId::Enemy(1)));
        assert_eq!(ctx.message, Some("escape refused"));
    }

    #[test]
    fn input_errors_carry_turn_context() {
        let err = InputError::escape_forbidden(2);
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "INPUT_ESCAPE_FORBIDDEN");
        let ctx = err.context().unwrap();
        assert_eq!(ctx.turn, 2);
        assert_eq!(ctx.message, Some("troop forbids escape"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn input_errors_serialize_with_context() {
        let err = InputError::not_input_phase(Phase::Turn, 5);
        let json = serde_json::to_value(&err).unwrap();
        let fields = &json["NotInputPhase"];
        assert_eq!(fields["context"]["turn"], 5);
        assert!(fields["context"]["message"].is_null());
    }
}
