//! Data errors for the entity model.

use crate::record::EntityKind;

/// A data-shape error in material arriving from the boundary.
///
/// These are never fatal to the engine: the ingestion pipeline drops the
/// offending payload, logs it, and leaves every other record untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A status string not in the kind's closed enumeration.
    #[error("unknown status '{status}' for kind {kind}")]
    UnknownStatus { kind: EntityKind, status: String },

    /// A record payload that fails shape validation (missing or mistyped
    /// field).
    #[error("malformed {kind} record: {message}")]
    Malformed { kind: EntityKind, message: String },

    /// An action requested against a kind it does not apply to.
    #[error("action '{action}' does not apply to kind {kind}")]
    ActionMismatch {
        kind: EntityKind,
        action: &'static str,
    },

    /// An action requested against a record already in a terminal state.
    #[error("{kind} {id} is already terminal in state {status}")]
    AlreadyTerminal {
        kind: EntityKind,
        id: String,
        status: &'static str,
    },
}
