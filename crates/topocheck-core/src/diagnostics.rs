use crate::ThisError;
use derive_more::Display;

///
/// EntityKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum EntityKind {
    #[display("node")]
    Node,
    #[display("call")]
    Call,
}

///
/// Field
/// Fields in the order they are compared.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Field {
    #[display("id")]
    Id,
    #[display("name")]
    Name,
    #[display("type")]
    Type,
    #[display("isReal")]
    IsReal,
    #[display("source")]
    Source,
    #[display("target")]
    Target,
}

///
/// FailureKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum FailureKind {
    Structural,
    Field,
    Binding,
    Unresolved,
}

///
/// VerifyError
///
/// The first failure detected by a verification pass. Ids are the expected
/// pattern description when no actual entity was paired, and the actual id
/// otherwise.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum VerifyError {
    #[error(
        "{kind} '{id}' field {field}: variable '{variable}' is bound to '{bound}' but found '{found}'"
    )]
    BindingConflict {
        kind: EntityKind,
        id: String,
        field: Field,
        variable: String,
        bound: String,
        found: String,
    },

    #[error("call '{call}' {field} '{node}' is not a node of the actual topology")]
    DanglingEndpoint {
        call: String,
        field: Field,
        node: String,
    },

    #[error("actual topology contains {kind} id '{id}' more than once")]
    DuplicateActualId { kind: EntityKind, id: String },

    #[error("{kind} '{id}' field {field}: expected {expected}, got {}", observed(.actual))]
    FieldMismatch {
        kind: EntityKind,
        id: String,
        field: Field,
        expected: String,
        actual: Option<String>,
    },

    #[error("expected {kind} with id {id} has no corresponding actual {kind}")]
    MissingEntity { kind: EntityKind, id: String },

    #[error("actual {kind} '{id}' is not declared in the expected topology")]
    UnexpectedEntity { kind: EntityKind, id: String },

    #[error("{kind} '{id}' field {field}: variable '{variable}' is used before any entity binds it")]
    UnresolvedVariable {
        kind: EntityKind,
        id: String,
        field: Field,
        variable: String,
    },
}

impl VerifyError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::DanglingEndpoint { .. }
            | Self::DuplicateActualId { .. }
            | Self::MissingEntity { .. }
            | Self::UnexpectedEntity { .. } => FailureKind::Structural,
            Self::FieldMismatch { .. } => FailureKind::Field,
            Self::BindingConflict { .. } => FailureKind::Binding,
            Self::UnresolvedVariable { .. } => FailureKind::Unresolved,
        }
    }

    /// The variable involved, for binding and resolution failures.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::BindingConflict { variable, .. } | Self::UnresolvedVariable { variable, .. } => {
                Some(variable)
            }
            _ => None,
        }
    }
}

#[allow(clippy::ref_option)]
fn observed(actual: &Option<String>) -> String {
    actual
        .as_ref()
        .map_or_else(|| "<absent>".to_string(), |v| format!("'{v}'"))
}

///
/// TESTS
///
