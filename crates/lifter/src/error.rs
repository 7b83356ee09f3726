//! Lift error types

use quarry_bytecode::{BytecodeError, ResolveError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiftError {
    #[error("Unsupported construct `{construct}`{}", at_position(.position))]
    UnsupportedConstruct {
        construct: String,
        position: Option<usize>,
    },

    #[error("Cannot resolve `{member}` on {receiver}: {reason}")]
    ReflectiveResolution {
        member: String,
        receiver: String,
        reason: String,
    },

    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    #[error(transparent)]
    Bytecode(#[from] BytecodeError),
}

pub type LiftResult<T> = Result<T, LiftError>;

impl LiftError {
    pub fn unsupported(construct: impl Into<String>, position: Option<usize>) -> Self {
        LiftError::UnsupportedConstruct {
            construct: construct.into(),
            position,
        }
    }

    /// Attach `position` to an unsupported construct raised without one.
    pub fn at(self, position: usize) -> Self {
        match self {
            LiftError::UnsupportedConstruct {
                construct,
                position: None,
            } => LiftError::UnsupportedConstruct {
                construct,
                position: Some(position),
            },
            other => other,
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        LiftError::StructuralInconsistency(message.into())
    }

    /// Wrap a host resolution failure, naming the member and receiver.
    pub fn resolution(error: ResolveError) -> Self {
        let reason = error.to_string();
        let (member, receiver) = match error {
            ResolveError::MissingMember { receiver, member }
            | ResolveError::AccessDenied { receiver, member }
            | ResolveError::InvocationFailed {
                receiver, member, ..
            } => (member, receiver),
        };
        LiftError::ReflectiveResolution {
            member,
            receiver,
            reason,
        }
    }
}

fn at_position(position: &Option<usize>) -> String {
    match position {
        Some(position) => format!(" at instruction {}", position),
        None => String::new(),
    }
}
