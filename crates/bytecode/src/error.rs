//! Bytecode model and host resolution error types

use crate::instruction::Label;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    #[error("Unknown label: {0}")]
    UnknownLabel(Label),

    #[error("Invalid descriptor `{descriptor}`: {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },

    #[error("Method body not found: {0}")]
    MethodNotFound(String),
}

pub type BytecodeResult<T> = Result<T, BytecodeError>;

/// Failure reported by a host while reading a member reflectively.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No member `{member}` on {receiver}")]
    MissingMember { receiver: String, member: String },

    #[error("Access to `{member}` on {receiver} denied")]
    AccessDenied { receiver: String, member: String },

    #[error("Invocation of `{member}` on {receiver} failed: {reason}")]
    InvocationFailed {
        receiver: String,
        member: String,
        reason: String,
    },
}

impl ResolveError {
    pub fn missing(receiver: impl Into<String>, member: impl Into<String>) -> Self {
        ResolveError::MissingMember {
            receiver: receiver.into(),
            member: member.into(),
        }
    }
}
