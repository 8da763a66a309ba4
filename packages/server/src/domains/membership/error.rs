use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::common::AuthError;
use crate::domains::membership::machine::{MembershipAction, TransitionError};
use crate::domains::membership::models::MembershipStatus;

/// Field-level validation messages, keyed by request field name
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn extend(&mut self, field: &str, messages: Vec<String>) {
        for message in messages {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(value)` when no messages were collected
    pub fn into_result<T>(self, value: T) -> Result<T, MembershipError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(MembershipError::Validation(self))
        }
    }
}

/// Errors surfaced by membership operations
#[derive(Error, Debug)]
pub enum MembershipError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("User not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Cannot {action} a membership that is {from}")]
    InvalidTransition {
        from: MembershipStatus,
        action: MembershipAction,
    },

    #[error("Membership is already {0}")]
    AlreadyTerminal(MembershipStatus),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MembershipError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn membership_not_found() -> Self {
        Self::not_found("Membership not found")
    }
}

impl From<AuthError> for MembershipError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::AuthenticationRequired | AuthError::InvalidToken => Self::Unauthenticated,
            AuthError::AdminRequired => Self::Forbidden("Admin access required".to_string()),
            AuthError::PermissionDenied(message) => Self::Forbidden(message),
        }
    }
}

impl From<TransitionError> for MembershipError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::AlreadyTerminal(status) => Self::AlreadyTerminal(status),
            TransitionError::Invalid { from, action } => Self::InvalidTransition { from, action },
        }
    }
}

pub type MembershipResult<T> = Result<T, MembershipError>;
