//! Domain errors for the notifier.

use thiserror::Error;

/// Errors raised by the persistence ports.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Subscriber not found: {0}")]
    SubscriberNotFound(i64),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Exchanging the user token for a bearer token failed. Fatal for the cycle.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token exchange rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token exchange failed: {0}")]
    Network(String),

    #[error("Token response is malformed: {0}")]
    Malformed(String),
}

/// Failure of a single read call against Allure TestOps.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credential missing or expired. Fatal for the rest of the cycle.
    #[error("Unauthorized request to {endpoint}")]
    Unauthorized { endpoint: String },

    /// Retryable status (400..=504) that outlived the retry budget.
    #[error("Request to {endpoint} failed with status {status}: {body}")]
    Transient {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Any other status than the expected one.
    #[error("Unexpected status {status} from {endpoint}: {body}")]
    Unexpected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Network { .. })
    }

    /// Returns true if the rest of the cycle cannot succeed either
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Unauthorized { endpoint }
            | Self::Transient { endpoint, .. }
            | Self::Unexpected { endpoint, .. }
            | Self::Network { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }

    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Transient { status, .. } | Self::Unexpected { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Failure to deliver a report to one chat.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The chat blocked the bot or no longer exists. The chat gets unsubscribed.
    #[error("Chat {chat_id} revoked access: {reason}")]
    Revoked { chat_id: i64, reason: String },

    #[error("Delivery to chat {chat_id} rejected with status {status}: {body}")]
    Rejected {
        chat_id: i64,
        status: u16,
        body: String,
    },

    #[error("Delivery to chat {chat_id} failed: {message}")]
    Network { chat_id: i64, message: String },
}

impl DeliveryError {
    pub const fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked { .. })
    }
}
