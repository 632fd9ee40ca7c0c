//! Error types for the parking API client.
//!
//! # Design
//! Every operation fails with exactly one `ApiError` variant whose message is
//! fixed ("login failed", ...), whatever went wrong underneath. The actual
//! reason is kept as a `Cause` and exposed through `Error::source`, so callers
//! that care can walk the chain while the display text stays uniform.

use thiserror::Error;

/// Boxed transport failure, independent of the HTTP library in use.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The logical operation a request or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    UpdateParams,
    GetParams,
}

impl Operation {
    /// Path segment under the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Register => "register",
            Operation::UpdateParams => "updateParams",
            Operation::GetParams => "getParams",
        }
    }

    /// Wrap `cause` into this operation's error variant.
    pub fn fail(self, cause: impl Into<Cause>) -> ApiError {
        let cause = cause.into();
        match self {
            Operation::Login => ApiError::Authentication(cause),
            Operation::Register => ApiError::Registration(cause),
            Operation::UpdateParams => ApiError::Update(cause),
            Operation::GetParams => ApiError::Fetch(cause),
        }
    }
}

/// Errors returned by `ParkingClient` and `ParkingApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("login failed")]
    Authentication(#[source] Cause),

    #[error("register failed")]
    Registration(#[source] Cause),

    #[error("update failed")]
    Update(#[source] Cause),

    #[error("get params failed")]
    Fetch(#[source] Cause),
}

impl ApiError {
    pub fn operation(&self) -> Operation {
        match self {
            ApiError::Authentication(_) => Operation::Login,
            ApiError::Registration(_) => Operation::Register,
            ApiError::Update(_) => Operation::UpdateParams,
            ApiError::Fetch(_) => Operation::GetParams,
        }
    }

    pub fn cause(&self) -> &Cause {
        match self {
            ApiError::Authentication(cause)
            | ApiError::Registration(cause)
            | ApiError::Update(cause)
            | ApiError::Fetch(cause) => cause,
        }
    }
}

/// Why an operation failed.
#[derive(Debug, Error)]
pub enum Cause {
    /// The server answered with anything but 200.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16, body: String },

    /// No response was received.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The base URL could not be combined into a request URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
