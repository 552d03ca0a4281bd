//! Error taxonomy for the authentication core, per spec §7. Challenge
//! continuations (`NewPasswordRequired`, `MfaRequired`, `CustomChallenge`)
//! are modeled as a sum-type in [`crate::challenge::AuthOutcome`] rather
//! than error variants here — they're not failures, they're a demand for
//! another round trip.

use derive_more::{Display, Error};

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
pub enum CryptoFailureKind {
    #[display("random number generator failed to produce a scalar")]
    RngFailure,
    #[display("derived scalar (A or u) was zero")]
    ZeroScalar,
    #[display("modular arithmetic step failed")]
    ArithFailure,
}

#[derive(Error, Display, Debug)]
pub enum AuthError {
    #[display("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[display("no valid session is cached for this operation")]
    NotAuthenticated,

    #[display("transport error: {message}")]
    Transport { message: String },

    #[display("service error [{code}]: {message}")]
    ServiceError { code: String, message: String },

    #[display("cryptographic failure: {kind}")]
    CryptoFailure { kind: CryptoFailureKind },

    #[display("an authentication operation is already in progress for this user")]
    Busy,

    #[display("persisted token data could not be parsed: {message}")]
    Corruption { message: String },
}

impl AuthError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn service_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServiceError { code: code.into(), message: message.into() }
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption { message: message.into() }
    }

    pub fn crypto(kind: CryptoFailureKind) -> Self {
        Self::CryptoFailure { kind }
    }
}
