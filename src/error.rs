use crate::scheme::Scheme;

/// Rejected request fields. Raised before any hashing or encoding work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing '{0}' property")]
    MissingField(&'static str),

    #[error("got `secret` but missing `strategy`, valid options are `HMAC` or `JWT`")]
    SecretWithoutStrategy,

    #[error("got `strategy` but missing `secret`, you can find it in your project advanced settings")]
    StrategyWithoutSecret,

    #[error("invalid signing strategy '{0}', valid options are `HMAC` or `JWT`")]
    InvalidStrategy(String),

    #[error("request identity does not fit the {scheme} url scheme")]
    IdentityMismatch { scheme: Scheme },

    #[error("the {scheme} url scheme does not support signed requests")]
    SigningUnsupported { scheme: Scheme },

    #[error("invalid variables: {0}")]
    InvalidVariables(String),

    #[error("version must be a string or a number")]
    InvalidVersion,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl Error {
    /// Whether the request itself was rejected, as opposed to a token failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
