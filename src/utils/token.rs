//! Compact HS256 signed tokens (`header.claims.signature`, base64url without padding).

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TokenError;

/// Claims of a project-slug token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectClaims {
    /// Meta defaults and variables, without the stamp
    pub params: Map<String, Value>,
    pub path: String,
}

/// Claims of a render-suffix token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderClaims {
    /// Deck
    pub d: String,
    /// Template
    pub t: String,
    /// Version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<Value>,
    /// Extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Variables
    #[serde(default)]
    pub var: Map<String, Value>,
    /// Renamed meta hints (`i`, `w`, `h`, `r`, `u`)
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

/// Sign `claims` with `key`
pub fn encode<T: Serialize>(claims: &T, key: &str) -> Result<String, TokenError> {
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )?)
}

/// Verify `token` against `key` and return its claims
///
/// Claims carry no registered fields, so expiry and audience are not checked.
pub fn decode<T: DeserializeOwned>(token: &str, key: &str) -> Result<T, TokenError> {
    let header = jsonwebtoken::decode_header(token).map_err(malformed)?;
    if header.alg != Algorithm::HS256 {
        return Err(TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<T>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
        .map_err(malformed)?;
    Ok(data.claims)
}

fn malformed(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => TokenError::Malformed,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Jwt(err),
    }
}
