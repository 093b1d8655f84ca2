//! Request signing.
//!
//! A request is either unsigned, signed with a truncated HMAC-SHA256 digest,
//! or carried entirely inside an HS256 token. The cache-bust stamp never
//! takes part in a signature, so re-requests with a fresh stamp keep it.

use serde_json::Value;

use crate::encoding::{scalar_to_string, to_sorted_query};
use crate::error::{Result, ValidationError};
use crate::normalize::{meta_defaults, Normalized};
use crate::request::{Meta, Strategy};
use crate::scheme::CLAIM_META_KEYS;
use crate::utils::crypto::{truncated_digest, verify_digest};
use crate::utils::token::{self, ProjectClaims, RenderClaims};

/// Placeholder path segment of unsigned requests
pub const UNSIGNED: &str = "_";

/// A validated secret and strategy pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub secret: &'a str,
    pub strategy: Strategy,
}

impl<'a> Credentials<'a> {
    /// Resolve the raw request fields. Both must be given or neither.
    pub fn resolve(
        secret: Option<&'a str>,
        strategy: Option<&str>,
    ) -> std::result::Result<Option<Self>, ValidationError> {
        let secret = secret.filter(|s| !s.is_empty());
        let strategy = strategy.filter(|s| !s.is_empty());

        match (secret, strategy) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ValidationError::SecretWithoutStrategy),
            (None, Some(_)) => Err(ValidationError::StrategyWithoutSecret),
            (Some(secret), Some(strategy)) => Ok(Some(Credentials {
                secret,
                strategy: strategy.parse()?,
            })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    Unsigned,
    /// First 16 hex characters of the digest
    Hmac(String),
    /// Compact HS256 token
    Jwt(String),
}

impl Signature {
    pub fn as_str(&self) -> &str {
        match self {
            Signature::Unsigned => UNSIGNED,
            Signature::Hmac(value) | Signature::Jwt(value) => value,
        }
    }
}

/// What a signature covers, per identity shape
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Project {
        project: &'a str,
        /// Normalized path, always starting with `/`
        path: &'a str,
    },
    Render {
        deck: &'a str,
        template: &'a str,
        version: Option<&'a Value>,
        extension: Option<&'a str>,
        meta: &'a Meta,
    },
}

impl Target<'_> {
    /// Message fed to the HMAC. Excludes the stamp.
    pub fn message(&self, normalized: &Normalized) -> String {
        match *self {
            Target::Project { project, path } => {
                format!("{project}{path}{}", to_sorted_query(&normalized.params(false)))
            }
            Target::Render {
                deck,
                template,
                version,
                extension,
                ..
            } => [
                deck.to_string(),
                template.to_string(),
                version.and_then(scalar_to_string).unwrap_or_default(),
                extension.unwrap_or_default().to_string(),
                to_sorted_query(&normalized.defaults),
            ]
            .join("#"),
        }
    }

    fn token(&self, normalized: &Normalized, secret: &str) -> Result<String> {
        let token = match *self {
            Target::Project { path, .. } => token::encode(
                &ProjectClaims {
                    params: normalized.params(false),
                    path: path.to_string(),
                },
                secret,
            )?,
            Target::Render {
                deck,
                template,
                version,
                extension,
                meta,
            } => token::encode(
                &RenderClaims {
                    d: deck.to_string(),
                    t: template.to_string(),
                    v: version.cloned(),
                    e: extension.map(str::to_string),
                    var: normalized.variables.clone(),
                    meta: meta_defaults(meta, &CLAIM_META_KEYS),
                },
                secret,
            )?,
        };
        Ok(token)
    }

    pub fn sign(
        &self,
        normalized: &Normalized,
        credentials: Option<Credentials<'_>>,
    ) -> Result<Signature> {
        let Some(credentials) = credentials else {
            return Ok(Signature::Unsigned);
        };

        match credentials.strategy {
            Strategy::Hmac => Ok(Signature::Hmac(truncated_digest(
                credentials.secret,
                &self.message(normalized),
            ))),
            Strategy::Jwt => Ok(Signature::Jwt(self.token(normalized, credentials.secret)?)),
        }
    }

    /// Check a truncated HMAC digest taken from a URL
    pub fn verify(&self, normalized: &Normalized, secret: &str, digest: &str) -> bool {
        verify_digest(secret, &self.message(normalized), digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::Error;
    use crate::request::RenderRequest;
    use crate::scheme::Scheme;
    use serde_json::json;

    const SECRET: &str = "sg1j0HVy9bsMihJqa8Qwu8ZYgCYHG0tx";

    fn fixture() -> RenderRequest {
        RenderRequest::project("project")
            .with_path("/collections/col")
            .with_variable("title", "Hello world!")
            .with_meta(Meta::new().id("dev forgot to slugify").width("100").height(200))
    }

    #[test]
    fn test_resolve_both_or_neither() {
        assert_eq!(Credentials::resolve(None, None).unwrap(), None);
        assert_eq!(Credentials::resolve(Some(""), Some("")).unwrap(), None);
        assert_eq!(
            Credentials::resolve(Some("secret"), None).unwrap_err(),
            ValidationError::SecretWithoutStrategy
        );
        assert_eq!(
            Credentials::resolve(None, Some("HMAC")).unwrap_err(),
            ValidationError::StrategyWithoutSecret
        );
        assert_eq!(
            Credentials::resolve(Some("secret"), Some("md5")).unwrap_err(),
            ValidationError::InvalidStrategy("md5".to_string())
        );
        assert_eq!(
            Credentials::resolve(Some("secret"), Some("jWt")).unwrap(),
            Some(Credentials {
                secret: "secret",
                strategy: Strategy::Jwt
            })
        );
    }

    #[test]
    fn test_project_hmac_is_time_independent() {
        let request = fixture();
        let target = Target::Project {
            project: "project",
            path: "/collections/col",
        };
        let credentials = Some(Credentials {
            secret: SECRET,
            strategy: Strategy::Hmac,
        });

        for now in [1, 1_700_000_000] {
            let normalized = Normalized::new(&request, Scheme::ProjectSlug, &FixedClock(now));
            assert_eq!(
                target.sign(&normalized, credentials).unwrap(),
                Signature::Hmac("361b2a456daf8415".to_string())
            );
            assert!(target.verify(&normalized, SECRET, "361b2a456daf8415"));
        }
    }

    #[test]
    fn test_render_message_layout() {
        let meta = Meta::new().width(100).id("x");
        let request = RenderRequest::template("tenant", "deck", "template").with_meta(meta.clone());
        let normalized = Normalized::new(&request, Scheme::RenderSuffix, &FixedClock(1));
        let version = json!(2);
        let target = Target::Render {
            deck: "deck",
            template: "template",
            version: Some(&version),
            extension: None,
            meta: &meta,
        };

        assert_eq!(target.message(&normalized), "deck#template#2##__id=x&_w=100");
    }

    #[test]
    fn test_render_message_sorts_meta_hints() {
        let meta = Meta::new().id("x").width(1200).height(630);
        let request = RenderRequest::template("tenant", "deck", "template").with_meta(meta.clone());
        let normalized = Normalized::new(&request, Scheme::RenderSuffix, &FixedClock(1));
        let target = Target::Render {
            deck: "deck",
            template: "template",
            version: None,
            extension: Some("png"),
            meta: &meta,
        };

        let message = target.message(&normalized);
        assert_eq!(message, "deck#template##png#__id=x&_h=630&_w=1200");
        assert!(!message.contains("_w=1200&_h=630"));
    }

    #[test]
    fn test_render_token_claims() {
        let meta = Meta::new().id("abc").height(200);
        let request = RenderRequest::template("tenant", "deck", "template")
            .with_variable("title", "Hello world!")
            .with_meta(meta.clone());
        let normalized = Normalized::new(&request, Scheme::RenderSuffix, &FixedClock(1));
        let version = json!(4);
        let target = Target::Render {
            deck: "deck",
            template: "template",
            version: Some(&version),
            extension: Some("jpeg"),
            meta: &meta,
        };

        let signature = target
            .sign(
                &normalized,
                Some(Credentials {
                    secret: SECRET,
                    strategy: Strategy::Jwt,
                }),
            )
            .unwrap();
        let Signature::Jwt(jwt) = signature.clone() else {
            panic!("expected a token, got {signature:?}");
        };

        let claims: RenderClaims = token::decode(&jwt, SECRET).unwrap();
        assert_eq!(claims.d, "deck");
        assert_eq!(claims.t, "template");
        assert_eq!(claims.v, Some(json!(4)));
        assert_eq!(claims.e.as_deref(), Some("jpeg"));
        assert_eq!(claims.var["title"], json!("Hello world!"));
        assert_eq!(claims.meta["i"], json!("abc"));
        assert_eq!(claims.meta["h"], json!(200));
        assert!(!claims.meta.contains_key("w"));

        let err = token::decode::<RenderClaims>(&jwt, "wrong").unwrap_err();
        assert!(matches!(
            Error::from(err),
            Error::Token(crate::error::TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_unsigned_placeholder() {
        let normalized = Normalized::new(&fixture(), Scheme::ProjectSlug, &FixedClock(1));
        let target = Target::Project {
            project: "project",
            path: "/",
        };

        let signature = target.sign(&normalized, None).unwrap();
        assert_eq!(signature, Signature::Unsigned);
        assert_eq!(signature.as_str(), "_");
    }
}
