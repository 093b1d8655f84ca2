//! # flyyer
//!
//! A Rust library for building Flyyer image-rendering URLs.
//!
//! A [`RenderRequest`] describes which template to render and with which
//! variables. [`FlyyerUrl`] turns it into the canonical URL for one of the
//! service's URL schemes, optionally signed with an HMAC digest or an HS256
//! token. Nothing here performs network I/O.
//!
//! ## Quick Start
//!
//! ```rust
//! use flyyer::{FlyyerUrl, Meta, RenderRequest, Scheme, Strategy};
//!
//! let request = RenderRequest::project("project")
//!     .with_path("/collections/col")
//!     .with_variable("title", "Hello world!")
//!     .with_meta(Meta::new().id("col"))
//!     .with_credentials("your-secret-key", Strategy::Hmac);
//!
//! let url = FlyyerUrl::new(Scheme::ProjectSlug).href(&request).unwrap();
//! // https://cdn.flyyer.io/v2/project/<digest>/__id=col&__v=...&title=Hello+world%21/collections/col
//! assert!(url.starts_with("https://cdn.flyyer.io/v2/project/"));
//! ```
//!
//! ## URL Schemes
//!
//! - **Legacy**: `https://flayyer.host/v2/<tenant>/<deck>/<template>[.<version>].<extension>?<query>`
//! - **ProjectSlug**: `https://cdn.flyyer.io/v2/<project>/<signature>/<query><path>`
//! - **RenderSuffix**: `https://cdn.flyyer.io/r/v2/<tenant>/<deck>/<template>[.<version>][.<extension>]?<query>`
//! - **PathOnly**: `https://flayyer.ai/v2/<project>/_/_<path>?<query>`
//!
//! Every URL carries a `__v` cache-bust stamp, `meta.v` or the current Unix time.

mod clock;
mod encoding;
mod error;
mod normalize;
mod request;
mod scheme;
mod signer;
mod utils;

#[cfg(feature = "cli")]
pub mod config;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

pub use clock::{Clock, FixedClock, SystemClock};
pub use encoding::{to_query, to_sorted_query};
pub use error::{Error, Result, TokenError, ValidationError};
pub use normalize::{is_absent, Normalized, STAMP_KEY};
pub use request::{Identity, Meta, RenderRequest, Strategy, Variables};
pub use scheme::{MetaKeys, Scheme, CLAIM_META_KEYS, QUERY_META_KEYS};
pub use signer::{Credentials, Signature, Target};
pub use utils::crypto::{generate_digest, truncated_digest, verify_digest};
pub use utils::token::{self, ProjectClaims, RenderClaims};

use encoding::{encode_component, encode_segment, scalar_to_string};

/// Rendering URL generator
///
/// # Example
///
/// ```rust
/// use flyyer::{FixedClock, FlyyerUrl, RenderRequest, Scheme};
///
/// let flyyer = FlyyerUrl::new(Scheme::RenderSuffix).with_clock(FixedClock(1_600_000_000));
/// let request = RenderRequest::template("tenant", "deck", "template").with_extension("png");
///
/// assert_eq!(
///     flyyer.href(&request).unwrap(),
///     "https://cdn.flyyer.io/r/v2/tenant/deck/template.png?__v=1600000000"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FlyyerUrl {
    scheme: Scheme,
    host: String,
    clock: Arc<dyn Clock>,
}

/// Identity pieces checked for one scheme
enum Resolved<'a> {
    Template {
        tenant: &'a str,
        deck: &'a str,
        template: &'a str,
    },
    Project(&'a str),
}

impl FlyyerUrl {
    /// Create a generator for `scheme` using its default host and wall-clock time
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            host: scheme.default_host().to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Override the host, e.g. for a staging deployment
    ///
    /// A leading `https://` and trailing slashes are ignored.
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        let host = host.as_ref();
        self.host = host
            .strip_prefix("https://")
            .unwrap_or(host)
            .trim_end_matches('/')
            .to_string();
        self
    }

    /// Set the time source of the default cache-bust stamp
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the final URL for `request`
    ///
    /// Fails with a [`ValidationError`] before any hashing when an identity
    /// field is missing, the identity does not fit the scheme, or the
    /// credentials are incomplete or unknown.
    pub fn href(&self, request: &RenderRequest) -> Result<String> {
        let identity = self.resolve_identity(&request.identity)?;
        let credentials =
            Credentials::resolve(request.secret.as_deref(), request.strategy.as_deref())?;
        if credentials.is_some() && !self.scheme.supports_signing() {
            return Err(ValidationError::SigningUnsupported {
                scheme: self.scheme,
            }
            .into());
        }
        let version = version_text(request.version.as_ref())?;
        let extension = request.extension.as_deref().filter(|e| !e.is_empty());

        let normalized = Normalized::new(request, self.scheme, self.clock.as_ref());
        let host = &self.host;

        let url = match identity {
            Resolved::Template {
                tenant,
                deck,
                template,
            } if self.scheme == Scheme::Legacy => {
                let extension = extension
                    .or(self.scheme.default_extension())
                    .unwrap_or_default();
                format!(
                    "https://{host}/v2/{}/{}/{}{}.{}?{}",
                    encode_segment(tenant),
                    encode_segment(deck),
                    encode_segment(template),
                    dotted(version.as_deref().map(encode_segment).as_deref()),
                    encode_segment(extension),
                    to_query(&normalized.params(true)),
                )
            }
            Resolved::Template {
                tenant,
                deck,
                template,
            } => {
                let target = Target::Render {
                    deck,
                    template,
                    version: request.version.as_ref().filter(|_| version.is_some()),
                    extension,
                    meta: &request.meta,
                };
                let base = format!("https://{host}/r/v2/{}", encode_segment(tenant));

                match target.sign(&normalized, credentials)? {
                    Signature::Jwt(jwt) => {
                        let mut query = Map::new();
                        query.insert("__jwt".to_string(), Value::String(jwt));
                        query.insert(STAMP_KEY.to_string(), normalized.stamp.clone());
                        format!("{base}?{}", to_query(&query))
                    }
                    signature => {
                        let mut url = format!(
                            "{base}/{}/{}{}{}?{}",
                            encode_segment(deck),
                            encode_segment(template),
                            dotted(version.as_deref().map(encode_segment).as_deref()),
                            dotted(extension.map(encode_segment).as_deref()),
                            to_query(&normalized.params(true)),
                        );
                        if let Signature::Hmac(digest) = signature {
                            url.push_str("&__hmac=");
                            url.push_str(&digest);
                        }
                        url
                    }
                }
            }
            Resolved::Project(project) if self.scheme == Scheme::PathOnly => {
                format!(
                    "https://{host}/v2/{}/_/_{}?{}",
                    encode_segment(project),
                    request.path_safe(),
                    to_query(&normalized.params(true)),
                )
            }
            Resolved::Project(project) => {
                let path = request.path_safe();
                let target = Target::Project {
                    project,
                    path: &path,
                };
                let project = encode_segment(project);

                match target.sign(&normalized, credentials)? {
                    Signature::Jwt(jwt) => format!(
                        "https://{host}/v2/{project}/jwt-{jwt}?{STAMP_KEY}={}",
                        encode_component(&normalized.stamp_text()),
                    ),
                    signature => format!(
                        "https://{host}/v2/{project}/{}/{}{path}",
                        signature.as_str(),
                        to_sorted_query(&normalized.params(true)),
                    ),
                }
            }
        };

        debug!(
            scheme = %self.scheme,
            strategy = credentials.map(|c| c.strategy.as_str()).unwrap_or("none"),
            "built render url"
        );
        Ok(url)
    }

    /// Check a truncated HMAC digest taken from a URL built for `request`
    ///
    /// The stamp is not signed, so the check holds for any `__v`.
    pub fn verify(&self, request: &RenderRequest, digest: &str) -> Result<bool> {
        let identity = self.resolve_identity(&request.identity)?;
        let Some(credentials) =
            Credentials::resolve(request.secret.as_deref(), request.strategy.as_deref())?
        else {
            return Ok(false);
        };
        if credentials.strategy != Strategy::Hmac || !self.scheme.supports_signing() {
            return Ok(false);
        }
        version_text(request.version.as_ref())?;

        let normalized = Normalized::new(request, self.scheme, self.clock.as_ref());
        let path = request.path_safe();
        let target = match identity {
            Resolved::Template { deck, template, .. } => Target::Render {
                deck,
                template,
                version: request.version.as_ref().filter(|v| !is_absent(v)),
                extension: request.extension.as_deref().filter(|e| !e.is_empty()),
                meta: &request.meta,
            },
            Resolved::Project(project) => Target::Project {
                project,
                path: &path,
            },
        };
        Ok(target.verify(&normalized, credentials.secret, digest))
    }

    fn resolve_identity<'a>(
        &self,
        identity: &'a Identity,
    ) -> std::result::Result<Resolved<'a>, ValidationError> {
        match (self.scheme, identity) {
            (
                Scheme::Legacy | Scheme::RenderSuffix,
                Identity::Template {
                    tenant,
                    deck,
                    template,
                },
            ) => Ok(Resolved::Template {
                tenant: required("tenant", tenant)?,
                deck: required("deck", deck)?,
                template: required("template", template)?,
            }),
            (Scheme::ProjectSlug | Scheme::PathOnly, Identity::Project(project)) => {
                Ok(Resolved::Project(required("project", project)?))
            }
            (scheme, _) => Err(ValidationError::IdentityMismatch { scheme }),
        }
    }
}

fn required<'a>(name: &'static str, value: &'a str) -> std::result::Result<&'a str, ValidationError> {
    if value.is_empty() {
        Err(ValidationError::MissingField(name))
    } else {
        Ok(value)
    }
}

/// Version as it appears in paths and signed messages
fn version_text(version: Option<&Value>) -> std::result::Result<Option<String>, ValidationError> {
    match version {
        None => Ok(None),
        Some(v) if is_absent(v) => Ok(None),
        Some(v @ (Value::String(_) | Value::Number(_))) => Ok(scalar_to_string(v)),
        Some(_) => Err(ValidationError::InvalidVersion),
    }
}

fn dotted(part: Option<&str>) -> String {
    part.map(|p| format!(".{p}")).unwrap_or_default()
}

/// Build a URL for `request` with the scheme's default host (convenience function)
///
/// This is a shorthand for creating a FlyyerUrl and calling href.
///
/// # Example
///
/// ```rust
/// use flyyer::{RenderRequest, Scheme};
///
/// let url = flyyer::href(Scheme::PathOnly, &RenderRequest::project("project")).unwrap();
/// assert!(url.starts_with("https://flayyer.ai/v2/project/_/_/?__v="));
/// ```
pub fn href(scheme: Scheme, request: &RenderRequest) -> Result<String> {
    FlyyerUrl::new(scheme).href(request)
}
