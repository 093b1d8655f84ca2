use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Template variables, kept in insertion order
pub type Variables = serde_json::Map<String, Value>;

/// Who the rendered image belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Hierarchical `tenant/deck/template` key
    Template {
        tenant: String,
        deck: String,
        template: String,
    },
    /// Single project slug
    Project(String),
}

/// Signature strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Hmac,
    Jwt,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Hmac => "HMAC",
            Strategy::Jwt => "JWT",
        }
    }
}

impl AsRef<str> for Strategy {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("hmac") {
            Ok(Strategy::Hmac)
        } else if s.eq_ignore_ascii_case("jwt") {
            Ok(Strategy::Jwt)
        } else {
            Err(ValidationError::InvalidStrategy(s.to_string()))
        }
    }
}

/// Out-of-band hints about the rendered asset.
///
/// Values keep their JSON type so signed tokens carry `200` and `"200"` apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    /// Product or post identifier
    pub id: Option<Value>,
    pub width: Option<Value>,
    pub height: Option<Value>,
    /// Pixel density
    pub resolution: Option<Value>,
    /// User agent hint
    pub agent: Option<Value>,
    /// Explicit cache-bust stamp
    pub v: Option<Value>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn width(mut self, width: impl Into<Value>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn height(mut self, height: impl Into<Value>) -> Self {
        self.height = Some(height.into());
        self
    }

    pub fn resolution(mut self, resolution: impl Into<Value>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn agent(mut self, agent: impl Into<Value>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn v(mut self, v: impl Into<Value>) -> Self {
        self.v = Some(v.into());
        self
    }
}

/// Everything needed to build one rendering URL
///
/// # Example
///
/// ```rust
/// use flyyer::{Meta, RenderRequest, Strategy};
///
/// let request = RenderRequest::project("project")
///     .with_path("/collections/col")
///     .with_variable("title", "Hello world!")
///     .with_meta(Meta::new().id("col").width(1200))
///     .with_credentials("secret", Strategy::Hmac);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub identity: Identity,
    /// Template version, latest when absent
    pub version: Option<Value>,
    /// Output format such as `jpeg`, `png` or `webp`
    pub extension: Option<String>,
    /// Requested page path, project identities only
    pub path: Option<String>,
    pub variables: Variables,
    pub meta: Meta,
    pub secret: Option<String>,
    /// Raw strategy name, parsed case-insensitively when the URL is built
    pub strategy: Option<String>,
}

impl RenderRequest {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            version: None,
            extension: None,
            path: None,
            variables: Variables::new(),
            meta: Meta::default(),
            secret: None,
            strategy: None,
        }
    }

    pub fn template(
        tenant: impl Into<String>,
        deck: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self::new(Identity::Template {
            tenant: tenant.into(),
            deck: deck.into(),
            template: template.into(),
        })
    }

    pub fn project(project: impl Into<String>) -> Self {
        Self::new(Identity::Project(project.into()))
    }

    pub fn with_version(mut self, version: impl Into<Value>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set a single variable, overwriting in place if the key exists.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Replace all variables with any value that serializes to a JSON object.
    pub fn with_variables<T: Serialize>(mut self, variables: &T) -> Result<Self, ValidationError> {
        let value = serde_json::to_value(variables)
            .map_err(|e| ValidationError::InvalidVariables(e.to_string()))?;
        match value {
            Value::Object(map) => {
                self.variables = map;
                Ok(self)
            }
            Value::Null => {
                self.variables = Variables::new();
                Ok(self)
            }
            other => Err(ValidationError::InvalidVariables(format!(
                "expected a mapping, got {other}"
            ))),
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_strategy(mut self, strategy: impl AsRef<str>) -> Self {
        self.strategy = Some(strategy.as_ref().to_string());
        self
    }

    pub fn with_credentials(self, secret: impl Into<String>, strategy: Strategy) -> Self {
        self.with_secret(secret).with_strategy(strategy)
    }

    /// Path with a guaranteed leading slash, `/` when unset.
    pub fn path_safe(&self) -> String {
        match self.path.as_deref() {
            None | Some("") => "/".to_string(),
            Some(path) if path.starts_with('/') => path.to_string(),
            Some(path) => format!("/{path}"),
        }
    }
}
