use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

use crate::{Meta, RenderRequest, Scheme};

#[derive(Debug, Clone, Parser)]
#[command(name = "flyyer", about = "Build Flyyer image-rendering URLs")]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,

    /// Signing secret from the project's advanced settings
    #[arg(short, long, env = "FLYYER_SECRET", global = true, hide_env_values = true)]
    pub secret: Option<String>,

    /// Signing strategy (HMAC or JWT)
    #[arg(long, env = "FLYYER_STRATEGY", global = true)]
    pub strategy: Option<String>,

    /// Override the scheme's default host
    #[arg(long, env = "FLYYER_HOST", global = true)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FLYYER_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build a rendering URL
    Href(HrefArgs),

    /// Verify a signed token and print its claims
    Decode {
        /// The token, without the `jwt-` prefix
        token: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct HrefArgs {
    /// URL scheme (legacy, project-slug, render-suffix, path-only)
    #[arg(long, default_value = "project-slug")]
    pub scheme: Scheme,

    /// Project slug
    #[arg(long, conflicts_with_all = ["tenant", "deck", "template"])]
    pub project: Option<String>,

    #[arg(long)]
    pub tenant: Option<String>,

    #[arg(long)]
    pub deck: Option<String>,

    #[arg(long)]
    pub template: Option<String>,

    /// Template version, latest when omitted
    #[arg(long)]
    pub version: Option<String>,

    /// Output format (jpeg, png, webp)
    #[arg(long)]
    pub extension: Option<String>,

    /// Requested page path
    #[arg(long)]
    pub path: Option<String>,

    /// Template variables as a JSON object
    #[arg(long, value_parser = parse_variables)]
    pub variables: Option<Map<String, Value>>,

    /// Meta hints as a JSON object (id, width, height, resolution, agent, v)
    #[arg(long, value_parser = parse_meta)]
    pub meta: Option<Meta>,
}

impl HrefArgs {
    pub fn to_request(&self, config: &Config) -> RenderRequest {
        let mut request = match &self.project {
            Some(project) => RenderRequest::project(project),
            None => RenderRequest::template(
                self.tenant.clone().unwrap_or_default(),
                self.deck.clone().unwrap_or_default(),
                self.template.clone().unwrap_or_default(),
            ),
        };

        request.version = self.version.clone().map(Value::String);
        request.extension = self.extension.clone();
        request.path = self.path.clone();
        request.variables = self.variables.clone().unwrap_or_default();
        request.meta = self.meta.clone().unwrap_or_default();
        request.secret = config.secret.clone();
        request.strategy = config.strategy.clone();
        request
    }
}

fn parse_variables(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(raw).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, got {other}")),
    }
}

fn parse_meta(raw: &str) -> Result<Meta, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}
