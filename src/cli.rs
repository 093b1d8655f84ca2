use clap::Parser;
use flyyer::{
    config::{Command, Config},
    token, FlyyerUrl,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &config.command {
        Command::Href(args) => {
            let mut flyyer = FlyyerUrl::new(args.scheme);
            if let Some(host) = &config.host {
                flyyer = flyyer.with_host(host);
            }

            let request = args.to_request(&config);
            let url = flyyer.href(&request)?;
            info!(host = flyyer.host(), "generated url");
            println!("{url}");
        }
        Command::Decode { token: jwt } => {
            let secret = config
                .secret
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("FLYYER_SECRET is required to verify tokens"))?;

            let claims: Value = token::decode(jwt, secret)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }

    Ok(())
}
