//! Launchpad CLI
//!
//! Command-line access to the Launchpad web service using pre-issued
//! OAuth credentials from the environment. Anonymous when none are set.
//!
//! # Usage
//! ```bash
//! # Look up a person
//! lp-client named-get /people getByEmail --param email=foo@example.com
//!
//! # Page through snaps
//! lp-client get /+snaps --start 0 --size 10
//!
//! # Request builds for a snap
//! lp-client named-post '~foo/+snap/bar' requestAutoBuilds
//!
//! # Change an attribute
//! lp-client set '~foo/+snap/bar' --attr auto_build=true
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use launchpad_client::config::{
    DEFAULT_API_URL, ENV_API_URL, ENV_CONSUMER_KEY, ENV_TOKEN, ENV_TOKEN_SECRET,
};
use launchpad_client::{LaunchpadClient, LaunchpadConfig, RequestConfig, Resource};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "lp-client")]
#[command(about = "Launchpad web service client", long_about = None)]
#[command(version)]
struct Cli {
    /// Launchpad API root
    #[arg(long, env = ENV_API_URL, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// OAuth consumer key
    #[arg(long, env = ENV_CONSUMER_KEY)]
    consumer_key: Option<String>,

    /// OAuth access token
    #[arg(long, env = ENV_TOKEN)]
    token: Option<String>,

    /// OAuth access token secret
    #[arg(long, env = ENV_TOKEN_SECRET, hide_env_values = true)]
    token_secret: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a resource
    Get {
        /// Relative path or absolute URI
        uri: String,

        /// First collection item to return
        #[arg(long)]
        start: Option<u64>,

        /// Number of collection items to return
        #[arg(long)]
        size: Option<u64>,

        /// Query parameter (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Invoke a named read operation
    NamedGet {
        uri: String,

        /// Operation name (ws.op)
        operation: String,

        /// Operation parameter (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Invoke a named write operation
    NamedPost {
        uri: String,

        /// Operation name (ws.op)
        operation: String,

        /// Operation parameter (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Change attributes of an entry and save them
    Set {
        uri: String,

        /// Attribute to change (repeatable)
        #[arg(long = "attr", value_parser = parse_key_value, required = true)]
        attrs: Vec<(String, String)>,
    },

    /// Print the fully-qualified form of a URI
    Normalize { uri: String },
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    let config = LaunchpadConfig::new(&cli.api_url)
        .context("Invalid Launchpad API URL")?
        .with_optional_credentials(cli.consumer_key, cli.token, cli.token_secret);

    if config.credentials.is_none() {
        debug!("No OAuth credentials configured, sending anonymous requests");
    }

    let client = LaunchpadClient::new(config).context("Failed to create Launchpad client")?;

    match cli.command {
        Commands::Get {
            uri,
            start,
            size,
            params,
        } => {
            let mut config = request_config(params);
            if let Some(start) = start {
                config = config.start(start);
            }
            if let Some(size) = size {
                config = config.size(size);
            }

            let resource = client
                .get(&uri, config)
                .await
                .with_context(|| format!("GET {} failed", uri))?;
            print_resource(&resource)?;
        }

        Commands::NamedGet {
            uri,
            operation,
            params,
        } => {
            let resource = client
                .named_get(&uri, &operation, request_config(params))
                .await
                .with_context(|| format!("{} on {} failed", operation, uri))?;
            print_resource(&resource)?;
        }

        Commands::NamedPost {
            uri,
            operation,
            params,
        } => {
            info!("📤 Invoking {} on {}", operation, uri);

            let resource = client
                .named_post(&uri, &operation, request_config(params))
                .await
                .with_context(|| format!("{} on {} failed", operation, uri))?;
            print_resource(&resource)?;
        }

        Commands::Set { uri, attrs } => {
            let mut entry = client
                .get(&uri, RequestConfig::default())
                .await
                .with_context(|| format!("GET {} failed", uri))?
                .into_entry()
                .with_context(|| format!("{} is not an entry", uri))?;

            for (name, value) in attrs {
                entry.set(&name, parse_value(&value));
            }

            info!("✏️  Saving {:?} on {}", entry.dirty_attributes(), entry.uri());

            let saved = entry
                .lp_save(RequestConfig::new())
                .await
                .with_context(|| format!("Saving {} failed", uri))?;
            print_resource(&saved)?;
        }

        Commands::Normalize { uri } => {
            println!("{}", client.normalize_uri(&uri));
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn request_config(params: Vec<(String, String)>) -> RequestConfig {
    params
        .into_iter()
        .fold(RequestConfig::new(), |config, (name, value)| {
            config.parameter(name, parse_value(&value))
        })
}

/// JSON literals (`true`, `3`, `["a"]`) are sent typed, anything else as text
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn print_resource(resource: &Resource) -> Result<()> {
    let output = match resource {
        Resource::Text(text) => text.clone(),
        other => serde_json::to_string_pretty(other).context("Failed to render response")?,
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("email=foo@example.com").unwrap(),
            ("email".to_string(), "foo@example.com".to_string())
        );
        assert_eq!(
            parse_key_value("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("3"), serde_json::json!(3));
        assert_eq!(parse_value("stable"), Value::String("stable".to_string()));
    }

    #[test]
    fn test_cli_parses_named_get() {
        let cli = Cli::try_parse_from([
            "lp-client",
            "--api-url",
            "https://api.staging.launchpad.net",
            "named-get",
            "/people",
            "getByEmail",
            "--param",
            "email=foo@example.com",
        ])
        .unwrap();

        assert_eq!(cli.api_url, "https://api.staging.launchpad.net");
        match cli.command {
            Commands::NamedGet {
                uri,
                operation,
                params,
            } => {
                assert_eq!(uri, "/people");
                assert_eq!(operation, "getByEmail");
                assert_eq!(params.len(), 1);
            }
            _ => panic!("expected named-get"),
        }
    }
}
