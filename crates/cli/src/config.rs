//! Credential loading
//!
//! Credentials come from a JSON file (`api_config.json` by default) or,
//! when the file is absent, from `BINANCE_API_KEY` / `BINANCE_SECRET_KEY`
//! (a `.env` file is honored). Template placeholders are rejected so a
//! freshly copied config fails loudly instead of producing signature
//! errors later.

use perpdesk_exchanges::binance::Credentials;
use perpdesk_exchanges::{ExchangeError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "api_config.json";

const PLACEHOLDER_KEYS: [&str; 2] = ["YOUR_API_KEY_HERE", "你的API密钥"];
const PLACEHOLDER_SECRETS: [&str; 2] = ["YOUR_SECRET_KEY_HERE", "你的API密钥密文"];

#[derive(Debug, Deserialize)]
struct ApiConfigFile {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    api_secret: Option<String>,
}

/// Load credentials from `path`, falling back to the environment when the
/// file does not exist.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExchangeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        info!("🔑 Credentials loaded from {}", path.display());
        return parse_config(&contents)
            .map_err(|e| ExchangeError::Config(format!("{}: {}", path.display(), strip_prefix(&e))));
    }

    debug!("{} not found, trying environment", path.display());
    dotenv::dotenv().ok();

    let api_key = std::env::var("BINANCE_API_KEY").ok();
    let api_secret = std::env::var("BINANCE_SECRET_KEY").ok();
    match (api_key, api_secret) {
        (Some(api_key), Some(api_secret)) => validate(&api_key, &api_secret),
        _ => Err(ExchangeError::Config(format!(
            "{} does not exist and BINANCE_API_KEY / BINANCE_SECRET_KEY are not set; \
             create the file with \"api_key\" and \"api_secret\"",
            path.display()
        ))),
    }
}

/// Parse and validate the JSON credentials file contents.
pub fn parse_config(contents: &str) -> Result<Credentials> {
    let file: ApiConfigFile = serde_json::from_str(contents)
        .map_err(|e| ExchangeError::Config(format!("not valid JSON: {e}")))?;

    validate(
        file.api_key.as_deref().unwrap_or_default(),
        file.api_secret.as_deref().unwrap_or_default(),
    )
}

fn validate(api_key: &str, api_secret: &str) -> Result<Credentials> {
    let api_key = api_key.trim();
    let api_secret = api_secret.trim();

    if api_key.is_empty() || api_secret.is_empty() {
        return Err(ExchangeError::Config("api_key or api_secret is missing".to_string()));
    }
    if PLACEHOLDER_KEYS.contains(&api_key) {
        return Err(ExchangeError::Config(
            "api_key is still the template placeholder, replace it with your API key".to_string(),
        ));
    }
    if PLACEHOLDER_SECRETS.contains(&api_secret) {
        return Err(ExchangeError::Config(
            "api_secret is still the template placeholder, replace it with your API secret"
                .to_string(),
        ));
    }

    Ok(Credentials::new(api_key, api_secret))
}

fn strip_prefix(err: &ExchangeError) -> String {
    match err {
        ExchangeError::Config(message) => message.clone(),
        other => other.to_string(),
    }
}
