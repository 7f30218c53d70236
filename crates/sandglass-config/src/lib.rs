//! Environment configuration for the sandglass binaries.
//! Values come from the process environment, with `.env` loaded first when
//! present. Everything has a default except the optional wallet address and
//! the oracle feed mapping.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_RPC_URL: &str = "https://mainnetbeta-rpc.eclipse.xyz";
const DEFAULT_HERMES_URL: &str = "https://hermes.pyth.network";
const DEFAULT_SNAPSHOT_PATH: &str = "output_snapshot.json";

// Example feed id (ETH/USD on Pyth):
// ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(&'static str),

    #[error("invalid oracle feed mapping entry: {0:?} (expected sy_mint=underlying_feed:base_feed)")]
    InvalidFeedMapping(String),
}

/// Hermes feed ids for one market's SY mint: the underlying yield-bearing
/// token quoted in the base asset, and the base asset quoted in the
/// reporting currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OracleFeeds {
    pub underlying_feed: String,
    pub base_feed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    pub hermes_url: String,
    pub snapshot_path: PathBuf,
    /// When set, a per-wallet token report is written alongside the snapshot.
    pub wallet_address: Option<String>,
    /// SY mint address -> Hermes feed pair. Markets without an entry are
    /// valued with the zero price sentinel.
    pub oracle_feeds: HashMap<String, OracleFeeds>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            rpc_url: var("SANDGLASS_RPC_URL")?.unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
            hermes_url: var("SANDGLASS_HERMES_URL")?
                .unwrap_or_else(|| DEFAULT_HERMES_URL.to_owned()),
            snapshot_path: var("SANDGLASS_SNAPSHOT_PATH")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            wallet_address: var("SANDGLASS_WALLET")?,
            oracle_feeds: var("SANDGLASS_ORACLE_FEEDS")?
                .map(|raw| parse_feed_mapping(&raw))
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// Output path for the per-wallet token report.
    pub fn user_tokens_path(&self, wallet: &str) -> PathBuf {
        PathBuf::from(format!("output_user_tokens_{wallet}.json"))
    }
}

fn var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name)),
    }
}

/// Parse `sy_mint=underlying_feed:base_feed` entries separated by `;`.
fn parse_feed_mapping(raw: &str) -> Result<HashMap<String, OracleFeeds>, ConfigError> {
    let mut mapping = HashMap::new();

    for entry in raw.split(';').filter(|e| !e.trim().is_empty()) {
        let (mint, feeds) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidFeedMapping(entry.to_owned()))?;
        let (underlying, base) = feeds
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidFeedMapping(entry.to_owned()))?;

        if mint.trim().is_empty() || underlying.trim().is_empty() || base.trim().is_empty() {
            return Err(ConfigError::InvalidFeedMapping(entry.to_owned()));
        }

        mapping.insert(
            mint.trim().to_owned(),
            OracleFeeds {
                underlying_feed: underlying.trim().to_owned(),
                base_feed: base.trim().to_owned(),
            },
        );
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_mapping_parses_multiple_entries() {
        let mapping = parse_feed_mapping("mintA=feed1:feed2; mintB=feed3:feed4").unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping["mintA"],
            OracleFeeds {
                underlying_feed: "feed1".to_owned(),
                base_feed: "feed2".to_owned(),
            }
        );
        assert_eq!(mapping["mintB"].base_feed, "feed4");
    }

    #[test]
    fn feed_mapping_rejects_malformed_entries() {
        assert!(parse_feed_mapping("mintA=feedonly").is_err());
        assert!(parse_feed_mapping("no-equals-sign").is_err());
        assert!(parse_feed_mapping("=feed1:feed2").is_err());
    }

    #[test]
    fn feed_mapping_ignores_empty_segments() {
        let mapping = parse_feed_mapping("mintA=feed1:feed2;;").unwrap();
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn user_tokens_path_embeds_the_wallet_address() {
        let config = Config {
            rpc_url: String::new(),
            hermes_url: String::new(),
            snapshot_path: PathBuf::new(),
            wallet_address: None,
            oracle_feeds: HashMap::new(),
        };

        assert_eq!(
            config.user_tokens_path("abc123"),
            PathBuf::from("output_user_tokens_abc123.json")
        );
    }
}
