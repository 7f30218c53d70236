//! Spot-price collaborator: resolves oracle quotes from the Pyth Hermes
//! HTTP API ahead of valuation, so the core can consume them synchronously.

use std::collections::HashMap;

use rust_decimal::{Decimal, MathematicalOps};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use sandglass_config::OracleFeeds;
use sandglass_core::SpotPriceProvider;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("hermes request failed")]
    Http(#[from] reqwest::Error),

    #[error("hermes returned no price for feed {0}")]
    MissingFeed(String),

    #[error("feed {feed} returned an unusable price: {message}")]
    BadPrice { feed: String, message: String },
}

#[derive(Debug, Deserialize)]
struct LatestPriceResponse {
    parsed: Vec<ParsedPrice>,
}

#[derive(Debug, Deserialize)]
struct ParsedPrice {
    price: PriceData,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    price: String,
    expo: i32,
}

/// Minimal Hermes REST client.
pub struct HermesClient {
    http: reqwest::Client,
    base_url: String,
}

impl HermesClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Latest price for one feed id, scaled by the feed exponent.
    pub async fn latest_price(&self, feed_id: &str) -> Result<Decimal, QuoteError> {
        let url = format!(
            "{}/v2/updates/price/latest",
            self.base_url.trim_end_matches('/')
        );

        let response: LatestPriceResponse = self
            .http
            .get(&url)
            .query(&[("ids[]", feed_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let parsed = response
            .parsed
            .into_iter()
            .next()
            .ok_or_else(|| QuoteError::MissingFeed(feed_id.to_owned()))?;

        let mantissa: i64 = parsed.price.price.parse().map_err(|e| QuoteError::BadPrice {
            feed: feed_id.to_owned(),
            message: format!("{e}"),
        })?;

        scale_price(mantissa, parsed.price.expo).ok_or_else(|| QuoteError::BadPrice {
            feed: feed_id.to_owned(),
            message: format!("exponent {} out of range", parsed.price.expo),
        })
    }
}

/// Apply a Pyth feed exponent to its integer mantissa.
fn scale_price(mantissa: i64, expo: i32) -> Option<Decimal> {
    if expo <= 0 {
        let scale = u32::try_from(-i64::from(expo)).ok()?;
        Decimal::try_from_i128_with_scale(i128::from(mantissa), scale).ok()
    } else {
        let factor = Decimal::TEN.checked_powu(u64::try_from(expo).ok()?)?;
        Decimal::from(mantissa).checked_mul(factor)
    }
}

#[derive(Debug, Clone, Copy)]
struct QuotePair {
    underlying: Decimal,
    base: Decimal,
}

/// Quotes resolved ahead of a snapshot run. Markets whose SY mint has no
/// entry resolve to the zero sentinel, which values them at a degenerate
/// zero price downstream instead of failing the run.
#[derive(Debug, Default)]
pub struct QuoteBook {
    quotes: HashMap<String, QuotePair>,
}

impl QuoteBook {
    /// Fetch both feeds for every configured SY mint. A failed fetch leaves
    /// the mint unmapped (zero sentinel) and logs a warning; it never aborts
    /// the snapshot.
    pub async fn resolve(
        client: &HermesClient,
        feeds: &HashMap<String, OracleFeeds>,
    ) -> Self {
        let mut quotes = HashMap::new();

        for (sy_mint, pair) in feeds {
            let underlying = client.latest_price(&pair.underlying_feed).await;
            let base = client.latest_price(&pair.base_feed).await;

            match (underlying, base) {
                (Ok(underlying), Ok(base)) => {
                    quotes.insert(sy_mint.clone(), QuotePair { underlying, base });
                }
                (Err(err), _) | (_, Err(err)) => {
                    warn!(%sy_mint, %err, "quote resolution failed, market will value at zero");
                }
            }
        }

        Self { quotes }
    }
}

impl SpotPriceProvider for QuoteBook {
    fn underlying_quote(&self, sy_mint: &str) -> Decimal {
        self.quotes
            .get(sy_mint)
            .map(|q| q.underlying)
            .unwrap_or(Decimal::ZERO)
    }

    fn base_quote(&self, sy_mint: &str) -> Decimal {
        self.quotes
            .get(sy_mint)
            .map(|q| q.base)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Fixed quotes for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticQuotes {
    quotes: HashMap<String, (Decimal, Decimal)>,
}

impl StaticQuotes {
    pub fn insert(
        &mut self,
        sy_mint: impl Into<String>,
        underlying: Decimal,
        base: Decimal,
    ) -> &mut Self {
        self.quotes.insert(sy_mint.into(), (underlying, base));
        self
    }
}

impl SpotPriceProvider for StaticQuotes {
    fn underlying_quote(&self, sy_mint: &str) -> Decimal {
        self.quotes
            .get(sy_mint)
            .map(|(u, _)| *u)
            .unwrap_or(Decimal::ZERO)
    }

    fn base_quote(&self, sy_mint: &str) -> Decimal {
        self.quotes
            .get(sy_mint)
            .map(|(_, b)| *b)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn negative_exponent_scales_down() {
        assert_eq!(scale_price(123_456_789, -8).unwrap(), dec("1.23456789"));
        assert_eq!(scale_price(250_000_000_000, -8).unwrap(), dec("2500"));
    }

    #[test]
    fn zero_and_positive_exponents() {
        assert_eq!(scale_price(42, 0).unwrap(), Decimal::from(42));
        assert_eq!(scale_price(42, 2).unwrap(), Decimal::from(4_200));
    }

    #[test]
    fn absurd_exponent_is_rejected() {
        assert!(scale_price(1, -40).is_none());
    }

    #[test]
    fn static_quotes_fall_back_to_zero_sentinel() {
        let mut quotes = StaticQuotes::default();
        quotes.insert("mapped", dec("1.02"), dec("2500"));

        assert_eq!(quotes.underlying_quote("mapped"), dec("1.02"));
        assert_eq!(quotes.base_quote("mapped"), dec("2500"));
        assert_eq!(quotes.underlying_quote("unmapped"), Decimal::ZERO);
        assert_eq!(quotes.base_quote("unmapped"), Decimal::ZERO);
    }
}
