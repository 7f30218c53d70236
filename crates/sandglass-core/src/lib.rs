//! Pure valuation core for sandglass yield-tokenization markets.
//! Every function here is deterministic and side-effect free: callers supply
//! point-in-time snapshots (market config, pool reserves, chain clock, oracle
//! quotes) and get plain values back. All I/O lives in the collaborator
//! crates.

pub mod curve;
pub mod error;
pub mod market;
pub mod oracle;
pub mod position;
pub mod price;
pub mod valuation;

pub use curve::{concentration, rate_snapshot, RateSnapshot, YEAR_SECONDS};
pub use error::ValuationError;
pub use market::{ChainClock, MarketConfig, MarketType, PoolConfig, PoolReserves};
pub use oracle::{market_quotes, MarketQuotes, SpotPriceProvider};
pub use position::{
    Contribution, PositionLedger, SingleWalletLedger, StakedAmounts, TokenClass, WalletPosition,
};
pub use price::{lp_rates, pool_prices, token_prices, LpRates, PoolPrices, TokenPrices};
pub use valuation::{value_market, MarketSnapshot, MarketValuation, UserTokensRow};
