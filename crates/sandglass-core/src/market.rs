//! Snapshot data model consumed by the valuation pipeline.
//! These are plain values decoded from chain state by a collaborator; the
//! core never fetches or caches anything itself.

use rust_decimal::Decimal;

use crate::error::ValuationError;

/// Closed set of market curve variants.
/// On chain this is a raw integer tag; decoding goes through [`MarketType::from_tag`]
/// so an unknown tag is a hard error instead of a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketType {
    /// Compounding interest-rate market: the terminal price accrues from the
    /// live spot price of the yield-bearing underlying.
    FixedAccrual,
    /// Fixed terminal-price market: the end price decays linearly toward the
    /// start price, independent of spot.
    LinearDecay,
}

impl MarketType {
    pub fn from_tag(tag: u64) -> Result<Self, ValuationError> {
        match tag {
            0 => Ok(Self::FixedAccrual),
            1 => Ok(Self::LinearDecay),
            other => Err(ValuationError::UnknownMarketType(other)),
        }
    }
}

/// Market configuration as persisted on chain.
/// Price fields are raw fixed-point integers scaled by `price_base`; the
/// cached `market_*` fields are the last values the program persisted and
/// serve as fallbacks when the refresh guard is not met.
#[derive(Debug, Clone, Copy)]
pub struct MarketConfig {
    pub market_type: MarketType,
    pub start_time: i64,
    pub end_time: i64,
    pub start_price: u64,
    pub initial_end_price: u64,
    pub price_base: u64,
    /// 0 selects epoch-based compounding, any positive value is a
    /// time-based compounding period in seconds.
    pub compounding_period: i64,
    pub update_skip_time: i64,
    pub last_update_time: i64,
    pub last_update_epoch: u64,
    pub start_epoch: u64,
    pub market_apy: u64,
    pub market_sol_price: u64,
    pub market_end_price: u64,
}

impl MarketConfig {
    /// Reject configurations whose divisions are undefined.
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.price_base == 0 {
            return Err(ValuationError::ZeroPriceBase);
        }
        if self.end_time <= self.start_time {
            return Err(ValuationError::EmptyMarketWindow {
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        Ok(())
    }

    pub fn market_duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// Bonding-curve pool parameters. Both concentrations are scale-free;
/// `maturity_concentration == 0` means the curve is flat.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub initial_concentration: u64,
    pub maturity_concentration: u64,
}

/// Chain time at the snapshot instant, taken from the Clock sysvar.
#[derive(Debug, Clone, Copy)]
pub struct ChainClock {
    pub unix_timestamp: i64,
    pub epoch: u64,
    pub epoch_start_timestamp: i64,
}

/// Pool token balances in raw base units. Everything derived from these is
/// a ratio, so mint-decimal scaling is left to the position ledger.
#[derive(Debug, Clone, Copy)]
pub struct PoolReserves {
    pub pt_pool_amount: Decimal,
    pub yt_pool_amount: Decimal,
    pub lp_supply_amount: Decimal,
}
