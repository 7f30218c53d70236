//! Concentration curve and yield curve engine.
//! Floor calls below are not optional rounding: they reproduce the on-chain
//! fixed-point integer math bit-for-bit at `price_base` granularity.

use rust_decimal::{Decimal, MathematicalOps};

use crate::market::{ChainClock, MarketConfig, MarketType, PoolConfig};

pub const YEAR_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Time-interpolated pool concentration.
/// Flat when `maturity_concentration` is zero, pinned at maturity once the
/// market window has closed, linear in between. Callers must not invoke
/// before `start_time`.
pub fn concentration(config: &MarketConfig, pool: &PoolConfig, now: i64) -> Decimal {
    let initial = Decimal::from(pool.initial_concentration);
    let maturity = Decimal::from(pool.maturity_concentration);

    if maturity.is_zero() {
        return initial;
    }
    if now >= config.end_time {
        return maturity;
    }

    let time_diff = Decimal::from(now - config.start_time);
    let total_diff = Decimal::from(config.market_duration());
    initial + (maturity - initial) * time_diff / total_diff
}

/// Output of the yield curve engine: current implied APY, terminal price and
/// the spot price the curve was last refreshed at, all normalized by
/// `price_base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    pub market_apy: Decimal,
    pub market_end_price: Decimal,
    pub market_sol_price: Decimal,
}

pub fn rate_snapshot(config: &MarketConfig, spot_price: Decimal, clock: &ChainClock) -> RateSnapshot {
    match config.market_type {
        MarketType::FixedAccrual => fixed_accrual_snapshot(config, spot_price, clock),
        MarketType::LinearDecay => linear_decay_snapshot(config, clock.unix_timestamp),
    }
}

/// Compounding interest-rate curve. Starts from the cached on-chain values
/// and recomputes only when the market is still open, spot has risen above
/// the cached refresh price, and enough epochs/time has elapsed since the
/// last update. This mirrors the program's own refresh cadence so a snapshot
/// taken between updates reproduces the persisted values exactly.
fn fixed_accrual_snapshot(
    config: &MarketConfig,
    spot_price: Decimal,
    clock: &ChainClock,
) -> RateSnapshot {
    let price_base = Decimal::from(config.price_base);
    let mut market_apy = Decimal::from(config.market_apy) / price_base;
    let mut market_sol_price = Decimal::from(config.market_sol_price) / price_base;
    let mut market_end_price = Decimal::from(config.market_end_price) / price_base;

    let scaled_spot = (spot_price * price_base).floor();
    let market_open = clock.unix_timestamp < config.end_time;

    if market_open && market_sol_price < spot_price {
        let start_price = Decimal::from(config.start_price);
        let market_time = Decimal::from(config.market_duration());

        let mut epoch_count = Decimal::ZERO;
        let mut year_epoch = Decimal::ZERO;
        let mut market_epoch = Decimal::ZERO;

        if config.compounding_period == 0 {
            // Epoch-based compounding: one compounding step per chain epoch.
            let refresh_due = clock.unix_timestamp
                > clock.epoch_start_timestamp + config.update_skip_time
                && clock.epoch >= config.last_update_epoch;
            let time_diff = clock.epoch_start_timestamp - config.start_time;

            // time_diff == 0 can only happen in the epoch window the market
            // started in; the period denominators would be zero, so treat it
            // as the guard failing and keep the cached values.
            if refresh_due && time_diff > 0 {
                epoch_count = Decimal::from(clock.epoch.saturating_sub(config.start_epoch));
                let time_diff = Decimal::from(time_diff);
                year_epoch = Decimal::from(YEAR_SECONDS) / time_diff * epoch_count;
                market_epoch = epoch_count * market_time / time_diff;
            }
        } else {
            // Time-based compounding with a fixed period in seconds.
            if clock.unix_timestamp > config.last_update_time + config.update_skip_time {
                let time_diff = Decimal::from(clock.unix_timestamp - config.start_time);
                let period = Decimal::from(config.compounding_period);
                epoch_count = time_diff / period;
                year_epoch = Decimal::from(YEAR_SECONDS) / period;
                market_epoch = market_time / period;
            }
        }

        if epoch_count > Decimal::ZERO && start_price > Decimal::ZERO {
            let apr_plus_one = (scaled_spot / start_price).powd(Decimal::ONE / epoch_count);

            market_apy =
                ((apr_plus_one.powd(year_epoch) - Decimal::ONE) * price_base).floor() / price_base;
            market_sol_price = spot_price;
            market_end_price = (apr_plus_one.powd(market_epoch) * (start_price / price_base)
                * price_base)
                .floor()
                / price_base;
        }
    }

    RateSnapshot {
        market_apy,
        market_end_price,
        market_sol_price,
    }
}

/// Fixed terminal-price curve: the end price decays linearly from
/// `initial_end_price` toward `start_price` over the market window. Past the
/// window the raw `start_price` is used directly; no rescale is needed there
/// by construction of the boundary case.
fn linear_decay_snapshot(config: &MarketConfig, now: i64) -> RateSnapshot {
    let price_base = Decimal::from(config.price_base);
    let start_price = Decimal::from(config.start_price);
    let initial_end_price = Decimal::from(config.initial_end_price);
    let delta_price = initial_end_price - start_price;

    let time_diff = Decimal::from(now - config.start_time);
    let market_time = Decimal::from(config.market_duration());

    let market_end_price = if time_diff <= market_time {
        ((initial_end_price - delta_price * time_diff / market_time) / price_base * price_base)
            .floor()
            / price_base
    } else {
        start_price
    };

    RateSnapshot {
        market_apy: Decimal::ZERO,
        market_end_price,
        market_sol_price: Decimal::ONE,
    }
}
