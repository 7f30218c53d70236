//! Per-market valuation entry point and output row types.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::curve::{concentration, rate_snapshot, RateSnapshot};
use crate::error::ValuationError;
use crate::market::{ChainClock, MarketConfig, PoolConfig, PoolReserves};
use crate::position::WalletPosition;
use crate::price::{lp_rates, pool_prices, token_prices, LpRates, PoolPrices, TokenPrices};

/// Everything the pricing chain produces for one market snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MarketValuation {
    pub concentration: Decimal,
    pub rates: RateSnapshot,
    pub token_prices: TokenPrices,
    pub pool_prices: PoolPrices,
    pub lp_rates: LpRates,
}

impl MarketValuation {
    /// Pool trade prices in the reporting currency: pool price split times
    /// the base-asset and underlying quotes.
    pub fn quoted_pool_prices(&self, base_quote: Decimal, underlying_quote: Decimal) -> TokenPrices {
        TokenPrices {
            pt_price: self.pool_prices.pool_pt_price * base_quote * underlying_quote,
            yt_price: self.pool_prices.pool_yt_price * base_quote * underlying_quote,
        }
    }
}

/// Run the full pricing chain for one market snapshot. The order is a strict
/// data dependency: yield curve before PT/YT pricing before pool pricing.
pub fn value_market(
    config: &MarketConfig,
    pool: &PoolConfig,
    reserves: &PoolReserves,
    clock: &ChainClock,
    spot_price: Decimal,
) -> Result<MarketValuation, ValuationError> {
    config.validate()?;

    let concentration = concentration(config, pool, clock.unix_timestamp);
    let rates = rate_snapshot(config, spot_price, clock);
    let token_prices = token_prices(config, rates.market_end_price);
    let pool_prices = pool_prices(concentration, reserves, &token_prices);
    let lp_rates = lp_rates(reserves)?;

    Ok(MarketValuation {
        concentration,
        rates,
        token_prices,
        pool_prices,
        lp_rates,
    })
}

/// One market's snapshot output row: prices plus every wallet position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub market_id: String,
    pub pt_price: Decimal,
    pub yt_price: Decimal,
    pub accounts: Vec<WalletPosition>,
}

/// One market's output row for a single wallet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTokensRow {
    pub market_id: String,
    pub pt_price: Decimal,
    pub yt_price: Decimal,
    #[serde(flatten)]
    pub position: WalletPosition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketType;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn linear_config() -> MarketConfig {
        MarketConfig {
            market_type: MarketType::LinearDecay,
            start_time: 0,
            end_time: 1_000_000,
            start_price: 900_000,
            initial_end_price: 1_000_000,
            price_base: 1_000_000,
            compounding_period: 0,
            update_skip_time: 0,
            last_update_time: 0,
            last_update_epoch: 0,
            start_epoch: 0,
            market_apy: 0,
            market_sol_price: 0,
            market_end_price: 0,
        }
    }

    fn clock_at(now: i64) -> ChainClock {
        ChainClock {
            unix_timestamp: now,
            epoch: 0,
            epoch_start_timestamp: now,
        }
    }

    #[test]
    fn value_market_rejects_zero_price_base() {
        let mut config = linear_config();
        config.price_base = 0;

        let reserves = PoolReserves {
            pt_pool_amount: Decimal::ZERO,
            yt_pool_amount: Decimal::ZERO,
            lp_supply_amount: Decimal::ZERO,
        };
        let pool = PoolConfig {
            initial_concentration: 10,
            maturity_concentration: 0,
        };

        let result = value_market(&config, &pool, &reserves, &clock_at(0), Decimal::ONE);
        assert_eq!(result.unwrap_err(), ValuationError::ZeroPriceBase);
    }

    #[test]
    fn value_market_rejects_empty_window() {
        let mut config = linear_config();
        config.end_time = config.start_time;

        let reserves = PoolReserves {
            pt_pool_amount: Decimal::ZERO,
            yt_pool_amount: Decimal::ZERO,
            lp_supply_amount: Decimal::ZERO,
        };
        let pool = PoolConfig {
            initial_concentration: 10,
            maturity_concentration: 0,
        };

        assert!(matches!(
            value_market(&config, &pool, &reserves, &clock_at(0), Decimal::ONE),
            Err(ValuationError::EmptyMarketWindow { .. })
        ));
    }

    #[test]
    fn value_market_runs_the_full_chain() {
        // LinearDecay at start: end price 1.0, start price 0.9 => pt 0.9.
        // Pool 100/100 with concentration 10 reproduces the 9:1 split.
        let config = linear_config();
        let pool = PoolConfig {
            initial_concentration: 10,
            maturity_concentration: 0,
        };
        let reserves = PoolReserves {
            pt_pool_amount: Decimal::from(100),
            yt_pool_amount: Decimal::from(100),
            lp_supply_amount: Decimal::from(200),
        };

        let valuation =
            value_market(&config, &pool, &reserves, &clock_at(0), Decimal::ONE).unwrap();

        assert_eq!(valuation.rates.market_end_price, Decimal::ONE);
        assert_eq!(valuation.token_prices.pt_price, dec("0.9"));
        assert_eq!(valuation.token_prices.yt_price, dec("0.1"));
        assert_eq!(valuation.pool_prices.pool_pt_price.round_dp(12), dec("0.9"));
        assert_eq!(valuation.lp_rates.lp_pt_rate, dec("0.5"));
        assert_eq!(valuation.lp_rates.lp_yt_rate, dec("0.5"));
    }

    #[test]
    fn quoted_pool_prices_scale_by_both_quotes() {
        let config = linear_config();
        let pool = PoolConfig {
            initial_concentration: 10,
            maturity_concentration: 0,
        };
        let reserves = PoolReserves {
            pt_pool_amount: Decimal::from(100),
            yt_pool_amount: Decimal::from(100),
            lp_supply_amount: Decimal::from(200),
        };

        let valuation =
            value_market(&config, &pool, &reserves, &clock_at(0), Decimal::ONE).unwrap();
        let quoted = valuation.quoted_pool_prices(dec("2000"), dec("1.05"));

        assert_eq!(quoted.pt_price.round_dp(10), dec("1890"));
        assert_eq!(quoted.yt_price.round_dp(10), dec("210"));
    }

    #[test]
    fn zero_quote_sentinel_values_market_at_zero() {
        let config = linear_config();
        let pool = PoolConfig {
            initial_concentration: 10,
            maturity_concentration: 0,
        };
        let reserves = PoolReserves {
            pt_pool_amount: Decimal::from(100),
            yt_pool_amount: Decimal::from(100),
            lp_supply_amount: Decimal::from(200),
        };

        let valuation =
            value_market(&config, &pool, &reserves, &clock_at(0), Decimal::ONE).unwrap();
        let quoted = valuation.quoted_pool_prices(Decimal::ZERO, Decimal::ZERO);

        assert_eq!(quoted.pt_price, Decimal::ZERO);
        assert_eq!(quoted.yt_price, Decimal::ZERO);
    }
}
