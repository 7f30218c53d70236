//! PT/YT pricing from the terminal price, bonding-curve pool pricing and
//! LP-to-backing conversion rates.

use rust_decimal::Decimal;

use crate::error::ValuationError;
use crate::market::{MarketConfig, PoolReserves};

/// Fundamental PT/YT price pair. Always sums to exactly one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPrices {
    pub pt_price: Decimal,
    pub yt_price: Decimal,
}

/// Pool-implied trade prices. `pool_pt_price + pool_yt_price == 1` exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolPrices {
    pub pool_price: Decimal,
    pub pool_pt_price: Decimal,
    pub pool_yt_price: Decimal,
}

/// LP share to PT/YT backing conversion rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LpRates {
    pub lp_pt_rate: Decimal,
    pub lp_yt_rate: Decimal,
}

/// PT price from the terminal price: the normalized start price discounted
/// by the terminal price, floored at `price_base` granularity and clamped
/// into [0, 1]. YT is the complement.
pub fn token_prices(config: &MarketConfig, market_end_price: Decimal) -> TokenPrices {
    let price_base = Decimal::from(config.price_base);
    let start_price = Decimal::from(config.start_price) / price_base;

    // A zero terminal price saturates the clamp: dividing first and
    // clamping after leaves only the upper bound.
    if market_end_price.is_zero() {
        return TokenPrices {
            pt_price: Decimal::ONE,
            yt_price: Decimal::ZERO,
        };
    }

    let mut pt_price = (start_price / market_end_price * price_base).floor() / price_base;
    if pt_price > Decimal::ONE {
        pt_price = Decimal::ONE;
    }

    TokenPrices {
        pt_price,
        yt_price: Decimal::ONE - pt_price,
    }
}

/// Concentration-adjusted bonding-curve pool pricing. Virtual reserves are
/// the real reserves plus the concentration offset; the trade price ratio
/// converges to the fundamental PT/YT price as reserves dominate the offset.
pub fn pool_prices(
    concentration: Decimal,
    reserves: &PoolReserves,
    prices: &TokenPrices,
) -> PoolPrices {
    let virtual_pt = reserves.pt_pool_amount + concentration;
    let virtual_yt = reserves.yt_pool_amount + concentration;

    // Worthless PT quotes the whole pool on the YT side.
    if prices.pt_price.is_zero() {
        return PoolPrices {
            pool_price: Decimal::ZERO,
            pool_pt_price: Decimal::ZERO,
            pool_yt_price: Decimal::ONE,
        };
    }

    // PT pinned at 1 (or an empty PT side) leaves no YT leg to quote; take
    // the trade-price limit directly instead of dividing by zero.
    if prices.yt_price.is_zero() || virtual_pt.is_zero() {
        return PoolPrices {
            pool_price: Decimal::MAX,
            pool_pt_price: Decimal::ONE,
            pool_yt_price: Decimal::ZERO,
        };
    }

    let pool_price = (virtual_yt / prices.yt_price) / (virtual_pt / prices.pt_price);
    let pool_pt_price = pool_price / (pool_price + Decimal::ONE);

    PoolPrices {
        pool_price,
        pool_pt_price,
        pool_yt_price: Decimal::ONE - pool_pt_price,
    }
}

/// LP-to-backing rates from the pool reserve ratios.
/// An empty pool (all three amounts zero) yields zero rates; a zero LP
/// supply with live reserves is a broken snapshot and fails fast.
pub fn lp_rates(reserves: &PoolReserves) -> Result<LpRates, ValuationError> {
    if reserves.lp_supply_amount.is_zero() {
        if reserves.pt_pool_amount.is_zero() && reserves.yt_pool_amount.is_zero() {
            return Ok(LpRates {
                lp_pt_rate: Decimal::ZERO,
                lp_yt_rate: Decimal::ZERO,
            });
        }
        return Err(ValuationError::ZeroLpSupply);
    }

    Ok(LpRates {
        lp_pt_rate: reserves.pt_pool_amount / reserves.lp_supply_amount,
        lp_yt_rate: reserves.yt_pool_amount / reserves.lp_supply_amount,
    })
}
