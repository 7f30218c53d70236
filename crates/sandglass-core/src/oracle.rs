//! Injected spot-price capability.
//! The engine never constructs an oracle client itself; callers hand in a
//! provider (live Hermes-backed book, or fixed quotes in tests).

use rust_decimal::Decimal;

use crate::market::MarketType;

/// Source of external spot quotes, keyed by the market's SY mint address.
/// Implementations return [`Decimal::ZERO`] for assets with no configured
/// feed; the zero sentinel flows through valuation as a degenerate price
/// instead of an error.
pub trait SpotPriceProvider {
    /// Quote for the market's yield-bearing underlying, in base-asset terms.
    fn underlying_quote(&self, sy_mint: &str) -> Decimal;

    /// Quote for the market's base asset in the reporting currency.
    fn base_quote(&self, sy_mint: &str) -> Decimal;
}

/// Resolved quote pair for one market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketQuotes {
    pub base: Decimal,
    pub underlying: Decimal,
}

impl MarketQuotes {
    /// True when the provider had no mapping for this market.
    pub fn is_unavailable(&self) -> bool {
        self.base.is_zero() || self.underlying.is_zero()
    }
}

/// Resolve both quotes for a market. LinearDecay markets price in their own
/// units and never consult the oracle.
pub fn market_quotes(
    provider: &dyn SpotPriceProvider,
    market_type: MarketType,
    sy_mint: &str,
) -> MarketQuotes {
    match market_type {
        MarketType::LinearDecay => MarketQuotes {
            base: Decimal::ONE,
            underlying: Decimal::ONE,
        },
        MarketType::FixedAccrual => MarketQuotes {
            base: provider.base_quote(sy_mint),
            underlying: provider.underlying_quote(sy_mint),
        },
    }
}
