use thiserror::Error;

/// Configuration faults that make a valuation undefined.
/// These fail fast; the core never emits a partial or corrupted price.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValuationError {
    #[error("price base must be greater than zero")]
    ZeroPriceBase,

    #[error("market window is empty: end_time {end_time} <= start_time {start_time}")]
    EmptyMarketWindow { start_time: i64, end_time: i64 },

    #[error("lp supply is zero while pool reserves are nonzero")]
    ZeroLpSupply,

    #[error("unknown market type tag: {0}")]
    UnknownMarketType(u64),
}
