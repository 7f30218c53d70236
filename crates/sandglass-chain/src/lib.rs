//! Chain-state collaborator: fetches and decodes the on-chain accounts the
//! valuation core consumes. Everything here returns plain structs; no
//! pricing logic lives in this crate.

pub mod accounts;
pub mod error;
pub mod rpc;

pub use accounts::{
    user_token_mints, MarketAccount, MarketConfigFields, PoolConfigFields, StakeAccount,
    StakeInfo, MARKET_ACCOUNT_LEN, SANDGLASS_PROGRAM_ID, STAKE_ACCOUNT_LEN,
};
pub use error::ChainError;
pub use rpc::{ChainReader, MarketData, TokenHolding};

pub use solana_pubkey::Pubkey;
