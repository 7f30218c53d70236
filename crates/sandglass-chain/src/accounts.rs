//! Borsh layouts for the sandglass program accounts, plus conversions into
//! the plain snapshot structs the core consumes. Accounts carry the usual
//! 8-byte anchor discriminator ahead of the payload.

use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use solana_pubkey::Pubkey;

use sandglass_core::{MarketConfig, MarketType, PoolConfig, ValuationError};

use crate::error::ChainError;

pub const SANDGLASS_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("SANDsy8SBzwUE8Zio2mrYZYqL52Phr2WQb9DDKuXMVK");

/// On-chain size of a market account, used as a getProgramAccounts filter.
pub const MARKET_ACCOUNT_LEN: u64 = 1104;

/// On-chain size of a stake account.
pub const STAKE_ACCOUNT_LEN: u64 = 416;

const DISCRIMINATOR_LEN: usize = 8;

/// Market account: token addresses plus the market and pool configuration.
/// Trailing fields of the on-chain layout that valuation never reads are not
/// modeled; borsh decoding stops once these fields are consumed.
#[derive(Debug, Clone, AnchorSerialize, AnchorDeserialize)]
pub struct MarketAccount {
    pub market_authority: Pubkey,
    pub token_sy_mint_address: Pubkey,
    pub token_pt_mint_address: Pubkey,
    pub token_yt_mint_address: Pubkey,
    pub token_lp_mint_address: Pubkey,
    pub pool_pt_token_account: Pubkey,
    pub pool_yt_token_account: Pubkey,
    pub market_config: MarketConfigFields,
    pub pool_config: PoolConfigFields,
}

#[derive(Debug, Clone, AnchorSerialize, AnchorDeserialize)]
pub struct MarketConfigFields {
    pub market_type: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub start_price: u64,
    pub initial_end_price: u64,
    pub price_base: u64,
    pub compounding_period: i64,
    pub update_skip_time: i64,
    pub last_update_time: i64,
    pub last_update_epoch: u64,
    pub start_epoch: u64,
    pub market_apy: u64,
    pub market_sol_price: u64,
    pub market_end_price: u64,
}

#[derive(Debug, Clone, AnchorSerialize, AnchorDeserialize)]
pub struct PoolConfigFields {
    pub initial_concentration: u64,
    pub maturity_concentration: u64,
}

/// Per-wallet stake record.
#[derive(Debug, Clone, AnchorSerialize, AnchorDeserialize)]
pub struct StakeAccount {
    pub market_account: Pubkey,
    pub user_address: Pubkey,
    pub stake_info: StakeInfo,
}

#[derive(Debug, Clone, AnchorSerialize, AnchorDeserialize)]
pub struct StakeInfo {
    pub stake_pt_amount: u64,
    pub stake_yt_amount: u64,
    pub stake_lp_amount: u64,
}

impl MarketAccount {
    pub fn decode(pubkey: &Pubkey, data: &[u8]) -> Result<Self, ChainError> {
        decode_anchor(pubkey, data, "market")
    }
}

impl StakeAccount {
    pub fn decode(pubkey: &Pubkey, data: &[u8]) -> Result<Self, ChainError> {
        decode_anchor(pubkey, data, "stake")
    }

    /// Stake accounts are PDAs of the market and wallet addresses.
    pub fn find_address(market: &Pubkey, wallet: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(
            &[market.as_ref(), wallet.as_ref()],
            &SANDGLASS_PROGRAM_ID,
        )
        .0
    }
}

fn decode_anchor<T: AnchorDeserialize>(
    pubkey: &Pubkey,
    data: &[u8],
    kind: &'static str,
) -> Result<T, ChainError> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(ChainError::AccountTooShort {
            pubkey: *pubkey,
            kind,
        });
    }

    T::deserialize(&mut &data[DISCRIMINATOR_LEN..]).map_err(|source| ChainError::AccountDecode {
        pubkey: *pubkey,
        kind,
        source,
    })
}

impl MarketConfigFields {
    pub fn to_core(&self) -> Result<MarketConfig, ValuationError> {
        Ok(MarketConfig {
            market_type: MarketType::from_tag(self.market_type)?,
            start_time: self.start_time,
            end_time: self.end_time,
            start_price: self.start_price,
            initial_end_price: self.initial_end_price,
            price_base: self.price_base,
            compounding_period: self.compounding_period,
            update_skip_time: self.update_skip_time,
            last_update_time: self.last_update_time,
            last_update_epoch: self.last_update_epoch,
            start_epoch: self.start_epoch,
            market_apy: self.market_apy,
            market_sol_price: self.market_sol_price,
            market_end_price: self.market_end_price,
        })
    }
}

impl PoolConfigFields {
    pub fn to_core(&self) -> PoolConfig {
        PoolConfig {
            initial_concentration: self.initial_concentration,
            maturity_concentration: self.maturity_concentration,
        }
    }
}

/// The mints the single-wallet path looks up, in PT, YT, LP order.
/// Each token class resolves against its own mint; a regression test pins
/// this because an earlier revision of the tool queried all three balances
/// under the PT mint.
pub fn user_token_mints(market: &MarketAccount) -> [Pubkey; 3] {
    [
        market.token_pt_mint_address,
        market.token_yt_mint_address,
        market.token_lp_mint_address,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_market() -> MarketAccount {
        MarketAccount {
            market_authority: Pubkey::new_unique(),
            token_sy_mint_address: Pubkey::new_unique(),
            token_pt_mint_address: Pubkey::new_unique(),
            token_yt_mint_address: Pubkey::new_unique(),
            token_lp_mint_address: Pubkey::new_unique(),
            pool_pt_token_account: Pubkey::new_unique(),
            pool_yt_token_account: Pubkey::new_unique(),
            market_config: MarketConfigFields {
                market_type: 0,
                start_time: 1_700_000_000,
                end_time: 1_731_536_000,
                start_price: 1_000_000,
                initial_end_price: 1_100_000,
                price_base: 1_000_000,
                compounding_period: 0,
                update_skip_time: 3_600,
                last_update_time: 1_700_086_400,
                last_update_epoch: 12,
                start_epoch: 10,
                market_apy: 52_000,
                market_sol_price: 1_010_000,
                market_end_price: 1_040_000,
            },
            pool_config: PoolConfigFields {
                initial_concentration: 1_000,
                maturity_concentration: 100,
            },
        }
    }

    fn encode<T: AnchorSerialize>(value: &T) -> Vec<u8> {
        let mut data = vec![0u8; DISCRIMINATOR_LEN];
        value.serialize(&mut data).unwrap();
        data
    }

    #[test]
    fn market_account_decodes_after_discriminator() {
        let market = sample_market();
        let pubkey = Pubkey::new_unique();
        let data = encode(&market);

        let decoded = MarketAccount::decode(&pubkey, &data).unwrap();
        assert_eq!(decoded.token_pt_mint_address, market.token_pt_mint_address);
        assert_eq!(decoded.market_config.price_base, 1_000_000);
        assert_eq!(decoded.pool_config.maturity_concentration, 100);
    }

    #[test]
    fn stake_account_decodes_after_discriminator() {
        let stake = StakeAccount {
            market_account: Pubkey::new_unique(),
            user_address: Pubkey::new_unique(),
            stake_info: StakeInfo {
                stake_pt_amount: 1_000_000,
                stake_yt_amount: 0,
                stake_lp_amount: 42,
            },
        };
        let pubkey = Pubkey::new_unique();
        let data = encode(&stake);

        let decoded = StakeAccount::decode(&pubkey, &data).unwrap();
        assert_eq!(decoded.user_address, stake.user_address);
        assert_eq!(decoded.stake_info.stake_lp_amount, 42);
    }

    #[test]
    fn truncated_account_is_rejected() {
        let pubkey = Pubkey::new_unique();
        assert!(matches!(
            MarketAccount::decode(&pubkey, &[0u8; 4]),
            Err(ChainError::AccountTooShort { .. })
        ));
    }

    #[test]
    fn market_config_converts_to_core_types() {
        let market = sample_market();
        let config = market.market_config.to_core().unwrap();
        assert_eq!(config.market_type, MarketType::FixedAccrual);
        assert_eq!(config.start_epoch, 10);

        let mut bad = market.market_config.clone();
        bad.market_type = 7;
        assert_eq!(
            bad.to_core().unwrap_err(),
            ValuationError::UnknownMarketType(7)
        );
    }

    #[test]
    fn user_token_lookups_use_three_distinct_mints() {
        let market = sample_market();
        let [pt, yt, lp] = user_token_mints(&market);

        assert_eq!(pt, market.token_pt_mint_address);
        assert_eq!(yt, market.token_yt_mint_address);
        assert_eq!(lp, market.token_lp_mint_address);
        assert!(pt != yt && yt != lp && pt != lp);
    }
}
