//! RPC fetch surface. Thin wrappers around the nonblocking RPC client that
//! return decoded snapshot values; account scans use processed commitment so
//! positions line up with the freshest program-side view.

use rust_decimal::Decimal;
use solana_account_decoder::UiAccountEncoding;
use solana_clock::Clock;
use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_rpc_client_api::filter::{Memcmp, RpcFilterType};
use spl_token_2022::extension::StateWithExtensions;
use spl_token_2022::state::{Account as TokenAccount, Mint};
use tracing::debug;

use sandglass_core::{ChainClock, PoolReserves};

use crate::accounts::{
    MarketAccount, StakeAccount, MARKET_ACCOUNT_LEN, SANDGLASS_PROGRAM_ID, STAKE_ACCOUNT_LEN,
};
use crate::error::ChainError;

const CLOCK_SYSVAR_ID: Pubkey =
    Pubkey::from_str_const("SysvarC1ock11111111111111111111111111111111");

/// Token-2022 account sizes scanned for holdings: the base layout and the
/// base layout with the account-type byte plus an extension header.
const TOKEN_ACCOUNT_SIZES: [u64; 2] = [165, 170];

/// One wallet's balance in some token account.
#[derive(Debug, Clone, Copy)]
pub struct TokenHolding {
    pub owner: Pubkey,
    pub amount: u64,
}

/// Everything fetched per market beyond its own account: mint decimals,
/// pool reserves and the chain clock at the snapshot instant.
#[derive(Debug, Clone, Copy)]
pub struct MarketData {
    pub mint_decimals: u8,
    pub reserves: PoolReserves,
    pub clock: ChainClock,
}

pub struct ChainReader {
    rpc: RpcClient,
}

impl ChainReader {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
        }
    }

    /// All market accounts of the sandglass program.
    pub async fn fetch_markets(&self) -> Result<Vec<(Pubkey, MarketAccount)>, ChainError> {
        let accounts = self
            .program_accounts(
                &SANDGLASS_PROGRAM_ID,
                vec![RpcFilterType::DataSize(MARKET_ACCOUNT_LEN)],
            )
            .await?;

        debug!(count = accounts.len(), "fetched market accounts");
        accounts
            .iter()
            .map(|(pubkey, data)| Ok((*pubkey, MarketAccount::decode(pubkey, data)?)))
            .collect()
    }

    /// All stake accounts of the program; callers filter by market.
    pub async fn fetch_stake_accounts(&self) -> Result<Vec<StakeAccount>, ChainError> {
        let accounts = self
            .program_accounts(
                &SANDGLASS_PROGRAM_ID,
                vec![RpcFilterType::DataSize(STAKE_ACCOUNT_LEN)],
            )
            .await?;

        debug!(count = accounts.len(), "fetched stake accounts");
        accounts
            .iter()
            .map(|(pubkey, data)| StakeAccount::decode(pubkey, data))
            .collect()
    }

    /// Every nonzero holding of a mint across Token-2022 accounts.
    pub async fn fetch_token_holdings(
        &self,
        mint: &Pubkey,
    ) -> Result<Vec<TokenHolding>, ChainError> {
        let mut holdings = Vec::new();

        for size in TOKEN_ACCOUNT_SIZES {
            let filters = vec![
                RpcFilterType::DataSize(size),
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(0, mint.as_ref())),
            ];
            let accounts = self
                .program_accounts(&spl_token_2022::id(), filters)
                .await?;

            for (pubkey, data) in &accounts {
                let state = unpack_token_account(pubkey, data)?;
                if state.amount > 0 {
                    holdings.push(state);
                }
            }
        }

        Ok(holdings)
    }

    /// Batch fetch of a market's pricing inputs: PT mint decimals, LP mint
    /// supply, pool PT/YT balances and the Clock sysvar.
    pub async fn fetch_market_data(&self, market: &MarketAccount) -> Result<MarketData, ChainError> {
        let keys = [
            market.token_pt_mint_address,
            market.token_lp_mint_address,
            market.pool_pt_token_account,
            market.pool_yt_token_account,
            CLOCK_SYSVAR_ID,
        ];

        let accounts = self.rpc.get_multiple_accounts(&keys).await?;
        let mut fetched = keys.iter().zip(accounts);

        let mut require = |label: &Pubkey| -> Result<Vec<u8>, ChainError> {
            match fetched.next() {
                Some((_, Some(account))) => Ok(account.data),
                _ => Err(ChainError::MissingAccount(*label)),
            }
        };

        let pt_mint_data = require(&market.token_pt_mint_address)?;
        let lp_mint_data = require(&market.token_lp_mint_address)?;
        let pool_pt_data = require(&market.pool_pt_token_account)?;
        let pool_yt_data = require(&market.pool_yt_token_account)?;
        let clock_data = require(&CLOCK_SYSVAR_ID)?;

        let mint_decimals =
            unpack_mint(&market.token_pt_mint_address, &pt_mint_data)?.decimals;
        let lp_supply = unpack_mint(&market.token_lp_mint_address, &lp_mint_data)?.supply;
        let pool_pt = unpack_token_account(&market.pool_pt_token_account, &pool_pt_data)?;
        let pool_yt = unpack_token_account(&market.pool_yt_token_account, &pool_yt_data)?;

        let clock: Clock = bincode::deserialize(&clock_data)?;

        Ok(MarketData {
            mint_decimals,
            reserves: PoolReserves {
                pt_pool_amount: Decimal::from(pool_pt.amount),
                yt_pool_amount: Decimal::from(pool_yt.amount),
                lp_supply_amount: Decimal::from(lp_supply),
            },
            clock: ChainClock {
                unix_timestamp: clock.unix_timestamp,
                epoch: clock.epoch,
                epoch_start_timestamp: clock.epoch_start_timestamp,
            },
        })
    }

    /// One wallet's stake account for a market, `None` when never staked.
    pub async fn fetch_stake_account(
        &self,
        market: &Pubkey,
        wallet: &Pubkey,
    ) -> Result<Option<StakeAccount>, ChainError> {
        let address = StakeAccount::find_address(market, wallet);
        let response = self
            .rpc
            .get_account_with_commitment(&address, CommitmentConfig::confirmed())
            .await?;

        match response.value {
            Some(account) => Ok(Some(StakeAccount::decode(&address, &account.data)?)),
            None => Ok(None),
        }
    }

    /// One wallet's associated token balance for a mint, `None` when the
    /// account does not exist.
    pub async fn fetch_wallet_holding(
        &self,
        wallet: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<TokenHolding>, ChainError> {
        let address = spl_associated_token_account::get_associated_token_address_with_program_id(
            wallet,
            mint,
            &spl_token_2022::id(),
        );
        let response = self
            .rpc
            .get_account_with_commitment(&address, CommitmentConfig::confirmed())
            .await?;

        match response.value {
            Some(account) => Ok(Some(unpack_token_account(&address, &account.data)?)),
            None => Ok(None),
        }
    }

    async fn program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, ChainError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(CommitmentConfig::processed()),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(program, config)
            .await?;
        Ok(accounts
            .into_iter()
            .map(|(pubkey, account)| (pubkey, account.data))
            .collect())
    }
}

fn unpack_token_account(pubkey: &Pubkey, data: &[u8]) -> Result<TokenHolding, ChainError> {
    let state =
        StateWithExtensions::<TokenAccount>::unpack(data).map_err(|e| ChainError::TokenDecode {
            pubkey: *pubkey,
            message: e.to_string(),
        })?;

    Ok(TokenHolding {
        owner: state.base.owner,
        amount: state.base.amount,
    })
}

fn unpack_mint(pubkey: &Pubkey, data: &[u8]) -> Result<Mint, ChainError> {
    let state = StateWithExtensions::<Mint>::unpack(data).map_err(|e| ChainError::TokenDecode {
        pubkey: *pubkey,
        message: e.to_string(),
    })?;
    Ok(state.base)
}
