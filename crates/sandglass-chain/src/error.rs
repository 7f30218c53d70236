use solana_pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc request failed")]
    Rpc(#[from] solana_rpc_client_api::client_error::Error),

    #[error("account {pubkey} is too short for a {kind} account")]
    AccountTooShort { pubkey: Pubkey, kind: &'static str },

    #[error("failed to decode {kind} account {pubkey}")]
    AccountDecode {
        pubkey: Pubkey,
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode token state for {pubkey}: {message}")]
    TokenDecode { pubkey: Pubkey, message: String },

    #[error("failed to decode clock sysvar")]
    ClockDecode(#[from] bincode::Error),

    #[error("expected account {0} is missing")]
    MissingAccount(Pubkey),
}
