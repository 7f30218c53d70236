//! Snapshot binary: walks every sandglass market, prices PT/YT/LP, and
//! writes per-wallet position reports as JSON. With a wallet configured it
//! additionally writes that wallet's token report.

use anyhow::{Context, Result};
use tracing::{info, warn};

use sandglass_chain::{user_token_mints, ChainReader, MarketAccount, Pubkey, StakeAccount};
use sandglass_config::Config;
use sandglass_core::{
    market_quotes, value_market, Contribution, MarketSnapshot, MarketValuation, PositionLedger,
    SingleWalletLedger, SpotPriceProvider, StakedAmounts, TokenClass, TokenPrices, UserTokensRow,
};
use sandglass_quote::{HermesClient, QuoteBook};

#[tokio::main]
async fn main() -> Result<()> {
    sandglass_telemetry::init()?;

    let config = Config::from_env().context("loading configuration")?;
    info!(rpc = %config.rpc_url, "starting sandglass snapshot");

    let reader = ChainReader::new(config.rpc_url.clone());
    let hermes = HermesClient::new(config.hermes_url.clone());
    let quotes = QuoteBook::resolve(&hermes, &config.oracle_feeds).await;

    let markets = reader.fetch_markets().await.context("fetching markets")?;
    info!(count = markets.len(), "markets discovered");

    let snapshot = build_snapshot(&reader, &quotes, &markets).await?;
    let rendered = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(&config.snapshot_path, rendered)
        .with_context(|| format!("writing {}", config.snapshot_path.display()))?;
    info!(
        path = %config.snapshot_path.display(),
        markets = snapshot.len(),
        "snapshot written"
    );

    if let Some(wallet) = &config.wallet_address {
        let wallet_key: Pubkey = wallet
            .parse()
            .with_context(|| format!("invalid SANDGLASS_WALLET address {wallet:?}"))?;

        let rows = build_user_tokens(&reader, &quotes, &markets, &wallet_key).await?;
        let path = config.user_tokens_path(wallet);
        std::fs::write(&path, serde_json::to_string_pretty(&rows)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), markets = rows.len(), "user token report written");
    }

    Ok(())
}

/// Pricing output shared by both report flows.
struct PricedMarket {
    valuation: MarketValuation,
    quoted: TokenPrices,
    mint_decimals: u8,
}

/// Fetch a market's live inputs and run the pricing chain. A market with no
/// configured oracle feed is still priced; its quotes are the zero sentinel,
/// so it reports a degenerate zero price rather than failing the run.
async fn price_market(
    reader: &ChainReader,
    provider: &dyn SpotPriceProvider,
    market_id: &Pubkey,
    market: &MarketAccount,
) -> Result<PricedMarket> {
    let data = reader.fetch_market_data(market).await?;
    let market_config = market.market_config.to_core()?;
    let pool_config = market.pool_config.to_core();

    let sy_mint = market.token_sy_mint_address.to_string();
    let quotes = market_quotes(provider, market_config.market_type, &sy_mint);
    if quotes.is_unavailable() {
        warn!(%market_id, %sy_mint, "no oracle quote, market will value at zero");
    }

    let valuation = value_market(
        &market_config,
        &pool_config,
        &data.reserves,
        &data.clock,
        quotes.underlying,
    )?;
    let quoted = valuation.quoted_pool_prices(quotes.base, quotes.underlying);

    Ok(PricedMarket {
        valuation,
        quoted,
        mint_decimals: data.mint_decimals,
    })
}

/// The mints holdings are scanned under, paired with the class each credits.
fn token_classes(market: &MarketAccount) -> [(TokenClass, Pubkey); 3] {
    let [pt, yt, lp] = user_token_mints(market);
    [
        (TokenClass::Principal, pt),
        (TokenClass::Yield, yt),
        (TokenClass::Liquidity, lp),
    ]
}

/// Price every market and collect all wallet positions. A market that fails
/// to price or fetch is skipped with a warning; the rest of the snapshot
/// still goes out.
async fn build_snapshot(
    reader: &ChainReader,
    quotes: &QuoteBook,
    markets: &[(Pubkey, MarketAccount)],
) -> Result<Vec<MarketSnapshot>> {
    let stakes = reader
        .fetch_stake_accounts()
        .await
        .context("fetching stake accounts")?;
    info!(count = stakes.len(), "stake accounts discovered");

    let mut rows = Vec::with_capacity(markets.len());
    for (market_id, market) in markets {
        match snapshot_market(reader, quotes, market_id, market, &stakes).await {
            Ok(row) => rows.push(row),
            Err(err) => warn!(%market_id, error = %err, "skipping market"),
        }
    }

    Ok(rows)
}

async fn snapshot_market(
    reader: &ChainReader,
    quotes: &QuoteBook,
    market_id: &Pubkey,
    market: &MarketAccount,
    stakes: &[StakeAccount],
) -> Result<MarketSnapshot> {
    let priced = price_market(reader, quotes, market_id, market).await?;
    let rates = priced.valuation.lp_rates;
    let mut ledger = PositionLedger::new(u32::from(priced.mint_decimals));

    for stake in stakes.iter().filter(|s| s.market_account == *market_id) {
        let amounts = StakedAmounts {
            pt: stake.stake_info.stake_pt_amount,
            yt: stake.stake_info.stake_yt_amount,
            lp: stake.stake_info.stake_lp_amount,
        };
        if let Some(contribution) = Contribution::staked(amounts, &rates) {
            ledger.credit(&stake.user_address.to_string(), &contribution);
        }
    }

    for (class, mint) in token_classes(market) {
        for holding in reader.fetch_token_holdings(&mint).await? {
            let contribution = Contribution::held(class, holding.amount, &rates);
            ledger.credit(&holding.owner.to_string(), &contribution);
        }
    }

    Ok(MarketSnapshot {
        market_id: market_id.to_string(),
        pt_price: priced.quoted.pt_price,
        yt_price: priced.quoted.yt_price,
        accounts: ledger.into_positions(),
    })
}

/// Price every market and collect one wallet's positions across them.
async fn build_user_tokens(
    reader: &ChainReader,
    quotes: &QuoteBook,
    markets: &[(Pubkey, MarketAccount)],
    wallet: &Pubkey,
) -> Result<Vec<UserTokensRow>> {
    let mut rows = Vec::with_capacity(markets.len());
    for (market_id, market) in markets {
        match user_tokens_market(reader, quotes, market_id, market, wallet).await {
            Ok(row) => rows.push(row),
            Err(err) => warn!(%market_id, error = %err, "skipping market for wallet report"),
        }
    }

    Ok(rows)
}

async fn user_tokens_market(
    reader: &ChainReader,
    quotes: &QuoteBook,
    market_id: &Pubkey,
    market: &MarketAccount,
    wallet: &Pubkey,
) -> Result<UserTokensRow> {
    let priced = price_market(reader, quotes, market_id, market).await?;
    let rates = priced.valuation.lp_rates;
    let wallet_address = wallet.to_string();
    let mut ledger = SingleWalletLedger::new(&wallet_address, u32::from(priced.mint_decimals));

    if let Some(stake) = reader.fetch_stake_account(market_id, wallet).await? {
        let amounts = StakedAmounts {
            pt: stake.stake_info.stake_pt_amount,
            yt: stake.stake_info.stake_yt_amount,
            lp: stake.stake_info.stake_lp_amount,
        };
        if let Some(contribution) = Contribution::staked(amounts, &rates) {
            ledger.credit(&stake.user_address.to_string(), &contribution);
        }
    }

    for (class, mint) in token_classes(market) {
        if let Some(holding) = reader.fetch_wallet_holding(wallet, &mint).await? {
            let contribution = Contribution::held(class, holding.amount, &rates);
            ledger.credit(&wallet_address, &contribution);
        }
    }

    Ok(UserTokensRow {
        market_id: market_id.to_string(),
        pt_price: priced.quoted.pt_price,
        yt_price: priced.quoted.yt_price,
        position: ledger.into_position(),
    })
}
