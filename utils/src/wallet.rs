use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tokio::task::JoinSet;
use yieldscope_common::RawAmount;

use crate::{chain::ChainReader, feeds::WatchToken, price::PriceResolver};

/// Balances at or below this are not worth showing.
pub const DUST_THRESHOLD: f64 = 0.00001;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenPrice {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub price_usd: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub balance: f64,
    pub price_usd: f64,
    pub value_usd: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WalletBalances {
    pub balances: Vec<TokenBalance>,
    pub total_value_usd: f64,
}

/// Prices every watch list token, leaving out the ones without a price.
pub async fn watch_list_prices<R: ChainReader>(
    prices: &PriceResolver<R>,
    watch_list: &[WatchToken],
) -> Vec<TokenPrice> {
    let mut priced = Vec::with_capacity(watch_list.len());
    for token in watch_list {
        let price_usd = prices.resolve(token.price_address()).await;
        if price_usd > 0.0 {
            priced.push(TokenPrice {
                symbol: token.symbol.clone(),
                address: token.address,
                decimals: token.decimals,
                price_usd,
            });
        }
    }

    tracing::info!(
        priced = priced.len(),
        total = watch_list.len(),
        "Updated watch list prices"
    );
    priced
}

async fn raw_balance<R: ChainReader>(
    reader: &R,
    token: &WatchToken,
    owner: Address,
) -> crate::Result<U256> {
    if token.is_native() {
        reader.native_balance(owner).await
    } else {
        reader.balance_of(token.address, owner, None).await
    }
}

async fn token_balance<R: ChainReader>(
    reader: &R,
    prices: &PriceResolver<R>,
    token: WatchToken,
    owner: Address,
) -> crate::Result<Option<TokenBalance>> {
    let raw = raw_balance(reader, &token, owner).await?;
    let balance = RawAmount::new(raw, token.decimals).to_f64()?;
    if balance <= DUST_THRESHOLD {
        return Ok(None);
    }

    let price_usd = prices.resolve(token.price_address()).await;
    Ok(Some(TokenBalance {
        symbol: token.symbol,
        balance,
        price_usd,
        value_usd: balance * price_usd,
    }))
}

/// Native and ERC20 balances of the watch list tokens held by `owner`, most valuable first.
pub async fn wallet_balances<R: ChainReader>(
    prices: Arc<PriceResolver<R>>,
    reader: Arc<R>,
    watch_list: &[WatchToken],
    owner: Address,
) -> WalletBalances {
    let mut tasks = JoinSet::new();
    for token in watch_list.iter().cloned() {
        let reader = Arc::clone(&reader);
        let prices = Arc::clone(&prices);
        tasks.spawn(async move {
            token_balance(reader.as_ref(), prices.as_ref(), token, owner).await
        });
    }

    let mut balances = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(Some(balance))) => {
                tracing::info!(
                    symbol = %balance.symbol,
                    balance = balance.balance,
                    value_usd = balance.value_usd,
                    "Found wallet balance"
                );
                balances.push(balance);
            }
            Ok(Ok(None)) => {}
            Ok(Err(error)) => tracing::warn!(%error, "Could not fetch wallet balance"),
            Err(error) => tracing::warn!(%error, "Wallet balance task failed"),
        }
    }

    balances.sort_by(|a, b| b.value_usd.total_cmp(&a.value_usd));
    let total_value_usd = balances.iter().map(|b| b.value_usd).sum();

    WalletBalances {
        balances,
        total_value_usd,
    }
}
