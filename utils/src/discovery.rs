//! Finds the staking positions an account currently holds.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::{
    aggregate::Family,
    chain::{AssetListing, ChainReader},
    position::PositionDefaults,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiscoveredAsset {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub underlying_symbol: String,
    pub family: Family,
}

/// Derives the display symbol of what a staking token wraps, `stkwaEthUSDC` -> `USDC`.
pub fn underlying_symbol(symbol: &str) -> String {
    let stripped = symbol.replacen("stkwa", "", 1).replacen("stk", "", 1);
    let stripped = stripped.strip_prefix("Eth").unwrap_or(&stripped);
    let stripped = stripped.strip_suffix("v1").unwrap_or(stripped);

    if stripped.is_empty() {
        symbol.to_string()
    } else {
        stripped.to_string()
    }
}

async fn listed_assets<R: ChainReader>(reader: &R, controller: Address) -> Vec<Address> {
    match reader.rewarded_assets(controller, AssetListing::All).await {
        Ok(assets) => assets,
        Err(error) => {
            tracing::debug!(%controller, %error, "getAllAssets failed, trying getAssetsList");
            reader
                .rewarded_assets(controller, AssetListing::Legacy)
                .await
                .unwrap_or_else(|error| {
                    tracing::warn!(%controller, %error, "Rewards controller lists no assets");
                    Vec::new()
                })
        }
    }
}

/// `None` when the account holds none of `asset` or the balance cannot be read.
async fn held_vault_asset<R: ChainReader>(
    reader: &R,
    asset: Address,
    account: Address,
) -> Option<DiscoveredAsset> {
    let balance = match reader.balance_of(asset, account, None).await {
        Ok(balance) => balance,
        Err(error) => {
            tracing::debug!(%asset, %error, "Skipping asset");
            return None;
        }
    };
    if balance.is_zero() {
        return None;
    }

    let name = reader
        .name(asset)
        .await
        .unwrap_or_else(|_| "Unknown".to_string());
    let symbol = reader
        .symbol(asset)
        .await
        .unwrap_or_else(|_| "UNK".to_string());

    tracing::info!(%asset, %symbol, "Found vault position");
    Some(DiscoveredAsset {
        address: asset,
        name,
        underlying_symbol: underlying_symbol(&symbol),
        symbol,
        family: Family::Vault,
    })
}

async fn held_rebasing_asset<R: ChainReader>(
    reader: &R,
    asset: Address,
    account: Address,
    head_block: u64,
) -> Option<DiscoveredAsset> {
    let shares = reader.shares_of(asset, account, head_block).await.ok()?;
    if shares.is_zero() {
        return None;
    }

    let symbol = reader
        .symbol(asset)
        .await
        .unwrap_or_else(|_| "stETH".to_string());
    let name = reader
        .name(asset)
        .await
        .unwrap_or_else(|_| "Liquid staked Ether 2.0".to_string());

    tracing::info!(%asset, %symbol, "Found rebasing position");
    Some(DiscoveredAsset {
        address: asset,
        name,
        symbol,
        underlying_symbol: "ETH".to_string(),
        family: Family::Rebasing,
    })
}

/// Vault assets listed by the rewards controller followed by the configured rebasing assets,
/// keeping the ones `account` holds. Per-asset failures are skipped.
pub async fn discover<R: ChainReader>(
    reader: Arc<R>,
    account: Address,
    defaults: &PositionDefaults,
) -> Vec<DiscoveredAsset> {
    let listed = listed_assets(reader.as_ref(), defaults.rewards_controller).await;
    tracing::info!(count = listed.len(), "Rewards controller manages assets");

    let mut tasks = JoinSet::new();
    for (index, asset) in listed.into_iter().enumerate() {
        let reader = Arc::clone(&reader);
        tasks.spawn(async move {
            let held = held_vault_asset(reader.as_ref(), asset, account).await;
            (index, held)
        });
    }

    let mut found = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Some(asset))) => found.push((index, asset)),
            Ok((_, None)) => {}
            Err(error) => tracing::warn!(%error, "Discovery task failed"),
        }
    }
    found.sort_by_key(|(index, _)| *index);
    let mut assets = found.into_iter().map(|(_, asset)| asset).collect::<Vec<_>>();

    match reader.head_block().await {
        Ok(head_block) => {
            for asset in &defaults.rebasing_assets {
                if let Some(found) =
                    held_rebasing_asset(reader.as_ref(), *asset, account, head_block).await
                {
                    assets.push(found);
                }
            }
        }
        Err(error) => tracing::warn!(%error, "Skipping rebasing assets"),
    }

    if assets.is_empty() {
        tracing::info!(%account, "No active staking positions found");
    }
    assets
}
