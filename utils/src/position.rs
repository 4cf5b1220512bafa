use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use yieldscope_common::RawAmount;

use crate::{
    aggregate::Family,
    cache::AppendOnlyCache,
    chain::{ChainReader, RewardsQuery},
    snapshot::{RewardAmount, SnapshotSource},
};

/// Decimals assumed for tokens that do not answer `decimals()`.
const FALLBACK_DECIMALS: u8 = 18;

/// One `previewRedeem` hop from a vault's shares into its asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ConversionStep {
    pub vault: Address,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PositionKind {
    /// Yield accrues entirely through the share to underlying rate, e.g. stETH.
    Rebasing,
    /// Yield splits between share appreciation and a rewards ledger, e.g. Umbrella stk-tokens.
    Vault {
        conversion: Vec<ConversionStep>,
        rewards_controller: Address,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionMeta {
    pub asset: Address,
    pub account: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: f64,
    /// Asset the exchange rate is denominated in, and whose price values the position.
    pub underlying: Address,
    pub underlying_decimals: u8,
    pub family: Family,
}

/// Where to look for things the chain does not tell us.
#[derive(Clone, Debug)]
pub struct PositionDefaults {
    pub rebasing_assets: Vec<Address>,
    pub rewards_controller: Address,
}

impl From<&crate::config::Config> for PositionDefaults {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            rebasing_assets: config.rebasing_assets.clone(),
            rewards_controller: config.rewards_controller,
        }
    }
}

/// A staking position resolved once at setup and then read at arbitrary heights.
pub struct Position<R> {
    reader: Arc<R>,
    meta: PositionMeta,
    kind: PositionKind,
    reward_decimals: AppendOnlyCache<Address, u8>,
}

impl<R: ChainReader> Position<R> {
    pub async fn resolve(
        reader: Arc<R>,
        asset: Address,
        account: Address,
        defaults: &PositionDefaults,
    ) -> crate::Result<Self> {
        let (meta, kind) = if defaults.rebasing_assets.contains(&asset) {
            resolve_rebasing(reader.as_ref(), asset, account).await
        } else {
            resolve_vault(reader.as_ref(), asset, account, defaults.rewards_controller).await?
        };

        tracing::debug!(%asset, symbol = %meta.symbol, ?kind, "Resolved position");

        Ok(Self {
            reader,
            meta,
            kind,
            reward_decimals: AppendOnlyCache::new(),
        })
    }

    pub fn meta(&self) -> &PositionMeta {
        &self.meta
    }

    pub fn kind(&self) -> &PositionKind {
        &self.kind
    }

    async fn reward_token_decimals(&self, token: Address) -> u8 {
        if let Some(decimals) = self.reward_decimals.get(&token) {
            return decimals;
        }
        let decimals = self
            .reader
            .decimals(token)
            .await
            .unwrap_or(FALLBACK_DECIMALS);
        self.reward_decimals.insert_if_absent(token, decimals)
    }

    async fn ledger_rewards(
        &self,
        controller: Address,
        block: u64,
    ) -> crate::Result<Vec<RewardAmount>> {
        let mut last_error = None;

        for query in [RewardsQuery::CurrentEffective, RewardsQuery::UnclaimedByAsset] {
            match self
                .reader
                .rewards(controller, query, self.meta.asset, self.meta.account, block)
                .await
            {
                Ok(entries) => {
                    let mut rewards = Vec::with_capacity(entries.len());
                    for (token, value) in entries {
                        let decimals = self.reward_token_decimals(token).await;
                        rewards.push(RewardAmount {
                            token,
                            amount: RawAmount::new(value, decimals),
                        });
                    }
                    return Ok(rewards);
                }
                Err(error) => {
                    tracing::debug!(
                        asset = %self.meta.asset,
                        block,
                        ?query,
                        %error,
                        "Rewards query failed"
                    );
                    last_error = Some(error);
                }
            }
        }

        // Both ledger views failing leaves the snapshot usable, it just carries no rewards.
        if let Some(error) = last_error {
            tracing::debug!(
                asset = %self.meta.asset,
                block,
                %error,
                "No rewards readable, counting zero"
            );
        }
        Ok(Vec::new())
    }
}

impl<R: ChainReader> SnapshotSource for Position<R> {
    fn asset(&self) -> Address {
        self.meta.asset
    }

    async fn head_block(&self) -> crate::Result<u64> {
        self.reader.head_block().await
    }

    async fn balance_at(&self, block: u64) -> crate::Result<RawAmount> {
        let value = match &self.kind {
            PositionKind::Rebasing => {
                self.reader
                    .shares_of(self.meta.asset, self.meta.account, block)
                    .await?
            }
            PositionKind::Vault { .. } => {
                self.reader
                    .balance_of(self.meta.asset, self.meta.account, Some(block))
                    .await?
            }
        };
        Ok(RawAmount::new(value, self.meta.decimals))
    }

    async fn exchange_rate_at(&self, block: u64) -> crate::Result<RawAmount> {
        let one_share = RawAmount::one(self.meta.decimals).value;

        let value = match &self.kind {
            PositionKind::Rebasing => {
                self.reader
                    .pooled_by_shares(self.meta.asset, one_share, block)
                    .await?
            }
            PositionKind::Vault { conversion, .. } => {
                let mut amount = one_share;
                for step in conversion {
                    amount = self.reader.preview_redeem(step.vault, amount, block).await?;
                }
                amount
            }
        };
        Ok(RawAmount::new(value, self.meta.underlying_decimals))
    }

    async fn accrued_rewards_at(&self, block: u64) -> crate::Result<Vec<RewardAmount>> {
        match &self.kind {
            PositionKind::Rebasing => Ok(Vec::new()),
            PositionKind::Vault {
                rewards_controller, ..
            } => self.ledger_rewards(*rewards_controller, block).await,
        }
    }
}

async fn resolve_rebasing<R: ChainReader>(
    reader: &R,
    asset: Address,
    account: Address,
) -> (PositionMeta, PositionKind) {
    let decimals = reader.decimals(asset).await.unwrap_or(FALLBACK_DECIMALS);
    let symbol = reader
        .symbol(asset)
        .await
        .unwrap_or_else(|_| "stETH".to_string());
    let name = reader
        .name(asset)
        .await
        .unwrap_or_else(|_| "Liquid staked Ether 2.0".to_string());

    let meta = PositionMeta {
        asset,
        account,
        symbol,
        name,
        decimals,
        total_supply: 0.0,
        underlying: asset,
        underlying_decimals: decimals,
        family: Family::Rebasing,
    };
    (meta, PositionKind::Rebasing)
}

async fn resolve_vault<R: ChainReader>(
    reader: &R,
    asset: Address,
    account: Address,
    default_controller: Address,
) -> crate::Result<(PositionMeta, PositionKind)> {
    let decimals = reader
        .decimals(asset)
        .await
        .map_err(|e| crate::Error::position_unreadable(asset, e))?;

    let symbol = reader
        .symbol(asset)
        .await
        .unwrap_or_else(|_| "UNKNOWN".to_string());
    let name = reader
        .name(asset)
        .await
        .unwrap_or_else(|_| "Unknown Token".to_string());
    let total_supply = reader
        .total_supply(asset)
        .await
        .unwrap_or(U256::ZERO);

    let rewards_controller = resolve_rewards_controller(reader, asset, default_controller).await;
    let (conversion, underlying, underlying_decimals) =
        resolve_conversion(reader, asset, decimals).await;

    let meta = PositionMeta {
        asset,
        account,
        symbol,
        name,
        decimals,
        total_supply: RawAmount::new(total_supply, decimals).to_f64()?,
        underlying,
        underlying_decimals,
        family: Family::Vault,
    };
    let kind = PositionKind::Vault {
        conversion,
        rewards_controller,
    };
    Ok((meta, kind))
}

async fn resolve_rewards_controller<R: ChainReader>(
    reader: &R,
    asset: Address,
    default_controller: Address,
) -> Address {
    if let Ok(controller) = reader.reward_controller(asset).await {
        if !controller.is_zero() {
            return controller;
        }
    }
    if let Ok(controller) = reader.incentives_controller(asset).await {
        if !controller.is_zero() {
            return controller;
        }
    }
    default_controller
}

/// Share tokens without `asset()` still convert through their own `previewRedeem` when they
/// answer it. Only a token answering neither gets an identity rate.
async fn self_redeeming<R: ChainReader>(reader: &R, asset: Address, decimals: u8) -> bool {
    let answered = match reader.head_block().await {
        Ok(head) => reader
            .preview_redeem(asset, RawAmount::one(decimals).value, head)
            .await
            .is_ok(),
        Err(_) => false,
    };
    if !answered {
        tracing::warn!(%asset, "Share token has no conversion, using an identity exchange rate");
    }
    answered
}

/// Walks `asset()` at most two levels down: share -> wrapped asset -> underlying.
async fn resolve_conversion<R: ChainReader>(
    reader: &R,
    asset: Address,
    decimals: u8,
) -> (Vec<ConversionStep>, Address, u8) {
    let Ok(wrapped) = reader.vault_asset(asset).await else {
        let conversion = if self_redeeming(reader, asset, decimals).await {
            vec![ConversionStep { vault: asset }]
        } else {
            Vec::new()
        };
        return (conversion, asset, decimals);
    };
    let wrapped_decimals = reader.decimals(wrapped).await.unwrap_or(FALLBACK_DECIMALS);
    let mut conversion = vec![ConversionStep { vault: asset }];

    match reader.vault_asset(wrapped).await {
        Ok(underlying) if !underlying.is_zero() => {
            let underlying_decimals = reader
                .decimals(underlying)
                .await
                .unwrap_or(FALLBACK_DECIMALS);
            conversion.push(ConversionStep { vault: wrapped });
            (conversion, underlying, underlying_decimals)
        }
        _ => (conversion, wrapped, wrapped_decimals),
    }
}
