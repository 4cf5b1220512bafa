//! Point-in-time position state across historical block heights.

use std::{future::Future, time::Duration};

use alloy::primitives::Address;
use chrono::NaiveDate;
use serde::Serialize;
use yieldscope_common::RawAmount;

/// A reward token balance with the token's own precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardAmount {
    pub token: Address,
    pub amount: RawAmount,
}

/// Per-height reads of one position.
pub trait SnapshotSource: Send + Sync {
    fn asset(&self) -> Address;

    fn head_block(&self) -> impl Future<Output = crate::Result<u64>> + Send;

    /// Shares held by the account.
    fn balance_at(&self, block: u64) -> impl Future<Output = crate::Result<RawAmount>> + Send;

    /// Underlying units redeemable for exactly one share unit.
    fn exchange_rate_at(&self, block: u64)
        -> impl Future<Output = crate::Result<RawAmount>> + Send;

    /// Accrued, unclaimed rewards. Empty for positions whose yield lives in the rate.
    fn accrued_rewards_at(
        &self,
        block: u64,
    ) -> impl Future<Output = crate::Result<Vec<RewardAmount>>> + Send;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub block_height: u64,
    pub label: String,
    pub date: NaiveDate,
    pub balance: f64,
    pub underlying_value: f64,
    pub exchange_rate: f64,
    pub accrued_rewards: f64,
}

/// Valid snapshots of one position, strictly ascending by block height.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SnapshotSequence {
    pub head_block: u64,
    snapshots: Vec<Snapshot>,
}

impl SnapshotSequence {
    /// Keeps the successful attempts with a positive exchange rate, ordered by height with
    /// duplicates removed.
    pub fn from_attempts(head_block: u64, attempts: Vec<crate::Result<Snapshot>>) -> Self {
        let mut snapshots = attempts
            .into_iter()
            .filter_map(|attempt| match attempt {
                Ok(snapshot) => Some(snapshot),
                Err(error) => {
                    tracing::debug!(%error, "Dropping snapshot");
                    None
                }
            })
            .filter(|snapshot| snapshot.exchange_rate > 0.0)
            .collect::<Vec<_>>();

        snapshots.sort_by_key(|snapshot| snapshot.block_height);
        snapshots.dedup_by_key(|snapshot| snapshot.block_height);

        Self {
            head_block,
            snapshots,
        }
    }

    /// Latest valid snapshot, which is not necessarily the one taken at the head.
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceOptions {
    pub lookback_days: u32,
    pub blocks_per_day: u64,
    /// Pause after this many sequential fetches, `0` disables pacing.
    pub pace_every: usize,
    pub pacing: Duration,
}

impl TraceOptions {
    pub const PACE_EVERY: usize = 5;
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            blocks_per_day: crate::config::BLOCKS_PER_DAY,
            pace_every: Self::PACE_EVERY,
            pacing: Duration::from_millis(50),
        }
    }
}

fn label_for(offset: u32, date: NaiveDate) -> String {
    if offset == 0 {
        "Today".to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

async fn capture<S: SnapshotSource>(
    source: &S,
    block_height: u64,
    label: String,
    date: NaiveDate,
) -> crate::Result<Snapshot> {
    let balance = source.balance_at(block_height).await?.to_f64()?;
    let exchange_rate = source.exchange_rate_at(block_height).await?.to_f64()?;

    let mut accrued_rewards = 0.0;
    for reward in source.accrued_rewards_at(block_height).await? {
        accrued_rewards += reward.amount.to_f64()?;
    }

    Ok(Snapshot {
        block_height,
        label,
        date,
        balance,
        underlying_value: balance * exchange_rate,
        exchange_rate,
        accrued_rewards,
    })
}

/// Samples the position once per day over the lookback window, newest first.
///
/// Heights are fetched one after another. A failed height is dropped, only an unreadable
/// head block fails the whole trace.
pub async fn reconstruct<S: SnapshotSource>(
    source: &S,
    options: &TraceOptions,
    today: NaiveDate,
) -> crate::Result<SnapshotSequence> {
    let asset = source.asset();
    let head_block = source
        .head_block()
        .await
        .map_err(|e| crate::Error::position_unreadable(asset, e))?;

    let mut attempts = Vec::with_capacity(options.lookback_days as usize + 1);
    let mut fetched = 0usize;

    for offset in 0..=options.lookback_days {
        let Some(block_height) = options
            .blocks_per_day
            .checked_mul(u64::from(offset))
            .and_then(|distance| head_block.checked_sub(distance))
        else {
            tracing::debug!(%asset, offset, "Lookback reaches past genesis");
            break;
        };

        let date = today - chrono::Days::new(u64::from(offset));
        attempts.push(capture(source, block_height, label_for(offset, date), date).await);

        fetched += 1;
        if options.pace_every > 0 && fetched % options.pace_every == 0 {
            tokio::time::sleep(options.pacing).await;
        }
    }

    let sequence = SnapshotSequence::from_attempts(head_block, attempts);
    let requested = options.lookback_days + 1;
    if sequence.is_empty() {
        tracing::warn!(%asset, head_block, requested, "No valid data points found");
    } else {
        tracing::info!(
            %asset,
            head_block,
            valid = sequence.len(),
            requested,
            "Completed trace"
        );
    }

    Ok(sequence)
}
