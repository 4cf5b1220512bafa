use serde::Serialize;

use crate::chain::ChainReader;

/// Number of mined blocks the summary covers.
pub const GAS_WINDOW: usize = 5;

const WEI_PER_GWEI: f64 = 1e9;

/// Base fee statistics in the unit of the input samples (gwei when fetched from a node).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GasSummary {
    pub latest: f64,
    pub median: f64,
    pub top20_avg: f64,
    pub bottom80_avg: f64,
    pub min: f64,
    pub max: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Summarizes the oldest-first `base_fees` window. Extra samples past the window are ignored.
pub fn summarize(base_fees: &[f64]) -> crate::Result<GasSummary> {
    if base_fees.len() < GAS_WINDOW {
        return Err(crate::Error::InsufficientGasSamples {
            needed: GAS_WINDOW,
            got: base_fees.len(),
        });
    }

    let window = &base_fees[..GAS_WINDOW];
    let latest = window[GAS_WINDOW - 1];

    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let top_count = ((n as f64 * 0.2).ceil() as usize).max(1);
    let (bottom, top) = sorted.split_at(n - top_count);

    Ok(GasSummary {
        latest,
        median: sorted[n / 2],
        top20_avg: mean(top),
        bottom80_avg: mean(bottom),
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// Reads the recent base fee window from the node and summarizes it in gwei.
pub async fn fetch_gas_summary<R: ChainReader>(reader: &R) -> crate::Result<GasSummary> {
    let base_fees = reader
        .recent_base_fees(GAS_WINDOW as u64)
        .await?
        .into_iter()
        .map(|wei| wei as f64 / WEI_PER_GWEI)
        .collect::<Vec<_>>();

    let summary = summarize(&base_fees)?;
    tracing::debug!(?summary, "Summarized base fees");
    Ok(summary)
}
