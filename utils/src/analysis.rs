//! End to end analysis of an account's staking positions.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use chrono::NaiveDate;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::{
    aggregate::{aggregate, Aggregates, Family},
    chain::ChainReader,
    earnings::{decompose, DailyYieldRecord, PeriodSummary, YieldBreakdown},
    position::{Position, PositionDefaults},
    price::{stablecoin_fallback, PriceResolver},
    snapshot::{reconstruct, SnapshotSource, TraceOptions},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetReport {
    pub asset: Address,
    pub symbol: String,
    pub name: String,
    pub family: Family,
    pub underlying: Address,
    pub period_earnings: f64,
    pub annualized_rate: f64,
    pub breakdown: YieldBreakdown,
    pub price_usd: f64,
    pub total_supply: f64,
    pub current_balance: f64,
    pub current_underlying_value: f64,
    pub lookback_days: u32,
    pub head_block: u64,
    pub daily_records: Vec<DailyYieldRecord>,
}

/// Everything one analysis run shares across assets.
pub struct AnalysisContext<R> {
    pub reader: Arc<R>,
    pub prices: Arc<PriceResolver<R>>,
    pub defaults: PositionDefaults,
    pub trace: TraceOptions,
    pub stablecoin_symbols: Vec<String>,
    /// Calendar day of the head block, older snapshots are dated backwards from it.
    pub today: NaiveDate,
}

impl<R: ChainReader> AnalysisContext<R> {
    pub async fn analyze_asset(
        &self,
        asset: Address,
        account: Address,
    ) -> crate::Result<AssetReport> {
        let position =
            Position::resolve(Arc::clone(&self.reader), asset, account, &self.defaults).await?;
        let sequence = reconstruct(&position, &self.trace, self.today).await?;
        let meta = position.meta();

        let price_usd = stablecoin_fallback(
            &meta.symbol,
            self.prices.resolve(meta.underlying).await,
            &self.stablecoin_symbols,
        );
        if price_usd == 0.0 {
            tracing::warn!(%asset, symbol = %meta.symbol, "Position is unpriced, valuing it at $0");
        }

        let daily_records = decompose(&sequence, price_usd);
        let (current_balance, current_underlying_value) = sequence
            .current()
            .map(|s| (s.balance, s.underlying_value))
            .unwrap_or_default();
        let summary = PeriodSummary::from_records(&daily_records, current_underlying_value);

        tracing::info!(
            %asset,
            symbol = %meta.symbol,
            period_earnings = summary.period_earnings,
            annualized_rate = summary.annualized_rate,
            "Analyzed position"
        );

        Ok(AssetReport {
            asset: position.asset(),
            symbol: meta.symbol.clone(),
            name: meta.name.clone(),
            family: meta.family,
            underlying: meta.underlying,
            period_earnings: summary.period_earnings,
            annualized_rate: summary.annualized_rate,
            breakdown: summary.breakdown(),
            price_usd,
            total_supply: meta.total_supply,
            current_balance,
            current_underlying_value,
            lookback_days: self.trace.lookback_days,
            head_block: sequence.head_block,
            daily_records,
        })
    }
}

/// Reports of every asset that could be analyzed, in the order the assets were requested.
#[derive(Debug, Default)]
pub struct AnalysisOutcome {
    pub reports: Vec<AssetReport>,
    pub failures: Vec<crate::Error>,
    pub aggregates: Aggregates,
}

/// Analyzes `assets` concurrently. `on_update` sees every finished report together with the
/// aggregates over all reports finished so far. A failing asset is recorded and skipped.
pub async fn analyze_all<R: ChainReader>(
    context: Arc<AnalysisContext<R>>,
    assets: &[Address],
    account: Address,
    mut on_update: impl FnMut(&AssetReport, &Aggregates),
) -> AnalysisOutcome {
    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();

    for (index, asset) in assets.iter().copied().enumerate() {
        let context = Arc::clone(&context);
        let handle =
            tasks.spawn(async move { (index, context.analyze_asset(asset, account).await) });
        pending.insert(handle.id(), asset);
    }

    let mut reports = Vec::with_capacity(assets.len());
    let mut order = Vec::with_capacity(assets.len());
    let mut failures = Vec::new();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (index, Ok(report)))) => {
                order.push(index);
                reports.push(report);
                let aggregates = aggregate(&reports, Family::from_symbol);
                if let Some(report) = reports.last() {
                    on_update(report, &aggregates);
                }
            }
            Ok((_, (_, Err(error)))) => {
                tracing::error!(%error, "Analysis failed");
                failures.push(error);
            }
            Err(error) => {
                let Some(asset) = pending.get(&error.id()).copied() else {
                    tracing::error!(%error, "Analysis task of unknown asset failed");
                    continue;
                };
                tracing::error!(%asset, %error, "Analysis task failed");
                failures.push(crate::Error::AnalysisTaskFailed { asset, error });
            }
        }
    }

    let mut indexed = order.into_iter().zip(reports).collect::<Vec<_>>();
    indexed.sort_by_key(|(index, _)| *index);
    let reports = indexed.into_iter().map(|(_, report)| report).collect::<Vec<_>>();
    let aggregates = aggregate(&reports, Family::from_symbol);

    AnalysisOutcome {
        reports,
        failures,
        aggregates,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy::primitives::{I256, U256};

    use super::*;
    use crate::{
        chain::{FeedAnswer, RewardsQuery},
        price::PriceCache,
        testing::{addr, units, MockChain},
    };

    const STK: u8 = 1;
    const USDC: u8 = 3;
    const AAVE: u8 = 4;
    const BROKEN: u8 = 60;
    const USER: u8 = 9;

    fn chain() -> MockChain {
        let mut chain = MockChain::default();
        chain.head = Some(1_000);
        chain
            .decimals
            .extend([(addr(STK), 6), (addr(USDC), 6), (addr(AAVE), 18)]);
        chain.symbols.insert(addr(STK), "stkwaEthUSDC".to_string());
        chain.vault_assets.insert(addr(STK), addr(USDC));
        chain.balances.insert((addr(STK), addr(USER)), units(100, 6));
        for (block, rate, rewards) in [(800, 100u64, 0u64), (900, 101, 5), (1_000, 102, 10)] {
            chain
                .redeem_ratios
                .insert((addr(STK), block), (U256::from(rate), U256::from(100u8)));
            chain.rewards.insert(
                (RewardsQuery::CurrentEffective, addr(STK), block),
                vec![(addr(AAVE), units(rewards, 17))],
            );
        }
        chain
    }

    fn context(
        chain: MockChain,
        feeds: HashMap<Address, Address>,
    ) -> Arc<AnalysisContext<MockChain>> {
        let reader = Arc::new(chain);
        let prices = PriceResolver::new(Arc::clone(&reader), feeds, Arc::new(PriceCache::new()));
        Arc::new(AnalysisContext {
            reader,
            prices: Arc::new(prices),
            defaults: PositionDefaults {
                rebasing_assets: vec![],
                rewards_controller: addr(50),
            },
            trace: TraceOptions {
                lookback_days: 2,
                blocks_per_day: 100,
                pace_every: TraceOptions::PACE_EVERY,
                pacing: Duration::ZERO,
            },
            stablecoin_symbols: vec!["USDC".to_string()],
            today: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        })
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_analyze_vault_position() {
        let report = context(chain(), HashMap::new())
            .analyze_asset(addr(STK), addr(USER))
            .await
            .unwrap();

        assert_eq!(report.symbol, "stkwaEthUSDC");
        assert_eq!(report.family, Family::Vault);
        assert_eq!(report.underlying, addr(USDC));
        // No feed configured, priced through the stablecoin fallback.
        assert_eq!(report.price_usd, 1.0);
        assert_eq!(report.head_block, 1_000);
        assert_eq!(report.daily_records.len(), 3);
        assert_eq!(report.daily_records[2].label, "Today");

        assert!(close(report.current_balance, 100.0));
        assert!(close(report.current_underlying_value, 102.0));
        assert!(close(report.daily_records[1].value_growth_yield, 1.0));
        assert!(close(report.daily_records[1].incentive_yield, 0.5));
        assert!(close(report.period_earnings, 3.0));
        assert!(close(report.annualized_rate, 1.5 * 365.0 / 102.0));
        assert_eq!(
            report.breakdown,
            YieldBreakdown {
                value_growth_percent: 67,
                incentive_percent: 33
            }
        );
    }

    #[tokio::test]
    async fn test_oracle_price_wins_over_fallback() {
        let mut chain = chain();
        chain.feeds.insert(
            addr(103),
            FeedAnswer {
                answer: I256::from_raw(U256::from(99_980_000u64)),
                decimals: 8,
            },
        );
        let feeds = HashMap::from([(addr(USDC), addr(103))]);

        let report = context(chain, feeds)
            .analyze_asset(addr(STK), addr(USER))
            .await
            .unwrap();
        assert_eq!(report.price_usd, 0.9998);
    }

    #[tokio::test]
    async fn test_failed_asset_does_not_block_the_rest() {
        let mut updates = Vec::new();
        let outcome = analyze_all(
            context(chain(), HashMap::new()),
            &[addr(BROKEN), addr(STK)],
            addr(USER),
            |report, aggregates| updates.push((report.asset, aggregates.global.asset_count)),
        )
        .await;

        assert_eq!(updates, vec![(addr(STK), 1)]);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            &outcome.failures[0],
            crate::Error::PositionUnreadable { asset, .. } if *asset == addr(BROKEN)
        ));
        assert_eq!(outcome.aggregates.vault.asset_count, 1);
        assert!(close(outcome.aggregates.global.total_value_usd, 102.0));
    }

    #[tokio::test]
    async fn test_reports_keep_requested_order() {
        let mut chain = chain();
        chain.decimals.insert(addr(2), 6);
        chain.balances.insert((addr(2), addr(USER)), units(1, 6));

        let mut seen = 0;
        let outcome = analyze_all(
            context(chain, HashMap::new()),
            &[addr(STK), addr(2)],
            addr(USER),
            |_, aggregates| {
                seen += 1;
                assert_eq!(aggregates.global.asset_count, seen);
            },
        )
        .await;

        assert_eq!(seen, 2);
        let order = outcome.reports.iter().map(|r| r.asset).collect::<Vec<_>>();
        assert_eq!(order, vec![addr(STK), addr(2)]);
        assert!(outcome.failures.is_empty());
    }
}
