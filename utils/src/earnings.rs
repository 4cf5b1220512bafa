//! Splits a snapshot sequence into daily value growth and incentive yield.
//!
//! Value growth is share appreciation, `balance * delta(exchange rate)`. Incentive yield is
//! the increase of accrued, unclaimed rewards. Both only count increases: a falling rate or a
//! rewards claim between two heights shows up as zero yield for that day, never as a loss.

use chrono::NaiveDate;
use serde::Serialize;

use crate::snapshot::SnapshotSequence;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyYieldRecord {
    pub date: NaiveDate,
    pub label: String,
    pub value_growth_yield: f64,
    pub incentive_yield: f64,
    pub total_daily_yield: f64,
    pub balance: f64,
    pub underlying_value_usd: f64,
    pub is_historical: bool,
    pub daily_annualized_rate: f64,
}

/// Per-day records for `sequence`, one per snapshot. The first record never carries yield.
pub fn decompose(sequence: &SnapshotSequence, price_usd: f64) -> Vec<DailyYieldRecord> {
    let snapshots = sequence.snapshots();

    snapshots
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let (value_growth_yield, incentive_yield) = match i.checked_sub(1) {
                Some(prev) => {
                    let prev = &snapshots[prev];
                    (
                        (current.exchange_rate - prev.exchange_rate).max(0.0) * current.balance,
                        (current.accrued_rewards - prev.accrued_rewards).max(0.0),
                    )
                }
                None => (0.0, 0.0),
            };
            let total_daily_yield = value_growth_yield + incentive_yield;

            DailyYieldRecord {
                date: current.date,
                label: current.label.clone(),
                value_growth_yield,
                incentive_yield,
                total_daily_yield,
                balance: current.balance,
                underlying_value_usd: current.underlying_value * price_usd,
                is_historical: true,
                daily_annualized_rate: if current.underlying_value > 0.0 {
                    total_daily_yield / current.underlying_value * DAYS_PER_YEAR
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Totals over the whole lookback window, in underlying units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period_earnings: f64,
    pub value_growth_earnings: f64,
    pub incentive_earnings: f64,
    pub annualized_rate: f64,
}

impl PeriodSummary {
    /// Averages the earnings over the covered days and annualizes them against the current
    /// underlying value.
    pub fn from_records(records: &[DailyYieldRecord], current_underlying_value: f64) -> Self {
        let value_growth_earnings = records.iter().map(|r| r.value_growth_yield).sum::<f64>();
        let incentive_earnings = records.iter().map(|r| r.incentive_yield).sum::<f64>();
        let period_earnings = records.iter().map(|r| r.total_daily_yield).sum::<f64>();

        let days_covered = records.len().saturating_sub(1).max(1) as f64;
        let annualized_rate = if current_underlying_value > 0.0 {
            period_earnings / days_covered * DAYS_PER_YEAR / current_underlying_value
        } else {
            0.0
        };

        Self {
            period_earnings,
            value_growth_earnings,
            incentive_earnings,
            annualized_rate,
        }
    }

    /// Whole percent of the period earnings from value growth and from incentives.
    pub fn breakdown(&self) -> YieldBreakdown {
        let percent = |part: f64| {
            if self.period_earnings > 0.0 {
                (part / self.period_earnings * 100.0).round() as u32
            } else {
                0
            }
        };

        YieldBreakdown {
            value_growth_percent: percent(self.value_growth_earnings),
            incentive_percent: percent(self.incentive_earnings),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct YieldBreakdown {
    pub value_growth_percent: u32,
    pub incentive_percent: u32,
}

impl std::fmt::Display for YieldBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Value growth: {}% + Incentives: {}%",
            self.value_growth_percent, self.incentive_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;

    /// Consecutive daily snapshots from `(exchange_rate, balance, accrued_rewards)` triples.
    fn sequence(points: &[(f64, f64, f64)]) -> SnapshotSequence {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let attempts = points
            .iter()
            .enumerate()
            .map(|(i, &(exchange_rate, balance, accrued_rewards))| {
                let date = start + chrono::Days::new(i as u64);
                Ok(Snapshot {
                    block_height: 1_000 + i as u64 * 100,
                    label: date.format("%b %-d").to_string(),
                    date,
                    balance,
                    underlying_value: balance * exchange_rate,
                    exchange_rate,
                    accrued_rewards,
                })
            })
            .collect();
        SnapshotSequence::from_attempts(1_000 + points.len() as u64 * 100, attempts)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rebasing_growth() {
        let records = decompose(&sequence(&[(1.00, 10.0, 0.0), (1.02, 10.0, 0.0)]), 3_000.0);

        assert_eq!(records.len(), 2);
        assert!(close(records[1].value_growth_yield, 0.2));
        assert_eq!(records[1].incentive_yield, 0.0);
        assert!(close(records[1].total_daily_yield, 0.2));
        assert!(close(records[1].underlying_value_usd, 30_600.0));
        assert!(records.iter().all(|r| r.is_historical));
    }

    #[test]
    fn test_vault_growth_and_incentives() {
        let records = decompose(&sequence(&[(2.0, 5.0, 1.0), (2.1, 5.0, 1.5)]), 1.0);

        assert!(close(records[1].value_growth_yield, 0.5));
        assert!(close(records[1].incentive_yield, 0.5));
        assert!(close(records[1].total_daily_yield, 1.0));
        assert!(close(records[1].daily_annualized_rate, 1.0 / 10.5 * 365.0));
    }

    #[test]
    fn test_first_record_has_no_yield() {
        let inputs: [&[(f64, f64, f64)]; 4] = [
            &[(1.5, 3.0, 7.0)],
            &[(1.0, 1.0, 0.0), (1.1, 1.0, 0.0), (1.2, 1.0, 0.0)],
            &[(2.0, 5.0, 9.0), (1.0, 5.0, 1.0)],
            &[],
        ];

        for points in inputs {
            let records = decompose(&sequence(points), 2.0);
            assert_eq!(records.len(), points.len());
            if let Some(first) = records.first() {
                assert_eq!(first.value_growth_yield, 0.0);
                assert_eq!(first.incentive_yield, 0.0);
                assert_eq!(first.total_daily_yield, 0.0);
            }
        }
    }

    #[test]
    fn test_negative_deltas_are_invisible() {
        // Rate drop on day 2, rewards claimed on day 3.
        let records = decompose(
            &sequence(&[
                (1.10, 10.0, 4.0),
                (1.05, 10.0, 5.0),
                (1.07, 10.0, 0.5),
                (1.07, 12.0, 0.75),
            ]),
            1.0,
        );

        assert!(records
            .iter()
            .all(|r| r.value_growth_yield >= 0.0 && r.incentive_yield >= 0.0));
        assert_eq!(records[1].value_growth_yield, 0.0);
        assert!(close(records[1].incentive_yield, 1.0));
        assert!(close(records[2].value_growth_yield, 0.2));
        assert_eq!(records[2].incentive_yield, 0.0);
        assert_eq!(records[3].value_growth_yield, 0.0);
        assert!(close(records[3].incentive_yield, 0.25));
    }

    #[test]
    fn test_zero_underlying_value_has_zero_daily_rate() {
        let records = decompose(&sequence(&[(1.0, 0.0, 0.0), (1.1, 0.0, 1.0)]), 1.0);
        assert!(close(records[1].incentive_yield, 1.0));
        assert_eq!(records[1].daily_annualized_rate, 0.0);
    }

    #[test]
    fn test_period_summary() {
        let records = decompose(
            &sequence(&[(2.0, 5.0, 1.0), (2.1, 5.0, 1.5), (2.1, 5.0, 2.5)]),
            1.0,
        );
        let summary = PeriodSummary::from_records(&records, 10.5);

        assert!(close(summary.period_earnings, 2.0));
        assert!(close(summary.value_growth_earnings, 0.5));
        assert!(close(summary.incentive_earnings, 1.5));
        assert!(close(summary.annualized_rate, 1.0 * 365.0 / 10.5));
        assert_eq!(
            summary.breakdown(),
            YieldBreakdown {
                value_growth_percent: 25,
                incentive_percent: 75
            }
        );
        assert_eq!(
            summary.breakdown().to_string(),
            "Value growth: 25% + Incentives: 75%"
        );
    }

    #[test]
    fn test_single_snapshot_summary() {
        let records = decompose(&sequence(&[(1.0, 10.0, 0.0)]), 1.0);
        let summary = PeriodSummary::from_records(&records, 10.0);

        assert_eq!(summary.period_earnings, 0.0);
        assert_eq!(summary.annualized_rate, 0.0);
        assert_eq!(summary.breakdown(), YieldBreakdown::default());
    }

    #[test]
    fn test_empty_summary_with_no_value() {
        let summary = PeriodSummary::from_records(&[], 0.0);
        assert_eq!(summary, PeriodSummary::default());
    }
}
