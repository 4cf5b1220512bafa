use serde::{Deserialize, Serialize};

use crate::analysis::AssetReport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Liquid staking tokens whose balance rebases, e.g. stETH.
    Rebasing,
    /// Share tokens of staking vaults with a separate rewards ledger.
    Vault,
}

impl Family {
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol == "stETH" {
            Family::Rebasing
        } else {
            Family::Vault
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Rebasing => write!(f, "Rebasing"),
            Family::Vault => write!(f, "Vault"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub total_value_usd: f64,
    pub total_daily_earnings_usd: f64,
    pub total_period_earnings_usd: f64,
    pub weighted_annualized_rate: f64,
    pub asset_count: usize,
}

/// Running sums, the rate numerator only becomes a rate once the total value is known.
#[derive(Default)]
struct Accumulator {
    total_value_usd: f64,
    total_daily_earnings_usd: f64,
    total_period_earnings_usd: f64,
    rate_numerator: f64,
    asset_count: usize,
}

impl Accumulator {
    fn add(&mut self, report: &AssetReport) {
        let value_usd = report.current_underlying_value * report.price_usd;

        self.total_value_usd += value_usd;
        self.total_daily_earnings_usd +=
            report.period_earnings / f64::from(report.lookback_days.max(1)) * report.price_usd;
        self.total_period_earnings_usd += report.period_earnings * report.price_usd;
        self.rate_numerator += report.annualized_rate * value_usd;
        self.asset_count += 1;
    }

    fn merge(&self, other: &Self) -> Self {
        Self {
            total_value_usd: self.total_value_usd + other.total_value_usd,
            total_daily_earnings_usd: self.total_daily_earnings_usd
                + other.total_daily_earnings_usd,
            total_period_earnings_usd: self.total_period_earnings_usd
                + other.total_period_earnings_usd,
            rate_numerator: self.rate_numerator + other.rate_numerator,
            asset_count: self.asset_count + other.asset_count,
        }
    }

    fn finish(&self) -> AggregateSummary {
        AggregateSummary {
            total_value_usd: self.total_value_usd,
            total_daily_earnings_usd: self.total_daily_earnings_usd,
            total_period_earnings_usd: self.total_period_earnings_usd,
            weighted_annualized_rate: if self.total_value_usd > 0.0 {
                self.rate_numerator / self.total_value_usd
            } else {
                0.0
            },
            asset_count: self.asset_count,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Aggregates {
    pub global: AggregateSummary,
    pub rebasing: AggregateSummary,
    pub vault: AggregateSummary,
}

/// Rolls up every report from scratch. Unpriced assets are counted with zero value.
pub fn aggregate(reports: &[AssetReport], classify: impl Fn(&str) -> Family) -> Aggregates {
    let mut rebasing = Accumulator::default();
    let mut vault = Accumulator::default();

    for report in reports {
        match classify(&report.symbol) {
            Family::Rebasing => rebasing.add(report),
            Family::Vault => vault.add(report),
        }
    }

    Aggregates {
        global: rebasing.merge(&vault).finish(),
        rebasing: rebasing.finish(),
        vault: vault.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::report;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_weighted_rate() {
        let reports = vec![
            report("stkwaEthUSDC", 100.0, 1.0, 0.05),
            report("stkwaEthUSDT", 300.0, 1.0, 0.10),
        ];

        let aggregates = aggregate(&reports, Family::from_symbol);
        assert!(close(aggregates.global.weighted_annualized_rate, 0.0875));
        assert_eq!(aggregates.global.total_value_usd, 400.0);
        assert_eq!(aggregates.vault, aggregates.global);
        assert_eq!(aggregates.rebasing, AggregateSummary::default());
    }

    #[test]
    fn test_families_and_earnings() {
        let mut steth = report("stETH", 2.0, 3_000.0, 0.03);
        steth.period_earnings = 0.0014;
        steth.lookback_days = 7;
        let mut usdc = report("stkwaEthUSDC", 1_000.0, 1.0, 0.08);
        usdc.period_earnings = 1.4;
        usdc.lookback_days = 7;

        let aggregates = aggregate(&[steth, usdc], Family::from_symbol);

        assert_eq!(aggregates.rebasing.asset_count, 1);
        assert!(close(aggregates.rebasing.total_value_usd, 6_000.0));
        assert!(close(aggregates.rebasing.total_period_earnings_usd, 4.2));
        assert!(close(aggregates.rebasing.total_daily_earnings_usd, 0.6));
        assert!(close(aggregates.rebasing.weighted_annualized_rate, 0.03));

        assert_eq!(aggregates.vault.asset_count, 1);
        assert!(close(aggregates.vault.total_daily_earnings_usd, 0.2));

        assert_eq!(aggregates.global.asset_count, 2);
        assert!(close(aggregates.global.total_value_usd, 7_000.0));
        assert!(close(
            aggregates.global.weighted_annualized_rate,
            (0.03 * 6_000.0 + 0.08 * 1_000.0) / 7_000.0
        ));
    }

    #[test]
    fn test_zero_value_has_zero_rate() {
        assert_eq!(aggregate(&[], Family::from_symbol), Aggregates::default());

        let unpriced = vec![
            report("stkGHO", 50.0, 0.0, 0.2),
            report("stETH", 0.0, 3_000.0, 0.03),
        ];
        let aggregates = aggregate(&unpriced, Family::from_symbol);
        assert_eq!(aggregates.global.asset_count, 2);
        assert_eq!(aggregates.global.total_value_usd, 0.0);
        assert_eq!(aggregates.global.weighted_annualized_rate, 0.0);
        assert_eq!(aggregates.vault.weighted_annualized_rate, 0.0);
        assert_eq!(aggregates.rebasing.weighted_annualized_rate, 0.0);
    }

    #[test]
    fn test_zero_lookback_divides_by_one() {
        let mut r = report("stkGHO", 10.0, 1.0, 0.1);
        r.period_earnings = 0.5;
        r.lookback_days = 0;
        assert_eq!(
            aggregate(&[r], Family::from_symbol).global.total_daily_earnings_usd,
            0.5
        );
    }

    #[test]
    fn test_custom_classifier() {
        let reports = vec![report("rETH", 1.0, 2_000.0, 0.03)];
        let aggregates = aggregate(&reports, |symbol| {
            if symbol.ends_with("ETH") {
                Family::Rebasing
            } else {
                Family::Vault
            }
        });
        assert_eq!(aggregates.rebasing.asset_count, 1);
        assert_eq!(aggregates.rebasing.total_value_usd, 2_000.0);
    }

    #[test]
    fn test_default_classifier() {
        assert_eq!(Family::from_symbol("stETH"), Family::Rebasing);
        assert_eq!(Family::from_symbol("STETH"), Family::Vault);
        assert_eq!(Family::from_symbol("stkwaEthUSDC"), Family::Vault);
    }
}
