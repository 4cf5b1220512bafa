//! Human readable terminal output.

use console::style;
use serde::Serialize;
use yieldscope_utils::{
    aggregate::{AggregateSummary, Aggregates},
    analysis::AssetReport,
    discovery::DiscoveredAsset,
    gas::GasSummary,
    wallet::{TokenPrice, WalletBalances},
};

/// Everything `analyze --json` prints.
#[derive(Serialize)]
pub struct AnalyzeOutput<'a> {
    pub account: String,
    pub discovered: &'a [DiscoveredAsset],
    pub reports: &'a [AssetReport],
    pub failures: Vec<String>,
    pub aggregates: &'a Aggregates,
    pub gas: Option<&'a GasSummary>,
    pub prices: &'a [TokenPrice],
}

pub fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

pub fn usd(value: f64) -> String {
    format!("${value:.2}")
}

/// Supply in millions of tokens, `2345678.9` -> `2.35M`.
pub fn millions(supply: f64) -> String {
    format!("{:.2}M", supply / 1_000_000.0)
}

pub fn print_discovered(assets: &[DiscoveredAsset]) {
    if assets.is_empty() {
        println!("{}", style("No active staking positions found.").yellow());
        return;
    }

    println!("{}", style("Positions").bold());
    for asset in assets {
        println!(
            "  {} {} ({}, underlying {})",
            style(&asset.symbol).cyan(),
            style(asset.address).dim(),
            asset.family,
            asset.underlying_symbol
        );
    }
    println!();
}

pub fn print_progress(report: &AssetReport, aggregates: &Aggregates) {
    println!(
        "{} {} analyzed, running total {} at {}",
        style("✓").green(),
        style(&report.symbol).cyan(),
        usd(aggregates.global.total_value_usd),
        percent(aggregates.global.weighted_annualized_rate)
    );
}

pub fn print_report(report: &AssetReport) {
    println!(
        "{} {} {}",
        style(&report.symbol).bold().cyan(),
        report.name,
        style(report.asset).dim()
    );
    println!(
        "  balance {:.6}, value {:.6} ({}) at {} per unit",
        report.current_balance,
        report.current_underlying_value,
        usd(report.current_underlying_value * report.price_usd),
        usd(report.price_usd)
    );
    println!(
        "  {} day earnings {:.6}, APY {}, {}",
        report.lookback_days,
        report.period_earnings,
        style(percent(report.annualized_rate)).green(),
        report.breakdown
    );
    println!(
        "  total staked {}, head block {}",
        millions(report.total_supply),
        report.head_block
    );

    match daily_rows(report) {
        Some(rows) => rows.iter().for_each(|row| println!("{row}")),
        None => println!(
            "  {}",
            style(format!("No historical data for {}", report.symbol)).yellow()
        ),
    }
    println!();
}

/// Header and one row per day, `None` when no height of the lookback window was readable.
fn daily_rows(report: &AssetReport) -> Option<Vec<String>> {
    if report.daily_records.is_empty() {
        return None;
    }

    let header = format!(
        "  {:<8} {:>14} {:>14} {:>14} {:>12}",
        "date", "growth", "incentives", "value (USD)", "daily APY"
    );
    let rows = report.daily_records.iter().map(|record| {
        format!(
            "  {:<8} {:>14.6} {:>14.6} {:>14.2} {:>12}",
            record.label,
            record.value_growth_yield,
            record.incentive_yield,
            record.underlying_value_usd,
            percent(record.daily_annualized_rate)
        )
    });
    Some(std::iter::once(header).chain(rows).collect())
}

fn print_summary(title: &str, summary: &AggregateSummary) {
    println!(
        "  {:<10} {:>3} assets  value {:>14}  daily {:>10}  period {:>10}  APY {:>8}",
        title,
        summary.asset_count,
        usd(summary.total_value_usd),
        usd(summary.total_daily_earnings_usd),
        usd(summary.total_period_earnings_usd),
        percent(summary.weighted_annualized_rate)
    );
}

pub fn print_aggregates(aggregates: &Aggregates) {
    println!("{}", style("Summary").bold());
    print_summary("Rebasing", &aggregates.rebasing);
    print_summary("Vault", &aggregates.vault);
    print_summary("All", &aggregates.global);
    println!();
}

pub fn print_failures(failures: &[yieldscope_utils::Error]) {
    for failure in failures {
        eprintln!("{} {failure}", style("skipped:").yellow());
    }
}

pub fn print_gas(gas: &GasSummary) {
    println!("{}", style("Base fee (gwei, last 5 blocks)").bold());
    println!(
        "  latest {:.3}  median {:.3}  top 20% {:.3}  bottom 80% {:.3}  min {:.3}  max {:.3}",
        gas.latest, gas.median, gas.top20_avg, gas.bottom80_avg, gas.min, gas.max
    );
    println!();
}

pub fn print_prices(prices: &[TokenPrice]) {
    println!("{}", style("Prices").bold());
    for price in prices {
        println!("  {:<6} {:>12}", price.symbol, usd(price.price_usd));
    }
    println!();
}

pub fn print_balances(wallet: &WalletBalances) {
    println!("{}", style("Wallet").bold());
    for balance in &wallet.balances {
        println!(
            "  {:<6} {:>18.6} {:>14}",
            balance.symbol,
            balance.balance,
            usd(balance.value_usd)
        );
    }
    println!("  {:<6} {:>33}", "total", style(usd(wallet.total_value_usd)).bold());
}
