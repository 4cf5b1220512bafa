use std::sync::Arc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;
use yieldscope_utils::{
    alloy::StringExt,
    analysis::{analyze_all, AnalysisContext},
    chain::RpcChainReader,
    config::Config,
    discovery::{discover, DiscoveredAsset},
    disk_storage::DiskStorageInterface,
    feeds::FeedStore,
    gas::fetch_gas_summary,
    position::PositionDefaults,
    price::{PriceCache, PriceResolver},
    wallet::{wallet_balances, watch_list_prices},
};

mod cli;
mod error;
mod report;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("{} {error}", style("error:").red());
        std::process::exit(1);
    }
}

/// Logs go to stderr so that `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct Session {
    config: Config,
    feeds: FeedStore,
    reader: Arc<RpcChainReader>,
    prices: Arc<PriceResolver<RpcChainReader>>,
}

impl Session {
    fn connect(rpc: Option<String>) -> error::Result<Self> {
        let config = Config::load()?;
        let feeds = FeedStore::load()?;

        let rpc_url = match rpc {
            Some(rpc_url) => rpc_url,
            None => config.get_rpc_url()?,
        };
        tracing::info!(%rpc_url, "Using RPC node");

        let reader = Arc::new(RpcChainReader::connect(&rpc_url)?);
        let prices = Arc::new(PriceResolver::new(
            Arc::clone(&reader),
            feeds.feed_map(),
            Arc::new(PriceCache::new()),
        ));

        Ok(Self {
            config,
            feeds,
            reader,
            prices,
        })
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let json = cli.json;

    match cli.cmd {
        Commands::Config { cmd } => run_config(cmd, json),
        Commands::Analyze {
            address,
            days,
            assets,
        } => analyze(Session::connect(cli.rpc)?, &address, days, &assets, json).await,
        Commands::Gas => {
            let session = Session::connect(cli.rpc)?;
            let gas = fetch_gas_summary(session.reader.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&gas)?);
            } else {
                report::print_gas(&gas);
            }
            Ok(())
        }
        Commands::Prices => {
            let session = Session::connect(cli.rpc)?;
            let prices =
                watch_list_prices(session.prices.as_ref(), &session.feeds.watch_list).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&prices)?);
            } else {
                report::print_prices(&prices);
            }
            Ok(())
        }
        Commands::Balances { address } => {
            let owner = address.parse_as_address()?;
            let session = Session::connect(cli.rpc)?;
            let wallet = wallet_balances(
                session.prices,
                session.reader,
                &session.feeds.watch_list,
                owner,
            )
            .await;
            if json {
                println!("{}", serde_json::to_string_pretty(&wallet)?);
            } else {
                report::print_balances(&wallet);
            }
            Ok(())
        }
    }
}

fn run_config(cmd: ConfigCommands, json: bool) -> error::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{}", style(Config::path()?.display()).dim());
                println!("{config:#?}");
                println!("{}", style(FeedStore::path()?.display()).dim());
                println!("{:#?}", FeedStore::load()?);
            }
        }
        ConfigCommands::SetRpc { url } => {
            Config::set_rpc_url(url)?;
            println!("{} RPC url saved", style("✓").green());
        }
    }
    Ok(())
}

async fn analyze(
    session: Session,
    address: &str,
    days: Option<u32>,
    requested: &[String],
    json: bool,
) -> error::Result<()> {
    let account = address.parse_as_address()?;
    let defaults = PositionDefaults::from(&session.config);

    let discovered: Vec<DiscoveredAsset> = if requested.is_empty() {
        discover(Arc::clone(&session.reader), account, &defaults).await
    } else {
        Vec::new()
    };
    let assets = if requested.is_empty() {
        discovered.iter().map(|asset| asset.address).collect()
    } else {
        requested
            .iter()
            .map(|asset| asset.parse_as_address())
            .collect::<yieldscope_utils::Result<Vec<_>>>()?
    };

    if !json {
        report::print_discovered(&discovered);
    }

    let context = Arc::new(AnalysisContext {
        reader: Arc::clone(&session.reader),
        prices: Arc::clone(&session.prices),
        defaults,
        trace: session.config.trace_options(days),
        stablecoin_symbols: session.config.stablecoin_symbols.clone(),
        today: chrono::Utc::now().date_naive(),
    });

    let (outcome, gas, prices) = tokio::join!(
        analyze_all(context, &assets, account, |asset_report, aggregates| {
            if !json {
                report::print_progress(asset_report, aggregates);
            }
        }),
        fetch_gas_summary(session.reader.as_ref()),
        watch_list_prices(session.prices.as_ref(), &session.feeds.watch_list),
    );

    let gas = gas
        .inspect_err(|error| tracing::warn!(%error, "Gas summary unavailable"))
        .ok();

    if json {
        let output = report::AnalyzeOutput {
            account: account.to_string(),
            discovered: &discovered,
            reports: &outcome.reports,
            failures: outcome.failures.iter().map(ToString::to_string).collect(),
            aggregates: &outcome.aggregates,
            gas: gas.as_ref(),
            prices: &prices,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        for asset_report in &outcome.reports {
            report::print_report(asset_report);
        }
        report::print_failures(&outcome.failures);
        report::print_aggregates(&outcome.aggregates);
        if let Some(gas) = &gas {
            report::print_gas(gas);
        }
        report::print_prices(&prices);
    }

    if outcome.reports.is_empty() && !assets.is_empty() {
        return Err(error::Error::NothingAnalyzed(assets.len()));
    }
    Ok(())
}
