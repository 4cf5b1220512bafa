use std::time::Duration;

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::{
    disk_storage::{DiskStorageInterface, FileFormat},
    snapshot::TraceOptions,
};

/// Aave Umbrella rewards controller, used when a staking token does not name its own.
pub const DEFAULT_REWARDS_CONTROLLER: Address = address!("4655Ce3D625a63d30bA704087E52B4C31E38188B");

/// Lido stETH.
pub const LIDO_STETH: Address = address!("ae7ab96520de3a18e5e111b5eaab095312d7fe84");

/// Ethereum PoS produces one block every 12 seconds.
pub const BLOCKS_PER_DAY: u64 = 7200;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub rpc_url: Option<String>,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_blocks_per_day")]
    pub blocks_per_day: u64,
    #[serde(default = "default_pacing_millis")]
    pub pacing_millis: u64,
    #[serde(default = "default_rewards_controller")]
    pub rewards_controller: Address,
    #[serde(default = "default_rebasing_assets")]
    pub rebasing_assets: Vec<Address>,
    #[serde(default = "default_stablecoin_symbols")]
    pub stablecoin_symbols: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            lookback_days: default_lookback_days(),
            blocks_per_day: default_blocks_per_day(),
            pacing_millis: default_pacing_millis(),
            rewards_controller: default_rewards_controller(),
            rebasing_assets: default_rebasing_assets(),
            stablecoin_symbols: default_stablecoin_symbols(),
        }
    }
}

fn default_lookback_days() -> u32 {
    7
}

fn default_blocks_per_day() -> u64 {
    BLOCKS_PER_DAY
}

fn default_pacing_millis() -> u64 {
    50
}

fn default_rewards_controller() -> Address {
    DEFAULT_REWARDS_CONTROLLER
}

fn default_rebasing_assets() -> Vec<Address> {
    vec![LIDO_STETH]
}

fn default_stablecoin_symbols() -> Vec<String> {
    ["USDT", "USDC", "DAI"].map(String::from).to_vec()
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
    const FORMAT: FileFormat = FileFormat::TOML;
}

impl Config {
    pub fn get_rpc_url(&self) -> crate::Result<String> {
        self.rpc_url.clone().ok_or(crate::Error::RpcUrlNotSet)
    }

    pub fn set_rpc_url(rpc_url: String) -> crate::Result<()> {
        rpc_url
            .parse::<url::Url>()
            .map_err(|e| crate::Error::UrlParsingFailed(rpc_url.clone(), e))?;

        let mut config = Config::load()?;
        config.rpc_url = Some(rpc_url);
        config.save()?;
        Ok(())
    }

    /// Trace parameters for a run, with an optional lookback that takes precedence over the
    /// stored one.
    pub fn trace_options(&self, lookback_days: Option<u32>) -> TraceOptions {
        TraceOptions {
            lookback_days: lookback_days.unwrap_or(self.lookback_days),
            blocks_per_day: self.blocks_per_day,
            pace_every: TraceOptions::PACE_EVERY,
            pacing: Duration::from_millis(self.pacing_millis),
        }
    }
}
