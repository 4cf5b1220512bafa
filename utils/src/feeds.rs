use std::collections::HashMap;

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::disk_storage::{DiskStorageInterface, FileFormat};

pub const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

/// Placeholder address wallets use for the native coin.
pub const NATIVE_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// A Chainlink USD feed for an asset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PriceFeed {
    pub asset: Address,
    pub feed: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WatchToken {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    /// Asset whose feed prices this token, for tokens without a feed of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_via: Option<Address>,
}

impl WatchToken {
    pub fn is_native(&self) -> bool {
        self.address == NATIVE_TOKEN
    }

    pub fn price_address(&self) -> Address {
        self.price_via.unwrap_or(self.address)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct FeedStore {
    pub feeds: Vec<PriceFeed>,
    #[serde(default)]
    pub watch_list: Vec<WatchToken>,
}

impl DiskStorageInterface for FeedStore {
    const FILE_NAME: &'static str = "feeds";
    const FORMAT: FileFormat = FileFormat::YAML;
}

impl Default for FeedStore {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            watch_list: default_watch_list(),
        }
    }
}

impl FeedStore {
    pub fn feed_map(&self) -> HashMap<Address, Address> {
        self.feeds.iter().map(|f| (f.asset, f.feed)).collect()
    }
}

fn feed(asset: Address, feed: Address, label: &str) -> PriceFeed {
    PriceFeed {
        asset,
        feed,
        label: Some(label.to_string()),
    }
}

/// Ethereum mainnet USD feeds.
fn default_feeds() -> Vec<PriceFeed> {
    vec![
        feed(
            address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            address!("8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6"),
            "USDC / USD",
        ),
        feed(
            address!("dac17f958d2ee523a2206206994597c13d831ec7"),
            address!("3E7d1eAB13ad0104d2750B8863b489D65364e32D"),
            "USDT / USD",
        ),
        feed(
            address!("6b175474e89094c44da98b954eedeac495271d0f"),
            address!("Aed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9"),
            "DAI / USD",
        ),
        feed(
            WETH,
            address!("5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"),
            "ETH / USD",
        ),
        feed(
            address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599"),
            address!("F4030086522a5bEEa4988F8cA5B36dbC97BeE88c"),
            "BTC / USD",
        ),
        feed(
            crate::config::LIDO_STETH,
            address!("CfE54B5cD566aB89272946F602D76Ea879CAb4a8"),
            "STETH / USD",
        ),
    ]
}

fn watch(symbol: &str, address: Address, decimals: u8) -> WatchToken {
    WatchToken {
        symbol: symbol.to_string(),
        address,
        decimals,
        price_via: None,
    }
}

fn default_watch_list() -> Vec<WatchToken> {
    vec![
        WatchToken {
            price_via: Some(WETH),
            ..watch("ETH", NATIVE_TOKEN, 18)
        },
        watch("WETH", WETH, 18),
        watch("WBTC", address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599"), 8),
        watch("USDC", address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), 6),
        watch("USDT", address!("dac17f958d2ee523a2206206994597c13d831ec7"), 6),
        watch("DAI", address!("6b175474e89094c44da98b954eedeac495271d0f"), 18),
    ]
}
