//! In-memory chain used by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use alloy::primitives::{Address, U256};

use crate::chain::{AssetListing, ChainReader, FeedAnswer, RewardsQuery};

pub fn addr(n: u8) -> Address {
    Address::with_last_byte(n)
}

/// `whole * 10^decimals` as a raw amount.
pub fn units(whole: u64, decimals: u8) -> U256 {
    U256::from(whole) * U256::from(10u8).pow(U256::from(decimals))
}

/// `(numerator, denominator)` applied to the input amount.
type Ratio = (U256, U256);

#[derive(Default)]
pub struct MockChain {
    pub head: Option<u64>,
    /// Any per-block read at these heights fails.
    pub broken_blocks: HashSet<u64>,
    pub decimals: HashMap<Address, u8>,
    pub symbols: HashMap<Address, String>,
    pub names: HashMap<Address, String>,
    pub supplies: HashMap<Address, U256>,
    pub native: HashMap<Address, U256>,
    /// Balances keyed by `(token, owner)`, applying to every block.
    pub balances: HashMap<(Address, Address), U256>,
    /// Balances keyed by `(token, owner, block)`, taking precedence over `balances`.
    pub balances_at: HashMap<(Address, Address, u64), U256>,
    pub vault_assets: HashMap<Address, Address>,
    pub redeem_ratios: HashMap<(Address, u64), Ratio>,
    pub reward_controllers: HashMap<Address, Address>,
    pub incentives_controllers: HashMap<Address, Address>,
    pub asset_lists: HashMap<(Address, AssetListing), Vec<Address>>,
    pub rewards: HashMap<(RewardsQuery, Address, u64), Vec<(Address, U256)>>,
    pub shares: HashMap<(Address, Address, u64), U256>,
    pub pooled_ratios: HashMap<(Address, u64), Ratio>,
    pub feeds: HashMap<Address, FeedAnswer>,
    pub base_fees: Vec<u128>,
    pub feed_reads: AtomicUsize,
}

fn missing(contract: Address, method: &'static str) -> crate::Error {
    crate::Error::ContractCall {
        contract,
        method,
        error: Box::new(alloy::contract::Error::UnknownFunction(method.to_string())),
    }
}

fn apply(ratio: &Ratio, amount: U256) -> U256 {
    amount * ratio.0 / ratio.1
}

impl MockChain {
    fn check_block(&self, contract: Address, method: &'static str, block: u64) -> crate::Result<()> {
        if self.broken_blocks.contains(&block) {
            Err(missing(contract, method))
        } else {
            Ok(())
        }
    }

    pub fn feed_reads(&self) -> usize {
        self.feed_reads.load(Ordering::SeqCst)
    }
}

impl ChainReader for MockChain {
    async fn head_block(&self) -> crate::Result<u64> {
        self.head.ok_or_else(|| crate::Error::Rpc {
            method: "eth_blockNumber",
            error: Box::new(alloy::transports::TransportErrorKind::custom_str("offline")),
        })
    }

    async fn native_balance(&self, owner: Address) -> crate::Result<U256> {
        Ok(self.native.get(&owner).copied().unwrap_or_default())
    }

    async fn decimals(&self, token: Address) -> crate::Result<u8> {
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| missing(token, "decimals"))
    }

    async fn symbol(&self, token: Address) -> crate::Result<String> {
        self.symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| missing(token, "symbol"))
    }

    async fn name(&self, token: Address) -> crate::Result<String> {
        self.names
            .get(&token)
            .cloned()
            .ok_or_else(|| missing(token, "name"))
    }

    async fn total_supply(&self, token: Address) -> crate::Result<U256> {
        self.supplies
            .get(&token)
            .copied()
            .ok_or_else(|| missing(token, "totalSupply"))
    }

    async fn balance_of(
        &self,
        token: Address,
        owner: Address,
        block: Option<u64>,
    ) -> crate::Result<U256> {
        if let Some(block) = block {
            self.check_block(token, "balanceOf", block)?;
            if let Some(balance) = self.balances_at.get(&(token, owner, block)) {
                return Ok(*balance);
            }
        }
        self.balances
            .get(&(token, owner))
            .copied()
            .ok_or_else(|| missing(token, "balanceOf"))
    }

    async fn vault_asset(&self, vault: Address) -> crate::Result<Address> {
        self.vault_assets
            .get(&vault)
            .copied()
            .ok_or_else(|| missing(vault, "asset"))
    }

    async fn preview_redeem(&self, vault: Address, shares: U256, block: u64) -> crate::Result<U256> {
        self.check_block(vault, "previewRedeem", block)?;
        self.redeem_ratios
            .get(&(vault, block))
            .map(|ratio| apply(ratio, shares))
            .ok_or_else(|| missing(vault, "previewRedeem"))
    }

    async fn reward_controller(&self, token: Address) -> crate::Result<Address> {
        self.reward_controllers
            .get(&token)
            .copied()
            .ok_or_else(|| missing(token, "REWARD_CONTROLLER"))
    }

    async fn incentives_controller(&self, token: Address) -> crate::Result<Address> {
        self.incentives_controllers
            .get(&token)
            .copied()
            .ok_or_else(|| missing(token, "getIncentivesController"))
    }

    async fn rewarded_assets(
        &self,
        controller: Address,
        listing: AssetListing,
    ) -> crate::Result<Vec<Address>> {
        self.asset_lists
            .get(&(controller, listing))
            .cloned()
            .ok_or_else(|| missing(controller, "getAllAssets"))
    }

    async fn rewards(
        &self,
        controller: Address,
        query: RewardsQuery,
        asset: Address,
        _user: Address,
        block: u64,
    ) -> crate::Result<Vec<(Address, U256)>> {
        self.check_block(controller, "rewards", block)?;
        self.rewards
            .get(&(query, asset, block))
            .cloned()
            .ok_or_else(|| missing(controller, "rewards"))
    }

    async fn shares_of(&self, token: Address, account: Address, block: u64) -> crate::Result<U256> {
        self.check_block(token, "sharesOf", block)?;
        self.shares
            .get(&(token, account, block))
            .copied()
            .ok_or_else(|| missing(token, "sharesOf"))
    }

    async fn pooled_by_shares(&self, token: Address, shares: U256, block: u64) -> crate::Result<U256> {
        self.check_block(token, "getPooledEthByShares", block)?;
        self.pooled_ratios
            .get(&(token, block))
            .map(|ratio| apply(ratio, shares))
            .ok_or_else(|| missing(token, "getPooledEthByShares"))
    }

    async fn feed_answer(&self, feed: Address) -> crate::Result<FeedAnswer> {
        self.feed_reads.fetch_add(1, Ordering::SeqCst);
        self.feeds
            .get(&feed)
            .copied()
            .ok_or_else(|| missing(feed, "latestRoundData"))
    }

    async fn recent_base_fees(&self, count: u64) -> crate::Result<Vec<u128>> {
        Ok(self.base_fees.iter().take(count as usize).copied().collect())
    }
}

/// A report carrying only what aggregation reads.
pub fn report(
    symbol: &str,
    current_underlying_value: f64,
    price_usd: f64,
    annualized_rate: f64,
) -> crate::analysis::AssetReport {
    crate::analysis::AssetReport {
        asset: Address::ZERO,
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        family: crate::aggregate::Family::from_symbol(symbol),
        underlying: Address::ZERO,
        period_earnings: 0.0,
        annualized_rate,
        breakdown: Default::default(),
        price_usd,
        total_supply: 0.0,
        current_balance: 0.0,
        current_underlying_value,
        lookback_days: 7,
        head_block: 0,
        daily_records: Vec::new(),
    }
}
