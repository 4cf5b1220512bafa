//! The raw on-chain read surface the engine consumes.
//!
//! Everything above this module talks to [`ChainReader`]; [`RpcChainReader`] is the
//! JSON-RPC implementation backed by alloy. Calls that take a `block` read historical
//! state at that height, `None` means latest.

use std::future::Future;

use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, I256, U256},
    providers::{DynProvider, Provider},
};
use yieldscope_common::contracts::{
    AggregatorV3Interface, IRewardsController, IStakeToken, IERC20, IERC4626, ILido,
};

use crate::alloy::StringExt;

/// Which rewards ledger view to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RewardsQuery {
    /// `calculateCurrentUserRewards`, includes rewards accrued since the last index update.
    CurrentEffective,
    /// `getRewardsByAsset`, the unclaimed amounts as stored.
    UnclaimedByAsset,
}

/// Which asset enumeration the rewards ledger exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetListing {
    All,
    Legacy,
}

/// Chainlink `latestRoundData` answer with the feed precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedAnswer {
    pub answer: I256,
    pub decimals: u8,
}

pub trait ChainReader: Send + Sync + 'static {
    fn head_block(&self) -> impl Future<Output = crate::Result<u64>> + Send;

    fn native_balance(&self, owner: Address) -> impl Future<Output = crate::Result<U256>> + Send;

    fn decimals(&self, token: Address) -> impl Future<Output = crate::Result<u8>> + Send;

    fn symbol(&self, token: Address) -> impl Future<Output = crate::Result<String>> + Send;

    fn name(&self, token: Address) -> impl Future<Output = crate::Result<String>> + Send;

    fn total_supply(&self, token: Address) -> impl Future<Output = crate::Result<U256>> + Send;

    fn balance_of(
        &self,
        token: Address,
        owner: Address,
        block: Option<u64>,
    ) -> impl Future<Output = crate::Result<U256>> + Send;

    /// ERC4626 `asset()`.
    fn vault_asset(&self, vault: Address) -> impl Future<Output = crate::Result<Address>> + Send;

    /// ERC4626 `previewRedeem(shares)`.
    fn preview_redeem(
        &self,
        vault: Address,
        shares: U256,
        block: u64,
    ) -> impl Future<Output = crate::Result<U256>> + Send;

    /// `REWARD_CONTROLLER()` of a staking token.
    fn reward_controller(&self, token: Address)
        -> impl Future<Output = crate::Result<Address>> + Send;

    /// `getIncentivesController()` of a staking token.
    fn incentives_controller(
        &self,
        token: Address,
    ) -> impl Future<Output = crate::Result<Address>> + Send;

    fn rewarded_assets(
        &self,
        controller: Address,
        listing: AssetListing,
    ) -> impl Future<Output = crate::Result<Vec<Address>>> + Send;

    /// Unclaimed rewards of `user` for `asset`, one `(reward token, raw amount)` per token.
    fn rewards(
        &self,
        controller: Address,
        query: RewardsQuery,
        asset: Address,
        user: Address,
        block: u64,
    ) -> impl Future<Output = crate::Result<Vec<(Address, U256)>>> + Send;

    /// Lido `sharesOf`.
    fn shares_of(
        &self,
        token: Address,
        account: Address,
        block: u64,
    ) -> impl Future<Output = crate::Result<U256>> + Send;

    /// Lido `getPooledEthByShares`.
    fn pooled_by_shares(
        &self,
        token: Address,
        shares: U256,
        block: u64,
    ) -> impl Future<Output = crate::Result<U256>> + Send;

    fn feed_answer(&self, feed: Address) -> impl Future<Output = crate::Result<FeedAnswer>> + Send;

    /// Base fee per gas (wei) of the last `count` mined blocks, oldest first.
    fn recent_base_fees(&self, count: u64)
        -> impl Future<Output = crate::Result<Vec<u128>>> + Send;
}

fn at(block: Option<u64>) -> BlockId {
    block.map(BlockId::number).unwrap_or_else(BlockId::latest)
}

fn call_failed(
    contract: Address,
    method: &'static str,
) -> impl FnOnce(alloy::contract::Error) -> crate::Error {
    move |error| crate::Error::ContractCall {
        contract,
        method,
        error: Box::new(error),
    }
}

fn rpc_failed(method: &'static str) -> impl FnOnce(alloy::transports::TransportError) -> crate::Error {
    move |error| crate::Error::Rpc {
        method,
        error: Box::new(error),
    }
}

#[derive(Clone)]
pub struct RpcChainReader {
    provider: DynProvider,
}

impl RpcChainReader {
    pub fn connect(rpc_url: &str) -> crate::Result<Self> {
        Ok(Self {
            provider: rpc_url.to_alloy_provider()?,
        })
    }
}

impl ChainReader for RpcChainReader {
    async fn head_block(&self) -> crate::Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(rpc_failed("eth_blockNumber"))
    }

    async fn native_balance(&self, owner: Address) -> crate::Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(rpc_failed("eth_getBalance"))
    }

    async fn decimals(&self, token: Address) -> crate::Result<u8> {
        IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(call_failed(token, "decimals"))
    }

    async fn symbol(&self, token: Address) -> crate::Result<String> {
        IERC20::new(token, &self.provider)
            .symbol()
            .call()
            .await
            .map_err(call_failed(token, "symbol"))
    }

    async fn name(&self, token: Address) -> crate::Result<String> {
        IERC20::new(token, &self.provider)
            .name()
            .call()
            .await
            .map_err(call_failed(token, "name"))
    }

    async fn total_supply(&self, token: Address) -> crate::Result<U256> {
        IERC20::new(token, &self.provider)
            .totalSupply()
            .call()
            .await
            .map_err(call_failed(token, "totalSupply"))
    }

    async fn balance_of(
        &self,
        token: Address,
        owner: Address,
        block: Option<u64>,
    ) -> crate::Result<U256> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .block(at(block))
            .call()
            .await
            .map_err(call_failed(token, "balanceOf"))
    }

    async fn vault_asset(&self, vault: Address) -> crate::Result<Address> {
        IERC4626::new(vault, &self.provider)
            .asset()
            .call()
            .await
            .map_err(call_failed(vault, "asset"))
    }

    async fn preview_redeem(&self, vault: Address, shares: U256, block: u64) -> crate::Result<U256> {
        IERC4626::new(vault, &self.provider)
            .previewRedeem(shares)
            .block(at(Some(block)))
            .call()
            .await
            .map_err(call_failed(vault, "previewRedeem"))
    }

    async fn reward_controller(&self, token: Address) -> crate::Result<Address> {
        IStakeToken::new(token, &self.provider)
            .REWARD_CONTROLLER()
            .call()
            .await
            .map_err(call_failed(token, "REWARD_CONTROLLER"))
    }

    async fn incentives_controller(&self, token: Address) -> crate::Result<Address> {
        IStakeToken::new(token, &self.provider)
            .getIncentivesController()
            .call()
            .await
            .map_err(call_failed(token, "getIncentivesController"))
    }

    async fn rewarded_assets(
        &self,
        controller: Address,
        listing: AssetListing,
    ) -> crate::Result<Vec<Address>> {
        let contract = IRewardsController::new(controller, &self.provider);
        match listing {
            AssetListing::All => contract
                .getAllAssets()
                .call()
                .await
                .map_err(call_failed(controller, "getAllAssets")),
            AssetListing::Legacy => contract
                .getAssetsList()
                .call()
                .await
                .map_err(call_failed(controller, "getAssetsList")),
        }
    }

    async fn rewards(
        &self,
        controller: Address,
        query: RewardsQuery,
        asset: Address,
        user: Address,
        block: u64,
    ) -> crate::Result<Vec<(Address, U256)>> {
        let contract = IRewardsController::new(controller, &self.provider);
        let (tokens, amounts) = match query {
            RewardsQuery::CurrentEffective => {
                let ret = contract
                    .calculateCurrentUserRewards(asset, user)
                    .block(at(Some(block)))
                    .call()
                    .await
                    .map_err(call_failed(controller, "calculateCurrentUserRewards"))?;
                (ret.rewardsList, ret.unclaimedAmounts)
            }
            RewardsQuery::UnclaimedByAsset => {
                let ret = contract
                    .getRewardsByAsset(asset, user)
                    .block(at(Some(block)))
                    .call()
                    .await
                    .map_err(call_failed(controller, "getRewardsByAsset"))?;
                (ret.rewardsList, ret.unclaimedAmounts)
            }
        };

        Ok(tokens.into_iter().zip(amounts).collect())
    }

    async fn shares_of(&self, token: Address, account: Address, block: u64) -> crate::Result<U256> {
        ILido::new(token, &self.provider)
            .sharesOf(account)
            .block(at(Some(block)))
            .call()
            .await
            .map_err(call_failed(token, "sharesOf"))
    }

    async fn pooled_by_shares(&self, token: Address, shares: U256, block: u64) -> crate::Result<U256> {
        ILido::new(token, &self.provider)
            .getPooledEthByShares(shares)
            .block(at(Some(block)))
            .call()
            .await
            .map_err(call_failed(token, "getPooledEthByShares"))
    }

    async fn feed_answer(&self, feed: Address) -> crate::Result<FeedAnswer> {
        let contract = AggregatorV3Interface::new(feed, &self.provider);

        let round = contract
            .latestRoundData()
            .call()
            .await
            .map_err(call_failed(feed, "latestRoundData"))?;

        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(call_failed(feed, "decimals"))?;

        Ok(FeedAnswer {
            answer: round.answer,
            decimals,
        })
    }

    async fn recent_base_fees(&self, count: u64) -> crate::Result<Vec<u128>> {
        let history = self
            .provider
            .get_fee_history(count, BlockNumberOrTag::Latest, &[])
            .await
            .map_err(rpc_failed("eth_feeHistory"))?;

        // The node appends the projected base fee of the next block, keep the mined ones.
        Ok(history
            .base_fee_per_gas
            .into_iter()
            .take(count as usize)
            .collect())
    }
}
