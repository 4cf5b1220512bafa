use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC4626 {
        function asset() external view returns (address);
        function previewRedeem(uint256 shares) external view returns (uint256);
    }
}

sol! {
    /// Staking tokens expose their rewards ledger under one of two names depending on the
    /// deployment generation.
    #[sol(rpc)]
    interface IStakeToken {
        function REWARD_CONTROLLER() external view returns (address);
        function getIncentivesController() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface ILido {
        function sharesOf(address account) external view returns (uint256);
        function getPooledEthByShares(uint256 sharesAmount) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IRewardsController {
        function getAllAssets() external view returns (address[]);
        function getAssetsList() external view returns (address[]);
        function calculateCurrentUserRewards(address asset, address user)
            external
            view
            returns (address[] rewardsList, uint256[] unclaimedAmounts);
        function getRewardsByAsset(address asset, address user)
            external
            view
            returns (address[] rewardsList, uint256[] unclaimedAmounts);
    }
}

sol! {
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function decimals() external view returns (uint8);
        function latestRoundData()
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }
}
