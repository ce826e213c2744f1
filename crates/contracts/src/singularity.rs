//! Singularity market and YieldBox interface definitions.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ISingularity {
        // Events
        event LogAccrue(uint256 indexed accruedAmount, uint256 indexed feeFraction, uint64 indexed rate, uint256 utilization);
        event LogExchangeRate(uint256 indexed rate);
        event LogAddCollateral(address indexed from, address indexed to, uint256 indexed share);
        event LogRemoveCollateral(address indexed from, address indexed to, uint256 indexed share);
        event LogBorrow(address indexed from, address indexed to, uint256 indexed amount, uint256 feeAmount, uint256 part);
        event LogRepay(address indexed from, address indexed to, uint256 indexed amount, uint256 part);
        event LogAddAsset(address indexed from, address indexed to, uint256 indexed share, uint256 fraction);

        // Liquidation entry point
        function liquidate(
            address[] calldata users,
            uint256[] calldata maxBorrowParts,
            address swapper,
            bytes calldata collateralToAssetSwapData,
            bytes calldata usdoToBorrowedSwapData
        ) external;

        // Ledger state
        function totalAsset() external view returns (uint128 elastic, uint128 base);
        function totalBorrow() external view returns (uint128 elastic, uint128 base);
        function totalCollateralShare() external view returns (uint256);
        function exchangeRate() external view returns (uint256);
        function accrueInfo() external view returns (uint64 interestPerSecond, uint64 lastAccrued, uint128 feesEarnedFraction);
        function userBorrowPart(address user) external view returns (uint256);
        function userCollateralShare(address user) external view returns (uint256);
        function balanceOf(address lender) external view returns (uint256);

        // Wiring
        function yieldBox() external view returns (address);
        function assetId() external view returns (uint256);
        function collateralId() external view returns (uint256);
        function liquidationQueue() external view returns (address);
        function feeTo() external view returns (address);

        // Parameters
        function liquidationMultiplier() external view returns (uint256);
        function orderBookLiquidationMultiplier() external view returns (uint256);
        function closedCollateralizationRate() external view returns (uint256);
        function lqCollateralizationRate() external view returns (uint256);
        function callerFee() external view returns (uint256);
        function protocolFee() external view returns (uint256);
        function borrowOpeningFee() external view returns (uint256);
        function minLiquidatorReward() external view returns (uint256);
        function maxLiquidatorReward() external view returns (uint256);
        function liquidationBonusAmount() external view returns (uint256);

        // Interest model
        function startingInterestPerSecond() external view returns (uint64);
        function minimumInterestPerSecond() external view returns (uint64);
        function maximumInterestPerSecond() external view returns (uint64);
        function interestElasticity() external view returns (uint256);
        function minimumTargetUtilization() external view returns (uint256);
        function maximumTargetUtilization() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IYieldBox {
        function assetTotals(uint256 assetId) external view returns (uint256 totalShare, uint256 totalAmount);
        function balanceOf(address owner, uint256 assetId) external view returns (uint256);
        function toShare(uint256 assetId, uint256 amount, bool roundUp) external view returns (uint256 share);
        function toAmount(uint256 assetId, uint256 share, bool roundUp) external view returns (uint256 amount);
    }
}
