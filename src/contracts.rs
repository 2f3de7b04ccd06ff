//! Contract interfaces and typed call surfaces
//!
//! One small handle per protocol contract, exposing exactly the reads the
//! pipeline needs. Per-market batches are always built in the order of the
//! market slice they are given.

use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;
use eyre::{Result, WrapErr};

use crate::rpc::{self, RemoteCaller};

// ============================================
// INTERFACES
// ============================================

sol! {
    interface ILendingPool {
        struct ReserveConfigurationMap {
            uint256 data;
        }

        struct ReserveData {
            ReserveConfigurationMap configuration;
            uint128 liquidityIndex;
            uint128 variableBorrowIndex;
            uint128 currentLiquidityRate;
            uint128 currentVariableBorrowRate;
            uint128 currentStableBorrowRate;
            uint40 lastUpdateTimestamp;
            address aTokenAddress;
            address stableDebtTokenAddress;
            address variableDebtTokenAddress;
            address interestRateStrategyAddress;
            uint8 id;
        }

        function getReservesList() external view returns (address[] memory);
        function getReserveData(address asset) external view returns (ReserveData memory);
    }

    interface IProtocolDataProvider {
        function getReserveConfigurationData(address asset) external view returns (
            uint256 decimals, uint256 ltv, uint256 liquidationThreshold,
            uint256 liquidationBonus, uint256 reserveFactor,
            bool usageAsCollateralEnabled, bool borrowingEnabled,
            bool stableBorrowRateEnabled, bool isActive, bool isFrozen
        );
    }

    interface IChefIncentivesController {
        function rewardsPerSecond() external view returns (uint256);
        function totalAllocPoint() external view returns (uint256);
        function poolInfo(address token) external view returns (
            uint256 totalSupply, uint256 allocPoint, uint256 lastRewardTime,
            uint256 accRewardPerShare, address onwardIncentives
        );
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
        function totalSupply() external view returns (uint256);
    }
}

// ============================================
// LENDING POOL
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct LendingPool {
    pub address: Address,
}

impl LendingPool {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub async fn reserves_list(&self, rpc: &dyn RemoteCaller) -> Result<Vec<Address>> {
        rpc::call(rpc, self.address, ILendingPool::getReservesListCall {})
            .await
            .wrap_err("LendingPool.getReservesList")
    }

    pub async fn reserve_data(
        &self,
        rpc: &dyn RemoteCaller,
        assets: &[Address],
    ) -> Result<Vec<ILendingPool::ReserveData>> {
        let calls = assets
            .iter()
            .map(|asset| (self.address, ILendingPool::getReserveDataCall { asset: *asset }))
            .collect();

        rpc::batch(rpc, calls).await.wrap_err("LendingPool.getReserveData")
    }
}

// ============================================
// PROTOCOL DATA PROVIDER
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct ProtocolDataProvider {
    pub address: Address,
}

impl ProtocolDataProvider {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub async fn reserve_configuration(
        &self,
        rpc: &dyn RemoteCaller,
        assets: &[Address],
    ) -> Result<Vec<IProtocolDataProvider::getReserveConfigurationDataReturn>> {
        let calls = assets
            .iter()
            .map(|asset| {
                (
                    self.address,
                    IProtocolDataProvider::getReserveConfigurationDataCall { asset: *asset },
                )
            })
            .collect();

        rpc::batch(rpc, calls)
            .await
            .wrap_err("ProtocolDataProvider.getReserveConfigurationData")
    }
}

// ============================================
// CHEF INCENTIVES CONTROLLER
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct IncentivesController {
    pub address: Address,
}

impl IncentivesController {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Raw emission rate, 18 decimals
    pub async fn rewards_per_second(&self, rpc: &dyn RemoteCaller) -> Result<U256> {
        rpc::call(rpc, self.address, IChefIncentivesController::rewardsPerSecondCall {})
            .await
            .wrap_err("ChefIncentivesController.rewardsPerSecond")
    }

    pub async fn total_alloc_point(&self, rpc: &dyn RemoteCaller) -> Result<U256> {
        rpc::call(rpc, self.address, IChefIncentivesController::totalAllocPointCall {})
            .await
            .wrap_err("ChefIncentivesController.totalAllocPoint")
    }

    /// Allocation point of each incentivised token, same order as `tokens`
    pub async fn alloc_points(&self, rpc: &dyn RemoteCaller, tokens: &[Address]) -> Result<Vec<U256>> {
        let calls = tokens
            .iter()
            .map(|token| (self.address, IChefIncentivesController::poolInfoCall { token: *token }))
            .collect();

        let infos = rpc::batch(rpc, calls)
            .await
            .wrap_err("ChefIncentivesController.poolInfo")?;

        Ok(infos.into_iter().map(|info| info.allocPoint).collect())
    }
}

// ============================================
// ERC-20
// ============================================

/// Batched ERC-20 reads over many tokens
pub struct Erc20;

impl Erc20 {
    /// `token.balanceOf(holder)` for each `(token, holder)` pair
    pub async fn balances(rpc: &dyn RemoteCaller, pairs: &[(Address, Address)]) -> Result<Vec<U256>> {
        let calls = pairs
            .iter()
            .map(|(token, holder)| (*token, IERC20::balanceOfCall { account: *holder }))
            .collect();

        rpc::batch(rpc, calls).await.wrap_err("ERC20.balanceOf")
    }

    pub async fn decimals(rpc: &dyn RemoteCaller, tokens: &[Address]) -> Result<Vec<u8>> {
        let calls = tokens.iter().map(|t| (*t, IERC20::decimalsCall {})).collect();

        rpc::batch(rpc, calls).await.wrap_err("ERC20.decimals")
    }

    pub async fn symbols(rpc: &dyn RemoteCaller, tokens: &[Address]) -> Result<Vec<String>> {
        let calls = tokens.iter().map(|t| (*t, IERC20::symbolCall {})).collect();

        rpc::batch(rpc, calls).await.wrap_err("ERC20.symbol")
    }

    pub async fn total_supplies(rpc: &dyn RemoteCaller, tokens: &[Address]) -> Result<Vec<U256>> {
        let calls = tokens.iter().map(|t| (*t, IERC20::totalSupplyCall {})).collect();

        rpc::batch(rpc, calls).await.wrap_err("ERC20.totalSupply")
    }
}
