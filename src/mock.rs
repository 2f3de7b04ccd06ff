//! In-memory chain and price service for tests.
//!
//! `MockChain` decodes real calldata and answers with real ABI-encoded return
//! data, so tests exercise the same encode/decode path as production.

use alloy_primitives::{aliases::U40, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::contracts::{IChefIncentivesController, IERC20, ILendingPool, IProtocolDataProvider};
use crate::prices::{CoinId, PriceQuotes, PriceSource};
use crate::registry::{Chain, ChainConfig};
use crate::rpc::RemoteCaller;

#[derive(Debug, Clone)]
pub struct MockMarket {
    pub asset: Address,
    pub a_token: Address,
    pub debt_token: Address,
    pub symbol: String,
    pub decimals: u8,
    pub liquidity_rate: u128,
    pub borrow_rate: u128,
    pub balance: U256,
    pub debt_supply: U256,
    pub ltv: u64,
    pub borrowing_enabled: bool,
    pub is_active: bool,
    pub is_frozen: bool,
    pub supply_alloc: u64,
    pub borrow_alloc: u64,
}

impl MockMarket {
    /// Market `n`: asset 0x0n.., aToken 0xAn.., debt token 0xDn..
    pub fn new(n: u8) -> Self {
        let n = n & 0x0f;
        Self {
            asset: Address::repeat_byte(n),
            a_token: Address::repeat_byte(0xa0 | n),
            debt_token: Address::repeat_byte(0xd0 | n),
            symbol: format!("TKN{}", n),
            decimals: 18,
            liquidity_rate: 3 * 10u128.pow(25),
            borrow_rate: 5 * 10u128.pow(25),
            balance: U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18u64)),
            debt_supply: U256::from(500u64) * U256::from(10u64).pow(U256::from(18u64)),
            ltv: 7500,
            borrowing_enabled: true,
            is_active: true,
            is_frozen: false,
            supply_alloc: 100,
            borrow_alloc: 200,
        }
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }

    pub fn decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn alloc(mut self, supply: u64, borrow: u64) -> Self {
        self.supply_alloc = supply;
        self.borrow_alloc = borrow;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn frozen(mut self) -> Self {
        self.is_frozen = true;
        self
    }
}

pub struct MockChain {
    config: ChainConfig,
    markets: Vec<MockMarket>,
    rewards_per_second: U256,
    total_alloc_point: U256,
    failing: bool,
}

impl MockChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            config: *chain.config(),
            markets: Vec::new(),
            rewards_per_second: U256::from(10u64).pow(U256::from(18u64)),
            total_alloc_point: U256::from(1000u64),
            failing: false,
        }
    }

    pub fn with_market(mut self, market: MockMarket) -> Self {
        self.markets.push(market);
        self
    }

    pub fn rewards(mut self, rewards_per_second: U256, total_alloc_point: U256) -> Self {
        self.rewards_per_second = rewards_per_second;
        self.total_alloc_point = total_alloc_point;
        self
    }

    /// Every call reverts, like an outage or a stale registry address
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn markets(&self) -> &[MockMarket] {
        &self.markets
    }

    fn by_asset(&self, asset: Address) -> Result<&MockMarket> {
        self.markets
            .iter()
            .find(|m| m.asset == asset)
            .ok_or_else(|| eyre!("unknown asset {:?}", asset))
    }

    fn answer(&self, target: Address, data: &[u8]) -> Result<Vec<u8>> {
        if self.failing {
            return Err(eyre!("execution reverted"));
        }
        if data.len() < 4 {
            return Err(eyre!("short calldata"));
        }
        let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];
        let cfg = &self.config;

        if target == cfg.lending_pool {
            return match selector {
                ILendingPool::getReservesListCall::SELECTOR => {
                    let list: Vec<Address> = self.markets.iter().map(|m| m.asset).collect();
                    Ok(ILendingPool::getReservesListCall::abi_encode_returns(&list))
                }
                ILendingPool::getReserveDataCall::SELECTOR => {
                    let call = ILendingPool::getReserveDataCall::abi_decode(data)?;
                    let m = self.by_asset(call.asset)?;
                    Ok(ILendingPool::getReserveDataCall::abi_encode_returns(&reserve_data(m)))
                }
                _ => Err(eyre!("unexpected LendingPool selector")),
            };
        }

        if target == cfg.data_provider {
            let call = IProtocolDataProvider::getReserveConfigurationDataCall::abi_decode(data)?;
            let m = self.by_asset(call.asset)?;
            let ret = IProtocolDataProvider::getReserveConfigurationDataReturn {
                decimals: U256::from(m.decimals),
                ltv: U256::from(m.ltv),
                liquidationThreshold: U256::from(8000u64),
                liquidationBonus: U256::from(10500u64),
                reserveFactor: U256::from(1000u64),
                usageAsCollateralEnabled: true,
                borrowingEnabled: m.borrowing_enabled,
                stableBorrowRateEnabled: false,
                isActive: m.is_active,
                isFrozen: m.is_frozen,
            };
            return Ok(IProtocolDataProvider::getReserveConfigurationDataCall::abi_encode_returns(&ret));
        }

        if target == cfg.incentive_controller {
            return match selector {
                IChefIncentivesController::rewardsPerSecondCall::SELECTOR => Ok(
                    IChefIncentivesController::rewardsPerSecondCall::abi_encode_returns(&self.rewards_per_second),
                ),
                IChefIncentivesController::totalAllocPointCall::SELECTOR => Ok(
                    IChefIncentivesController::totalAllocPointCall::abi_encode_returns(&self.total_alloc_point),
                ),
                IChefIncentivesController::poolInfoCall::SELECTOR => {
                    let call = IChefIncentivesController::poolInfoCall::abi_decode(data)?;
                    let alloc = self
                        .markets
                        .iter()
                        .find_map(|m| {
                            if m.a_token == call.token {
                                Some(m.supply_alloc)
                            } else if m.debt_token == call.token {
                                Some(m.borrow_alloc)
                            } else {
                                None
                            }
                        })
                        .ok_or_else(|| eyre!("no pool for {:?}", call.token))?;
                    let ret = IChefIncentivesController::poolInfoReturn {
                        totalSupply: U256::ZERO,
                        allocPoint: U256::from(alloc),
                        lastRewardTime: U256::ZERO,
                        accRewardPerShare: U256::ZERO,
                        onwardIncentives: Address::ZERO,
                    };
                    Ok(IChefIncentivesController::poolInfoCall::abi_encode_returns(&ret))
                }
                _ => Err(eyre!("unexpected controller selector")),
            };
        }

        // ERC-20 reads on an underlying asset or a debt token
        match selector {
            IERC20::balanceOfCall::SELECTOR => {
                let call = IERC20::balanceOfCall::abi_decode(data)?;
                let m = self.by_asset(target)?;
                let balance = if call.account == m.a_token { m.balance } else { U256::ZERO };
                Ok(IERC20::balanceOfCall::abi_encode_returns(&balance))
            }
            IERC20::decimalsCall::SELECTOR => {
                Ok(IERC20::decimalsCall::abi_encode_returns(&self.by_asset(target)?.decimals))
            }
            IERC20::symbolCall::SELECTOR => {
                Ok(IERC20::symbolCall::abi_encode_returns(&self.by_asset(target)?.symbol))
            }
            IERC20::totalSupplyCall::SELECTOR => {
                let m = self
                    .markets
                    .iter()
                    .find(|m| m.debt_token == target)
                    .ok_or_else(|| eyre!("unknown debt token {:?}", target))?;
                Ok(IERC20::totalSupplyCall::abi_encode_returns(&m.debt_supply))
            }
            _ => Err(eyre!("unexpected call to {:?}", target)),
        }
    }
}

fn reserve_data(m: &MockMarket) -> ILendingPool::ReserveData {
    ILendingPool::ReserveData {
        configuration: ILendingPool::ReserveConfigurationMap { data: U256::ZERO },
        liquidityIndex: 10u128.pow(27),
        variableBorrowIndex: 10u128.pow(27),
        currentLiquidityRate: m.liquidity_rate,
        currentVariableBorrowRate: m.borrow_rate,
        currentStableBorrowRate: 0,
        lastUpdateTimestamp: U40::ZERO,
        aTokenAddress: m.a_token,
        stableDebtTokenAddress: Address::ZERO,
        variableDebtTokenAddress: m.debt_token,
        interestRateStrategyAddress: Address::ZERO,
        id: 0,
    }
}

#[async_trait]
impl RemoteCaller for MockChain {
    async fn call(&self, target: Address, calldata: Bytes) -> Result<Bytes> {
        self.answer(target, &calldata).map(Bytes::from)
    }

    async fn aggregate(&self, calls: Vec<(Address, Bytes)>) -> Result<Vec<Bytes>> {
        calls
            .iter()
            .map(|(target, data)| self.answer(*target, data).map(Bytes::from))
            .collect()
    }
}

/// Wraps a caller and drops the last result of every batch
pub struct ShortBatches<C>(pub C);

#[async_trait]
impl<C: RemoteCaller> RemoteCaller for ShortBatches<C> {
    async fn call(&self, target: Address, calldata: Bytes) -> Result<Bytes> {
        self.0.call(target, calldata).await
    }

    async fn aggregate(&self, calls: Vec<(Address, Bytes)>) -> Result<Vec<Bytes>> {
        let mut out = self.0.aggregate(calls).await?;
        out.pop();
        Ok(out)
    }
}

/// Fixed quotes; remembers every id it was asked for
#[derive(Default)]
pub struct MockPrices {
    prices: HashMap<String, f64>,
    requested: Mutex<Vec<CoinId>>,
}

impl MockPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: CoinId, price: f64) -> Self {
        self.prices.insert(id.key(), price);
        self
    }

    pub fn requested(&self) -> Vec<CoinId> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn current_prices(&self, coins: &[CoinId]) -> Result<PriceQuotes> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.extend_from_slice(coins);
        }

        let mut quotes = PriceQuotes::new();
        for id in coins {
            if let Some(price) = self.prices.get(&id.key()) {
                quotes.insert(&id.key(), *price);
            }
        }
        Ok(quotes)
    }
}
