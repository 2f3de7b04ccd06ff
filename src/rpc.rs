//! Remote-call transport - MULTICALL3 Edition
//!
//! `RemoteCaller` is the seam every contract read goes through. The production
//! implementation batches calls through Multicall3 so one market list costs a
//! handful of `eth_call`s instead of one per market.
//!
//! Batches are all-or-nothing: `allowFailure` is off, so any reverted call
//! fails the whole batch and with it the chain pipeline that issued it.

use alloy_primitives::{address, Address, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, trace};

// ============================================
// MULTICALL3 INTERFACE
// ============================================

sol! {
    /// Multicall3 - deployed at same address on all EVM chains
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external payable returns (Result[] memory returnData);
    }
}

/// Multicall3 address (same on all EVM chains)
pub const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Maximum calls per batch (to avoid gas limits)
pub const DEFAULT_MAX_CALLS_PER_BATCH: usize = 100;

// ============================================
// TRANSPORT SEAM
// ============================================

/// Resolves raw contract calls on one chain.
///
/// `aggregate` must return exactly one result per call, in input order.
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    async fn call(&self, target: Address, calldata: Bytes) -> Result<Bytes>;

    async fn aggregate(&self, calls: Vec<(Address, Bytes)>) -> Result<Vec<Bytes>>;
}

/// Single-call helper: encode, call, decode.
pub async fn call<C: SolCall>(rpc: &dyn RemoteCaller, target: Address, call: C) -> Result<C::Return> {
    let raw = rpc.call(target, call.abi_encode().into()).await?;

    C::abi_decode_returns(&raw)
        .wrap_err_with(|| format!("Failed to decode {} from {:?}", C::SIGNATURE, target))
}

/// Batched helper: one decoded return per `(target, call)`, same order.
pub async fn batch<C: SolCall>(
    rpc: &dyn RemoteCaller,
    calls: Vec<(Address, C)>,
) -> Result<Vec<C::Return>> {
    let expected = calls.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let encoded: Vec<(Address, Bytes)> = calls
        .into_iter()
        .map(|(target, c)| (target, Bytes::from(c.abi_encode())))
        .collect();
    let targets: Vec<Address> = encoded.iter().map(|(t, _)| *t).collect();

    let raw = rpc.aggregate(encoded).await?;
    if raw.len() != expected {
        return Err(eyre!(
            "{}: batch returned {} results for {} calls",
            C::SIGNATURE,
            raw.len(),
            expected
        ));
    }

    debug!("{}: {} calls decoded", C::SIGNATURE, expected);

    raw.iter()
        .zip(targets)
        .map(|(data, target)| {
            C::abi_decode_returns(data)
                .wrap_err_with(|| format!("Failed to decode {} from {:?}", C::SIGNATURE, target))
        })
        .collect()
}

/// Attach each batch value to the market it was fetched for.
///
/// Later joins go through the key, so a short or padded batch surfaces here
/// instead of silently shifting every market after it.
pub fn keyed<T>(markets: &[Address], values: Vec<T>) -> Result<HashMap<Address, T>> {
    if markets.len() != values.len() {
        return Err(eyre!(
            "{} values for {} markets",
            values.len(),
            markets.len()
        ));
    }

    let map: HashMap<Address, T> = markets.iter().copied().zip(values).collect();
    if map.len() != markets.len() {
        return Err(eyre!(
            "{} distinct markets in a list of {}",
            map.len(),
            markets.len()
        ));
    }

    Ok(map)
}

// ============================================
// JSON-RPC + MULTICALL3 IMPLEMENTATION
// ============================================

pub struct RpcCaller {
    rpc_url: String,
    provider: DynProvider,
    max_calls_per_batch: usize,
}

impl RpcCaller {
    pub fn new(rpc_url: String, max_calls_per_batch: usize) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.parse().wrap_err_with(|| format!("Invalid RPC URL {}", rpc_url))?)
            .erased();

        Ok(Self {
            rpc_url,
            provider,
            max_calls_per_batch: max_calls_per_batch.max(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Execute a Multicall3 batch
    async fn execute_multicall(&self, calls: Vec<IMulticall3::Call3>) -> Result<Vec<IMulticall3::Result>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let calldata = IMulticall3::aggregate3Call { calls }.abi_encode();

        let tx = TransactionRequest::default()
            .to(MULTICALL3)
            .input(calldata.into());

        let result = self.provider.call(tx).await
            .map_err(|e| eyre!("Multicall3 failed: {}", e))?;

        let decoded = IMulticall3::aggregate3Call::abi_decode_returns(&result)
            .map_err(|e| eyre!("Failed to decode multicall result: {}", e))?;

        Ok(decoded)
    }
}

#[async_trait]
impl RemoteCaller for RpcCaller {
    async fn call(&self, target: Address, calldata: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .to(target)
            .input(calldata.into());

        self.provider.call(tx).await
            .map_err(|e| eyre!("eth_call to {:?} failed: {}", target, e))
    }

    async fn aggregate(&self, calls: Vec<(Address, Bytes)>) -> Result<Vec<Bytes>> {
        aggregate_chunked(&calls, self.max_calls_per_batch, |call3s| self.execute_multicall(call3s)).await
    }
}

/// Send `calls` through `execute` in chunks of at most `max_calls`.
///
/// Chunks run in order and are concatenated in order.
async fn aggregate_chunked<F, Fut>(
    calls: &[(Address, Bytes)],
    max_calls: usize,
    execute: F,
) -> Result<Vec<Bytes>>
where
    F: Fn(Vec<IMulticall3::Call3>) -> Fut,
    Fut: Future<Output = Result<Vec<IMulticall3::Result>>>,
{
    let mut out = Vec::with_capacity(calls.len());

    for (chunk_idx, chunk) in calls.chunks(max_calls.max(1)).enumerate() {
        let call3s: Vec<IMulticall3::Call3> = chunk
            .iter()
            .map(|(target, data)| IMulticall3::Call3 {
                target: *target,
                allowFailure: false,
                callData: data.clone(),
            })
            .collect();

        let results = execute(call3s).await?;
        append_chunk(chunk_idx, chunk, results, &mut out)?;

        trace!("Multicall3 chunk {}: {} calls", chunk_idx, chunk.len());
    }

    Ok(out)
}

/// One chunk's return data onto `out`; a short chunk or any revert fails the batch
fn append_chunk(
    chunk_idx: usize,
    chunk: &[(Address, Bytes)],
    results: Vec<IMulticall3::Result>,
    out: &mut Vec<Bytes>,
) -> Result<()> {
    if results.len() != chunk.len() {
        return Err(eyre!(
            "Multicall3 chunk {} returned {} results for {} calls",
            chunk_idx,
            results.len(),
            chunk.len()
        ));
    }

    for (result, (target, _)) in results.into_iter().zip(chunk) {
        if !result.success {
            return Err(eyre!("Call to {:?} reverted inside Multicall3", target));
        }
        out.push(result.returnData);
    }

    Ok(())
}
