//! # Scripted Wallet
//!
//! An in-memory EIP-1193 wallet for tests.
//!
//! It knows a set of chains, exposes configurable accounts, records every
//! request, answers `eth_call` through handlers keyed by contract address and
//! function selector, and mines every `eth_sendTransaction` immediately
//! (optionally after a few empty receipt polls).
//!
//! Notifications are only sent through [`ScriptedWallet::emit_accounts_changed`]
//! and [`ScriptedWallet::emit_chain_changed`]; chain switches are silent.

#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::error::ProviderError;
use crate::events::{ReceiptLog, TransactionReceipt};
use crate::provider::{methods, Eip1193Provider, WalletNotification};

/// Result of a scripted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// Mined successfully with these logs.
    Mined(Vec<ReceiptLog>),
    /// Mined and reverted.
    Reverted,
}

/// One request the wallet received.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// Method name.
    pub method: String,
    /// Raw params.
    pub params: Value,
}

type Selector = [u8; 4];
type CallHandler = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, ProviderError> + Send + Sync>;
type SendHandler = Arc<dyn Fn(&[u8]) -> TxOutcome + Send + Sync>;

struct Transaction {
    to: Address,
    data: Bytes,
}

#[derive(Default)]
struct State {
    authorized: Vec<Address>,
    requestable: Vec<Address>,
    chain_id: String,
    known_chains: HashSet<String>,
    failures: HashMap<String, VecDeque<ProviderError>>,
    requests: Vec<RecordedRequest>,
    call_handlers: HashMap<(Address, Selector), CallHandler>,
    send_handlers: HashMap<(Address, Selector), SendHandler>,
    code: HashSet<Address>,
    transactions: Vec<Transaction>,
    receipts: HashMap<B256, TransactionReceipt>,
    pending_polls: HashMap<B256, u32>,
    receipt_delay: u32,
}

/// Scripted EIP-1193 wallet.
pub struct ScriptedWallet {
    state: Mutex<State>,
    notifications: broadcast::Sender<WalletNotification>,
}

impl Default for ScriptedWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedWallet {
    /// A wallet on the default required chain with no accounts.
    pub fn new() -> Self {
        let (notifications, _) = broadcast::channel(32);
        let chain = monsphere_shared::REQUIRED_CHAIN_ID_HEX.to_string();
        let state = State {
            known_chains: HashSet::from([chain.to_ascii_lowercase()]),
            chain_id: chain,
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
            notifications,
        }
    }

    /// Accounts handed out by `eth_requestAccounts` (not yet authorized).
    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.state.lock().requestable = accounts;
        self
    }

    /// Accounts already authorized, so `eth_accounts` reports them too.
    pub fn with_authorized(self, accounts: Vec<Address>) -> Self {
        {
            let mut state = self.state.lock();
            state.requestable.clone_from(&accounts);
            state.authorized = accounts;
        }
        self
    }

    /// Puts the wallet on `chain_id`, which it then knows.
    pub fn on_chain(self, chain_id: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.known_chains.insert(chain_id.to_ascii_lowercase());
            state.chain_id = chain_id.to_string();
        }
        self
    }

    /// Teaches the wallet `chain_id` without switching to it.
    pub fn knows_chain(self, chain_id: &str) -> Self {
        self.state.lock().known_chains.insert(chain_id.to_ascii_lowercase());
        self
    }

    /// Deploys code at `address` so `eth_getCode` is non-empty.
    pub fn with_code(self, address: Address) -> Self {
        self.state.lock().code.insert(address);
        self
    }

    /// Number of `null` receipt responses before each transaction is mined.
    pub fn with_receipt_delay(self, polls: u32) -> Self {
        self.state.lock().receipt_delay = polls;
        self
    }

    /// Replaces the exposed accounts at runtime.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let mut state = self.state.lock();
        state.requestable.clone_from(&accounts);
        state.authorized = accounts;
    }

    /// Current chain id.
    pub fn chain_id(&self) -> String {
        self.state.lock().chain_id.clone()
    }

    /// Fails the next request for `method` with `error`. Queues stack.
    pub fn fail_next(&self, method: &str, error: ProviderError) {
        self.state
            .lock()
            .failures
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Answers `eth_call`s of `C` to `to`.
    ///
    /// The handler returns ABI-encoded output, usually built with
    /// `C::abi_encode_returns`.
    pub fn on_call<C, F>(&self, to: Address, handler: F)
    where
        C: SolCall + 'static,
        F: Fn(C) -> Vec<u8> + Send + Sync + 'static,
    {
        self.on_call_result::<C, _>(to, move |call| Ok(handler(call)));
    }

    /// Like [`ScriptedWallet::on_call`], but the handler may fail.
    pub fn on_call_result<C, F>(&self, to: Address, handler: F)
    where
        C: SolCall + 'static,
        F: Fn(C) -> Result<Vec<u8>, ProviderError> + Send + Sync + 'static,
    {
        let handler: CallHandler = Arc::new(move |data: &[u8]| {
            let call = C::abi_decode(data, true)
                .map_err(|err| ProviderError::new(ProviderError::INVALID_PARAMS, err.to_string()))?;
            handler(call)
        });
        self.state.lock().call_handlers.insert((to, C::SELECTOR), handler);
    }

    /// Decides the outcome of transactions calling `C` on `to`.
    /// Unscripted transactions are mined with no logs.
    pub fn on_send<C, F>(&self, to: Address, handler: F)
    where
        C: SolCall + 'static,
        F: Fn(C) -> TxOutcome + Send + Sync + 'static,
    {
        let handler: SendHandler = Arc::new(move |data: &[u8]| match C::abi_decode(data, true) {
            Ok(call) => handler(call),
            Err(_) => TxOutcome::Reverted,
        });
        self.state.lock().send_handlers.insert((to, C::SELECTOR), handler);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of requests for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|request| request.method == method)
            .count()
    }

    /// Forgets the request log.
    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    /// Decoded `eth_call`s of `C` made against `to`.
    pub fn calls_to<C: SolCall>(&self, to: Address) -> Vec<C> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|request| request.method == methods::CALL)
            .filter_map(|request| {
                let tx = &request.params[0];
                let target: Address = serde_json::from_value(tx["to"].clone()).ok()?;
                let data: Bytes = serde_json::from_value(tx["data"].clone()).ok()?;
                (target == to).then(|| C::abi_decode(&data, true).ok()).flatten()
            })
            .collect()
    }

    /// Decoded transactions calling `C` sent to `to`, in order.
    pub fn sent<C: SolCall>(&self, to: Address) -> Vec<C> {
        self.state
            .lock()
            .transactions
            .iter()
            .filter(|tx| tx.to == to)
            .filter_map(|tx| C::abi_decode(&tx.data, true).ok())
            .collect()
    }

    /// Number of transactions sent.
    pub fn transaction_count(&self) -> usize {
        self.state.lock().transactions.len()
    }

    /// Pushes an `accountsChanged` notification.
    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        self.set_accounts(accounts.clone());
        let _ = self
            .notifications
            .send(WalletNotification::AccountsChanged(accounts));
    }

    /// Pushes a `chainChanged` notification.
    pub fn emit_chain_changed(&self, chain_id: &str) {
        self.state.lock().chain_id = chain_id.to_string();
        let _ = self
            .notifications
            .send(WalletNotification::ChainChanged(chain_id.to_string()));
    }

    /// Number of live notification listeners.
    pub fn listener_count(&self) -> usize {
        self.notifications.receiver_count()
    }

    fn handle(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            params: params.clone(),
        });
        if let Some(error) = state.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(error);
        }

        match method {
            methods::ACCOUNTS => Ok(json!(state.authorized)),
            methods::REQUEST_ACCOUNTS => {
                state.authorized = state.requestable.clone();
                Ok(json!(state.authorized))
            }
            methods::CHAIN_ID => Ok(json!(state.chain_id)),
            methods::SWITCH_CHAIN => {
                let chain_id = chain_param(params)?;
                if !state.known_chains.contains(&chain_id.to_ascii_lowercase()) {
                    return Err(ProviderError::new(
                        ProviderError::UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{chain_id}\"."),
                    ));
                }
                state.chain_id = chain_id;
                Ok(Value::Null)
            }
            methods::ADD_CHAIN => {
                let chain_id = chain_param(params)?;
                state.known_chains.insert(chain_id.to_ascii_lowercase());
                Ok(Value::Null)
            }
            methods::GET_CODE => {
                let address: Address = param(&params[0])?;
                let code = if state.code.contains(&address) {
                    Bytes::from_static(&[0x60, 0x80, 0x60, 0x40])
                } else {
                    Bytes::new()
                };
                Ok(json!(code))
            }
            methods::CALL => {
                let to: Address = param(&params[0]["to"])?;
                let data: Bytes = param(&params[0]["data"])?;
                let handler = data
                    .get(..4)
                    .and_then(|selector| <Selector>::try_from(selector).ok())
                    .and_then(|selector| state.call_handlers.get(&(to, selector)).cloned());
                drop(state);
                let handler = handler.ok_or_else(|| ProviderError::new(-32000, "execution reverted"))?;
                Ok(json!(Bytes::from(handler(&data[..])?)))
            }
            methods::SEND_TRANSACTION => {
                let from: Address = param(&params[0]["from"])?;
                if !state.authorized.contains(&from) {
                    return Err(ProviderError::new(
                        ProviderError::UNAUTHORIZED,
                        "The requested account has not been authorized by the user.",
                    ));
                }
                let to: Address = param(&params[0]["to"])?;
                let data: Bytes = param(&params[0]["data"])?;
                let outcome = data
                    .get(..4)
                    .and_then(|selector| <Selector>::try_from(selector).ok())
                    .and_then(|selector| state.send_handlers.get(&(to, selector)).cloned())
                    .map_or(TxOutcome::Mined(Vec::new()), |handler| handler(&data[..]));

                state.transactions.push(Transaction { to, data });
                let nonce = state.transactions.len() as u64;
                let hash = B256::from(U256::from(nonce).to_be_bytes::<32>());
                let (status, logs) = match outcome {
                    TxOutcome::Mined(logs) => (1u64, logs),
                    TxOutcome::Reverted => (0u64, Vec::new()),
                };
                state.receipts.insert(
                    hash,
                    TransactionReceipt {
                        transaction_hash: hash,
                        block_number: Some(U64::from(nonce)),
                        status: Some(U64::from(status)),
                        logs,
                    },
                );
                let delay = state.receipt_delay;
                state.pending_polls.insert(hash, delay);
                Ok(json!(hash))
            }
            methods::GET_RECEIPT => {
                let hash: B256 = param(&params[0])?;
                if let Some(remaining) = state.pending_polls.get_mut(&hash) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Ok(Value::Null);
                    }
                }
                Ok(state.receipts.get(&hash).map_or(Value::Null, |receipt| json!(receipt)))
            }
            other => Err(ProviderError::new(
                ProviderError::UNSUPPORTED_METHOD,
                format!("The method \"{other}\" is not supported."),
            )),
        }
    }
}

fn param<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, ProviderError> {
    serde_json::from_value(value.clone())
        .map_err(|err| ProviderError::new(ProviderError::INVALID_PARAMS, err.to_string()))
}

fn chain_param(params: &Value) -> Result<String, ProviderError> {
    param(&params[0]["chainId"])
}

#[async_trait]
impl Eip1193Provider for ScriptedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.handle(method, &params)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletNotification> {
        self.notifications.subscribe()
    }
}
