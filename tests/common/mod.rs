#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use transfer_validator::blockchain::{ChainReader, EndpointPool, PoolConfig, TransactionValidator};
use transfer_validator::config::TokenConfig;
use std::sync::Arc;

pub const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
pub const USDT: &str = "0xc2132d05d31c914a87c6611c10748aeb04b58e8f";
pub const USDC: &str = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174";
pub const SENDER: &str = "0xf977814e90da44bfa03b6295a0616a897441acec";
pub const WALLET: &str = "0x1234567890123456789012345678901234567890";
pub const OTHER_WALLET: &str = "0x9999999999999999999999999999999999999999";

pub const SYMBOL_SELECTOR: &str = "0x95d89b41";
pub const DECIMALS_SELECTOR: &str = "0x313ce567";

/// In-memory chain answering JSON-RPC requests
#[derive(Clone, Default)]
pub struct FakeChain {
    pub head: u64,
    transactions: HashMap<String, Value>,
    receipts: HashMap<String, Value>,
    blocks: HashMap<u64, Value>,
    calls: HashMap<(String, String), Result<String, String>>,
}

impl FakeChain {
    pub fn new(head: u64) -> Self {
        Self {
            head,
            ..Default::default()
        }
    }

    pub fn with_transaction(mut self, tx: Value) -> Self {
        let hash = tx["hash"].as_str().unwrap_or_default().to_lowercase();
        self.transactions.insert(hash, tx);
        self
    }

    pub fn with_receipt(mut self, receipt: Value) -> Self {
        let hash = receipt["transactionHash"].as_str().unwrap_or_default().to_lowercase();
        self.receipts.insert(hash, receipt);
        self
    }

    pub fn with_block(mut self, number: u64, timestamp: u64) -> Self {
        self.blocks.insert(
            number,
            json!({
                "number": format!("0x{:x}", number),
                "hash": format!("0x{:064x}", number),
                "timestamp": format!("0x{:x}", timestamp),
            }),
        );
        self
    }

    /// Register a token answering `symbol()` and `decimals()`
    pub fn with_token(mut self, address: &str, symbol: &str, decimals: u8) -> Self {
        let address = address.to_lowercase();
        self.calls
            .insert((address.clone(), SYMBOL_SELECTOR.to_string()), Ok(abi_string(symbol)));
        self.calls.insert(
            (address, DECIMALS_SELECTOR.to_string()),
            Ok(format!("0x{:064x}", decimals)),
        );
        self
    }

    /// Register a contract whose view calls revert
    pub fn with_reverting_contract(mut self, address: &str) -> Self {
        let address = address.to_lowercase();
        for selector in [SYMBOL_SELECTOR, DECIMALS_SELECTOR] {
            self.calls.insert(
                (address.clone(), selector.to_string()),
                Err("execution reverted".to_string()),
            );
        }
        self
    }

    pub fn respond(&self, request: &Value) -> Value {
        let id = request["id"].clone();
        let params = &request["params"];
        let key = |index: usize| params[index].as_str().unwrap_or_default().to_lowercase();

        let result = match request["method"].as_str().unwrap_or_default() {
            "eth_blockNumber" => Ok(json!(format!("0x{:x}", self.head))),
            "eth_getTransactionByHash" => Ok(self.transactions.get(&key(0)).cloned().unwrap_or(Value::Null)),
            "eth_getTransactionReceipt" => Ok(self.receipts.get(&key(0)).cloned().unwrap_or(Value::Null)),
            "eth_getBlockByNumber" => {
                let number = u64::from_str_radix(key(0).trim_start_matches("0x"), 16).unwrap_or(u64::MAX);
                Ok(self.blocks.get(&number).cloned().unwrap_or(Value::Null))
            }
            "eth_call" => {
                let to = params[0]["to"].as_str().unwrap_or_default().to_lowercase();
                let data = params[0]["data"].as_str().unwrap_or_default().to_lowercase();
                match self.calls.get(&(to, data)) {
                    Some(Ok(output)) => Ok(json!(output)),
                    Some(Err(message)) => Err(message.clone()),
                    None => Ok(json!("0x")),
                }
            }
            other => Err(format!("method {} not supported", other)),
        };

        match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(message) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": 3, "message": message },
            }),
        }
    }

    pub async fn serve(self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(move |req: &Request| match req.body_json::<Value>() {
                Ok(body) => ResponseTemplate::new(200).set_body_json(self.respond(&body)),
                Err(_) => ResponseTemplate::new(400),
            })
            .mount(&server)
            .await;
        server
    }
}

/// Server answering every request with the given HTTP status
pub async fn failing_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// Server answering `eth_blockNumber` only after `delay`
pub async fn slow_server(head: u64, delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": format!("0x{:x}", head) }))
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

pub fn pool_config(urls: Vec<String>) -> PoolConfig {
    PoolConfig {
        endpoints: urls,
        max_failures: 3,
        max_attempts: 3,
        probe_interval: Duration::from_secs(3600),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn validator_for(urls: Vec<String>) -> TransactionValidator {
    let pool = Arc::new(EndpointPool::new(pool_config(urls)).expect("pool"));
    TransactionValidator::new(ChainReader::new(pool), &TokenConfig::default())
}

pub fn abi_string(value: &str) -> String {
    let mut data = hex::encode(value.as_bytes());
    let padded_len = ((data.len() + 63) / 64).max(1) * 64;
    data.extend(std::iter::repeat('0').take(padded_len - data.len()));
    format!("0x{:064x}{:064x}{}", 32, value.len(), data)
}

pub fn address_topic(address: &str) -> String {
    format!("0x000000000000000000000000{}", address.trim_start_matches("0x").to_lowercase())
}

pub fn transfer_log(contract: &str, from: &str, to: &str, value: u128, log_index: u64) -> Value {
    json!({
        "address": contract,
        "topics": [TRANSFER_TOPIC, address_topic(from), address_topic(to)],
        "data": format!("0x{:064x}", value),
        "logIndex": format!("0x{:x}", log_index),
    })
}

pub fn tx_hash(n: u64) -> String {
    format!("0x{:064x}", n)
}

pub fn transaction(hash: &str, from: &str, to: Option<&str>, value: u128, input: &str, block: u64) -> Value {
    json!({
        "hash": hash,
        "from": from,
        "to": to,
        "value": format!("0x{:x}", value),
        "input": input,
        "gasPrice": "0x6fc23ac00",
        "blockNumber": format!("0x{:x}", block),
    })
}

pub fn receipt(hash: &str, block: u64, gas_used: u64, status: u64, logs: Vec<Value>) -> Value {
    json!({
        "transactionHash": hash,
        "blockNumber": format!("0x{:x}", block),
        "gasUsed": format!("0x{:x}", gas_used),
        "effectiveGasPrice": "0x6fc23ac00",
        "status": format!("0x{:x}", status),
        "logs": logs,
    })
}
