use alloy_primitives::U256;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::blockchain::units::{parse_hex_u256, parse_hex_u64, strip_hex_prefix};
use crate::error::RpcError;
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::RawLog;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    #[serde(default = "zero_quantity")]
    value: String,
    #[serde(default)]
    input: String,
    gas_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: String,
    gas_used: String,
    effective_gas_price: Option<String>,
    status: Option<String>,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
    log_index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    timestamp: String,
}

fn zero_quantity() -> String {
    "0x0".to_string()
}

/// Transaction as returned by `eth_getTransactionByHash`
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: U256,
    pub input: String,
    pub gas_price: Option<U256>,
}

impl Transaction {
    /// True when the transaction carries calldata
    pub fn has_payload(&self) -> bool {
        !strip_hex_prefix(self.input.trim()).is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub effective_gas_price: Option<U256>,
    pub success: bool,
    pub logs: Vec<RawLog>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub timestamp: u64,
}

/// JSON-RPC client bound to a single upstream endpoint
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl RpcClient {
    /// Bind to `endpoint` over a shared HTTP client (its timeout applies to every request)
    pub fn with_client(client: Client, endpoint: String, timeout: Duration) -> Self {
        LogContext::new("rpc_client", "initialization")
            .with_endpoint(&endpoint)
            .with_metadata("timeout_seconds", json!(timeout.as_secs()))
            .debug("Initializing RPC client");

        Self {
            client,
            endpoint,
            timeout_seconds: timeout.as_secs(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", method))
            .with_metadata("endpoint", json!(self.endpoint));

        let result = self.send(method, params).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, &self.endpoint, duration, result.is_ok());

        result
    }

    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::from_transport(e, self.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RpcError::from_transport(e, self.timeout_seconds))?;
        let rpc_response: JsonRpcResponse = serde_json::from_str(&body)?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }

    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let result = self.make_request("eth_blockNumber", vec![]).await?;
        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Block number is not a string".to_string()))?;
        parse_hex_u64(hex_string).map_err(RpcError::InvalidResponse)
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<Option<Transaction>, RpcError> {
        let result = self
            .make_request("eth_getTransactionByHash", vec![json!(hash)])
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let raw: RpcTransaction = serde_json::from_value(result)?;
        Ok(Some(Transaction {
            hash: raw.hash,
            from: raw.from,
            to: raw.to,
            value: parse_hex_u256(&raw.value).map_err(RpcError::InvalidResponse)?,
            input: raw.input,
            gas_price: raw
                .gas_price
                .as_deref()
                .map(parse_hex_u256)
                .transpose()
                .map_err(RpcError::InvalidResponse)?,
        }))
    }

    pub async fn get_receipt(&self, hash: &str) -> Result<Option<Receipt>, RpcError> {
        let result = self
            .make_request("eth_getTransactionReceipt", vec![json!(hash)])
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let raw: RpcReceipt = serde_json::from_value(result)?;
        parse_receipt(raw).map(Some)
    }

    pub async fn get_block(&self, block_number: u64) -> Result<Option<Block>, RpcError> {
        let params = vec![json!(format!("0x{:x}", block_number)), json!(false)];
        let result = self.make_request("eth_getBlockByNumber", params).await?;
        if result.is_null() {
            return Ok(None);
        }

        let raw: RpcBlock = serde_json::from_value(result)?;
        Ok(Some(Block {
            timestamp: parse_hex_u64(&raw.timestamp).map_err(RpcError::InvalidResponse)?,
        }))
    }

    /// `eth_call` against the latest block; returns the raw hex output
    pub async fn call(&self, to: &str, data: &str) -> Result<String, RpcError> {
        let params = vec![json!({ "to": to, "data": data }), json!("latest")];
        let result = self.make_request("eth_call", params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::InvalidResponse("eth_call result is not a string".to_string()))
    }
}

fn parse_receipt(raw: RpcReceipt) -> Result<Receipt, RpcError> {
    let block_number = parse_hex_u64(&raw.block_number).map_err(RpcError::InvalidResponse)?;

    let mut logs = Vec::with_capacity(raw.logs.len());
    for (position, log) in raw.logs.into_iter().enumerate() {
        let log_index = match log.log_index.as_deref() {
            Some(index) => parse_hex_u64(index)
                .map_err(RpcError::InvalidResponse)
                .and_then(|index| log_index_u32(index as u128))?,
            None => log_index_u32(position as u128)?,
        };
        logs.push(RawLog {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number,
            transaction_hash: raw.transaction_hash.clone(),
            log_index,
        });
    }

    let success = match raw.status.as_deref() {
        Some(status) => parse_hex_u64(status).map_err(RpcError::InvalidResponse)? == 1,
        None => false,
    };

    Ok(Receipt {
        transaction_hash: raw.transaction_hash,
        block_number,
        gas_used: parse_hex_u64(&raw.gas_used).map_err(RpcError::InvalidResponse)?,
        effective_gas_price: raw
            .effective_gas_price
            .as_deref()
            .map(parse_hex_u256)
            .transpose()
            .map_err(RpcError::InvalidResponse)?,
        success,
        logs,
    })
}

fn log_index_u32(index: u128) -> Result<u32, RpcError> {
    u32::try_from(index).map_err(|_| RpcError::InvalidResponse(format!("log index {} out of range", index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_blockNumber",
            params: vec![],
            id: 1,
        };

        let serialized = serde_json::to_string(&request).unwrap();
        let expected = r#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}"#;
        assert_eq!(serialized, expected);
    }

    #[test]
    fn test_json_rpc_response_null_result() {
        let response: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":null,"id":1}"#).unwrap();
        assert!(response.result.is_null());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_json_rpc_response_deserialization_error() {
        let response_json =
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":1}"#;
        let response: JsonRpcResponse = serde_json::from_str(response_json).unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found");
    }

    #[test]
    fn test_transaction_payload_detection() {
        let mut tx = Transaction {
            hash: "0xabc".to_string(),
            from: "0x1".to_string(),
            to: Some("0x2".to_string()),
            value: U256::ZERO,
            input: "0x".to_string(),
            gas_price: None,
        };
        assert!(!tx.has_payload());

        tx.input = "0xa9059cbb".to_string();
        assert!(tx.has_payload());
    }

    #[test]
    fn test_rpc_transaction_defaults() {
        let raw: RpcTransaction = serde_json::from_value(json!({
            "hash": "0xabc",
            "from": "0x1111111111111111111111111111111111111111",
            "to": null,
            "input": "0x6080",
            "blockNumber": "0x10"
        }))
        .unwrap();

        assert_eq!(raw.input, "0x6080");
        assert_eq!(raw.value, "0x0");
        assert!(raw.to.is_none());
    }

    #[test]
    fn test_rpc_client_creation() {
        let client = RpcClient::with_client(
            Client::new(),
            "https://polygon-rpc.com/".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(client.endpoint(), "https://polygon-rpc.com/");
        assert_eq!(client.timeout_seconds, 5);
    }

    fn raw_receipt(logs: Value) -> RpcReceipt {
        serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x64",
            "gasUsed": "0x5208",
            "status": "0x1",
            "logs": logs
        }))
        .unwrap()
    }

    #[test]
    fn test_receipt_log_indices() {
        let receipt = parse_receipt(raw_receipt(json!([
            { "address": "0x1", "topics": [], "data": "0x", "logIndex": "0x7" },
            { "address": "0x2", "topics": [], "data": "0x" }
        ])))
        .unwrap();

        assert_eq!(receipt.block_number, 100);
        assert!(receipt.success);
        assert_eq!(receipt.logs[0].log_index, 7);
        // Missing index falls back to the position in the receipt
        assert_eq!(receipt.logs[1].log_index, 1);
        assert_eq!(receipt.logs[1].transaction_hash, "0xabc");
    }

    #[test]
    fn test_receipt_log_index_out_of_range() {
        let err = parse_receipt(raw_receipt(json!([
            { "address": "0x1", "topics": [], "data": "0x", "logIndex": "0x100000000" }
        ])))
        .unwrap_err();

        assert!(matches!(err, RpcError::InvalidResponse(_)), "{}", err);
    }
}
