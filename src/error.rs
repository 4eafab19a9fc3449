use thiserror::Error;

/// Errors from the JSON-RPC chain client.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Block not found: {height}")]
    BlockNotFound { height: u64 },

    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by the block-polling loop.
///
/// Only the startup path returns these to the caller: a chain-config fetch
/// failure before the first iteration is fatal. Everything the loop hits
/// afterwards is logged and retried in place, never escalated.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("chain config unavailable at startup: {0}")]
    Startup(#[source] RpcError),
}

/// HTTP API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Server error: {0}")]
    Server(String),
}
