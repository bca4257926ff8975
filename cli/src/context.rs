use std::env;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::Keypair;

use crate::error::FlashCliError;

/// Environment-backed run context: RPC connection, payer keypair, HTTP
/// client for the routing service. `RPC_URL` and `KEYPAIR` (base58 secret
/// key) are required; `ROUTER_URL` overrides the per-script default.
pub struct CliContext {
    pub rpc: RpcClient,
    pub http: reqwest::Client,
    pub payer: Keypair,
    pub router_url: String,
}

impl CliContext {
    pub fn from_env(default_router_url: &str) -> Result<Self, FlashCliError> {
        let rpc_url = env::var("RPC_URL").map_err(|_| FlashCliError::MissingEnv("RPC_URL"))?;
        let secret = env::var("KEYPAIR").map_err(|_| FlashCliError::MissingEnv("KEYPAIR"))?;
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|_| FlashCliError::InvalidKeypair)?;
        let payer =
            Keypair::try_from(bytes.as_slice()).map_err(|_| FlashCliError::InvalidKeypair)?;
        let router_url =
            env::var("ROUTER_URL").unwrap_or_else(|_| default_router_url.to_string());
        Ok(Self {
            rpc: RpcClient::new(rpc_url),
            http: reqwest::Client::new(),
            payer,
            router_url,
        })
    }
}
