use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;

use crate::error::FlashCliError;

/// Account reference inside a routing-service instruction payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetaPayload {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Instruction payload as the routing service ships it: base58 program id,
/// account refs, base64 data. Converted to a native instruction exactly
/// once, at the assembler boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionPayload {
    pub program_id: String,
    pub accounts: Vec<AccountMetaPayload>,
    pub data: String,
}

/// Full route descriptor from the `swap-instructions` endpoint. The cleanup
/// slot is null when the route needs no teardown.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    #[serde(default)]
    pub compute_budget_instructions: Vec<InstructionPayload>,
    #[serde(default)]
    pub setup_instructions: Vec<InstructionPayload>,
    pub swap_instruction: InstructionPayload,
    #[serde(default)]
    pub cleanup_instruction: Option<InstructionPayload>,
    #[serde(default)]
    pub address_lookup_table_addresses: Vec<String>,
}

/// Bare swap instruction from the older `swap-ix` endpoint; the caller
/// interleaves its own setup and cleanup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapIxDescriptor {
    pub swap_instruction: InstructionPayload,
    #[serde(default)]
    pub lookup_table_addresses: Vec<String>,
}

fn reject_route_error(value: Value) -> Result<Value, FlashCliError> {
    if let Some(err) = value.get("error") {
        return Err(FlashCliError::RouteUnavailable(err.to_string()));
    }
    Ok(value)
}

pub async fn quote(
    http: &reqwest::Client,
    base_url: &str,
    input_mint: &Pubkey,
    output_mint: &Pubkey,
    amount: u64,
    slippage_bps: u16,
) -> Result<Value, FlashCliError> {
    let url = format!(
        "{base_url}/quote?inputMint={input_mint}&outputMint={output_mint}&amount={amount}&slippageBps={slippage_bps}"
    );
    debug!("quote request: {url}");
    let value: Value = http.get(&url).send().await?.json().await?;
    reject_route_error(value)
}

pub async fn swap_instructions(
    http: &reqwest::Client,
    base_url: &str,
    user: &Pubkey,
    quote: &Value,
) -> Result<RouteDescriptor, FlashCliError> {
    let body = json!({
        "quoteResponse": quote,
        "userPublicKey": user.to_string(),
    });
    let value: Value = http
        .post(format!("{base_url}/swap-instructions"))
        .json(&body)
        .send()
        .await?
        .json()
        .await?;
    let value = reject_route_error(value)?;
    serde_json::from_value(value).map_err(|e| FlashCliError::MalformedInstruction(e.to_string()))
}

pub async fn swap_instruction(
    http: &reqwest::Client,
    base_url: &str,
    user: &Pubkey,
    source_token_account: &Pubkey,
    destination_token_account: &Pubkey,
    quote: &Value,
) -> Result<SwapIxDescriptor, FlashCliError> {
    let body = json!({
        "quoteResponse": quote,
        "userPublicKey": user.to_string(),
        "sourceTokenAccount": source_token_account.to_string(),
        "destinationTokenAccount": destination_token_account.to_string(),
    });
    let value: Value = http
        .post(format!("{base_url}/swap-ix"))
        .json(&body)
        .send()
        .await?
        .json()
        .await?;
    let value = reject_route_error(value)?;
    serde_json::from_value(value).map_err(|e| FlashCliError::MalformedInstruction(e.to_string()))
}
