use log::{info, warn};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use crate::error::FlashCliError;

/// Simulates the assembled transaction and only submits on success. A
/// failed simulation surfaces the runtime logs and never reaches the
/// cluster; submission cost is only paid for transactions that pass.
pub async fn simulate_and_send(
    rpc: &RpcClient,
    transaction: &VersionedTransaction,
) -> Result<Signature, FlashCliError> {
    let simulation = rpc.simulate_transaction(transaction).await?;
    if let Some(err) = simulation.value.err {
        let logs = simulation.value.logs.unwrap_or_default();
        for line in &logs {
            warn!("simulation: {line}");
        }
        return Err(FlashCliError::SimulationFailed {
            err: err.to_string(),
            logs,
        });
    }
    info!("simulation passed, submitting");
    Ok(rpc.send_and_confirm_transaction(transaction).await?)
}
