use solana_client::client_error::ClientError;
use solana_sdk::message::CompileError;
use solana_sdk::signer::SignerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlashCliError {
    #[error("router returned an error instead of a route: {0}")]
    RouteUnavailable(String),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("KEYPAIR is not a valid base58-encoded keypair")]
    InvalidKeypair,
    #[error("malformed instruction payload: {0}")]
    MalformedInstruction(String),
    #[error("simulation failed: {err}")]
    SimulationFailed { err: String, logs: Vec<String> },
    #[error("rpc error: {0}")]
    Rpc(#[from] ClientError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("message compilation failed: {0}")]
    Compile(#[from] CompileError),
    #[error("signing failed: {0}")]
    Signer(#[from] SignerError),
}
