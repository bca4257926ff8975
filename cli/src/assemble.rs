use std::str::FromStr;

use anchor_lang::{InstructionData, ToAccountMetas};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::state::AddressLookupTable;
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use solana_sdk::{system_program, sysvar};

use crate::error::FlashCliError;
use crate::router::InstructionPayload;

pub fn pool_authority() -> Pubkey {
    Pubkey::find_program_address(&[flash_pool::POOL_AUTHORITY_SEED], &flash_pool::ID).0
}

pub fn withdraw_instruction(borrower: &Pubkey, amount: u64) -> Instruction {
    Instruction {
        program_id: flash_pool::ID,
        accounts: flash_pool::accounts::Withdraw {
            borrower: *borrower,
            pool_authority: pool_authority(),
            instructions: sysvar::instructions::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: flash_pool::instruction::Withdraw { amount }.data(),
    }
}

pub fn repay_instruction(borrower: &Pubkey, amount: u64) -> Instruction {
    Instruction {
        program_id: flash_pool::ID,
        accounts: flash_pool::accounts::Repay {
            borrower: *borrower,
            pool_authority: pool_authority(),
            instructions: sysvar::instructions::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: flash_pool::instruction::Repay { amount }.data(),
    }
}

fn parse_pubkey(raw: &str) -> Result<Pubkey, FlashCliError> {
    Pubkey::from_str(raw).map_err(|_| FlashCliError::MalformedInstruction(format!("bad pubkey: {raw}")))
}

/// Converts a routing-service payload into a native instruction. Runs once
/// per payload, before anything enters the transaction.
pub fn payload_to_instruction(payload: &InstructionPayload) -> Result<Instruction, FlashCliError> {
    let program_id = parse_pubkey(&payload.program_id)?;
    let accounts = payload
        .accounts
        .iter()
        .map(|meta| {
            Ok(AccountMeta {
                pubkey: parse_pubkey(&meta.pubkey)?,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
        })
        .collect::<Result<Vec<_>, FlashCliError>>()?;
    let data = BASE64
        .decode(&payload.data)
        .map_err(|e| FlashCliError::MalformedInstruction(e.to_string()))?;
    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

pub fn payloads_to_instructions(
    payloads: &[InstructionPayload],
) -> Result<Vec<Instruction>, FlashCliError> {
    payloads.iter().map(payload_to_instruction).collect()
}

/// Orders the full list: compute budget, exactly one withdraw, setup, the
/// swap, optional cleanup, exactly one repay. A `None` cleanup drops out
/// without leaving a hole.
pub fn build_flash_instructions(
    borrower: &Pubkey,
    borrow_lamports: u64,
    compute_budget: Vec<Instruction>,
    setup: Vec<Instruction>,
    swap: Instruction,
    cleanup: Option<Instruction>,
) -> Vec<Instruction> {
    let mut instructions = compute_budget;
    instructions.push(withdraw_instruction(borrower, borrow_lamports));
    instructions.extend(setup);
    instructions.push(swap);
    instructions.extend(cleanup);
    instructions.push(repay_instruction(borrower, borrow_lamports));
    instructions
}

/// Fetches and deserializes lookup tables. Tables that are missing or fail
/// to deserialize are dropped with a warning; the transaction proceeds with
/// whatever compaction is achievable.
pub async fn resolve_lookup_tables(
    rpc: &RpcClient,
    addresses: &[String],
) -> Result<Vec<AddressLookupTableAccount>, FlashCliError> {
    let keys = addresses
        .iter()
        .map(|a| parse_pubkey(a))
        .collect::<Result<Vec<_>, _>>()?;
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let infos = rpc.get_multiple_accounts(&keys).await?;
    Ok(collect_lookup_tables(&keys, &infos))
}

pub fn collect_lookup_tables(
    keys: &[Pubkey],
    infos: &[Option<Account>],
) -> Vec<AddressLookupTableAccount> {
    keys.iter()
        .zip(infos)
        .filter_map(|(key, info)| {
            let info = match info {
                Some(info) => info,
                None => {
                    warn!("lookup table {key} not found, dropping");
                    return None;
                }
            };
            match AddressLookupTable::deserialize(&info.data) {
                Ok(table) => Some(AddressLookupTableAccount {
                    key: *key,
                    addresses: table.addresses.to_vec(),
                }),
                Err(err) => {
                    warn!("lookup table {key} failed to deserialize ({err:?}), dropping");
                    None
                }
            }
        })
        .collect()
}

pub fn compile_transaction(
    payer: &Keypair,
    instructions: &[Instruction],
    tables: &[AddressLookupTableAccount],
    blockhash: Hash,
) -> Result<VersionedTransaction, FlashCliError> {
    let message = v0::Message::try_compile(&payer.pubkey(), instructions, tables, blockhash)?;
    Ok(VersionedTransaction::try_new(
        VersionedMessage::V0(message),
        &[payer],
    )?)
}
