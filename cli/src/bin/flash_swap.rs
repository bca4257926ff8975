use anyhow::Result;
use log::info;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token::native_mint;

use flash_cli::{assemble, context::CliContext, router, submit};

const ROUTER_URL: &str = "https://quote-api.jup.ag/beta";
const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
const SWAP_AMOUNT: u64 = 1_000_000; // 1 USDC
const SLIPPAGE_BPS: u16 = 50;
const COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let ctx = CliContext::from_env(ROUTER_URL)?;
    let borrower = ctx.payer.pubkey();
    let source_account = get_associated_token_address(&borrower, &USDC_MINT);
    let wsol_account = get_associated_token_address(&borrower, &native_mint::ID);
    info!("borrower {borrower}");
    info!("pool authority {}", assemble::pool_authority());

    let quote = router::quote(
        &ctx.http,
        &ctx.router_url,
        &USDC_MINT,
        &native_mint::ID,
        SWAP_AMOUNT,
        SLIPPAGE_BPS,
    )
    .await?;
    let descriptor = router::swap_instruction(
        &ctx.http,
        &ctx.router_url,
        &borrower,
        &source_account,
        &wsol_account,
        &quote,
    )
    .await?;
    let swap = assemble::payload_to_instruction(&descriptor.swap_instruction)?;

    // The borrowed lamports fund the wSOL account opened below; closing it
    // after the swap releases them back to the borrower for the repay.
    let borrow_lamports = ctx
        .rpc
        .get_minimum_balance_for_rent_exemption(spl_token::state::Account::LEN)
        .await?;
    let create_wsol_account = create_associated_token_account_idempotent(
        &borrower,
        &borrower,
        &native_mint::ID,
        &spl_token::ID,
    );
    let close_wsol_account = spl_token::instruction::close_account(
        &spl_token::ID,
        &wsol_account,
        &borrower,
        &borrower,
        &[],
    )?;

    let instructions = assemble::build_flash_instructions(
        &borrower,
        borrow_lamports,
        vec![ComputeBudgetInstruction::set_compute_unit_limit(
            COMPUTE_UNIT_LIMIT,
        )],
        vec![create_wsol_account],
        swap,
        Some(close_wsol_account),
    );
    let tables =
        assemble::resolve_lookup_tables(&ctx.rpc, &descriptor.lookup_table_addresses).await?;
    let blockhash = ctx.rpc.get_latest_blockhash().await?;
    let transaction = assemble::compile_transaction(&ctx.payer, &instructions, &tables, blockhash)?;

    let signature = submit::simulate_and_send(&ctx.rpc, &transaction).await?;
    println!("{signature}");
    Ok(())
}
