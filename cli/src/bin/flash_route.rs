use anyhow::Result;
use log::info;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use spl_token::native_mint;

use flash_cli::{assemble, context::CliContext, router, submit};

const ROUTER_URL: &str = "https://quote-api.jup.ag/v6";
const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
const SWAP_AMOUNT: u64 = 1_000_000; // 1 USDC
const SLIPPAGE_BPS: u16 = 50;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let ctx = CliContext::from_env(ROUTER_URL)?;
    let borrower = ctx.payer.pubkey();
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
    let route = router::swap_instructions(&ctx.http, &ctx.router_url, &borrower, &quote).await?;

    // Borrow exactly what it costs to open the wSOL account the route's
    // setup instructions create.
    let borrow_lamports = ctx
        .rpc
        .get_minimum_balance_for_rent_exemption(spl_token::state::Account::LEN)
        .await?;

    let compute_budget = assemble::payloads_to_instructions(&route.compute_budget_instructions)?;
    let setup = assemble::payloads_to_instructions(&route.setup_instructions)?;
    let swap = assemble::payload_to_instruction(&route.swap_instruction)?;
    let cleanup = route
        .cleanup_instruction
        .as_ref()
        .map(assemble::payload_to_instruction)
        .transpose()?;

    let instructions = assemble::build_flash_instructions(
        &borrower,
        borrow_lamports,
        compute_budget,
        setup,
        swap,
        cleanup,
    );
    let tables =
        assemble::resolve_lookup_tables(&ctx.rpc, &route.address_lookup_table_addresses).await?;
    let blockhash = ctx.rpc.get_latest_blockhash().await?;
    let transaction = assemble::compile_transaction(&ctx.payer, &instructions, &tables, blockhash)?;

    let signature = submit::simulate_and_send(&ctx.rpc, &transaction).await?;
    println!("{signature}");
    Ok(())
}
