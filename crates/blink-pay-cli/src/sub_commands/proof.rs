use anyhow::Result;
use blink_pay::BlinkClient;
use clap::Args;

#[derive(Args)]
pub struct ProofSubCommand {
    /// BOLT11 invoice to look up
    #[arg(long)]
    invoice: String,
    /// How many recent transactions to scan
    #[arg(long, default_value_t = 10)]
    first: u32,
}

pub async fn proof(client: &BlinkClient, args: &ProofSubCommand) -> Result<()> {
    match client.find_payment_proof(&args.invoice, args.first).await? {
        Some(proof) => {
            if let Some(status) = &proof.status {
                println!("Status: {status}");
            }
            if let Some(amount) = proof.settlement_amount {
                println!("Amount (satoshis): {amount}");
            }
            match &proof.pre_image {
                Some(pre_image) => println!("Preimage: {pre_image}"),
                None => println!("No preimage reported for this transaction."),
            }
        }
        None => println!("No matching transaction found for the provided payment request."),
    }

    Ok(())
}
