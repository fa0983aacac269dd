use anyhow::Result;
use blink_pay::BlinkClient;
use clap::Args;

#[derive(Args)]
pub struct ReceiveSubCommand {
    /// Amount in satoshi
    #[arg(long)]
    amount: u64,
    /// Invoice memo
    #[arg(long)]
    memo: Option<String>,
}

pub async fn receive(client: &BlinkClient, args: &ReceiveSubCommand) -> Result<()> {
    let wallet = client.resolve_btc_wallet().await?;
    let invoice = client
        .create_invoice(&wallet.id, args.amount, args.memo.as_deref())
        .await?;

    println!("Payment request: {}", invoice.payment_request);
    if let Some(hash) = &invoice.payment_hash {
        println!("Payment hash: {hash}");
    }
    if let Some(satoshis) = invoice.satoshis {
        println!("Amount: {satoshis} sats");
    }

    Ok(())
}
