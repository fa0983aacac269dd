use anyhow::Result;
use blink_pay::BlinkClient;
use clap::Args;

#[derive(Args)]
pub struct PriceSubCommand {
    /// Satoshi amount to convert
    #[arg(long)]
    amount: u64,
    /// Target display currency (e.g. BTC, USD, EUR, GBP, TRY)
    #[arg(long, default_value = "USD")]
    currency: String,
}

pub async fn price(client: &BlinkClient, args: &PriceSubCommand) -> Result<()> {
    let currency = args.currency.to_uppercase();

    // BTC is a fixed denomination, no provider quote needed.
    if currency == "BTC" {
        println!(
            "{} satoshi is equal to {:.8} BTC.",
            args.amount,
            args.amount as f64 / 1e8
        );
        return Ok(());
    }

    let quote = client.realtime_price(&currency).await?;
    let symbol = quote.symbol.as_deref().unwrap_or_default();
    println!(
        "{} satoshi is approximately {symbol}{:.2} {}.",
        args.amount,
        quote.convert(args.amount),
        quote.currency
    );

    Ok(())
}
