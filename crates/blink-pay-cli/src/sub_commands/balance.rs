use anyhow::{bail, Result};
use blink_pay::BlinkClient;

pub async fn balance(client: &BlinkClient) -> Result<()> {
    let wallets = client.wallets().await?;

    let Some(btc) = wallets.iter().find(|w| w.is_btc()) else {
        bail!("no BTC wallet on account");
    };
    println!("BTC balance: {} sats", btc.balance);

    for wallet in wallets.iter().filter(|w| !w.is_btc()) {
        println!("{} balance: {}", wallet.currency, wallet.balance);
    }

    Ok(())
}
