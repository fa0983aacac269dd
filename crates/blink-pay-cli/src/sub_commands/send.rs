use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use blink_pay::workflow::{FeeApproval, SendOutcome, SendRequest, SendWorkflow};
use blink_pay::{BlinkClient, Error, HttpLnurlConnector, ProviderError};
use clap::Args;

#[derive(Args)]
pub struct SendSubCommand {
    /// BOLT11 invoice to pay
    #[arg(long, conflicts_with_all = ["to", "lnurl"])]
    invoice: Option<String>,
    /// Lightning address or LNURL-pay URL to resolve and pay
    #[arg(long, requires = "amount", conflicts_with = "lnurl")]
    to: Option<String>,
    /// Raw LNURL for provider-side resolution and settlement
    #[arg(long, requires = "amount")]
    lnurl: Option<String>,
    /// Amount in satoshi
    #[arg(long)]
    amount: Option<u64>,
    /// Memo, attached as a comment when the payee accepts one
    #[arg(long)]
    memo: Option<String>,
    /// Pay without asking for fee confirmation
    #[arg(short = 'y', long)]
    yes: bool,
}

/// Confirmation gate that prompts on stdin; a failed read declines, which
/// cancels the workflow without any mutation.
struct StdinFeeApproval {
    auto_approve: bool,
}

#[async_trait]
impl FeeApproval for StdinFeeApproval {
    async fn approve(&self, fee_sats: u64) -> Result<bool, Error> {
        println!("Quoted routing fee: {fee_sats} sats");
        if self.auto_approve {
            return Ok(true);
        }

        print!("Proceed with payment? (y/n): ");
        io::stdout().flush().ok();

        let mut user_input = String::new();
        if io::stdin().read_line(&mut user_input).is_err() {
            tracing::warn!("Could not read confirmation; canceling");
            return Ok(false);
        }

        Ok(user_input.trim().eq_ignore_ascii_case("y"))
    }
}

pub async fn send(client: &BlinkClient, args: &SendSubCommand) -> Result<()> {
    let request = if let Some(payment_request) = &args.invoice {
        SendRequest::Invoice {
            payment_request: payment_request.clone(),
        }
    } else if let Some(to) = &args.to {
        SendRequest::Lnurl {
            identifier: to.parse()?,
            amount_sats: args.amount.context("--amount is required with --to")?,
            memo: args.memo.clone(),
        }
    } else if let Some(lnurl) = &args.lnurl {
        SendRequest::DirectLnurl {
            lnurl: lnurl.clone(),
            amount_sats: args.amount.context("--amount is required with --lnurl")?,
        }
    } else {
        bail!("one of --invoice, --to or --lnurl is required");
    };

    let connector = HttpLnurlConnector::new();
    let approval = StdinFeeApproval {
        auto_approve: args.yes,
    };
    let workflow = SendWorkflow::new(client, &connector, &approval);

    match workflow.run(request).await? {
        SendOutcome::Executed {
            quoted_fee_sats,
            outcome,
        } => {
            println!("Payment status: {}", outcome.status);
            if let Some(fee) = quoted_fee_sats {
                println!("Quoted fee: {fee} sats");
            }
            print_provider_errors(&outcome.errors);
        }
        SendOutcome::Canceled { quoted_fee_sats } => {
            println!("Canceled; no payment was made (quoted fee was {quoted_fee_sats} sats)");
        }
        SendOutcome::ProbeFailed { errors } => {
            println!("Fee probe failed; no payment was made");
            print_provider_errors(&errors);
        }
    }

    Ok(())
}

fn print_provider_errors(errors: &[ProviderError]) {
    for error in errors {
        match &error.code {
            Some(code) => println!("Provider error [{code}]: {}", error.message),
            None => println!("Provider error: {}", error.message),
        }
    }
}
