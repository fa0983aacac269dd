//! Fee-gated send workflow
//!
//! Sequences wallet resolution, LNURL resolution, invoice negotiation,
//! fee probing and payment dispatch behind a single human decision point.
//! Every terminal path is explicit: the only route to an invoice payment
//! runs through a successful fee probe and an approval; the direct-LNURL
//! route is the one documented exception, since the provider quotes and
//! settles atomically on its side.

use async_trait::async_trait;

use crate::error::Error;
use crate::lnurl::{self, LnurlConnector, PayeeIdentifier};
use crate::types::{FeeEstimate, PaymentOutcome, PaymentStatus, ProviderError, WalletHandle};

/// Provider operations the send workflow depends on
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Resolve the account's BTC wallet
    async fn resolve_btc_wallet(&self) -> Result<WalletHandle, Error>;
    /// Probe the routing fee for an invoice
    async fn probe_fee(&self, wallet_id: &str, payment_request: &str)
        -> Result<FeeEstimate, Error>;
    /// Submit an invoice for settlement
    async fn pay_invoice(
        &self,
        wallet_id: &str,
        payment_request: &str,
    ) -> Result<PaymentOutcome, Error>;
    /// Submit an LNURL with an amount for provider-side settlement
    async fn pay_lnurl(
        &self,
        wallet_id: &str,
        lnurl: &str,
        amount_sats: u64,
    ) -> Result<PaymentOutcome, Error>;
}

/// The confirmation gate between fee discovery and payment
#[async_trait]
pub trait FeeApproval: Send + Sync {
    /// Present the quoted fee; `false` cancels the workflow cleanly
    async fn approve(&self, fee_sats: u64) -> Result<bool, Error>;
}

/// What to send, chosen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRequest {
    /// Pay a BOLT11 invoice directly
    Invoice {
        /// The payment request
        payment_request: String,
    },
    /// Resolve a lightning address or LNURL-pay URL, negotiate an invoice
    /// for the requested amount, then pay it
    Lnurl {
        /// Lightning address or LNURL-pay URL
        identifier: PayeeIdentifier,
        /// Amount to request, in satoshi
        amount_sats: u64,
        /// Optional memo, attached as a comment when the payee allows it
        memo: Option<String>,
    },
    /// Hand amount and raw LNURL to the provider, which resolves and
    /// settles server-side; skips the fee probe and the confirmation gate
    DirectLnurl {
        /// Raw LNURL
        lnurl: String,
        /// Amount in satoshi
        amount_sats: u64,
    },
}

/// Terminal result of a send workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// A payment mutation was executed; the provider's verdict, errors
    /// included, is reported verbatim
    Executed {
        /// Quoted fee in satoshi; `None` on the direct-LNURL path
        quoted_fee_sats: Option<u64>,
        /// The provider's reported outcome
        outcome: PaymentOutcome,
    },
    /// The operator declined at the confirmation gate; no mutation
    /// occurred
    Canceled {
        /// The fee that was quoted before cancellation
        quoted_fee_sats: u64,
    },
    /// The fee probe returned provider errors; no mutation occurred
    ProbeFailed {
        /// Errors reported by the provider
        errors: Vec<ProviderError>,
    },
}

/// Workflow states, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendState {
    Idle,
    WalletResolved,
    MethodSelected,
    InvoiceObtained,
    DirectLnurl,
    FeeProbed,
    Confirmed,
    Canceled,
    Paid,
    Failed,
}

impl std::fmt::Display for SendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::WalletResolved => "wallet_resolved",
            Self::MethodSelected => "method_selected",
            Self::InvoiceObtained => "invoice_obtained",
            Self::DirectLnurl => "direct_lnurl",
            Self::FeeProbed => "fee_probed",
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
            Self::Paid => "paid",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Orchestrates one send from wallet resolution to terminal state
pub struct SendWorkflow<'a> {
    api: &'a dyn PaymentApi,
    connector: &'a dyn LnurlConnector,
    approval: &'a dyn FeeApproval,
}

impl std::fmt::Debug for SendWorkflow<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendWorkflow").finish_non_exhaustive()
    }
}

impl<'a> SendWorkflow<'a> {
    /// Create a workflow over the given collaborators
    pub fn new(
        api: &'a dyn PaymentApi,
        connector: &'a dyn LnurlConnector,
        approval: &'a dyn FeeApproval,
    ) -> Self {
        Self {
            api,
            connector,
            approval,
        }
    }

    /// Run the workflow to a terminal state.
    ///
    /// `Err` means the run aborted with no payment mutation attempted,
    /// except [`Error::AmbiguousPayment`], which reports a dispatched
    /// mutation with an unknown result.
    pub async fn run(&self, request: SendRequest) -> Result<SendOutcome, Error> {
        let mut state = SendState::Idle;

        let wallet = self.api.resolve_btc_wallet().await?;
        transition(&mut state, SendState::WalletResolved);
        transition(&mut state, SendState::MethodSelected);

        let payment_request = match request {
            SendRequest::DirectLnurl { lnurl, amount_sats } => {
                transition(&mut state, SendState::DirectLnurl);
                let outcome = self.api.pay_lnurl(&wallet.id, &lnurl, amount_sats).await?;
                transition(&mut state, terminal_for(&outcome));
                return Ok(SendOutcome::Executed {
                    quoted_fee_sats: None,
                    outcome,
                });
            }
            SendRequest::Invoice { payment_request } => payment_request,
            SendRequest::Lnurl {
                identifier,
                amount_sats,
                memo,
            } => {
                let params = lnurl::resolve_pay_params(self.connector, &identifier).await?;
                let invoice =
                    lnurl::request_invoice(self.connector, &params, amount_sats, memo.as_deref())
                        .await?;
                invoice.payment_request
            }
        };
        transition(&mut state, SendState::InvoiceObtained);

        let fee_sats = match self.api.probe_fee(&wallet.id, &payment_request).await {
            Ok(FeeEstimate::Sats(fee)) => fee,
            Ok(FeeEstimate::Unavailable(errors)) => {
                transition(&mut state, SendState::Failed);
                return Ok(SendOutcome::ProbeFailed { errors });
            }
            Err(e) => {
                transition(&mut state, SendState::Failed);
                return Err(e);
            }
        };
        transition(&mut state, SendState::FeeProbed);

        if !self.approval.approve(fee_sats).await? {
            transition(&mut state, SendState::Canceled);
            return Ok(SendOutcome::Canceled {
                quoted_fee_sats: fee_sats,
            });
        }
        transition(&mut state, SendState::Confirmed);

        let outcome = self.api.pay_invoice(&wallet.id, &payment_request).await?;
        transition(&mut state, terminal_for(&outcome));

        Ok(SendOutcome::Executed {
            quoted_fee_sats: Some(fee_sats),
            outcome,
        })
    }
}

fn transition(state: &mut SendState, next: SendState) {
    tracing::debug!("send workflow: {state} -> {next}");
    *state = next;
}

fn terminal_for(outcome: &PaymentOutcome) -> SendState {
    if outcome.status == PaymentStatus::Failure || outcome.has_errors() {
        SendState::Failed
    } else {
        SendState::Paid
    }
}
