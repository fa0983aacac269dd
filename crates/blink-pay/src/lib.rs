//! Client library for the Blink custodial Lightning wallet
//!
//! Blink exposes a GraphQL API at `https://api.blink.sv/graphql`,
//! authenticated with an API key. The core of this crate is LNURL-pay
//! resolution and a fee-gated send workflow that probes the routing fee
//! and waits for explicit confirmation before any payment mutation is
//! dispatched. Balance queries, invoice creation, price conversion,
//! proof-of-payment lookup and contacts round out the client.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod client;
pub mod config;
pub mod error;
mod graphql;
pub mod lnurl;
pub mod types;
pub mod workflow;

pub use client::BlinkClient;
pub use config::Config;
pub use error::Error;
pub use lnurl::{HttpLnurlConnector, LightningAddress, LnurlPayParams, PayeeIdentifier};
pub use types::{
    Contact, FeeEstimate, Invoice, PaymentOutcome, PaymentProof, PaymentStatus, PriceQuote,
    ProviderError, WalletHandle,
};
pub use workflow::{FeeApproval, PaymentApi, SendOutcome, SendRequest, SendWorkflow};
