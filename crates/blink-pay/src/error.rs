//! Error types for the Blink pay client

use thiserror::Error;

/// Blink pay error
#[derive(Debug, Error)]
pub enum Error {
    /// Non-success HTTP status from a remote endpoint
    #[error("HTTP request failed with status {0}")]
    Http(u16),
    /// Transport-level failure (connection, TLS, body read)
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// Request exceeded its time bound
    #[error("request timed out")]
    Timeout,
    /// Well-formed transport response with a semantically invalid payload
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Top-level errors in the GraphQL response envelope
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    /// Provider rejected an operation that has no data channel for errors
    #[error("provider error: {0}")]
    Provider(String),
    /// Amount outside the payee's sendable range, detected before any
    /// network call
    #[error("amount {amount_sats} sat outside sendable range {min_sats}..={max_sats} sat")]
    AmountOutOfRange {
        /// Requested amount in satoshi
        amount_sats: u64,
        /// Minimum sendable in satoshi
        min_sats: u64,
        /// Maximum sendable in satoshi
        max_sats: u64,
    },
    /// Identifier is neither a lightning address nor a URL
    #[error("invalid payee identifier: {0}")]
    InvalidIdentifier(String),
    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Account has no BTC wallet
    #[error("no BTC wallet on account")]
    NoBtcWallet,
    /// Transport failed after a payment mutation was dispatched; the
    /// payment may still have settled on the provider side
    #[error("payment request was sent but no response was received; the payment may still settle: {0}")]
    AmbiguousPayment(#[source] reqwest::Error),
}
