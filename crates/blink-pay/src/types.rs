//! Shared domain types for wallet, invoice and payment operations

use serde::{Deserialize, Serialize};

/// A wallet on the Blink account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHandle {
    /// Opaque wallet identifier
    pub id: String,
    /// Currency code, `BTC` or `USD`
    #[serde(rename = "walletCurrency")]
    pub currency: String,
    /// Balance in the wallet's native unit (sats for BTC)
    pub balance: i64,
}

impl WalletHandle {
    /// Whether this is the account's BTC (Lightning sats) wallet
    pub fn is_btc(&self) -> bool {
        self.currency == "BTC"
    }
}

/// A Lightning invoice obtained from the provider or an LNURL callback.
///
/// The payment request is treated as an opaque single-use credential; no
/// local validation of its encoding is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// BOLT11 payment request, verbatim
    pub payment_request: String,
    /// Payment hash, where the source reports one
    #[serde(default)]
    pub payment_hash: Option<String>,
    /// Payment secret, where the source reports one
    #[serde(default)]
    pub payment_secret: Option<String>,
    /// Invoice amount in satoshi, where the source reports one
    #[serde(default)]
    pub satoshis: Option<u64>,
}

/// Business-level error reported inside an otherwise successful provider
/// response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Human-readable message
    pub message: String,
    /// Provider error code
    #[serde(default)]
    pub code: Option<String>,
    /// Field path the error refers to
    #[serde(default)]
    pub path: Option<Vec<String>>,
}

/// Routing fee quote for an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeEstimate {
    /// Probed fee in satoshi
    Sats(u64),
    /// The probe completed but the provider reported errors; no estimate
    /// is available and payment must not proceed on this path
    Unavailable(Vec<ProviderError>),
}

/// Status of a submitted payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Payment settled
    Success,
    /// Payment is in flight
    Pending,
    /// Payment failed
    Failure,
    /// The invoice was already paid
    AlreadyPaid,
    /// Provider reported an unrecognized status
    Unknown,
}

impl PaymentStatus {
    /// Map a provider status string, case-insensitively
    pub fn from_provider(status: &str) -> Self {
        match status.to_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "PENDING" => Self::Pending,
            "FAILURE" | "FAILED" => Self::Failure,
            "ALREADY_PAID" => Self::AlreadyPaid,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Pending => "PENDING",
            Self::Failure => "FAILURE",
            Self::AlreadyPaid => "ALREADY_PAID",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Result of a payment mutation, provider errors included as data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Provider-reported status
    pub status: PaymentStatus,
    /// Business-level errors accompanying the status
    pub errors: Vec<ProviderError>,
}

impl PaymentOutcome {
    /// Whether the provider reported any business-level errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A settled transaction matched to a payment request, used as proof of
/// payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    /// The matched payment request
    pub payment_request: String,
    /// Settlement preimage, when the provider exposes one
    pub pre_image: Option<String>,
    /// Settled amount in satoshi (negative for sends)
    pub settlement_amount: Option<i64>,
    /// Transaction status string as reported
    pub status: Option<String>,
}

/// Real-time BTC price quote for one display currency
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Display currency code the quote is denominated in
    pub currency: String,
    /// Currency symbol reported by the provider, if any
    pub symbol: Option<String>,
    /// Price of one satoshi in major units of the display currency
    pub sat_price: f64,
}

impl PriceQuote {
    /// Convert a satoshi amount to the quote's display currency
    pub fn convert(&self, amount_sats: u64) -> f64 {
        amount_sats as f64 * self.sat_price
    }
}

/// An entry in the account's contact list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Blink username
    pub username: String,
    /// Local alias, if set
    #[serde(default)]
    pub alias: Option<String>,
    /// Number of transactions with this contact
    #[serde(default)]
    pub transactions_count: Option<u64>,
}

impl Contact {
    /// The contact's lightning address on the provider's domain
    pub fn lightning_address(&self) -> String {
        format!("{}@blink.sv", self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_maps_case_insensitively() {
        assert_eq!(PaymentStatus::from_provider("SUCCESS"), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_provider("success"), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_provider("Pending"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_provider("FAILURE"), PaymentStatus::Failure);
        assert_eq!(PaymentStatus::from_provider("failed"), PaymentStatus::Failure);
        assert_eq!(PaymentStatus::from_provider("ALREADY_PAID"), PaymentStatus::AlreadyPaid);
        assert_eq!(PaymentStatus::from_provider("what"), PaymentStatus::Unknown);
    }

    #[test]
    fn btc_wallet_detection() {
        let wallet = WalletHandle {
            id: "w1".to_string(),
            currency: "BTC".to_string(),
            balance: 1000,
        };
        assert!(wallet.is_btc());

        let usd = WalletHandle {
            id: "w2".to_string(),
            currency: "USD".to_string(),
            balance: 5,
        };
        assert!(!usd.is_btc());
    }

    #[test]
    fn price_quote_scales_linearly_with_sats() {
        let quote = PriceQuote {
            currency: "USD".to_string(),
            symbol: Some("$".to_string()),
            sat_price: 0.0006,
        };
        assert!((quote.convert(1000) - 0.6).abs() < 1e-9);
        assert_eq!(quote.convert(0), 0.0);
    }

    #[test]
    fn contact_lightning_address() {
        let contact = Contact {
            username: "alice".to_string(),
            alias: None,
            transactions_count: None,
        };
        assert_eq!(contact.lightning_address(), "alice@blink.sv");
    }
}
