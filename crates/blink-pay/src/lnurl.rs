//! LNURL-pay resolution and invoice negotiation
//!
//! A payee identifier is either a lightning address (`user@domain`,
//! mapped to `https://domain/.well-known/lnurlp/user`) or a raw LNURL-pay
//! URL fetched unchanged. Resolution yields sendable bounds and a callback
//! URL; a second round trip against the callback, with the amount (and an
//! optional comment) merged into its query string, yields a concrete
//! invoice.

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::types::Invoice;

/// Lightning address, `user@domain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightningAddress {
    user: String,
    domain: String,
}

impl LightningAddress {
    /// The LNURL-pay well-known endpoint for this address
    pub fn to_url(&self) -> Result<Url, Error> {
        let url = format!("https://{}/.well-known/lnurlp/{}", self.domain, self.user);
        Ok(Url::parse(&url)?)
    }
}

impl FromStr for LightningAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let parts: Vec<&str> = trimmed.split('@').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidIdentifier(format!(
                "{trimmed}: expected user@domain"
            )));
        }

        let user = parts[0].trim();
        let domain = parts[1].trim();

        if user.is_empty() || domain.is_empty() {
            return Err(Error::InvalidIdentifier(
                "user and domain must not be empty".to_string(),
            ));
        }

        Ok(LightningAddress {
            user: user.to_string(),
            domain: domain.to_string(),
        })
    }
}

impl std::fmt::Display for LightningAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user, self.domain)
    }
}

/// A user-supplied payee identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayeeIdentifier {
    /// Lightning address resolved via the well-known endpoint
    Address(LightningAddress),
    /// Raw LNURL-pay URL, fetched as given
    Url(Url),
}

impl PayeeIdentifier {
    /// The URL to fetch pay parameters from
    pub fn endpoint_url(&self) -> Result<Url, Error> {
        match self {
            Self::Address(addr) => addr.to_url(),
            Self::Url(url) => Ok(url.clone()),
        }
    }
}

impl FromStr for PayeeIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.contains('@') {
            Ok(Self::Address(trimmed.parse()?))
        } else {
            Ok(Self::Url(Url::parse(trimmed)?))
        }
    }
}

impl std::fmt::Display for PayeeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address(addr) => addr.fmt(f),
            Self::Url(url) => url.fmt(f),
        }
    }
}

/// Wire form of the LNURL-pay metadata response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequestResponse {
    /// Callback URL for the invoice request
    #[serde(default)]
    pub callback: Option<String>,
    /// Minimum sendable amount in millisatoshi
    #[serde(default)]
    pub min_sendable: Option<u64>,
    /// Maximum sendable amount in millisatoshi
    #[serde(default)]
    pub max_sendable: Option<u64>,
    /// Maximum comment length; 0 or absent means comments unsupported
    #[serde(default)]
    pub comment_allowed: u64,
    /// Metadata string (JSON stringified)
    #[serde(default)]
    pub metadata: Option<String>,
    /// `ERROR` when the payee reports a failure
    #[serde(default)]
    pub status: Option<String>,
    /// Failure reason accompanying an error status
    #[serde(default)]
    pub reason: Option<String>,
}

/// Wire form of the LNURL-pay callback response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceResponse {
    /// BOLT11 payment request
    #[serde(default)]
    pub pr: Option<String>,
    /// `ERROR` when the payee reports a failure
    #[serde(default)]
    pub status: Option<String>,
    /// Failure reason accompanying an error status
    #[serde(default)]
    pub reason: Option<String>,
}

fn is_error_status(status: &Option<String>) -> bool {
    status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("error"))
}

/// Validated LNURL-pay parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LnurlPayParams {
    /// Callback URL; pre-existing query parameters are preserved
    pub callback: Url,
    /// Minimum sendable amount in millisatoshi, inclusive
    pub min_sendable_msat: u64,
    /// Maximum sendable amount in millisatoshi, inclusive
    pub max_sendable_msat: u64,
    /// Maximum comment length; 0 means comments unsupported
    pub comment_allowed: u64,
    /// Metadata string, where the payee supplies one
    pub metadata: Option<String>,
}

impl TryFrom<PayRequestResponse> for LnurlPayParams {
    type Error = Error;

    fn try_from(raw: PayRequestResponse) -> Result<Self, Error> {
        if is_error_status(&raw.status) {
            let reason = raw
                .reason
                .unwrap_or_else(|| "LNURL-pay endpoint returned an error".to_string());
            return Err(Error::Protocol(reason));
        }

        let callback = raw
            .callback
            .ok_or_else(|| Error::Protocol("no callback in LNURL-pay response".to_string()))?;
        let callback = Url::parse(&callback)?;

        let min_sendable_msat = raw
            .min_sendable
            .ok_or_else(|| Error::Protocol("no minSendable in LNURL-pay response".to_string()))?;
        let max_sendable_msat = raw
            .max_sendable
            .ok_or_else(|| Error::Protocol("no maxSendable in LNURL-pay response".to_string()))?;

        Ok(Self {
            callback,
            min_sendable_msat,
            max_sendable_msat,
            comment_allowed: raw.comment_allowed,
            metadata: raw.metadata,
        })
    }
}

/// HTTP seam for the two LNURL-pay round trips
#[async_trait]
pub trait LnurlConnector: Send + Sync {
    /// GET the LNURL-pay metadata document
    async fn fetch_pay_request(&self, url: &Url) -> Result<PayRequestResponse, Error>;
    /// GET an invoice from the callback URL
    async fn fetch_invoice(&self, url: &Url) -> Result<InvoiceResponse, Error>;
}

/// [`LnurlConnector`] backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpLnurlConnector {
    client: reqwest::Client,
}

impl HttpLnurlConnector {
    /// Create a connector with a fresh HTTP client
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Protocol(format!("malformed LNURL response: {e}")))
    }
}

#[async_trait]
impl LnurlConnector for HttpLnurlConnector {
    async fn fetch_pay_request(&self, url: &Url) -> Result<PayRequestResponse, Error> {
        self.get_json(url).await
    }

    async fn fetch_invoice(&self, url: &Url) -> Result<InvoiceResponse, Error> {
        self.get_json(url).await
    }
}

/// Resolve a payee identifier to validated pay parameters.
///
/// One GET, no retries; a failed fetch terminates resolution.
pub async fn resolve_pay_params(
    connector: &dyn LnurlConnector,
    identifier: &PayeeIdentifier,
) -> Result<LnurlPayParams, Error> {
    let url = identifier.endpoint_url()?;
    tracing::debug!("Fetching LNURL-pay parameters from {url}");

    let raw = connector.fetch_pay_request(&url).await?;
    raw.try_into()
}

/// Build the callback URL for an invoice request.
///
/// Query parameters already present on the callback are preserved; only
/// `amount` (and `comment`, when given) are set, overwriting any previous
/// occurrence.
fn invoice_callback_url(callback: &Url, amount_msat: u64, comment: Option<&str>) -> Url {
    let kept: Vec<(String, String)> = callback
        .query_pairs()
        .filter(|(k, _)| k != "amount" && k != "comment")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = callback.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("amount", &amount_msat.to_string());
        if let Some(comment) = comment {
            pairs.append_pair("comment", comment);
        }
    }
    url
}

/// Negotiate an invoice for `amount_sats` against resolved pay parameters.
///
/// The sendable-range check runs before any network call; a violation
/// reports both bounds in satoshi. The memo is attached only when the
/// payee accepts comments, truncated to the advertised maximum length.
/// The returned payment request is not validated locally.
pub async fn request_invoice(
    connector: &dyn LnurlConnector,
    params: &LnurlPayParams,
    amount_sats: u64,
    memo: Option<&str>,
) -> Result<Invoice, Error> {
    let amount_msat = amount_sats.checked_mul(1000).ok_or(Error::AmountOutOfRange {
        amount_sats,
        min_sats: params.min_sendable_msat / 1000,
        max_sats: params.max_sendable_msat / 1000,
    })?;

    if amount_msat < params.min_sendable_msat || amount_msat > params.max_sendable_msat {
        return Err(Error::AmountOutOfRange {
            amount_sats,
            min_sats: params.min_sendable_msat / 1000,
            max_sats: params.max_sendable_msat / 1000,
        });
    }

    let comment: Option<String> = match memo {
        Some(memo) if params.comment_allowed > 0 && !memo.is_empty() => Some(
            memo.chars()
                .take(params.comment_allowed as usize)
                .collect(),
        ),
        _ => None,
    };

    let url = invoice_callback_url(&params.callback, amount_msat, comment.as_deref());
    tracing::debug!("Requesting invoice from callback {url}");

    let raw = connector.fetch_invoice(&url).await?;

    if is_error_status(&raw.status) {
        let reason = raw
            .reason
            .unwrap_or_else(|| "LNURL callback returned an error".to_string());
        return Err(Error::Protocol(reason));
    }

    let pr = raw
        .pr
        .ok_or_else(|| Error::Protocol("no invoice in response".to_string()))?;

    Ok(Invoice {
        payment_request: pr,
        payment_hash: None,
        payment_secret: None,
        satoshis: None,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeConnector {
        pay_response: Option<PayRequestResponse>,
        invoice_response: Option<InvoiceResponse>,
        fetched: Mutex<Vec<Url>>,
    }

    #[async_trait]
    impl LnurlConnector for FakeConnector {
        async fn fetch_pay_request(&self, url: &Url) -> Result<PayRequestResponse, Error> {
            self.fetched.lock().expect("lock").push(url.clone());
            Ok(self.pay_response.clone().expect("pay response set"))
        }

        async fn fetch_invoice(&self, url: &Url) -> Result<InvoiceResponse, Error> {
            self.fetched.lock().expect("lock").push(url.clone());
            Ok(self.invoice_response.clone().expect("invoice response set"))
        }
    }

    impl FakeConnector {
        fn fetch_count(&self) -> usize {
            self.fetched.lock().expect("lock").len()
        }

        fn last_query(&self) -> HashMap<String, String> {
            let fetched = self.fetched.lock().expect("lock");
            let url = fetched.last().expect("at least one fetch");
            url.query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        }
    }

    fn params(min_msat: u64, max_msat: u64, comment_allowed: u64) -> LnurlPayParams {
        LnurlPayParams {
            callback: Url::parse("https://pay.example.com/cb").expect("url"),
            min_sendable_msat: min_msat,
            max_sendable_msat: max_msat,
            comment_allowed,
            metadata: None,
        }
    }

    #[test]
    fn address_resolves_to_well_known_url() {
        let id: PayeeIdentifier = "alice@example.com".parse().expect("identifier");
        assert_eq!(
            id.endpoint_url().expect("url").as_str(),
            "https://example.com/.well-known/lnurlp/alice"
        );
    }

    #[test]
    fn raw_url_is_fetched_unchanged() {
        let id: PayeeIdentifier = "https://pay.example.com/custom".parse().expect("identifier");
        assert_eq!(
            id.endpoint_url().expect("url").as_str(),
            "https://pay.example.com/custom"
        );
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!("@example.com".parse::<PayeeIdentifier>().is_err());
        assert!("user@".parse::<PayeeIdentifier>().is_err());
        assert!("a@b@c".parse::<PayeeIdentifier>().is_err());
        assert!("not a url".parse::<PayeeIdentifier>().is_err());
    }

    #[test]
    fn missing_callback_is_protocol_error() {
        let raw = PayRequestResponse {
            min_sendable: Some(1000),
            max_sendable: Some(2000),
            ..Default::default()
        };
        let err = LnurlPayParams::try_from(raw).unwrap_err();
        assert!(matches!(err, Error::Protocol(m) if m.contains("no callback")));
    }

    #[test]
    fn error_status_carries_reason() {
        let raw = PayRequestResponse {
            status: Some("ERROR".to_string()),
            reason: Some("unknown user".to_string()),
            ..Default::default()
        };
        let err = LnurlPayParams::try_from(raw).unwrap_err();
        assert!(matches!(err, Error::Protocol(m) if m == "unknown user"));
    }

    #[tokio::test]
    async fn amount_in_range_issues_one_callback_get() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse {
                pr: Some("lnbc1...".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let invoice = request_invoice(&connector, &params(1000, 100_000, 0), 50, None)
            .await
            .expect("invoice");

        assert_eq!(invoice.payment_request, "lnbc1...");
        assert_eq!(connector.fetch_count(), 1);
        assert_eq!(connector.last_query().get("amount"), Some(&"50000".to_string()));
    }

    #[tokio::test]
    async fn amount_out_of_range_fails_without_network() {
        let connector = FakeConnector::default();

        let err = request_invoice(&connector, &params(10_000, 100_000, 0), 5, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::AmountOutOfRange {
                amount_sats: 5,
                min_sats: 10,
                max_sats: 100,
            }
        ));
        assert_eq!(connector.fetch_count(), 0);
    }

    #[tokio::test]
    async fn comment_is_truncated_to_allowed_length() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse {
                pr: Some("lnbc1...".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        request_invoice(&connector, &params(1000, 100_000, 5), 50, Some("hello world"))
            .await
            .expect("invoice");

        assert_eq!(connector.last_query().get("comment"), Some(&"hello".to_string()));
    }

    #[tokio::test]
    async fn comment_truncation_is_character_based() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse {
                pr: Some("lnbc1...".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        request_invoice(&connector, &params(1000, 100_000, 3), 50, Some("héllo"))
            .await
            .expect("invoice");

        assert_eq!(connector.last_query().get("comment"), Some(&"hél".to_string()));
    }

    #[tokio::test]
    async fn comment_omitted_when_unsupported() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse {
                pr: Some("lnbc1...".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        request_invoice(&connector, &params(1000, 100_000, 0), 50, Some("hello"))
            .await
            .expect("invoice");

        assert!(!connector.last_query().contains_key("comment"));
    }

    #[tokio::test]
    async fn existing_callback_query_parameters_survive() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse {
                pr: Some("lnbc1...".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mut p = params(1000, 100_000, 0);
        p.callback = Url::parse("https://pay.example.com/cb?session=abc&amount=1").expect("url");

        request_invoice(&connector, &p, 50, None).await.expect("invoice");

        let query = connector.last_query();
        assert_eq!(query.get("session"), Some(&"abc".to_string()));
        // previous amount is overwritten, not duplicated
        assert_eq!(query.get("amount"), Some(&"50000".to_string()));
        let fetched = connector.fetched.lock().expect("lock");
        let amount_params = fetched
            .last()
            .expect("fetch")
            .query_pairs()
            .filter(|(k, _)| k == "amount")
            .count();
        assert_eq!(amount_params, 1);
    }

    #[tokio::test]
    async fn callback_error_status_is_protocol_error() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse {
                status: Some("error".to_string()),
                reason: Some("amount too small".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let err = request_invoice(&connector, &params(1000, 100_000, 0), 50, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(m) if m == "amount too small"));
    }

    #[tokio::test]
    async fn missing_pr_is_protocol_error() {
        let connector = FakeConnector {
            invoice_response: Some(InvoiceResponse::default()),
            ..Default::default()
        };

        let err = request_invoice(&connector, &params(1000, 100_000, 0), 50, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(m) if m.contains("no invoice")));
    }

    #[tokio::test]
    async fn resolve_validates_at_the_boundary() {
        let connector = FakeConnector {
            pay_response: Some(PayRequestResponse {
                callback: Some("https://pay.example.com/cb".to_string()),
                min_sendable: Some(1000),
                max_sendable: Some(500_000_000),
                comment_allowed: 140,
                metadata: Some("[[\"text/plain\",\"pay alice\"]]".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let id: PayeeIdentifier = "alice@example.com".parse().expect("identifier");
        let params = resolve_pay_params(&connector, &id).await.expect("params");

        assert_eq!(params.min_sendable_msat, 1000);
        assert_eq!(params.max_sendable_msat, 500_000_000);
        assert_eq!(params.comment_allowed, 140);
        assert_eq!(
            connector.fetched.lock().expect("lock")[0].as_str(),
            "https://example.com/.well-known/lnurlp/alice"
        );
    }
}
