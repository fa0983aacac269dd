//! Typed client for the Blink GraphQL API
//!
//! All provider operations the workflows need live here: wallet
//! resolution, invoice creation, fee probing, payment dispatch, proof
//! lookup and contact management. One [`reqwest::Client`] is built per
//! [`BlinkClient`] with the API key as a default header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::Error;
use crate::graphql;
use crate::types::{
    Contact, FeeEstimate, Invoice, PaymentOutcome, PaymentProof, PaymentStatus, PriceQuote,
    ProviderError, WalletHandle,
};
use crate::workflow::PaymentApi;

/// Timeout for fee probe requests
const PROBE_FEE_TIMEOUT: Duration = Duration::from_secs(5);

/// Display currencies quote the satoshi price in minor units (cents)
const MINOR_UNITS_PER_MAJOR: f64 = 100.0;

/// Client for the Blink GraphQL API
#[derive(Debug, Clone)]
pub struct BlinkClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletsData {
    me: WalletsMe,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletsMe {
    default_account: WalletsAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletsAccount {
    wallets: Vec<WalletHandle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceCreatePayload {
    #[serde(default)]
    invoice: Option<Invoice>,
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeProbePayload {
    #[serde(default)]
    amount: Option<u64>,
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentSendPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsData {
    me: TransactionsMe,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsMe {
    default_account: TransactionsAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsAccount {
    transactions: TransactionEdges,
}

#[derive(Debug, Deserialize)]
struct TransactionEdges {
    edges: Vec<TransactionEdge>,
}

#[derive(Debug, Deserialize)]
struct TransactionEdge {
    node: TransactionNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionNode {
    #[serde(default)]
    initiation_via: Option<InitiationVia>,
    #[serde(default)]
    settlement_via: Option<SettlementVia>,
    #[serde(default)]
    settlement_amount: Option<i64>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiationVia {
    #[serde(default)]
    payment_request: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettlementVia {
    #[serde(default)]
    pre_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactsData {
    me: ContactsMe,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactsMe {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactByUsernameData {
    me: ContactByUsernameMe,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactByUsernameMe {
    #[serde(default)]
    contact_by_username: Option<Contact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealtimePriceData {
    #[serde(default)]
    realtime_price: Option<RealtimePrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealtimePrice {
    btc_sat_price: BtcSatPrice,
    #[serde(default)]
    denominator_currency_details: Option<CurrencyDetails>,
}

#[derive(Debug, Deserialize)]
struct BtcSatPrice {
    base: f64,
    offset: i32,
}

#[derive(Debug, Deserialize)]
struct CurrencyDetails {
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactUpdatePayload {
    #[serde(default)]
    contact: Option<Contact>,
    #[serde(default)]
    errors: Vec<ProviderError>,
}

/// Map a transport error on a payment mutation to the ambiguous-outcome
/// variant when the request may have been dispatched before the failure.
/// Connection and request-build failures happen before anything reaches
/// the provider, so those stay [`Error::Transport`].
fn ambiguous(err: Error) -> Error {
    match err {
        Error::Transport(inner) if !inner.is_connect() && !inner.is_builder() => {
            Error::AmbiguousPayment(inner)
        }
        other => other,
    }
}

impl BlinkClient {
    /// Create a client from a [`Config`]
    pub fn new(config: &Config) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "X-API-KEY",
            reqwest::header::HeaderValue::from_str(&config.api_key)
                .map_err(|_| Error::Protocol("API key is not a valid header value".to_string()))?,
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn execute(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, Error> {
        graphql::execute(&self.http, &self.endpoint, query, variables).await
    }

    /// List the account's wallets with balances
    pub async fn wallets(&self) -> Result<Vec<WalletHandle>, Error> {
        let query = r#"
            query Me {
                me {
                    defaultAccount {
                        wallets {
                            id
                            walletCurrency
                            balance
                        }
                    }
                }
            }
        "#;

        let data = self.execute(query, None).await?;
        let data: WalletsData = serde_json::from_value(data)
            .map_err(|e| Error::Protocol(format!("malformed wallets payload: {e}")))?;

        Ok(data.me.default_account.wallets)
    }

    /// Resolve the account's BTC wallet
    pub async fn resolve_btc_wallet(&self) -> Result<WalletHandle, Error> {
        let wallets = self.wallets().await?;
        wallets
            .into_iter()
            .find(WalletHandle::is_btc)
            .ok_or(Error::NoBtcWallet)
    }

    /// Create an invoice on the BTC wallet for `amount_sats`
    pub async fn create_invoice(
        &self,
        wallet_id: &str,
        amount_sats: u64,
        memo: Option<&str>,
    ) -> Result<Invoice, Error> {
        let query = r#"
            mutation LnInvoiceCreate($input: LnInvoiceCreateInput!) {
                lnInvoiceCreate(input: $input) {
                    invoice {
                        paymentRequest
                        paymentHash
                        paymentSecret
                        satoshis
                    }
                    errors {
                        message
                    }
                }
            }
        "#;

        let variables = json!({
            "input": {
                "walletId": wallet_id,
                "amount": amount_sats,
                "memo": memo.unwrap_or_default(),
            }
        });

        let data = self.execute(query, Some(variables)).await?;
        let payload: InvoiceCreatePayload = graphql::payload(data, "lnInvoiceCreate")?;

        if !payload.errors.is_empty() {
            return Err(Error::Provider(graphql::join_messages(&payload.errors)));
        }

        payload
            .invoice
            .ok_or_else(|| Error::Protocol("no invoice in response".to_string()))
    }

    /// Probe the routing fee for an invoice without committing to payment.
    ///
    /// Transport failure or timeout is an error and the caller must not
    /// proceed to payment. Provider-reported errors yield
    /// [`FeeEstimate::Unavailable`]; the decision to abort stays with the
    /// caller.
    pub async fn probe_fee(
        &self,
        wallet_id: &str,
        payment_request: &str,
    ) -> Result<FeeEstimate, Error> {
        let query = r#"
            mutation LnInvoiceFeeProbe($input: LnInvoiceFeeProbeInput!) {
                lnInvoiceFeeProbe(input: $input) {
                    amount
                    errors {
                        message
                    }
                }
            }
        "#;

        let variables = json!({
            "input": {
                "walletId": wallet_id,
                "paymentRequest": payment_request,
            }
        });

        let data = graphql::execute_with_timeout(
            &self.http,
            &self.endpoint,
            query,
            Some(variables),
            PROBE_FEE_TIMEOUT,
        )
        .await?;
        let payload: FeeProbePayload = graphql::payload(data, "lnInvoiceFeeProbe")?;

        if !payload.errors.is_empty() {
            tracing::warn!(
                "Fee probe reported provider errors: {}",
                graphql::join_messages(&payload.errors)
            );
            return Ok(FeeEstimate::Unavailable(payload.errors));
        }

        Ok(FeeEstimate::Sats(payload.amount.unwrap_or_default()))
    }

    /// Pay a BOLT11 invoice from the given wallet.
    ///
    /// Provider-reported errors are part of the outcome, not raised. A
    /// transport failure after the mutation was dispatched surfaces as
    /// [`Error::AmbiguousPayment`] since it may have been accepted; a
    /// failure to connect or to build the request cannot have reached the
    /// provider and stays [`Error::Transport`].
    pub async fn pay_invoice(
        &self,
        wallet_id: &str,
        payment_request: &str,
    ) -> Result<PaymentOutcome, Error> {
        let query = r#"
            mutation LnInvoicePaymentSend($input: LnInvoicePaymentInput!) {
                lnInvoicePaymentSend(input: $input) {
                    status
                    errors {
                        message
                        path
                        code
                    }
                }
            }
        "#;

        let variables = json!({
            "input": {
                "walletId": wallet_id,
                "paymentRequest": payment_request,
            }
        });

        let data = self
            .execute(query, Some(variables))
            .await
            .map_err(ambiguous)?;
        let payload: PaymentSendPayload = graphql::payload(data, "lnInvoicePaymentSend")?;

        Ok(outcome_from(payload))
    }

    /// Pay an LNURL directly; the provider resolves the LNURL and settles
    /// in one step, quoting its own fee.
    pub async fn pay_lnurl(
        &self,
        wallet_id: &str,
        lnurl: &str,
        amount_sats: u64,
    ) -> Result<PaymentOutcome, Error> {
        let query = r#"
            mutation LnurlPaymentSend($input: LnurlPaymentSendInput!) {
                lnurlPaymentSend(input: $input) {
                    status
                    errors {
                        code
                        message
                        path
                    }
                }
            }
        "#;

        let variables = json!({
            "input": {
                "walletId": wallet_id,
                "amount": amount_sats,
                "lnurl": lnurl,
            }
        });

        let data = self
            .execute(query, Some(variables))
            .await
            .map_err(ambiguous)?;
        let payload: PaymentSendPayload = graphql::payload(data, "lnurlPaymentSend")?;

        Ok(outcome_from(payload))
    }

    /// Look up a settled transaction matching `payment_request` among the
    /// most recent `first` transactions
    pub async fn find_payment_proof(
        &self,
        payment_request: &str,
        first: u32,
    ) -> Result<Option<PaymentProof>, Error> {
        let query = r#"
            query PaymentsWithProof($first: Int) {
                me {
                    defaultAccount {
                        transactions(first: $first) {
                            edges {
                                node {
                                    initiationVia {
                                        ... on InitiationViaLn {
                                            paymentRequest
                                        }
                                    }
                                    settlementVia {
                                        ... on SettlementViaIntraLedger {
                                            preImage
                                        }
                                        ... on SettlementViaLn {
                                            preImage
                                        }
                                    }
                                    settlementAmount
                                    status
                                }
                            }
                        }
                    }
                }
            }
        "#;

        let variables = json!({ "first": first });

        let data = self.execute(query, Some(variables)).await?;
        let data: TransactionsData = serde_json::from_value(data)
            .map_err(|e| Error::Protocol(format!("malformed transactions payload: {e}")))?;

        for edge in data.me.default_account.transactions.edges {
            let node = edge.node;
            let matches = node
                .initiation_via
                .as_ref()
                .and_then(|via| via.payment_request.as_deref())
                == Some(payment_request);

            if matches {
                return Ok(Some(PaymentProof {
                    payment_request: payment_request.to_string(),
                    pre_image: node.settlement_via.and_then(|via| via.pre_image),
                    settlement_amount: node.settlement_amount,
                    status: node.status,
                }));
            }
        }

        Ok(None)
    }

    /// Fetch the real-time BTC price in a display currency.
    ///
    /// The provider quotes the satoshi price as `base / 10^offset` in
    /// minor units; the returned [`PriceQuote`] carries the price of one
    /// satoshi in major units.
    pub async fn realtime_price(&self, currency: &str) -> Result<PriceQuote, Error> {
        let query = r#"
            query RealtimePrice($currency: DisplayCurrency) {
                realtimePrice(currency: $currency) {
                    btcSatPrice {
                        base
                        offset
                    }
                    denominatorCurrencyDetails {
                        symbol
                    }
                }
            }
        "#;

        let currency = currency.to_uppercase();
        let variables = json!({ "currency": currency });

        let data = self.execute(query, Some(variables)).await?;
        let data: RealtimePriceData = serde_json::from_value(data)
            .map_err(|e| Error::Protocol(format!("malformed price payload: {e}")))?;
        let price = data
            .realtime_price
            .ok_or_else(|| Error::Protocol("no price in response".to_string()))?;

        let per_sat_minor = price.btc_sat_price.base / 10f64.powi(price.btc_sat_price.offset);

        Ok(PriceQuote {
            currency,
            symbol: price
                .denominator_currency_details
                .and_then(|details| details.symbol),
            sat_price: per_sat_minor / MINOR_UNITS_PER_MAJOR,
        })
    }

    /// List the account's contacts
    pub async fn contacts(&self) -> Result<Vec<Contact>, Error> {
        let query = r#"
            query Contacts {
                me {
                    contacts {
                        username
                        alias
                        transactionsCount
                    }
                }
            }
        "#;

        let data = self.execute(query, None).await?;
        let data: ContactsData = serde_json::from_value(data)
            .map_err(|e| Error::Protocol(format!("malformed contacts payload: {e}")))?;

        Ok(data.me.contacts)
    }

    /// Fetch one contact by username
    pub async fn contact_by_username(&self, username: &str) -> Result<Option<Contact>, Error> {
        let query = r#"
            query GetContactDetails($username: Username!) {
                me {
                    contactByUsername(username: $username) {
                        username
                        alias
                    }
                }
            }
        "#;

        let variables = json!({ "username": username });

        let data = self.execute(query, Some(variables)).await?;
        let data: ContactByUsernameData = serde_json::from_value(data)
            .map_err(|e| Error::Protocol(format!("malformed contact payload: {e}")))?;

        Ok(data.me.contact_by_username)
    }

    /// Add a contact or update its alias
    pub async fn set_contact_alias(&self, username: &str, alias: &str) -> Result<Contact, Error> {
        let query = r#"
            mutation AddContact($input: UserContactUpdateAliasInput!) {
                userContactUpdateAlias(input: $input) {
                    contact {
                        username
                        alias
                    }
                    errors {
                        message
                    }
                }
            }
        "#;

        let variables = json!({
            "input": {
                "username": username,
                "alias": alias,
            }
        });

        let data = self.execute(query, Some(variables)).await?;
        let payload: ContactUpdatePayload = graphql::payload(data, "userContactUpdateAlias")?;

        if !payload.errors.is_empty() {
            return Err(Error::Provider(graphql::join_messages(&payload.errors)));
        }

        payload
            .contact
            .ok_or_else(|| Error::Protocol("no contact in response".to_string()))
    }
}

fn outcome_from(payload: PaymentSendPayload) -> PaymentOutcome {
    let status = payload
        .status
        .as_deref()
        .map_or(PaymentStatus::Unknown, PaymentStatus::from_provider);

    PaymentOutcome {
        status,
        errors: payload.errors,
    }
}

#[async_trait]
impl PaymentApi for BlinkClient {
    async fn resolve_btc_wallet(&self) -> Result<WalletHandle, Error> {
        self.resolve_btc_wallet().await
    }

    async fn probe_fee(&self, wallet_id: &str, payment_request: &str) -> Result<FeeEstimate, Error> {
        self.probe_fee(wallet_id, payment_request).await
    }

    async fn pay_invoice(
        &self,
        wallet_id: &str,
        payment_request: &str,
    ) -> Result<PaymentOutcome, Error> {
        self.pay_invoice(wallet_id, payment_request).await
    }

    async fn pay_lnurl(
        &self,
        wallet_id: &str,
        lnurl: &str,
        amount_sats: u64,
    ) -> Result<PaymentOutcome, Error> {
        self.pay_lnurl(wallet_id, lnurl, amount_sats).await
    }
}
