//! GraphQL transport against the Blink API
//!
//! One POST per operation. Top-level `errors` in the response envelope are
//! surfaced as [`Error::GraphQl`]; business-level errors inside a
//! mutation's payload are left for the caller to interpret.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Execute a GraphQL request and return the `data` object
pub(crate) async fn execute(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
    variables: Option<Value>,
) -> Result<Value, Error> {
    let body = serde_json::json!({
        "query": query,
        "variables": variables.unwrap_or(Value::Null),
    });

    let response = client.post(endpoint).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Http(status.as_u16()));
    }

    let json: Value = response.json().await?;

    if let Some(errors) = json.get("errors").and_then(|e| e.as_array()) {
        if !errors.is_empty() {
            let msg = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::GraphQl(msg));
        }
    }

    json.get("data")
        .cloned()
        .ok_or_else(|| Error::Protocol("no data in GraphQL response".to_string()))
}

/// Execute a GraphQL request with a time bound
pub(crate) async fn execute_with_timeout(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
    variables: Option<Value>,
    timeout: std::time::Duration,
) -> Result<Value, Error> {
    match tokio::time::timeout(timeout, execute(client, endpoint, query, variables)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout),
    }
}

/// Extract one named field from a `data` object into a typed payload
pub(crate) fn payload<T: DeserializeOwned>(data: Value, field: &str) -> Result<T, Error> {
    let value = data
        .get(field)
        .cloned()
        .ok_or_else(|| Error::Protocol(format!("no {field} in response")))?;
    serde_json::from_value(value)
        .map_err(|e| Error::Protocol(format!("malformed {field} payload: {e}")))
}

/// Join provider error messages for display or error construction
pub(crate) fn join_messages(errors: &[crate::types::ProviderError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
