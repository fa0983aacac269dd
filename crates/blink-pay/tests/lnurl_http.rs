//! Integration tests for the LNURL-pay HTTP connector using mockito

use blink_pay::lnurl::{self, HttpLnurlConnector};
use blink_pay::{Error, PayeeIdentifier};

#[tokio::test]
async fn resolves_pay_params_over_http() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/.well-known/lnurlp/alice")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "callback":"https://pay.example.com/cb",
                "minSendable":1000,
                "maxSendable":500000000,
                "commentAllowed":140,
                "metadata":"[[\"text/plain\",\"pay alice\"]]",
                "tag":"payRequest"
            }"#,
        )
        .create_async()
        .await;

    let connector = HttpLnurlConnector::new();
    let identifier: PayeeIdentifier = format!("{}/.well-known/lnurlp/alice", server.url())
        .parse()
        .expect("identifier");

    let params = lnurl::resolve_pay_params(&connector, &identifier)
        .await
        .expect("params");

    assert_eq!(params.callback.as_str(), "https://pay.example.com/cb");
    assert_eq!(params.min_sendable_msat, 1000);
    assert_eq!(params.max_sendable_msat, 500_000_000);
    assert_eq!(params.comment_allowed, 140);
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_carries_the_code() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/.well-known/lnurlp/ghost")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let connector = HttpLnurlConnector::new();
    let identifier: PayeeIdentifier = format!("{}/.well-known/lnurlp/ghost", server.url())
        .parse()
        .expect("identifier");

    let err = lnurl::resolve_pay_params(&connector, &identifier)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(404)));
}

#[tokio::test]
async fn malformed_body_is_a_protocol_error() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/.well-known/lnurlp/alice")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let connector = HttpLnurlConnector::new();
    let identifier: PayeeIdentifier = format!("{}/.well-known/lnurlp/alice", server.url())
        .parse()
        .expect("identifier");

    let err = lnurl::resolve_pay_params(&connector, &identifier)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn invoice_request_sends_amount_and_comment() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/cb")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("session".into(), "abc".into()),
            mockito::Matcher::UrlEncoded("amount".into(), "50000".into()),
            mockito::Matcher::UrlEncoded("comment".into(), "hello".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"pr":"lnbc500n1...","routes":[]}"#)
        .create_async()
        .await;

    let connector = HttpLnurlConnector::new();
    let params = blink_pay::LnurlPayParams {
        callback: format!("{}/cb?session=abc", server.url()).parse().expect("url"),
        min_sendable_msat: 1000,
        max_sendable_msat: 100_000,
        comment_allowed: 5,
        metadata: None,
    };

    let invoice = lnurl::request_invoice(&connector, &params, 50, Some("hello world"))
        .await
        .expect("invoice");

    assert_eq!(invoice.payment_request, "lnbc500n1...");
    mock.assert_async().await;
}

#[tokio::test]
async fn callback_error_body_fails_negotiation() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/cb")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"ERROR","reason":"amount below minimum"}"#)
        .create_async()
        .await;

    let connector = HttpLnurlConnector::new();
    let params = blink_pay::LnurlPayParams {
        callback: format!("{}/cb", server.url()).parse().expect("url"),
        min_sendable_msat: 1000,
        max_sendable_msat: 100_000,
        comment_allowed: 0,
        metadata: None,
    };

    let err = lnurl::request_invoice(&connector, &params, 50, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol(m) if m == "amount below minimum"));
}
