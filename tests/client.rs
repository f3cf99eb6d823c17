//! Outbound client behavior against a local mock upstream.

mod common;

use serde::Deserialize;

use faultline::config::ClientConfig;
use faultline::http::client::{get_json, new_client, post_json};
use faultline::provenance::{decode, Decoded};

#[derive(Debug, Deserialize)]
struct Health {
    state: String,
}

#[tokio::test]
async fn test_get_json_decodes_reply() {
    let addr =
        common::start_mock_upstream("200 OK", "application/json", r#"{"state": "ready"}"#).await;
    let client = new_client(&ClientConfig::default()).unwrap();

    let reply = get_json::<Health>(&client, &format!("http://{addr}/health"))
        .await
        .unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body.state, "ready");
}

#[tokio::test]
async fn test_post_json_decodes_reply() {
    let addr =
        common::start_mock_upstream("200 OK", "application/json", r#"{"state": "accepted"}"#)
            .await;
    let client = new_client(&ClientConfig::default()).unwrap();
    let payload = serde_json::json!({ "name": "probe" });

    let reply = post_json::<_, Health>(&client, &format!("http://{addr}/submit"), &payload)
        .await
        .unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body.state, "accepted");
}

#[tokio::test]
async fn test_error_statuses_still_decode() {
    let addr = common::start_mock_upstream(
        "503 Service Unavailable",
        "application/json",
        r#"{"state": "draining"}"#,
    )
    .await;
    let client = new_client(&ClientConfig::default()).unwrap();

    let reply = get_json::<Health>(&client, &format!("http://{addr}/health"))
        .await
        .unwrap();

    assert_eq!(reply.status, 503);
    assert_eq!(reply.body.state, "draining");
}

#[tokio::test]
async fn test_decode_failure_comes_back_annotated() {
    let addr = common::start_mock_upstream("200 OK", "text/plain", "oops").await;
    let client = new_client(&ClientConfig::default()).unwrap();

    let err = get_json::<Health>(&client, &format!("http://{addr}/health"))
        .await
        .unwrap_err();

    let decoded = decode(err.as_str());
    assert!(
        decoded.text().contains("error decoding response body"),
        "got {decoded:?}"
    );
    // Attribution is best effort across the await; the file is stable when
    // frames resolve.
    if let Decoded::Located { file, .. } = &decoded {
        assert_eq!(file, "client.rs");
    }
}
