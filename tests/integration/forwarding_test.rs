use super::common::{
    assert_no_delivery, client, dead_address, next_request, proxy_config, spawn_proxy,
    spawn_upstream, spawn_webhook,
};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[test_log::test(tokio::test)]
async fn untracked_get_is_forwarded_with_query_and_not_notified() {
    let mut upstream = spawn_upstream().await;
    let mut webhook = spawn_webhook(StatusCode::OK).await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, Some(&webhook.url), None)).await;

    let response = client()
        .get(format!("{}/v1/agents/agent-123?include=tools&limit=5", proxy))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"id": "agent-123"}));

    let seen = next_request(&mut upstream).await;
    assert_eq!(seen.method, reqwest::Method::GET);
    assert_eq!(seen.path_and_query, "/v1/agents/agent-123?include=tools&limit=5");
    assert!(seen.body.is_empty());

    assert_no_delivery(&mut webhook).await;
}

#[tokio::test]
async fn configured_key_replaces_caller_credential() {
    let mut upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, Some("proxy-key"), None, None)).await;

    client()
        .get(format!("{}/v1/agents", proxy))
        .header(header::AUTHORIZATION, "Bearer caller-token")
        .send()
        .await
        .unwrap();

    let seen = next_request(&mut upstream).await;
    let auth: Vec<_> = seen.headers.get_all(header::AUTHORIZATION).iter().collect();
    assert_eq!(auth, vec!["Bearer proxy-key"]);
}

#[tokio::test]
async fn caller_credential_is_stripped_without_configured_key() {
    let mut upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, None, None)).await;

    client()
        .get(format!("{}/v1/agents", proxy))
        .header(header::AUTHORIZATION, "Bearer caller-token")
        .send()
        .await
        .unwrap();

    let seen = next_request(&mut upstream).await;
    assert!(seen.headers.get(header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn framing_headers_are_regenerated_for_the_upstream_call() {
    let mut upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, None, None)).await;

    client()
        .post(format!("{}/v1/agents/agent-123/messages", proxy))
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-user-id", "user-7")
        .body(r#"{ "messages" : [ { "content" : "hi" } ] }"#)
        .send()
        .await
        .unwrap();

    let seen = next_request(&mut upstream).await;
    let canonical = br#"{"messages":[{"content":"hi"}]}"#;
    assert_eq!(&seen.body[..], &canonical[..]);

    // Host names the upstream, not the proxy; length matches the re-serialized body.
    assert_eq!(seen.headers[header::HOST], upstream.addr.to_string().as_str());
    assert_eq!(
        seen.headers[header::CONTENT_LENGTH],
        canonical.len().to_string().as_str()
    );
    assert_eq!(seen.headers["x-user-id"], "user-7");
    assert_eq!(seen.headers[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn malformed_json_is_rejected_before_forwarding() {
    let mut upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, None, None)).await;

    let response = client()
        .post(format!("{}/v1/agents/agent-123/messages", proxy))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{\"messages\": [")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(body["details"].is_string());

    assert!(upstream.requests.try_recv().is_err());
}

#[tokio::test]
async fn unreachable_upstream_becomes_error_envelope() {
    let proxy = spawn_proxy(proxy_config(dead_address(), None, None, None)).await;

    let response = client()
        .get(format!("{}/v1/agents", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to reach upstream");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn upstream_errors_are_relayed_verbatim() {
    let upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, None, None)).await;

    let response = client()
        .get(format!("{}/v1/agents/missing", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Agent not found"}));
}

#[tokio::test]
async fn redirects_are_followed_upstream() {
    let upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, None, None)).await;

    let response = client()
        .get(format!("{}/old-location", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"id": "agent-123"}));
}

#[tokio::test]
async fn multipart_body_passes_through_byte_for_byte() {
    let mut upstream = spawn_upstream().await;
    let proxy = spawn_proxy(proxy_config(upstream.addr, None, None, None)).await;

    let payload = "--b0und\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
                   Content-Type: text/plain\r\n\r\nhello\r\n--b0und--\r\n";
    let response = client()
        .post(format!("{}/upload/source", proxy))
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=b0und")
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = next_request(&mut upstream).await;
    assert_eq!(&seen.body[..], payload.as_bytes());
    assert_eq!(
        seen.headers[header::CONTENT_TYPE],
        "multipart/form-data; boundary=b0und"
    );
}
