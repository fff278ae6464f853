use crate::e2e::helpers;

use feedtape_narration::domain::audio::ItemId;
use helpers::{TestContext, FAILING_TEXT_MARKER};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_context::test_context;

fn story(title: &str, text: &str) -> Value {
    json!({
        "source_url": "https://example.com/feed",
        "title": title,
        "text": text,
    })
}

fn item_id(title: &str, text: &str) -> ItemId {
    ItemId::for_content("https://example.com/feed", title, text)
}

fn items(report: &Value) -> &Vec<Value> {
    report.get("items").and_then(|v| v.as_array()).expect("Missing items")
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_generate_with_local_provider_and_serve_result(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(
            "/api/audio/generate",
            &json!({ "voice": "narrator-b", "items": [story("Hello", "<p>Hello listeners</p>")] }),
            &ctx.token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let report = response.body.as_ref().unwrap();
    assert_eq!(report.get("ready").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(report.get("failed").and_then(|v| v.as_u64()), Some(0));
    assert!(report.get("completed_at").is_some());

    let entry = &items(report)[0];
    let id = item_id("Hello", "<p>Hello listeners</p>");
    assert_eq!(entry.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
    assert_eq!(entry.get("status").and_then(|v| v.as_str()), Some("ready"));
    assert_eq!(entry.get("provider").and_then(|v| v.as_str()), Some("local"));
    assert_eq!(entry.get("cached").and_then(|v| v.as_bool()), Some(false));

    let url = entry.get("url").and_then(|v| v.as_str()).unwrap();
    let audio = ctx.client.get_with_auth(url, &ctx.token).await.unwrap();
    audio.assert_status(StatusCode::OK);
    assert_eq!(
        entry.get("size_bytes").and_then(|v| v.as_u64()),
        Some(audio.body_bytes.len() as u64)
    );
    assert_eq!(ctx.remote.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fall_back_to_remote_when_local_is_unavailable(ctx: &TestContext) {
    ctx.local.set_available(false);

    let response = ctx
        .client
        .post_with_auth("/api/audio/generate", &json!({ "items": [story("Fallback", "Some text")] }), &ctx.token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let entry = &items(response.body.as_ref().unwrap())[0];
    assert_eq!(entry.get("provider").and_then(|v| v.as_str()), Some("polly"));
    assert_eq!(ctx.local.calls(), 0);
    assert_eq!(ctx.remote.calls(), 1);

    let provider = ctx.client.get_with_auth("/api/audio/provider", &ctx.token).await.unwrap();
    provider.assert_status(StatusCode::OK);
    assert_eq!(provider.body.unwrap(), json!({ "provider": "polly", "error": null }));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pick_up_local_provider_again_without_restart(ctx: &TestContext) {
    ctx.local.set_available(false);
    let status = ctx.client.get_with_auth("/api/audio/provider", &ctx.token).await.unwrap();
    assert_eq!(status.body.unwrap().get("provider").and_then(|v| v.as_str()), Some("polly"));

    ctx.local.set_available(true);
    let status = ctx.client.get_with_auth("/api/audio/provider", &ctx.token).await.unwrap();
    assert_eq!(status.body.unwrap().get("provider").and_then(|v| v.as_str()), Some("local"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_every_item_when_no_provider_is_available(ctx: &TestContext) {
    ctx.local.set_available(false);
    ctx.remote.set_available(false);

    let response = ctx
        .client
        .post_with_auth(
            "/api/audio/generate",
            &json!({ "items": [story("One", "first"), story("Two", "second")] }),
            &ctx.token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let report = response.body.as_ref().unwrap();
    assert_eq!(report.get("failed").and_then(|v| v.as_u64()), Some(2));
    for entry in items(report) {
        assert_eq!(entry.get("status").and_then(|v| v.as_str()), Some("failed"));
        assert_eq!(entry.get("kind").and_then(|v| v.as_str()), Some("no_provider_available"));
        let message = entry.get("message").and_then(|v| v.as_str()).unwrap();
        assert!(message.contains("local switched off"));
        assert!(message.contains("polly switched off"));
    }

    let provider = ctx.client.get_with_auth("/api/audio/provider", &ctx.token).await.unwrap();
    let body = provider.body.unwrap();
    assert_eq!(body.get("provider"), Some(&Value::Null));
    assert!(body.get("error").and_then(|v| v.as_str()).unwrap().contains("local"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_continue_batch_after_a_failed_item(ctx: &TestContext) {
    let bad_text = format!("this one {}", FAILING_TEXT_MARKER);

    let response = ctx
        .client
        .post_with_auth(
            "/api/audio/generate",
            &json!({ "items": [story("A", "alpha"), story("B", &bad_text), story("C", "gamma")] }),
            &ctx.token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let report = response.body.as_ref().unwrap();
    let statuses: Vec<&str> = items(report)
        .iter()
        .map(|e| e.get("status").and_then(|v| v.as_str()).unwrap())
        .collect();
    assert_eq!(statuses, vec!["ready", "failed", "ready"]);
    assert_eq!(items(report)[1].get("kind").and_then(|v| v.as_str()), Some("synthesis_failed"));

    let availability = ctx
        .client
        .post_with_auth(
            "/api/audio/availability",
            &json!({ "ids": [item_id("A", "alpha"), item_id("B", &bad_text), item_id("C", "gamma")] }),
            &ctx.token,
        )
        .await
        .unwrap();
    availability.assert_status(StatusCode::OK);
    let flags: Vec<bool> = items(availability.body.as_ref().unwrap())
        .iter()
        .map(|e| e.get("has_audio").and_then(|v| v.as_bool()).unwrap())
        .collect();
    assert_eq!(flags, vec![true, false, true]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_second_request_from_store(ctx: &TestContext) {
    let body = json!({ "items": [story("Cached", "same text")] });

    ctx.client
        .post_with_auth("/api/audio/generate", &body, &ctx.token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    let second = ctx
        .client
        .post_with_auth("/api/audio/generate", &body, &ctx.token)
        .await
        .unwrap();

    let entry = &items(second.body.as_ref().unwrap())[0];
    assert_eq!(entry.get("cached").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(entry.get("provider"), Some(&Value::Null));
    assert_eq!(ctx.local.calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_id_that_does_not_match_content(ctx: &TestContext) {
    let mut item = story("Title", "text");
    item["id"] = json!("b".repeat(64));

    let response = ctx
        .client
        .post_with_auth("/api/audio/generate", &json!({ "items": [item] }), &ctx.token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("does not match its content");
    assert_eq!(ctx.local.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_ids_in_availability_request(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(
            "/api/audio/availability",
            &json!({ "ids": ["a".repeat(64), "../secret"] }),
            &ctx.token,
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid item id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_batch(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth("/api/audio/generate", &json!({ "items": [] }), &ctx.token)
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
}
