mod harness;

use easel_config::{ErrorKind, ProviderKind};
use harness::config::ConfigBuilder;
use harness::mock_dalle::MockDalle;
use harness::mock_midjourney::MockMidjourney;
use harness::server::TestServer;
use serde_json::json;

fn accounts() -> serde_json::Value {
    json!([{"id": "acct-1", "coreSize": 3, "queueSize": 0, "enable": true}])
}

#[tokio::test]
async fn executor_retries_transient_errors() {
    let dalle = MockDalle::start_failing(2).await.unwrap();
    let config = ConfigBuilder::new().with_dalle(&dalle.api_url()).max_retries(3).build();
    let server = TestServer::start(config).await.unwrap();

    let (_, body) = server.generate(&json!({"prompt": "a red fox"})).await;
    let task = server.wait_for_terminal(body["task_id"].as_str().unwrap()).await;

    assert_eq!(task["status"], "completed");
    assert_eq!(dalle.request_count(), 3);
}

#[tokio::test]
async fn failing_default_falls_back_once() {
    let dalle = MockDalle::start_failing(u32::MAX).await.unwrap();
    let midjourney = MockMidjourney::start(accounts(), 0).await.unwrap();
    let config = ConfigBuilder::new()
        .with_dalle(&dalle.api_url())
        .with_midjourney(&midjourney.api_url(), 3)
        .fallback_provider(ProviderKind::Midjourney)
        .max_retries(2)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let (_, body) = server.generate(&json!({"prompt": "a red fox"})).await;

    // the task keeps the provider it was routed to
    assert_eq!(body["provider"], "dalle");

    let task = server.wait_for_terminal(body["task_id"].as_str().unwrap()).await;

    assert_eq!(task["status"], "completed");
    assert_eq!(task["result_url"], MockMidjourney::image_url("task-1"));
    assert_eq!(dalle.request_count(), 2);
    assert_eq!(midjourney.submit_count(), 1);
}

#[tokio::test]
async fn error_outside_fallback_set_fails_the_task() {
    let dalle = MockDalle::start_failing(u32::MAX).await.unwrap();
    let midjourney = MockMidjourney::start(accounts(), 0).await.unwrap();
    let config = ConfigBuilder::new()
        .with_dalle(&dalle.api_url())
        .with_midjourney(&midjourney.api_url(), 3)
        .fallback_provider(ProviderKind::Midjourney)
        .fallback_on(vec![ErrorKind::Network])
        .max_retries(1)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let (_, body) = server.generate(&json!({"prompt": "a red fox"})).await;
    let task = server.wait_for_terminal(body["task_id"].as_str().unwrap()).await;

    assert_eq!(task["status"], "failed");
    assert_eq!(task["error_message"], "API Error (500): Server Error");
    assert_eq!(midjourney.submit_count(), 0);
}

#[tokio::test]
async fn midjourney_without_capacity_does_not_fall_back() {
    let dalle = MockDalle::start().await.unwrap();
    let midjourney = MockMidjourney::start(
        json!([
            {"id": "full", "coreSize": 2, "queueSize": 2, "enable": true},
            {"id": "off", "coreSize": 5, "queueSize": 0, "enable": false}
        ]),
        0,
    )
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_dalle(&dalle.api_url())
        .with_midjourney(&midjourney.api_url(), 3)
        .default_provider(ProviderKind::Midjourney)
        .fallback_provider(ProviderKind::Dalle)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let (_, body) = server.generate(&json!({"prompt": "a castle"})).await;
    let task = server.wait_for_terminal(body["task_id"].as_str().unwrap()).await;

    assert_eq!(task["status"], "failed");
    assert_eq!(task["error_message"], "No available Midjourney accounts");
    assert_eq!(midjourney.submit_count(), 0);
    assert_eq!(dalle.request_count(), 0);
}
