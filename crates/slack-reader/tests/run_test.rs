use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chatops_slack_reader::{
    config::{RunConfig, SlackConfig, WebhookConfig},
    sinks::WebhookSink,
    slack::SlackClient,
    RunOutcome, Runner,
};
use serde_json::{json, Value};

const CHANNEL: &str = "C0123456";

#[derive(Clone, Default)]
struct Recorded {
    webhook_bodies: Arc<Mutex<Vec<Value>>>,
    posted: Arc<Mutex<Vec<Value>>>,
    joined: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct FakeState {
    channel_name: String,
    history: Value,
    webhook_status: StatusCode,
    recorded: Recorded,
}

async fn conversations_info(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if params.get("channel").map(String::as_str) != Some(CHANNEL) {
        return Json(json!({ "ok": false, "error": "channel_not_found" }));
    }
    Json(json!({
        "ok": true,
        "channel": { "id": CHANNEL, "name": state.channel_name, "is_channel": true }
    }))
}

async fn conversations_join(State(state): State<FakeState>, Json(body): Json<Value>) -> Json<Value> {
    state.recorded.joined.lock().unwrap().push(body);
    Json(json!({ "ok": true, "channel": { "id": CHANNEL } }))
}

async fn conversations_history(State(state): State<FakeState>) -> Json<Value> {
    Json(json!({ "ok": true, "has_more": false, "messages": state.history }))
}

async fn post_message(State(state): State<FakeState>, Json(body): Json<Value>) -> Json<Value> {
    state.recorded.posted.lock().unwrap().push(body);
    Json(json!({ "ok": true, "channel": CHANNEL, "ts": "1623339200.000100" }))
}

async fn alert_webhook(State(state): State<FakeState>, Json(body): Json<Value>) -> StatusCode {
    state.recorded.webhook_bodies.lock().unwrap().push(body);
    state.webhook_status
}

async fn start_fake(channel_name: &str, history: Value, webhook_status: StatusCode) -> (String, Recorded) {
    let recorded = Recorded::default();
    let state = FakeState {
        channel_name: channel_name.to_string(),
        history,
        webhook_status,
        recorded: recorded.clone(),
    };
    let app = Router::new()
        .route("/api/conversations.info", get(conversations_info))
        .route("/api/conversations.join", post(conversations_join))
        .route("/api/conversations.history", get(conversations_history))
        .route("/api/chat.postMessage", post(post_message))
        .route("/alert", post(alert_webhook))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), recorded)
}

fn runner(base_url: &str) -> Runner {
    let slack = SlackClient::new(&SlackConfig {
        token: "xoxb-test".to_string(),
        channel_id: CHANNEL.to_string(),
        api_url: format!("{}/api", base_url),
        timeout_secs: 5,
    })
    .unwrap();
    let sink = WebhookSink::new(&WebhookConfig {
        url: format!("{}/alert", base_url),
        timeout_secs: 5,
    })
    .unwrap();
    Runner::new(
        Arc::new(slack),
        Arc::new(sink),
        RunConfig {
            channel_prefix: "inc-".to_string(),
            settle_delay_secs: 0,
            dry_run: false,
        },
    )
}

fn opsgenie_history() -> Value {
    json!([
        { "type": "message", "user": "U1", "text": "anyone looking at this?", "ts": "1623339300.000100" },
        {
            "type": "message",
            "user": "U02MCG949",
            "ts": "1623339149.000700",
            "attachments": [{
                "id": 1,
                "color": "D0D0D0",
                "title": "#4865: [Prometheus]: anteater / anteater - PrometheusPersistentVolumeSpaceTooLow",
                "title_link": "https://opsg.in/a/i/giantswarm/2e674f86-b131-42be-9f9c-3c68b49684af-1623336728751",
                "text": "*Team:* atlas",
                "fields": [
                    { "title": "Priority", "value": "P3", "short": true },
                    {
                        "title": "Tags",
                        "value": "PrometheusPersistentVolumeSpaceTooLow, anteater, atlas, aws, management_cluster, page, stable",
                        "short": true
                    },
                    { "title": "Routed Teams", "value": "atlas, alerts_router_team", "short": true }
                ]
            }]
        }
    ])
}

#[tokio::test]
async fn test_alert_is_posted_to_webhook() {
    let (base_url, recorded) = start_fake("inc-4865-anteater", opsgenie_history(), StatusCode::OK).await;

    let outcome = runner(&base_url).run(CHANNEL).await.unwrap();
    assert!(matches!(outcome, RunOutcome::AlertForwarded(_)));

    let bodies = recorded.webhook_bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        json!({
            "alert_name": "PrometheusPersistentVolumeSpaceTooLow",
            "priority": "P3",
            "installation_name": "anteater",
            "installation_pipeline": "stable",
            "provider": "aws",
            "affects_management_cluster": true,
            "affects_workload_cluster": false,
            "slack_channel_id": CHANNEL,
            "slack_channel_name": "inc-4865-anteater"
        })
    );

    assert_eq!(recorded.joined.lock().unwrap().len(), 1);
    let posted = recorded.posted.lock().unwrap().clone();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["channel"], CHANNEL);
    let text = posted[0]["text"].as_str().unwrap();
    assert!(text.contains("\"provider\": \"aws\""));
    assert!(text.ends_with("`[chatops-slack-reader done for channel C0123456]`"));
}

#[tokio::test]
async fn test_webhook_error_status_is_reported() {
    let (base_url, recorded) = start_fake(
        "inc-4865-anteater",
        opsgenie_history(),
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .await;

    let outcome = runner(&base_url).run(CHANNEL).await.unwrap();
    match outcome {
        RunOutcome::ForwardFailed { error, .. } => {
            assert!(error.to_string().contains("webhook status was 503"))
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let posted = recorded.posted.lock().unwrap().clone();
    assert_eq!(
        posted[0]["text"],
        "Could not trigger alert event: `could not trigger alert event, webhook status was 503`"
    );
}

#[tokio::test]
async fn test_channel_without_alert_is_prompted() {
    let history = json!([{ "type": "message", "user": "U1", "text": "hello", "ts": "1.0" }]);
    let (base_url, recorded) = start_fake("inc-9999-unknown", history, StatusCode::OK).await;

    let outcome = runner(&base_url).run(CHANNEL).await.unwrap();
    assert!(matches!(outcome, RunOutcome::NoAlert));
    assert!(recorded.webhook_bodies.lock().unwrap().is_empty());

    let posted = recorded.posted.lock().unwrap().clone();
    assert_eq!(
        posted[0]["text"],
        "No alert info found so far. Please share an #opsgenie alert message in this channel."
    );
}

#[tokio::test]
async fn test_other_channels_are_left_alone() {
    let (base_url, recorded) = start_fake("general", opsgenie_history(), StatusCode::OK).await;

    let outcome = runner(&base_url).run(CHANNEL).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Ignored { .. }));
    assert!(recorded.joined.lock().unwrap().is_empty());
    assert!(recorded.posted.lock().unwrap().is_empty());
    assert!(recorded.webhook_bodies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_channel_is_an_error() {
    let (base_url, _recorded) = start_fake("inc-1", json!([]), StatusCode::OK).await;

    let err = runner(&base_url).run("C_UNKNOWN").await.unwrap_err();
    assert!(err.to_string().contains("channel_not_found"));
}
