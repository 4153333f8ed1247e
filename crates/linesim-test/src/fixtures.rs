//! Test fixtures for scenarios, parameters and catalog payloads.

use std::sync::Once;

use linesim_core::{MessageTemplate, ParameterSet, Scenario};
use serde_json::{Value, json};

/// Parameters matching the hotel demo sheet.
pub fn hotel_parameters() -> ParameterSet {
    ParameterSet::new()
        .with("shop_name", "膂盟大飯店")
        .with("user_name", "James")
        .with("product_name", "極上一泊二食 | ITF台北國際旅展住宿券")
}

/// Three messages: `A` immediately, `B` after 100 ms, `C` 50 ms after `B`.
pub fn timed_scenario() -> Scenario {
    Scenario::new("timed", "Timed")
        .with_category("Timing")
        .with_message(MessageTemplate::new("A"))
        .with_message(MessageTemplate::new("B").with_delay_ms(100))
        .with_message(MessageTemplate::new("C").with_delay_ms(50))
}

/// A greeting whose text depends on the parameters at emission time.
pub fn greeting_scenario() -> Scenario {
    Scenario::new("greeting", "Greeting")
        .with_category("Onboarding")
        .with_message(MessageTemplate::new("Hi {user_name}").with_time_label("10:00"))
        .with_message(MessageTemplate::new("Welcome to {shop_name}").with_delay_ms(1_000))
}

/// A longer scenario, useful for stopping or overlapping playback.
pub fn slow_scenario() -> Scenario {
    (1..=5).fold(
        Scenario::new("slow", "Slow").with_category("Timing"),
        |s, n| s.with_message(MessageTemplate::new(format!("step {n}")).with_delay_ms(1_000)),
    )
}

/// A catalog payload with two categories, one uncategorized scenario and one
/// record with a negative delay.
pub fn sample_catalog_json() -> Value {
    json!([
        {
            "id": "welcome",
            "label": "歡迎訊息",
            "category": "Onboarding",
            "messages": [
                {"text": "{user_name} 您好，歡迎來到 {shop_name}！", "delay": 0, "timeLabel": "10:00"},
                {"text": "今日推薦：{product_name}", "delay": 800}
            ]
        },
        {
            "id": "order",
            "label": "訂單確認",
            "category": "Booking",
            "messages": [
                {"text": "感謝訂購 {product_name}", "delay": 500},
                {"text": "訂單編號 {order_id}", "delay": 500, "timeLabel": "10:05"}
            ]
        },
        {
            "id": 42,
            "label": "",
            "messages": [{"text": "numeric id", "delay": "200"}]
        },
        {
            "id": "reminder",
            "label": "入住提醒",
            "category": "Onboarding",
            "messages": [{"text": "明天見，{user_name}", "delay": 300}]
        },
        {
            "id": "broken",
            "label": "Broken",
            "messages": [{"text": "never", "delay": -100}]
        }
    ])
}

/// The error object a script endpoint returns when its sheet is missing.
pub fn server_error_json() -> Value {
    json!({"error": "找不到工作表 Scenarios"})
}

static TRACING: Once = Once::new();

/// Install a test subscriber once per process, filtered by `RUST_LOG`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
