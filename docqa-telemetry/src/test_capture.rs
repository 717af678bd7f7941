use crate::{CapturedEvents, LogFormat, TelemetryConfig, capturing_subscriber};
use tracing::info_span;

#[test]
fn test_event_capture_records_message_and_fields() {
    let storage = CapturedEvents::new();
    let _guard = tracing::subscriber::set_default(capturing_subscriber(&storage));

    tracing::info!(chunk_count = 3u64, path = "kb.txt", "document chunked");
    tracing::warn!("something odd");

    let events = storage.events();
    assert_eq!(events.len(), 2);

    let first = &events[0];
    assert_eq!(first.level, "INFO");
    assert_eq!(first.message.as_deref(), Some("document chunked"));
    assert_eq!(first.field("chunk_count"), Some(&serde_json::json!(3)));
    assert_eq!(first.field_str("path"), Some("kb.txt"));
    assert!(first.timestamp > 0);

    assert_eq!(storage.at_level("WARN").len(), 1);
    assert_eq!(storage.messages(), vec!["document chunked", "something odd"]);
}

#[test]
fn test_events_inherit_span_fields() {
    let storage = CapturedEvents::new();
    let _guard = tracing::subscriber::set_default(capturing_subscriber(&storage));

    let outer = info_span!("answer", request.id = "req-1");
    let _outer = outer.enter();
    let inner = info_span!("retrieve", top_k = 4u64);
    let _inner = inner.enter();

    tracing::info!(top_k = 2u64, "retrieved");

    let event = storage.find("retrieved").expect("event captured");
    assert_eq!(event.span.as_deref(), Some("retrieve"));
    assert_eq!(event.field_str("request.id"), Some("req-1"));
    // event fields win over span fields
    assert_eq!(event.field("top_k"), Some(&serde_json::json!(2)));
}

#[test]
fn test_capture_is_scoped_to_guard() {
    let storage = CapturedEvents::new();
    {
        let _guard = tracing::subscriber::set_default(capturing_subscriber(&storage));
        tracing::info!("inside");
    }
    tracing::info!("outside");

    assert!(storage.contains("inside"));
    assert!(!storage.contains("outside"));

    storage.clear();
    assert!(storage.is_empty());
}

#[test]
fn test_captured_event_serialization() {
    let storage = CapturedEvents::new();
    let _guard = tracing::subscriber::set_default(capturing_subscriber(&storage));
    tracing::error!(stage = "embedding", "upstream failure");

    let json = serde_json::to_string(&storage.events()[0]).unwrap();
    assert!(json.contains("\"level\":\"ERROR\""));
    assert!(json.contains("\"message\":\"upstream failure\""));
    assert!(json.contains("\"stage\":\"embedding\""));
    assert!(!json.contains("\"span\""));
}

#[test]
fn test_log_format_parsing() {
    assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert!("xml".parse::<LogFormat>().is_err());
}

#[test]
fn test_config_builder() {
    let config =
        TelemetryConfig::new("svc").with_log_file("logs/app.log").with_format(LogFormat::Json);
    assert_eq!(config.service_name, "svc");
    assert_eq!(config.default_filter, "info");
    assert_eq!(config.clone().with_default_filter("debug").default_filter, "debug");
    assert_eq!(config.log_file.as_deref(), Some(std::path::Path::new("logs/app.log")));
    assert_eq!(config.format, LogFormat::Json);
}
