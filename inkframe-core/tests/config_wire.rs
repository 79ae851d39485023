//! Wire-format tests against a realistic device configuration document.

use inkframe_core::types::{Condition, DisplayConfig};

const DEVICE_DOC: &str = r#"{
    "screens": [
        {
            "url": "http://homeassistant.local:8123/lovelace/morning",
            "start_time": "06:00",
            "end_time": "09:30"
        },
        {
            "url": "http://homeassistant.local:8123/lovelace/away",
            "duration_minutes": 5,
            "force_show_if_conditions_match": true,
            "conditions": [
                {
                    "type": "user-zone",
                    "entity": "person.alex",
                    "zone": "home",
                    "expected_state": false
                }
            ]
        },
        {
            "url": "http://grafana.local/d/energy",
            "duration_minutes": 15,
            "conditions": [
                {"type": "day-of-week", "days": [1, 2, 3, 4, 5]}
            ]
        },
        {
            "url": "http://dash.local/photos"
        }
    ],
    "randomize_screens": true,
    "refresh_interval_minutes": 60
}"#;

#[test]
fn full_document_parses() {
    let config: DisplayConfig = serde_json::from_str(DEVICE_DOC).expect("parse device doc");

    assert_eq!(config.screens.len(), 4);
    assert!(config.randomize_screens);
    assert_eq!(config.refresh_interval_minutes, 60);
    assert_eq!(
        config.conditions_check_interval_minutes, 5,
        "unset check interval should fall back to 5"
    );

    let morning = &config.screens[0];
    assert!(morning.has_window());
    assert_eq!(
        morning.window().map(|(s, e)| (s.to_string(), e.to_string())),
        Some(("06:00".to_string(), "09:30".to_string()))
    );

    let away = &config.screens[1];
    assert!(away.force_show_if_conditions_match);
    assert_eq!(away.duration_ms(), 5 * 60_000);
    assert!(matches!(
        away.conditions[0],
        Condition::UserZone {
            expected_state: false,
            ..
        }
    ));

    let photos = &config.screens[3];
    assert!(!photos.has_window());
    assert_eq!(photos.duration_ms(), 20 * 60_000, "default duration");
}

#[test]
fn document_roundtrips_through_json() {
    let config: DisplayConfig = serde_json::from_str(DEVICE_DOC).expect("parse");
    let encoded = serde_json::to_string(&config).expect("encode");
    let decoded: DisplayConfig = serde_json::from_str(&encoded).expect("reparse");
    assert_eq!(config, decoded);
}

#[test]
fn unknown_condition_type_is_a_parse_error() {
    let doc = r#"{"screens": [{"url": "http://x.test", "conditions": [{"type": "moon-phase"}]}]}"#;
    assert!(serde_json::from_str::<DisplayConfig>(doc).is_err());
}
