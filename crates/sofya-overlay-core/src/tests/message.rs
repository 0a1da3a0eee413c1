use crate::Command;

/// WHAT: Commands use a kebab-case `type` tag on the wire
/// WHY: Page scripts match on the `type` field of incoming messages
#[test]
#[allow(clippy::unwrap_used)]
fn given_commands_when_serializing_then_type_tagged_json() {
    // When
    let show = serde_json::to_value(Command::Show).unwrap();
    let status = serde_json::to_value(Command::AuthStatus {
        authenticated: true,
    })
    .unwrap();

    // Then
    assert_eq!(show, serde_json::json!({ "type": "show" }));
    assert_eq!(
        status,
        serde_json::json!({ "type": "auth-status", "authenticated": true })
    );
}

/// WHAT: Unknown message types are rejected
/// WHY: A page must not act on messages it does not understand
#[test]
fn given_unknown_type_when_deserializing_then_error() {
    let parsed = serde_json::from_str::<Command>(r#"{"type":"hide"}"#);
    assert!(parsed.is_err());
}
