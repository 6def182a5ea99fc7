use serde_json::{Map, Value};

use crate::types::PlayerInput;

#[derive(Debug)]
pub enum ParsedClientMessage {
    Hello {
        name: String,
        room_id: Option<String>,
    },
    Input(PlayerInput),
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "hello" => {
            let name = match object.get("name") {
                None | Some(Value::Null) => String::new(),
                Some(value) => value.as_str()?.to_string(),
            };
            let room_id = match object.get("roomId") {
                None => None,
                Some(value) => Some(value.as_str()?.to_string()),
            };
            Some(ParsedClientMessage::Hello { name, room_id })
        }
        "input" => Some(ParsedClientMessage::Input(PlayerInput {
            up: required_bool(object, "up")?,
            down: required_bool(object, "down")?,
            left: required_bool(object, "left")?,
            right: required_bool(object, "right")?,
            chop: required_bool(object, "chop")?,
        })),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn required_bool(object: &Map<String, Value>, key: &str) -> Option<bool> {
    object.get(key)?.as_bool()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hello_message() {
        let parsed = parse_client_message(r#"{"type":"hello","name":"A","roomId":"game"}"#)
            .expect("hello message should parse");
        match parsed {
            ParsedClientMessage::Hello { name, room_id } => {
                assert_eq!(name, "A");
                assert_eq!(room_id.as_deref(), Some("game"));
            }
            _ => panic!("expected hello message"),
        }
    }

    #[test]
    fn parse_hello_without_name_is_accepted() {
        let parsed = parse_client_message(r#"{"type":"hello"}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::Hello { ref name, room_id: None }) if name.is_empty()
        ));
    }

    #[test]
    fn parse_hello_rejects_non_string_name() {
        assert!(parse_client_message(r#"{"type":"hello","name":5}"#).is_none());
    }

    #[test]
    fn parse_input_message() {
        let parsed = parse_client_message(
            r#"{"type":"input","up":false,"down":true,"left":false,"right":true,"chop":true}"#,
        );
        match parsed {
            Some(ParsedClientMessage::Input(input)) => {
                assert_eq!(input.direction(), (1, 1));
                assert!(input.chop);
            }
            other => panic!("expected input message, got {other:?}"),
        }
    }

    #[test]
    fn parse_input_rejects_missing_or_mistyped_fields() {
        assert!(parse_client_message(
            r#"{"type":"input","up":false,"down":true,"left":false,"right":true}"#
        )
        .is_none());
        assert!(parse_client_message(
            r#"{"type":"input","up":0,"down":true,"left":false,"right":true,"chop":false}"#
        )
        .is_none());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_client_message("not json").is_none());
        assert!(parse_client_message("[1,2,3]").is_none());
        assert!(parse_client_message(r#"{"type":"teleport"}"#).is_none());
        assert!(parse_client_message(r#"{"up":true}"#).is_none());
    }

    #[test]
    fn parse_ping_requires_number() {
        assert!(matches!(
            parse_client_message(r#"{"type":"ping","t":12.5}"#),
            Some(ParsedClientMessage::Ping { .. })
        ));
        assert!(parse_client_message(r#"{"type":"ping","t":"now"}"#).is_none());
    }
}
