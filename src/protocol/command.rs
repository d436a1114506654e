use serde::Deserialize;
use thiserror::Error;

/// A control instruction broadcast over the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    /// Wire token carried in the `command` field.
    pub fn token(self) -> &'static str {
        match self {
            Command::Start => "transcribe-start",
            Command::Stop => "transcribe-stop",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "transcribe-start" => Some(Command::Start),
            "transcribe-stop" => Some(Command::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Wire envelope: a JSON object with a single recognized field.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    command: Option<String>,
}

/// Malformed inbound payload. Reported to the caller of `decode`, never
/// propagated through the channel's receive loop.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a command as its JSON wire form.
pub fn encode(command: Command) -> String {
    serde_json::json!({ "command": command.token() }).to_string()
}

/// Decode an inbound wire message.
///
/// `Ok(None)` means the payload was well-formed but did not carry a
/// recognized command; such messages are dropped without dispatch so newer
/// peers can send commands this build does not know about.
pub fn decode(text: &str) -> Result<Option<Command>, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    Ok(envelope.command.as_deref().and_then(Command::from_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_start() {
        assert_eq!(encode(Command::Start), r#"{"command":"transcribe-start"}"#);
    }

    #[test]
    fn encode_stop() {
        assert_eq!(encode(Command::Stop), r#"{"command":"transcribe-stop"}"#);
    }

    #[test]
    fn decode_roundtrip() {
        let decoded = decode(&encode(Command::Start)).unwrap();
        assert_eq!(decoded, Some(Command::Start));
        let decoded = decode(&encode(Command::Stop)).unwrap();
        assert_eq!(decoded, Some(Command::Stop));
    }

    #[test]
    fn unknown_command_is_ignored() {
        let decoded = decode(r#"{"command":"transcribe-pause"}"#).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn missing_command_field_is_ignored() {
        let decoded = decode(r#"{"other":"field"}"#).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn extra_fields_do_not_break_decode() {
        let decoded = decode(r#"{"command":"transcribe-start","extra":42}"#).unwrap();
        assert_eq!(decoded, Some(Command::Start));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(decode("not json").is_err());
    }

    #[test]
    fn non_object_payload_is_an_error() {
        assert!(decode("[1,2,3]").is_err());
    }
}
