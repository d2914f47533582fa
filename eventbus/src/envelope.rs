use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub const TRANSFER_TOPIC: &str = "transfer";

/// The wire-level wrapper every bus message carries. `payload` is raw JSON
/// bytes of whichever shape `event_type` names; the envelope itself never
/// needs to know that shape to be routed or persisted.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub timestamp_ms: i64,
    pub event_type: String,
    pub sender: String,
    pub payload: Vec<u8>,
}

/// Wire shape of an `Envelope`: field names and the base64-encoded payload
/// match the upstream struct's default `encoding/json` marshaling (no
/// json tags on that struct, and `[]byte` fields marshal to base64).
#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "Timestamp")]
    timestamp: i64,
    #[serde(rename = "EventType")]
    event_type: String,
    #[serde(rename = "Sender")]
    sender: String,
    #[serde(rename = "Payload")]
    payload: String,
}

impl Envelope {
    pub fn to_wire_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&WireEnvelope {
            timestamp: self.timestamp_ms,
            event_type: self.event_type.clone(),
            sender: self.sender.clone(),
            payload: BASE64.encode(&self.payload),
        })
    }

    pub fn from_wire_json(bytes: &[u8]) -> Result<Self, String> {
        let wire: WireEnvelope = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        let payload = BASE64.decode(wire.payload).map_err(|e| e.to_string())?;
        Ok(Envelope {
            timestamp_ms: wire.timestamp,
            event_type: wire.event_type,
            sender: wire.sender,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_json_uses_capitalized_field_names_and_base64_payload() {
        let envelope = Envelope {
            timestamp_ms: 1_700_000_000_000,
            event_type: "transfer_created".to_string(),
            sender: "jim".to_string(),
            payload: b"{\"status\":\"created\"}".to_vec(),
        };
        let wire = envelope.to_wire_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&wire).unwrap();
        assert_eq!(parsed["Timestamp"], 1_700_000_000_000i64);
        assert_eq!(parsed["EventType"], "transfer_created");
        assert_eq!(parsed["Sender"], "jim");
        assert_eq!(parsed["Payload"], BASE64.encode(&envelope.payload));
    }

    #[test]
    fn wire_json_round_trips_back_to_the_same_envelope() {
        let envelope = Envelope {
            timestamp_ms: 42,
            event_type: "transfer_sent".to_string(),
            sender: "alice".to_string(),
            payload: b"{\"status\":\"sent\",\"sent_amount\":23992.0}".to_vec(),
        };
        let wire = envelope.to_wire_json().unwrap();
        let decoded = Envelope::from_wire_json(&wire).unwrap();
        assert_eq!(decoded.timestamp_ms, envelope.timestamp_ms);
        assert_eq!(decoded.event_type, envelope.event_type);
        assert_eq!(decoded.sender, envelope.sender);
        assert_eq!(decoded.payload, envelope.payload);
    }
}
