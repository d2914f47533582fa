use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::error::BusError;

pub const EVENT_TYPE_CREATED: &str = "transfer_created";
pub const EVENT_TYPE_SENT: &str = "transfer_sent";
pub const EVENT_TYPE_FAILED: &str = "transfer_failed";

/// Fields every transfer event shares, regardless of lifecycle stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFields {
    pub transfer_id: Uuid,
    pub from_asset: String,
    pub to_asset: String,
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub fee: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CreatedPayload {
    #[serde(flatten)]
    transfer: TransferFields,
    status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SentPayload {
    #[serde(flatten)]
    transfer: TransferFields,
    status: String,
    sent_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FailedPayload {
    #[serde(flatten)]
    transfer: TransferFields,
    status: String,
    failure_reason: String,
}

/// A tagged union over the three lifecycle stages of a transfer, matched on
/// the envelope's `event_type` string rather than a serde internally-tagged
/// enum — the wire format is a flat `event_type` field alongside the
/// payload, not a serde-style tag wrapper.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Created(TransferFields),
    Sent { transfer: TransferFields, sent_amount: f64 },
    Failed { transfer: TransferFields, failure_reason: String },
}

impl TransferEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TransferEvent::Created(_) => EVENT_TYPE_CREATED,
            TransferEvent::Sent { .. } => EVENT_TYPE_SENT,
            TransferEvent::Failed { .. } => EVENT_TYPE_FAILED,
        }
    }

    pub fn sender(&self) -> &str {
        match self {
            TransferEvent::Created(t) => &t.sender,
            TransferEvent::Sent { transfer, .. } => &transfer.sender,
            TransferEvent::Failed { transfer, .. } => &transfer.sender,
        }
    }

    pub fn transfer_fields(&self) -> &TransferFields {
        match self {
            TransferEvent::Created(t) => t,
            TransferEvent::Sent { transfer, .. } => transfer,
            TransferEvent::Failed { transfer, .. } => transfer,
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, BusError> {
        let payload = match self {
            TransferEvent::Created(transfer) => serde_json::to_vec(&CreatedPayload {
                transfer: transfer.clone(),
                status: "created".to_string(),
            }),
            TransferEvent::Sent { transfer, sent_amount } => serde_json::to_vec(&SentPayload {
                transfer: transfer.clone(),
                status: "sent".to_string(),
                sent_amount: *sent_amount,
            }),
            TransferEvent::Failed { transfer, failure_reason } => {
                serde_json::to_vec(&FailedPayload {
                    transfer: transfer.clone(),
                    status: "failed".to_string(),
                    failure_reason: failure_reason.clone(),
                })
            }
        }
        .map_err(|e| BusError::Decode(e.to_string()))?;

        Ok(Envelope {
            timestamp_ms: Utc::now().timestamp_millis(),
            event_type: self.event_type().to_string(),
            sender: self.sender().to_string(),
            payload,
        })
    }

    /// `Ok(None)` for any `event_type` this system doesn't model — callers
    /// that only care about `transfer_created` ignore those, per the
    /// ingest consumer's documented behavior.
    pub fn from_envelope(envelope: &Envelope) -> Result<Option<TransferEvent>, BusError> {
        match envelope.event_type.as_str() {
            EVENT_TYPE_CREATED => {
                let payload: CreatedPayload = serde_json::from_slice(&envelope.payload)
                    .map_err(|e| BusError::Decode(e.to_string()))?;
                Ok(Some(TransferEvent::Created(payload.transfer)))
            }
            EVENT_TYPE_SENT => {
                let payload: SentPayload = serde_json::from_slice(&envelope.payload)
                    .map_err(|e| BusError::Decode(e.to_string()))?;
                Ok(Some(TransferEvent::Sent {
                    transfer: payload.transfer,
                    sent_amount: payload.sent_amount,
                }))
            }
            EVENT_TYPE_FAILED => {
                let payload: FailedPayload = serde_json::from_slice(&envelope.payload)
                    .map_err(|e| BusError::Decode(e.to_string()))?;
                Ok(Some(TransferEvent::Failed {
                    transfer: payload.transfer,
                    failure_reason: payload.failure_reason,
                }))
            }
            _ => Ok(None),
        }
    }
}
