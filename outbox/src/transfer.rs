use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Unsent,
    Sent,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Unsent => "unsent",
            TransferStatus::Sent => "sent",
            TransferStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unsent" => Some(TransferStatus::Unsent),
            "sent" => Some(TransferStatus::Sent),
            "failed" => Some(TransferStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Internal,
    External,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Internal => "internal",
            TransferType::External => "external",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(TransferType::Internal),
            "external" => Some(TransferType::External),
            _ => None,
        }
    }

    pub fn classify(sender: &str, recipient: &str) -> Self {
        if sender == "system" && recipient == "system" {
            TransferType::Internal
        } else {
            TransferType::External
        }
    }
}

/// A single row of the transfer outbox. `lease_id` is the exclusive-owner
/// token a dispatcher holds while it processes this row; `None` means the
/// row is either unclaimed or already terminal.
#[derive(Debug, Clone)]
pub struct OutgoingTransfer {
    pub transfer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub from_asset: String,
    pub to_asset: String,
    pub requested_amount: f64,
    pub fee: f64,
    pub rate: f64,
    pub sent_amount: Option<f64>,
    pub sender: String,
    pub recipient: String,
    pub status: TransferStatus,
    pub failure_reason: Option<String>,
    pub transfer_type: TransferType,
    pub lease_id: Option<Uuid>,
}

impl OutgoingTransfer {
    pub fn net_amount(&self) -> f64 {
        self.requested_amount - self.fee
    }

    pub fn new_unsent(
        transfer_id: Uuid,
        from_asset: impl Into<String>,
        to_asset: impl Into<String>,
        requested_amount: f64,
        fee: f64,
        rate: f64,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        let sender = sender.into();
        let recipient = recipient.into();
        let transfer_type = TransferType::classify(&sender, &recipient);
        Self {
            transfer_id,
            created_at: Utc::now(),
            sent_at: None,
            from_asset: from_asset.into(),
            to_asset: to_asset.into(),
            requested_amount,
            fee,
            rate,
            sent_amount: None,
            sender,
            recipient,
            status: TransferStatus::Unsent,
            failure_reason: None,
            transfer_type,
            lease_id: None,
        }
    }
}
