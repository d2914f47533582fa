use uuid::Uuid;

/// The system account that funds fees and absorbs/provides liquidity for the
/// pool rebalancer.
pub const SYSTEM_ACCOUNT: &str = "system";

/// One ledger-level transfer: a debit of `requested_amount` in `from_asset`
/// from `sender`, a credit of `send_amount()` in `to_asset` to `recipient`,
/// and (when applicable) a fee carved out of the debit and routed to
/// [`SYSTEM_ACCOUNT`] in `from_asset`.
#[derive(Debug, Clone)]
pub struct TransferInstruction {
    pub transfer_id: Uuid,
    pub sender: String,
    pub recipient: String,
    pub from_asset: String,
    pub to_asset: String,
    pub requested_amount: f64,
    pub fee: f64,
    pub rate: f64,
}

impl TransferInstruction {
    /// Amount debited from the sender's `from_asset` balance.
    pub fn deduct(&self) -> f64 {
        self.requested_amount
    }

    /// Amount credited to the recipient's `to_asset` balance.
    pub fn send_amount(&self) -> f64 {
        (self.requested_amount - self.fee) * self.rate
    }

    pub fn is_system_internal(&self) -> bool {
        self.sender == SYSTEM_ACCOUNT && self.recipient == SYSTEM_ACCOUNT
    }
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transfer_id: Uuid,
    pub sent_amount: f64,
}
