use std::fmt::Display;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::db_types::{Centavos, PayablePayload, PaymentRecord, ProcessorId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for PayerInfo {
    fn default() -> Self {
        Self {
            email: "cliente@wendizx.com".to_string(),
            first_name: "Cliente".to_string(),
            last_name: "Wendizx".to_string(),
        }
    }
}

/// A request to the processor to create a PIX charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCharge {
    pub amount: Centavos,
    pub description: String,
    pub payer: PayerInfo,
    pub idempotency_key: String,
    pub notification_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The processor's view of a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorCharge {
    pub id: ProcessorId,
    pub status: ChargeStatus,
    pub status_detail: Option<String>,
    pub amount: Centavos,
    pub payable: Option<PayablePayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChargeStatus {
    /// Maps a processor status string onto the three states the engine distinguishes.
    pub fn from_processor_status(status: &str) -> Self {
        match status {
            "approved" => Self::Approved,
            "pending" | "in_process" | "authorized" | "in_mediation" => Self::Pending,
            "rejected" | "cancelled" | "refunded" | "charged_back" => Self::Rejected,
            s => {
                warn!("💳️ Unknown processor status '{s}'. Treating it as pending");
                Self::Pending
            },
        }
    }
}

impl Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The outcome of a single pass of the expiry job.
#[derive(Debug, Clone, Default)]
pub struct ExpiryResult {
    /// Deposits that were still unpaid after their timeout and are now `expired`.
    pub expired: Vec<PaymentRecord>,
    /// Closed deposits that were dropped from the ledger.
    pub purged: Vec<PaymentRecord>,
}

impl ExpiryResult {
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }

    pub fn purged_count(&self) -> usize {
        self.purged.len()
    }
}
