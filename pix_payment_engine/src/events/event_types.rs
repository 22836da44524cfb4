use serde::{Deserialize, Serialize};

use crate::db_types::{Account, PaymentRecord, PaymentStatus};

/// A charge was issued and the deposit is waiting for the payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCreatedEvent {
    pub payment: PaymentRecord,
}

impl DepositCreatedEvent {
    pub fn new(payment: PaymentRecord) -> Self {
        Self { payment }
    }
}

/// Emitted exactly once per deposit, by whichever reconciliation call won the approval. `account` is the owner's
/// account immediately after the credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositApprovedEvent {
    pub payment: PaymentRecord,
    pub account: Account,
}

impl DepositApprovedEvent {
    pub fn new(payment: PaymentRecord, account: Account) -> Self {
        Self { payment, account }
    }
}

/// The deposit was closed without being paid, either because the processor rejected it or because it expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAnnulledEvent {
    pub payment: PaymentRecord,
    pub status: PaymentStatus,
}

impl DepositAnnulledEvent {
    pub fn new(payment: PaymentRecord) -> Self {
        let status = payment.status;
        Self { payment, status }
    }
}
