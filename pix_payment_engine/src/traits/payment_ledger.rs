use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Centavos, NewDeposit, PaymentId, PaymentRecord, PaymentStatus, ProcessorId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Deposit amounts must be positive, but {0} was requested")]
    InvalidAmount(Centavos),
    #[error("No payment was found for the key {0}")]
    NotFound(String),
    #[error("A payment with id {0} already exists")]
    AlreadyExists(PaymentId),
    #[error("Payment {0} is already bound to processor id {1}")]
    AlreadyBound(PaymentId, ProcessorId),
    #[error("Processor id {0} is already in use by payment {1}")]
    ProcessorIdInUse(ProcessorId, PaymentId),
    #[error("Payment {id} cannot transition from {from} to {to}")]
    InvalidTransition { id: PaymentId, from: PaymentStatus, to: PaymentStatus },
}

/// The ledger of deposit attempts.
///
/// Every method that takes a `key` accepts either the internal [`PaymentId`] or the [`ProcessorId`] bound to it. Both
/// keys always resolve to the same record.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger: Clone {
    /// Stores a new deposit in `pending` status, without a processor id.
    ///
    /// Fails with [`LedgerError::InvalidAmount`] if the amount is not positive.
    async fn create(&self, deposit: NewDeposit) -> Result<PaymentRecord, LedgerError>;

    /// Binds the processor's charge id to the record. From this point on, the record can be fetched by either key.
    ///
    /// Binding is a one-shot operation: a second call fails with [`LedgerError::AlreadyBound`], and a processor id that
    /// already refers to another record is refused with [`LedgerError::ProcessorIdInUse`].
    async fn attach_processor_id(&self, id: &PaymentId, processor_id: &ProcessorId)
        -> Result<PaymentRecord, LedgerError>;

    async fn fetch_payment(&self, key: &str) -> Result<PaymentRecord, LedgerError>;

    /// Atomically moves the record to `approved`.
    ///
    /// Returns the updated record and a flag that is `true` if the record was _already_ approved before this call.
    /// Exactly one caller ever sees `false` for a given record. Nothing is credited here; approvals that must credit
    /// the owner go through [`crate::traits::DepositSettlement::approve_and_credit`].
    ///
    /// Late approvals of `expired` records are accepted. `rejected` records cannot be approved.
    async fn mark_approved(
        &self,
        key: &str,
        status_detail: Option<String>,
    ) -> Result<(PaymentRecord, bool), LedgerError>;

    /// Atomically moves a `pending` or `expired` record to `rejected`. Rejecting an already rejected record is a no-op.
    /// Returns the record and `true` if this call performed the transition.
    async fn mark_rejected(
        &self,
        key: &str,
        status_detail: Option<String>,
    ) -> Result<(PaymentRecord, bool), LedgerError>;

    /// Atomically moves a `pending` record to `expired`. Any other current status is an
    /// [`LedgerError::InvalidTransition`].
    async fn mark_expired(&self, key: &str) -> Result<PaymentRecord, LedgerError>;

    /// Records the processor's latest status detail without changing the status.
    ///
    /// Only `pending` and `expired` records are updated. `approved` and `rejected` records keep the detail they were
    /// finalised with and are returned unchanged.
    async fn update_status_detail(&self, key: &str, status_detail: Option<String>)
        -> Result<PaymentRecord, LedgerError>;

    /// Removes the record from the ledger, including its secondary index entry.
    async fn remove_payment(&self, id: &PaymentId) -> Result<PaymentRecord, LedgerError>;

    /// All `pending` records created before `cutoff`, oldest first.
    async fn fetch_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<PaymentRecord>, LedgerError>;

    /// Removes `rejected` and `expired` records last updated before `cutoff` and returns them.
    async fn purge_closed(&self, cutoff: DateTime<Utc>) -> Result<Vec<PaymentRecord>, LedgerError>;

    /// All records owned by `user_id`, newest first.
    async fn fetch_payments_for_user(&self, user_id: &UserId) -> Result<Vec<PaymentRecord>, LedgerError>;
}
