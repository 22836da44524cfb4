use thiserror::Error;

use crate::{
    db_types::{Account, PaymentRecord},
    traits::{AccountApiError, AccountManagement, LedgerError, PaymentLedger},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Account(#[from] AccountApiError),
}

/// The outcome of [`DepositSettlement::approve_and_credit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// This call approved the deposit and credited the owner. Carries the account as it was right after the credit.
    Credited { record: PaymentRecord, account: Account },
    /// The deposit had been approved (and credited) earlier. Nothing was changed.
    AlreadyApproved(PaymentRecord),
}

impl Settlement {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            Self::Credited { record, .. } => record,
            Self::AlreadyApproved(record) => record,
        }
    }
}

/// Backends that hold both the ledger and the accounts, and can change them together.
#[allow(async_fn_in_trait)]
pub trait DepositSettlement: PaymentLedger + AccountManagement {
    /// Moves the deposit identified by `key` to `approved` and credits its amount to the owner, in a single atomic
    /// step.
    ///
    /// Either both changes are committed or neither is. In particular, dropping the returned future at any point
    /// never leaves an approved deposit without its credit, and no reader ever sees the approval before the balance
    /// reflects it. The credit is a `deposit` entry referencing the payment id, with `memo` attached.
    ///
    /// Approving an already approved deposit is a no-op that returns [`Settlement::AlreadyApproved`]. `rejected`
    /// deposits fail with [`LedgerError::InvalidTransition`]; `expired` ones are approved and credited.
    async fn approve_and_credit(
        &self,
        key: &str,
        status_detail: Option<String>,
        memo: String,
    ) -> Result<Settlement, SettlementError>;
}
