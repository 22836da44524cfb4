use thiserror::Error;

use crate::{
    db_types::{Centavos, PaymentId},
    traits::{AccountApiError, LedgerError, ProcessorError, SettlementError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepositFlowError {
    #[error("Invalid deposit amount {amount}. The minimum deposit is {minimum}")]
    InvalidAmount { amount: Centavos, minimum: Centavos },
    #[error("No deposit was found for {0}")]
    NotFound(String),
    #[error("The payment processor is unavailable. {0}")]
    ProcessorUnavailable(String),
    #[error("The payment processor declined the request ({status}). {message}")]
    ProcessorRejected { status: u16, message: String },
    #[error("The payment processor returned an unusable response. {0}")]
    ProcessorResponseInvalid(String),
    #[error("The processor reports {reported} for deposit {id}, but {expected} was recorded")]
    AmountMismatch { id: PaymentId, expected: Centavos, reported: Centavos },
    #[error("Ledger error: {0}")]
    LedgerError(LedgerError),
    #[error("Account error: {0}")]
    AccountError(#[from] AccountApiError),
}

impl DepositFlowError {
    /// True if the same request may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProcessorUnavailable(_))
    }
}

impl From<ProcessorError> for DepositFlowError {
    fn from(e: ProcessorError) -> Self {
        match e {
            ProcessorError::Unavailable(msg) => Self::ProcessorUnavailable(msg),
            ProcessorError::Rejected { status, message } => Self::ProcessorRejected { status, message },
            ProcessorError::InvalidResponse(msg) => Self::ProcessorResponseInvalid(msg),
        }
    }
}

impl From<LedgerError> for DepositFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(key) => Self::NotFound(key),
            e => Self::LedgerError(e),
        }
    }
}

impl From<SettlementError> for DepositFlowError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::Ledger(e) => e.into(),
            SettlementError::Account(e) => e.into(),
        }
    }
}
