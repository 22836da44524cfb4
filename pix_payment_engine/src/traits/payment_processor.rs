use thiserror::Error;

use crate::{
    db_types::ProcessorId,
    traits::data_objects::{NewCharge, ProcessorCharge},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// Network failure, timeout or a 5xx from the processor. Safe to retry.
    #[error("The payment processor is unavailable. {0}")]
    Unavailable(String),
    /// The processor understood the request and refused it.
    #[error("The payment processor rejected the request ({status}). {message}")]
    Rejected { status: u16, message: String },
    /// The processor answered, but not with anything we can use.
    #[error("The payment processor returned an invalid response. {0}")]
    InvalidResponse(String),
}

/// A remote payment processor that can issue PIX charges.
#[allow(async_fn_in_trait)]
pub trait PaymentProcessor {
    /// Creates a charge. `charge.idempotency_key` must be unique to this call.
    async fn create_charge(&self, charge: NewCharge) -> Result<ProcessorCharge, ProcessorError>;

    /// Fetches the authoritative status of a charge.
    async fn fetch_charge(&self, id: &ProcessorId) -> Result<ProcessorCharge, ProcessorError>;
}
