//! PIX Payment Engine
//!
//! The PIX Payment Engine lets users top up an account balance with PIX transfers. It creates charges with a payment
//! processor, tracks each deposit through to approval, and credits the owner's account exactly once, no matter how
//! many times, or through how many channels, the approval is observed.
//!
//! The library is divided into these main sections:
//! 1. Backend contracts ([`mod@traits`]). The ledger of deposits, the account store and the remote payment processor
//!    are all described by traits, so the reconciliation logic does not depend on where state lives or which
//!    processor is used. [`MemoryDatabase`] is the bundled in-process backend.
//! 2. The payment engine public API ([`DepositFlowApi`] and [`AccountApi`]). This is the only thing the HTTP layer
//!    should talk to.
//!
//! The engine also emits events when a deposit is created, approved or annulled. A simple pub-sub framework
//! ([`mod@events`]) lets you hook into these and react, e.g. to notify an operator.
mod memory;
mod pix_api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use memory::MemoryDatabase;
pub use pix_api::{
    accounts_api::AccountApi,
    deposit_flow_api::DepositFlowApi,
    deposit_objects::{DepositOptions, DepositReceipt, DepositStatusReport},
    errors::DepositFlowError,
};
pub use traits::{AccountManagement, DepositSettlement, PaymentLedger, PaymentProcessor};
