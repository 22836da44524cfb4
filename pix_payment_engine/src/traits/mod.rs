//! #  Backend contracts.
//!
//! This module defines the behaviour that backends need to expose in order to be driven by the payment engine APIs.
//!
//! ## Ledger
//! The [`PaymentLedger`] stores one record per deposit attempt. Records are reachable by their internal id and, once
//! bound, by the processor's charge id. Every status transition is a single atomic compare-and-set, so concurrent
//! callers racing on the same record get exactly one winner.
//!
//! ## Accounts
//! [`AccountManagement`] keeps a balance and an append-only history per user. Mutations on one account are serialized;
//! different accounts do not block each other.
//!
//! ## Settlement
//! [`DepositSettlement`] is implemented by backends that own both of the above. It approves a deposit and credits its
//! owner as one indivisible step.
//!
//! ## Payment processor
//! [`PaymentProcessor`] is the remote side: it creates PIX charges and reports their authoritative status.
mod account_management;
mod data_objects;
mod deposit_settlement;
mod payment_ledger;
mod payment_processor;

pub use account_management::{AccountApiError, AccountManagement};
pub use data_objects::{ChargeStatus, ExpiryResult, NewCharge, PayerInfo, ProcessorCharge};
pub use deposit_settlement::{DepositSettlement, Settlement, SettlementError};
pub use payment_ledger::{LedgerError, PaymentLedger};
pub use payment_processor::{PaymentProcessor, ProcessorError};
