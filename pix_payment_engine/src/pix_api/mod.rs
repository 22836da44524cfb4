//! # PIX payment engine API
//!
//! [`DepositFlowApi`] drives deposits from charge creation to credit. [`AccountApi`] exposes balances and the debit
//! flows.
pub mod accounts_api;
pub mod deposit_flow_api;
pub mod deposit_objects;
pub mod errors;
