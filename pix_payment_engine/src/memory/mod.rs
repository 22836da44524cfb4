//! An in-process backend for the payment engine.
//!
//! State lives only as long as the process does. Cloning a [`MemoryDatabase`] is cheap and every clone shares the same
//! underlying ledger and account book.
mod accounts;
mod ledger;
mod memory_impl;

pub use memory_impl::MemoryDatabase;
