//! Unifies API for accessing accounts.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Account, AccountEntry, NewAccountEntry, PaymentRecord, UserId},
    traits::{AccountApiError, AccountManagement, LedgerError, PaymentLedger},
};

/// The `AccountApi` provides a unified API for reading balances and for the debit flows (purchases and withdrawals)
/// that sit outside reconciliation.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the account for `user_id`, creating an empty one if the user has never been seen before.
    pub async fn account_for_user(&self, user_id: &UserId) -> Result<Account, AccountApiError> {
        self.db.fetch_or_create_account(user_id).await
    }

    pub async fn history(&self, user_id: &UserId) -> Result<Vec<AccountEntry>, AccountApiError> {
        self.db.history(user_id).await
    }

    /// Takes funds out of an account for a purchase or withdrawal.
    pub async fn debit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError> {
        trace!("🏦️ Debit of {} ({}) requested for {user_id}", entry.amount, entry.entry_type);
        self.db.debit(user_id, entry).await
    }
}

impl<B> AccountApi<B>
where B: PaymentLedger
{
    /// All deposit attempts for `user_id`, newest first.
    pub async fn payments_for_user(&self, user_id: &UserId) -> Result<Vec<PaymentRecord>, LedgerError> {
        self.db.fetch_payments_for_user(user_id).await
    }
}
