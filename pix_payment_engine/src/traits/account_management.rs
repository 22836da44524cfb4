use thiserror::Error;

use crate::db_types::{Account, AccountEntry, Centavos, EntryType, NewAccountEntry, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountApiError {
    #[error("Account entries must have a positive amount, but {0} was given")]
    InvalidAmount(Centavos),
    #[error("A {0} entry cannot be applied in this direction")]
    InvalidEntryType(EntryType),
    #[error("Account {user_id} has insufficient funds. Balance: {balance}, requested: {requested}")]
    InsufficientFunds { user_id: UserId, balance: Centavos, requested: Centavos },
    #[error("Applying {amount} to account {user_id} would overflow its balance")]
    BalanceOverflow { user_id: UserId, amount: Centavos },
}

/// The `AccountManagement` trait defines behaviour for managing user balances.
///
/// Accounts are created lazily, with a zero balance and an empty history, the first time they are referenced.
/// Mutations for a given user are applied atomically and in some serial order with respect to each other.
#[allow(async_fn_in_trait)]
pub trait AccountManagement: Clone {
    async fn fetch_or_create_account(&self, user_id: &UserId) -> Result<Account, AccountApiError>;

    /// Fetches the account for `user_id` without creating it.
    async fn fetch_account(&self, user_id: &UserId) -> Result<Option<Account>, AccountApiError>;

    /// Adds `entry.amount` to the balance and appends the entry to the history. Only credit entry types are accepted.
    async fn credit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError>;

    /// Subtracts `entry.amount` from the balance and appends the entry to the history. Fails with
    /// [`AccountApiError::InsufficientFunds`] if the balance does not cover the amount.
    async fn debit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError>;

    /// The account's history, oldest entry first. Unknown users have an empty history.
    async fn history(&self, user_id: &UserId) -> Result<Vec<AccountEntry>, AccountApiError>;
}
