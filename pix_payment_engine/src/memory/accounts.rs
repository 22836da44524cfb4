//! Per-user balances.
//!
//! Each account sits behind its own mutex, so mutations for one user are serialized while different users never
//! contend. The outer map is only write-locked for the brief moment it takes to insert a new account.
use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use log::*;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    db_types::{Account, AccountEntry, Centavos, NewAccountEntry, UserId},
    traits::AccountApiError,
};

#[derive(Debug, Default)]
pub(crate) struct AccountBook {
    accounts: RwLock<HashMap<UserId, Arc<Mutex<Account>>>>,
}

impl AccountBook {
    async fn slot(&self, user_id: &UserId) -> Arc<Mutex<Account>> {
        if let Some(slot) = self.accounts.read().await.get(user_id) {
            return Arc::clone(slot);
        }
        let mut accounts = self.accounts.write().await;
        let slot = accounts.entry(user_id.clone()).or_insert_with(|| {
            debug!("🏦️ Creating account for {user_id}");
            Arc::new(Mutex::new(Account::new(user_id.clone())))
        });
        Arc::clone(slot)
    }

    pub async fn fetch_or_create(&self, user_id: &UserId) -> Account {
        let slot = self.slot(user_id).await;
        let account = slot.lock().await;
        account.clone()
    }

    pub async fn fetch(&self, user_id: &UserId) -> Option<Account> {
        let slot = self.accounts.read().await.get(user_id).cloned();
        match slot {
            Some(slot) => Some(slot.lock().await.clone()),
            None => None,
        }
    }

    /// Exclusive access to the account, which is created if needed. Nothing else can touch it until the guard is
    /// dropped.
    pub async fn lock(&self, user_id: &UserId) -> OwnedMutexGuard<Account> {
        self.slot(user_id).await.lock_owned().await
    }

    pub async fn credit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError> {
        let mut account = self.lock(user_id).await;
        let balance = credited_balance(&account, &entry)?;
        apply(&mut account, balance, entry);
        trace!("🏦️ {user_id} credited. New balance: {}", account.balance);
        Ok(account.clone())
    }

    pub async fn debit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError> {
        check_entry(&entry, false)?;
        let mut account = self.lock(user_id).await;
        if account.balance < entry.amount {
            return Err(AccountApiError::InsufficientFunds {
                user_id: user_id.clone(),
                balance: account.balance,
                requested: entry.amount,
            });
        }
        let balance = account.balance - entry.amount;
        apply(&mut account, balance, entry);
        trace!("🏦️ {user_id} debited. New balance: {}", account.balance);
        Ok(account.clone())
    }
}

fn check_entry(entry: &NewAccountEntry, credit: bool) -> Result<(), AccountApiError> {
    if !entry.amount.is_positive() {
        return Err(AccountApiError::InvalidAmount(entry.amount));
    }
    if entry.entry_type.is_credit() != credit {
        return Err(AccountApiError::InvalidEntryType(entry.entry_type));
    }
    Ok(())
}

/// The balance `account` would have once the credit `entry` is applied. Nothing is changed.
pub(crate) fn credited_balance(account: &Account, entry: &NewAccountEntry) -> Result<Centavos, AccountApiError> {
    check_entry(entry, true)?;
    account
        .balance
        .checked_add(entry.amount)
        .ok_or_else(|| AccountApiError::BalanceOverflow { user_id: account.user_id.clone(), amount: entry.amount })
}

pub(crate) fn apply(account: &mut Account, balance: Centavos, entry: NewAccountEntry) {
    let now = Utc::now();
    account.balance = balance;
    account.history.push(AccountEntry::from_new_entry(entry, now));
    account.updated_at = now;
}
