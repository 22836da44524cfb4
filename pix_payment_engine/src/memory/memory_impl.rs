//! `MemoryDatabase` is a concrete implementation of a PIX payment engine backend.
//!
//! It implements [`PaymentLedger`] and [`AccountManagement`] on top of plain maps. The ledger is guarded by a single
//! lock, so every state transition is one compare-and-set step. Accounts are locked individually.
//!
//! Approvals take the ledger lock first and then the owner's account lock. No other path holds an account lock while
//! waiting for the ledger.
use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use log::*;
use tokio::sync::RwLock;

use super::{
    accounts::{apply, credited_balance, AccountBook},
    ledger::LedgerState,
};
use crate::{
    db_types::{
        Account,
        AccountEntry,
        NewAccountEntry,
        NewDeposit,
        PaymentId,
        PaymentRecord,
        PaymentStatus,
        ProcessorId,
        UserId,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        DepositSettlement,
        LedgerError,
        PaymentLedger,
        Settlement,
        SettlementError,
    },
};

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    ledger: Arc<RwLock<LedgerState>>,
    accounts: Arc<AccountBook>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentLedger for MemoryDatabase {
    async fn create(&self, deposit: NewDeposit) -> Result<PaymentRecord, LedgerError> {
        let record = self.ledger.write().await.insert(deposit, Utc::now())?;
        debug!("🏦️ New deposit {} of {} for {} recorded", record.id, record.amount, record.user_id);
        Ok(record)
    }

    async fn attach_processor_id(
        &self,
        id: &PaymentId,
        processor_id: &ProcessorId,
    ) -> Result<PaymentRecord, LedgerError> {
        let record = self.ledger.write().await.bind(id, processor_id, Utc::now())?;
        debug!("🏦️ Deposit {id} is bound to processor charge {processor_id}");
        Ok(record)
    }

    async fn fetch_payment(&self, key: &str) -> Result<PaymentRecord, LedgerError> {
        self.ledger.read().await.get(key)
    }

    async fn mark_approved(
        &self,
        key: &str,
        status_detail: Option<String>,
    ) -> Result<(PaymentRecord, bool), LedgerError> {
        let (record, already_approved) = self.ledger.write().await.approve(key, status_detail, Utc::now())?;
        if already_approved {
            trace!("🏦️ Deposit {} was already approved", record.id);
        } else {
            info!("🏦️ Deposit {} has been approved", record.id);
        }
        Ok((record, already_approved))
    }

    async fn mark_rejected(
        &self,
        key: &str,
        status_detail: Option<String>,
    ) -> Result<(PaymentRecord, bool), LedgerError> {
        let (record, changed) = self.ledger.write().await.reject(key, status_detail, Utc::now())?;
        if changed {
            info!("🏦️ Deposit {} has been rejected ({})", record.id, record.status_detail.as_deref().unwrap_or("-"));
        }
        Ok((record, changed))
    }

    async fn mark_expired(&self, key: &str) -> Result<PaymentRecord, LedgerError> {
        let record = self.ledger.write().await.expire(key, Utc::now())?;
        info!("🏦️ Deposit {} has expired", record.id);
        Ok(record)
    }

    async fn update_status_detail(
        &self,
        key: &str,
        status_detail: Option<String>,
    ) -> Result<PaymentRecord, LedgerError> {
        self.ledger.write().await.set_status_detail(key, status_detail, Utc::now())
    }

    async fn remove_payment(&self, id: &PaymentId) -> Result<PaymentRecord, LedgerError> {
        let record = self.ledger.write().await.remove(id)?;
        debug!("🏦️ Deposit {id} removed from the ledger");
        Ok(record)
    }

    async fn fetch_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<PaymentRecord>, LedgerError> {
        Ok(self.ledger.read().await.stale_pending(cutoff))
    }

    async fn purge_closed(&self, cutoff: DateTime<Utc>) -> Result<Vec<PaymentRecord>, LedgerError> {
        let purged = self.ledger.write().await.purge_closed(cutoff);
        if !purged.is_empty() {
            debug!("🏦️ Purged {} closed deposits from the ledger", purged.len());
        }
        Ok(purged)
    }

    async fn fetch_payments_for_user(&self, user_id: &UserId) -> Result<Vec<PaymentRecord>, LedgerError> {
        Ok(self.ledger.read().await.for_user(user_id))
    }
}

impl AccountManagement for MemoryDatabase {
    async fn fetch_or_create_account(&self, user_id: &UserId) -> Result<Account, AccountApiError> {
        Ok(self.accounts.fetch_or_create(user_id).await)
    }

    async fn fetch_account(&self, user_id: &UserId) -> Result<Option<Account>, AccountApiError> {
        Ok(self.accounts.fetch(user_id).await)
    }

    async fn credit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError> {
        let amount = entry.amount;
        let account = self.accounts.credit(user_id, entry).await?;
        debug!("🏦️ Credited {amount} to {user_id}. Balance is now {}", account.balance);
        Ok(account)
    }

    async fn debit(&self, user_id: &UserId, entry: NewAccountEntry) -> Result<Account, AccountApiError> {
        let amount = entry.amount;
        let account = self.accounts.debit(user_id, entry).await?;
        debug!("🏦️ Debited {amount} from {user_id}. Balance is now {}", account.balance);
        Ok(account)
    }

    async fn history(&self, user_id: &UserId) -> Result<Vec<AccountEntry>, AccountApiError> {
        Ok(self.accounts.fetch(user_id).await.map(|a| a.history).unwrap_or_default())
    }
}

impl DepositSettlement for MemoryDatabase {
    async fn approve_and_credit(
        &self,
        key: &str,
        status_detail: Option<String>,
        memo: String,
    ) -> Result<Settlement, SettlementError> {
        let mut ledger = self.ledger.write().await;
        let current = ledger.get(key)?;
        if current.status == PaymentStatus::Approved {
            trace!("🏦️ Deposit {} was already approved", current.id);
            return Ok(Settlement::AlreadyApproved(current));
        }
        let mut account = self.accounts.lock(&current.user_id).await;
        // Both locks are held and nothing below awaits: the approval and the credit land together or not at all
        let entry = NewAccountEntry::deposit(current.amount, &current.id).with_memo(memo);
        let balance = credited_balance(&account, &entry)?;
        let (record, _) = ledger.approve(key, status_detail, Utc::now())?;
        apply(&mut account, balance, entry);
        info!("🏦️ Deposit {} has been approved. {} credited to {}", record.id, record.amount, record.user_id);
        Ok(Settlement::Credited { record, account: account.clone() })
    }
}
