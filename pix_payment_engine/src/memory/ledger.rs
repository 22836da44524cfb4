//! The ledger's state machine.
//!
//! `LedgerState` holds one authoritative copy of each record, keyed by internal id, plus a secondary index from
//! processor id to internal id. It is not thread-safe by itself; [`super::MemoryDatabase`] wraps it in a lock so that
//! every method here runs as a single atomic step.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{NewDeposit, PaymentId, PaymentRecord, PaymentStatus, ProcessorId, UserId},
    traits::LedgerError,
};

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    payments: HashMap<PaymentId, PaymentRecord>,
    processor_index: HashMap<ProcessorId, PaymentId>,
}

impl LedgerState {
    pub fn insert(&mut self, deposit: NewDeposit, now: DateTime<Utc>) -> Result<PaymentRecord, LedgerError> {
        if !deposit.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(deposit.amount));
        }
        if self.resolve(deposit.id.as_str()).is_some() {
            return Err(LedgerError::AlreadyExists(deposit.id));
        }
        let record = PaymentRecord::from_new_deposit(deposit, now);
        self.payments.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn bind(
        &mut self,
        id: &PaymentId,
        processor_id: &ProcessorId,
        now: DateTime<Utc>,
    ) -> Result<PaymentRecord, LedgerError> {
        if let Some(owner) = self.resolve(processor_id.as_str()) {
            if owner != id {
                return Err(LedgerError::ProcessorIdInUse(processor_id.clone(), owner.clone()));
            }
        }
        let record = self.payments.get_mut(id.as_str()).ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if let Some(existing) = &record.processor_id {
            return Err(LedgerError::AlreadyBound(id.clone(), existing.clone()));
        }
        record.processor_id = Some(processor_id.clone());
        record.updated_at = now;
        self.processor_index.insert(processor_id.clone(), id.clone());
        Ok(record.clone())
    }

    /// Internal ids take precedence over processor ids. Since a processor id equal to an existing internal id can never
    /// be bound, at most one of the two lookups can succeed.
    fn resolve(&self, key: &str) -> Option<&PaymentId> {
        self.payments.get_key_value(key).map(|(id, _)| id).or_else(|| self.processor_index.get(key))
    }

    fn record_mut(&mut self, key: &str) -> Result<&mut PaymentRecord, LedgerError> {
        let id = self.resolve(key).cloned().ok_or_else(|| LedgerError::NotFound(key.to_string()))?;
        self.payments.get_mut(&id).ok_or_else(|| {
            error!("🏦️ The processor index points {key} at {id}, but there is no such payment. The index is corrupt.");
            LedgerError::NotFound(key.to_string())
        })
    }

    pub fn get(&self, key: &str) -> Result<PaymentRecord, LedgerError> {
        self.resolve(key)
            .and_then(|id| self.payments.get(id))
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(key.to_string()))
    }

    pub fn approve(
        &mut self,
        key: &str,
        status_detail: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(PaymentRecord, bool), LedgerError> {
        let record = self.record_mut(key)?;
        match record.status {
            PaymentStatus::Approved => Ok((record.clone(), true)),
            PaymentStatus::Pending | PaymentStatus::Expired => {
                record.status = PaymentStatus::Approved;
                record.status_detail = status_detail.or(record.status_detail.take());
                record.updated_at = now;
                Ok((record.clone(), false))
            },
            PaymentStatus::Rejected => Err(LedgerError::InvalidTransition {
                id: record.id.clone(),
                from: record.status,
                to: PaymentStatus::Approved,
            }),
        }
    }

    pub fn reject(
        &mut self,
        key: &str,
        status_detail: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(PaymentRecord, bool), LedgerError> {
        let record = self.record_mut(key)?;
        match record.status {
            PaymentStatus::Rejected => Ok((record.clone(), false)),
            PaymentStatus::Pending | PaymentStatus::Expired => {
                record.status = PaymentStatus::Rejected;
                record.status_detail = status_detail.or(record.status_detail.take());
                record.updated_at = now;
                Ok((record.clone(), true))
            },
            PaymentStatus::Approved => Err(LedgerError::InvalidTransition {
                id: record.id.clone(),
                from: record.status,
                to: PaymentStatus::Rejected,
            }),
        }
    }

    pub fn expire(&mut self, key: &str, now: DateTime<Utc>) -> Result<PaymentRecord, LedgerError> {
        let record = self.record_mut(key)?;
        if record.status != PaymentStatus::Pending {
            return Err(LedgerError::InvalidTransition {
                id: record.id.clone(),
                from: record.status,
                to: PaymentStatus::Expired,
            });
        }
        record.status = PaymentStatus::Expired;
        record.updated_at = now;
        Ok(record.clone())
    }

    pub fn set_status_detail(
        &mut self,
        key: &str,
        status_detail: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PaymentRecord, LedgerError> {
        let record = self.record_mut(key)?;
        // Final records keep the detail that came with their verdict
        if record.status.is_final() {
            trace!("🏦️ Ignoring status detail {status_detail:?} for {} deposit {}", record.status, record.id);
            return Ok(record.clone());
        }
        if record.status_detail != status_detail {
            record.status_detail = status_detail;
            record.updated_at = now;
        }
        Ok(record.clone())
    }

    pub fn remove(&mut self, id: &PaymentId) -> Result<PaymentRecord, LedgerError> {
        let record = self.payments.remove(id.as_str()).ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if let Some(pid) = &record.processor_id {
            self.processor_index.remove(pid.as_str());
        }
        Ok(record)
    }

    pub fn stale_pending(&self, cutoff: DateTime<Utc>) -> Vec<PaymentRecord> {
        let mut result = self
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Pending && p.created_at < cutoff)
            .cloned()
            .collect::<Vec<_>>();
        result.sort_by_key(|p| p.created_at);
        result
    }

    pub fn purge_closed(&mut self, cutoff: DateTime<Utc>) -> Vec<PaymentRecord> {
        let ids = self
            .payments
            .values()
            .filter(|p| matches!(p.status, PaymentStatus::Rejected | PaymentStatus::Expired) && p.updated_at < cutoff)
            .map(|p| p.id.clone())
            .collect::<Vec<_>>();
        ids.iter().filter_map(|id| self.remove(id).ok()).collect()
    }

    pub fn for_user(&self, user_id: &UserId) -> Vec<PaymentRecord> {
        let mut result = self.payments.values().filter(|p| &p.user_id == user_id).cloned().collect::<Vec<_>>();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }
}
