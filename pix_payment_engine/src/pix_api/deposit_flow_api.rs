use std::{fmt::Debug, future::Future};

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{Centavos, NewDeposit, PaymentRecord, PaymentStatus, UserId},
    events::{DepositAnnulledEvent, DepositApprovedEvent, DepositCreatedEvent, EventProducers},
    helpers::{charge_description, new_idempotency_key},
    pix_api::{
        deposit_objects::{DepositOptions, DepositReceipt},
        errors::DepositFlowError,
    },
    traits::{
        ChargeStatus,
        DepositSettlement,
        ExpiryResult,
        LedgerError,
        NewCharge,
        PaymentProcessor,
        ProcessorCharge,
        ProcessorError,
        Settlement,
    },
};

/// `DepositFlowApi` is the reconciliation engine. It creates PIX charges with the processor and applies the
/// processor's verdict to the ledger and to the owner's account.
///
/// Client polls and processor webhooks both end up in [`Self::reconcile`]. It is safe to call any number of times,
/// from any number of tasks, with either of a deposit's two keys. Approval and credit happen together through
/// [`DepositSettlement::approve_and_credit`], so the account is credited exactly once per approved deposit, even if a
/// caller gives up half way through.
pub struct DepositFlowApi<B, P> {
    db: B,
    processor: P,
    producers: EventProducers,
    options: DepositOptions,
}

impl<B, P> Debug for DepositFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DepositFlowApi")
    }
}

impl<B, P> DepositFlowApi<B, P> {
    pub fn new(db: B, processor: P, producers: EventProducers, options: DepositOptions) -> Self {
        Self { db, processor, producers, options }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn options(&self) -> &DepositOptions {
        &self.options
    }
}

impl<B, P> DepositFlowApi<B, P>
where
    B: DepositSettlement,
    P: PaymentProcessor,
{
    /// Issues a PIX charge for `amount` and records a pending deposit for `user_id`.
    ///
    /// If anything fails, no ledger record is left behind. A charge that the processor created but that we could not
    /// record is simply never paid into an account; it will lapse on the processor side.
    pub async fn create_deposit(&self, user_id: UserId, amount: Centavos) -> Result<DepositReceipt, DepositFlowError> {
        let minimum = self.options.minimum_deposit;
        if amount < minimum || !amount.is_positive() {
            debug!("🔄️ Refusing deposit of {amount} for {user_id}. Minimum is {minimum}");
            return Err(DepositFlowError::InvalidAmount { amount, minimum });
        }
        let charge = NewCharge {
            amount,
            description: charge_description(&self.options.store_name, amount),
            payer: self.options.payer.clone(),
            idempotency_key: new_idempotency_key(),
            notification_url: self.options.notification_url.clone(),
            expires_at: self.options.charge_ttl.map(|ttl| Utc::now() + ttl),
        };
        trace!("🔄️ Requesting a charge of {amount} for {user_id} [{}]", charge.idempotency_key);
        let charge = self.call_processor(self.processor.create_charge(charge)).await.map_err(|e| {
            warn!("🔄️ Could not create a charge of {amount} for {user_id}. {e}");
            DepositFlowError::from(e)
        })?;
        let payable = charge.payable.clone().ok_or_else(|| {
            error!("🔄️ Charge {} was accepted, but the processor did not return a PIX code", charge.id);
            DepositFlowError::ProcessorResponseInvalid(format!("Charge {} has no payable code", charge.id))
        })?;
        if charge.amount != amount {
            error!("🔄️ Charge {} was created for {}, but {amount} was requested", charge.id, charge.amount);
            return Err(DepositFlowError::ProcessorResponseInvalid(format!(
                "Charge {} is for {} instead of {amount}",
                charge.id, charge.amount
            )));
        }
        let deposit = NewDeposit::new(user_id, amount)
            .with_payable(payable.clone())
            .with_status_detail(charge.status_detail.clone());
        let record = self.db.create(deposit).await?;
        let record = match self.db.attach_processor_id(&record.id, &charge.id).await {
            Ok(record) => record,
            Err(e) => {
                error!("🔄️ Could not bind charge {} to deposit {}. {e}. Rolling back.", charge.id, record.id);
                if let Err(e) = self.db.remove_payment(&record.id).await {
                    error!("🔄️ Rollback of deposit {} failed. {e}", record.id);
                }
                return Err(e.into());
            },
        };
        info!("🔄️ Deposit {} of {amount} for {} is awaiting payment (charge {})", record.id, record.user_id, charge.id);
        for producer in &self.producers.deposit_created_producer {
            producer.publish_event(DepositCreatedEvent::new(record.clone()));
        }
        Ok(DepositReceipt { payment_id: record.id, processor_charge_id: charge.id, payable_payload: payable, amount })
    }

    /// Brings the deposit identified by `key` up to date with the processor, crediting the owner's account if this call
    /// is the one that observes the approval.
    ///
    /// `key` may be the internal payment id or the processor's charge id. Deposits that are already approved or
    /// rejected are returned as-is without contacting the processor.
    pub async fn reconcile(&self, key: &str) -> Result<PaymentRecord, DepositFlowError> {
        let record = self.db.fetch_payment(key).await?;
        if record.status.is_final() {
            trace!("🔄️ Deposit {} is already {}. Nothing to do", record.id, record.status);
            return Ok(record);
        }
        let Some(processor_id) = record.processor_id.clone() else {
            // Only possible while create_deposit is between creating the record and binding it
            debug!("🔄️ Deposit {} has no charge bound to it yet", record.id);
            return Ok(record);
        };
        let charge = self.call_processor(self.processor.fetch_charge(&processor_id)).await.map_err(|e| {
            warn!("🔄️ Could not fetch the status of charge {processor_id} for deposit {}. {e}", record.id);
            DepositFlowError::from(e)
        })?;
        if charge.amount != record.amount {
            error!(
                "🔄️ Amount mismatch on deposit {}. Recorded {}, processor reports {}. The deposit will not be credited.",
                record.id, record.amount, charge.amount
            );
            return Err(DepositFlowError::AmountMismatch {
                id: record.id,
                expected: record.amount,
                reported: charge.amount,
            });
        }
        match charge.status {
            ChargeStatus::Approved => self.approve(record, charge).await,
            ChargeStatus::Rejected => self.reject(record, charge).await,
            ChargeStatus::Pending => {
                if charge.status_detail.is_some() && charge.status_detail != record.status_detail {
                    let record = self.db.update_status_detail(record.id.as_str(), charge.status_detail).await?;
                    return Ok(record);
                }
                trace!("🔄️ Deposit {} is still {}", record.id, record.status);
                Ok(record)
            },
        }
    }

    async fn approve(&self, record: PaymentRecord, charge: ProcessorCharge) -> Result<PaymentRecord, DepositFlowError> {
        let memo = format!("PIX charge {}", charge.id);
        let settlement =
            self.db.approve_and_credit(record.id.as_str(), charge.status_detail, memo).await.map_err(|e| {
                error!(
                    "🔄️ The processor approved charge {}, but deposit {} could not be settled. {e}",
                    charge.id, record.id
                );
                DepositFlowError::from(e)
            })?;
        match settlement {
            Settlement::Credited { record, account } => {
                info!("🔄️ Deposit {} approved. {} credited to {}", record.id, record.amount, record.user_id);
                for producer in &self.producers.deposit_approved_producer {
                    producer.publish_event(DepositApprovedEvent::new(record.clone(), account.clone()));
                }
                Ok(record)
            },
            Settlement::AlreadyApproved(record) => {
                debug!("🔄️ Deposit {} was approved by a concurrent reconciliation", record.id);
                Ok(record)
            },
        }
    }

    async fn reject(&self, record: PaymentRecord, charge: ProcessorCharge) -> Result<PaymentRecord, DepositFlowError> {
        match self.db.mark_rejected(record.id.as_str(), charge.status_detail).await {
            Ok((record, true)) => {
                info!("🔄️ Deposit {} was rejected by the processor", record.id);
                self.publish_annulled(&record);
                Ok(record)
            },
            Ok((record, false)) => Ok(record),
            Err(LedgerError::InvalidTransition { id, from, .. }) => {
                warn!("🔄️ The processor reports charge {} as failed, but deposit {id} is already {from}", charge.id);
                Ok(self.db.fetch_payment(id.as_str()).await?)
            },
            Err(e) => Err(e.into()),
        }
    }

    /// The webhook entry point. Reconciles the deposit bound to `processor_id` and absorbs every failure, since the
    /// processor must get its acknowledgement no matter what happens here.
    pub async fn handle_processor_notification(&self, processor_id: &str) -> Option<PaymentRecord> {
        match self.reconcile(processor_id).await {
            Ok(record) => {
                debug!("🔄️ Notification for charge {processor_id} handled. Deposit {} is {}", record.id, record.status);
                Some(record)
            },
            Err(DepositFlowError::NotFound(_)) => {
                info!("🔄️ Received a notification for charge {processor_id}, which is not in the ledger. Ignoring it.");
                None
            },
            Err(e) => {
                warn!("🔄️ Notification for charge {processor_id} could not be reconciled. {e}");
                None
            },
        }
    }

    /// Closes deposits that have gone unpaid for longer than `unpaid_timeout` and drops closed deposits older than
    /// `retention` from the ledger.
    ///
    /// Each stale deposit is reconciled one last time first, so a payment that arrived without a notification is still
    /// credited. Expired deposits that the processor approves later are credited too.
    pub async fn expire_stale_deposits(
        &self,
        unpaid_timeout: Duration,
        retention: Duration,
    ) -> Result<ExpiryResult, DepositFlowError> {
        let now = Utc::now();
        let stale = self.db.fetch_stale_pending(now - unpaid_timeout).await?;
        let mut result = ExpiryResult::default();
        for record in stale {
            match self.reconcile(record.id.as_str()).await {
                Ok(r) if r.status != PaymentStatus::Pending => continue,
                Ok(_) => {},
                Err(e) => warn!("🔄️ Final reconciliation of deposit {} failed. {e}. Expiring it anyway.", record.id),
            }
            match self.db.mark_expired(record.id.as_str()).await {
                Ok(expired) => {
                    self.publish_annulled(&expired);
                    result.expired.push(expired);
                },
                Err(LedgerError::InvalidTransition { id, from, .. }) => {
                    debug!("🔄️ Deposit {id} became {from} before it could be expired");
                },
                Err(e) => return Err(e.into()),
            }
        }
        result.purged = self.db.purge_closed(now - retention).await?;
        Ok(result)
    }

    fn publish_annulled(&self, record: &PaymentRecord) {
        for producer in &self.producers.deposit_annulled_producer {
            producer.publish_event(DepositAnnulledEvent::new(record.clone()));
        }
    }

    async fn call_processor<T, F>(&self, call: F) -> Result<T, ProcessorError>
    where F: Future<Output = Result<T, ProcessorError>> {
        let timeout = self.options.processor_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProcessorError::Unavailable(format!("No response within {}ms", timeout.as_millis()))),
        }
    }
}
