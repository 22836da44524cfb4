//! A [`PaymentProcessor`] whose answers are set by the test.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
        MutexGuard,
    },
    time::Duration,
};

use crate::{
    db_types::{Centavos, PayablePayload, ProcessorId},
    traits::{ChargeStatus, NewCharge, PaymentProcessor, ProcessorCharge, ProcessorError},
};

#[derive(Debug, Default)]
struct Script {
    charges: HashMap<ProcessorId, ProcessorCharge>,
    requests: Vec<NewCharge>,
    next_id: u64,
    create_failure: Option<ProcessorError>,
    fetch_failure: Option<ProcessorError>,
    delay: Option<Duration>,
    omit_payable: bool,
}

/// Charges start out `pending`. Tests move them along with [`ScriptedProcessor::approve`] and friends, and can inspect
/// how often the engine called out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProcessor {
    script: Arc<Mutex<Script>>,
    create_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
}

impl ScriptedProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Every charge request received so far, in order.
    pub fn requests(&self) -> Vec<NewCharge> {
        self.script().requests.clone()
    }

    pub fn charge(&self, id: &str) -> Option<ProcessorCharge> {
        self.script().charges.get(id).cloned()
    }

    pub fn set_status(&self, id: &str, status: ChargeStatus, detail: &str) {
        if let Some(charge) = self.script().charges.get_mut(id) {
            charge.status = status;
            charge.status_detail = Some(detail.to_string());
        }
    }

    pub fn approve(&self, id: &str) {
        self.set_status(id, ChargeStatus::Approved, "accredited");
    }

    pub fn reject(&self, id: &str) {
        self.set_status(id, ChargeStatus::Rejected, "cc_rejected_other_reason");
    }

    /// Makes the processor report a different amount for the charge than the one it was created with.
    pub fn set_reported_amount(&self, id: &str, amount: Centavos) {
        if let Some(charge) = self.script().charges.get_mut(id) {
            charge.amount = amount;
        }
    }

    pub fn fail_creates_with(&self, err: Option<ProcessorError>) {
        self.script().create_failure = err;
    }

    pub fn fail_fetches_with(&self, err: Option<ProcessorError>) {
        self.script().fetch_failure = err;
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.script().delay = delay;
    }

    /// New charges come back without a PIX code.
    pub fn omit_payable(&self, omit: bool) {
        self.script().omit_payable = omit;
    }

    async fn pause(&self) {
        let delay = self.script().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PaymentProcessor for ScriptedProcessor {
    async fn create_charge(&self, charge: NewCharge) -> Result<ProcessorCharge, ProcessorError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let mut script = self.script();
        script.requests.push(charge.clone());
        if let Some(err) = script.create_failure.clone() {
            return Err(err);
        }
        script.next_id += 1;
        let id = ProcessorId::from(format!("{}", 1_000_000 + script.next_id));
        let payable = (!script.omit_payable).then(|| {
            PayablePayload::new(format!("00020126580014br.gov.bcb.pix0136{id}5204000053039865802BR"))
                .with_image("iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==")
        });
        let result = ProcessorCharge {
            id: id.clone(),
            status: ChargeStatus::Pending,
            status_detail: Some("pending_waiting_transfer".to_string()),
            amount: charge.amount,
            payable,
        };
        script.charges.insert(id, result.clone());
        Ok(result)
    }

    async fn fetch_charge(&self, id: &ProcessorId) -> Result<ProcessorCharge, ProcessorError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let script = self.script();
        if let Some(err) = script.fetch_failure.clone() {
            return Err(err);
        }
        script
            .charges
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ProcessorError::Rejected { status: 404, message: format!("Payment {id} not found") })
    }
}
