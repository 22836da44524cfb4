use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Centavos, PayablePayload, PaymentId, PaymentRecord, PaymentStatus, ProcessorId},
    traits::PayerInfo,
};

/// What a caller gets back from a successful deposit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    pub payment_id: PaymentId,
    pub processor_charge_id: ProcessorId,
    pub payable_payload: PayablePayload,
    pub amount: Centavos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositStatusReport {
    pub payment_id: PaymentId,
    pub processor_charge_id: Option<ProcessorId>,
    pub status: PaymentStatus,
    pub status_detail: Option<String>,
    pub amount: Centavos,
}

impl From<PaymentRecord> for DepositStatusReport {
    fn from(record: PaymentRecord) -> Self {
        Self {
            payment_id: record.id,
            processor_charge_id: record.processor_id,
            status: record.status,
            status_detail: record.status_detail,
            amount: record.amount,
        }
    }
}

/// Knobs for the deposit flow.
#[derive(Debug, Clone)]
pub struct DepositOptions {
    /// Requests below this amount are refused before the processor is contacted.
    pub minimum_deposit: Centavos,
    /// Upper bound on every call to the processor.
    pub processor_timeout: Duration,
    pub store_name: String,
    pub payer: PayerInfo,
    /// Where the processor should deliver webhooks for the charges we create.
    pub notification_url: Option<String>,
    /// If set, charges are created with an expiry this far in the future.
    pub charge_ttl: Option<chrono::Duration>,
}

impl Default for DepositOptions {
    fn default() -> Self {
        Self {
            minimum_deposit: Centavos::from_reais(1),
            processor_timeout: Duration::from_secs(5),
            store_name: "Wendizx Store".to_string(),
            payer: PayerInfo::default(),
            notification_url: None,
            charge_ttl: Some(chrono::Duration::minutes(30)),
        }
    }
}

impl DepositOptions {
    pub fn with_minimum_deposit(mut self, minimum: Centavos) -> Self {
        self.minimum_deposit = minimum;
        self
    }

    pub fn with_processor_timeout(mut self, timeout: Duration) -> Self {
        self.processor_timeout = timeout;
        self
    }

    pub fn with_store_name<S: Into<String>>(mut self, name: S) -> Self {
        self.store_name = name.into();
        self
    }

    pub fn with_payer(mut self, payer: PayerInfo) -> Self {
        self.payer = payer;
        self
    }

    pub fn with_notification_url(mut self, url: Option<String>) -> Self {
        self.notification_url = url;
        self
    }

    pub fn with_charge_ttl(mut self, ttl: Option<chrono::Duration>) -> Self {
        self.charge_ttl = ttl;
        self
    }
}
