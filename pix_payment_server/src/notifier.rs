//! Best-effort operator notifications.
//!
//! The server tells an operator channel about new and approved deposits. Messages are POSTed as `{"content": ...}`,
//! which is what Discord and most chat webhooks accept. Nothing here can fail a request: every error is logged and
//! dropped.
use std::time::Duration;

use log::*;
use pix_payment_engine::{
    db_types::PaymentStatus,
    events::{DepositAnnulledEvent, DepositApprovedEvent, DepositCreatedEvent, EventHooks},
};
use reqwest::Client;
use serde_json::json;

use crate::errors::ServerError;

const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct OperatorNotifier {
    url: Option<String>,
    client: Client,
}

impl OperatorNotifier {
    pub fn new(url: Option<String>) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(NOTIFICATION_TIMEOUT)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not create the notification client. {e}")))?;
        Ok(Self { url, client })
    }

    pub async fn send(&self, message: &str) {
        let Some(url) = &self.url else {
            info!("📣️ {message}");
            return;
        };
        let result = self.client.post(url).json(&json!({ "content": message })).send().await;
        match result {
            Ok(res) if res.status().is_success() => trace!("📣️ Operator notified"),
            Ok(res) => warn!("📣️ Operator webhook answered {}. Message was: {message}", res.status()),
            Err(e) => warn!("📣️ Could not notify the operator. {e}. Message was: {message}"),
        }
    }
}

pub fn deposit_created_message(ev: &DepositCreatedEvent) -> String {
    let p = &ev.payment;
    let charge = p.processor_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
    format!("💰 New PIX deposit of {} for {} (payment {}, charge {charge})", p.amount, p.user_id, p.id)
}

pub fn deposit_approved_message(ev: &DepositApprovedEvent) -> String {
    let p = &ev.payment;
    format!(
        "✅ PIX deposit {} approved. {} credited to {}. New balance: {}",
        p.id, p.amount, p.user_id, ev.account.balance
    )
}

pub fn deposit_annulled_message(ev: &DepositAnnulledEvent) -> String {
    let p = &ev.payment;
    let reason = match ev.status {
        PaymentStatus::Expired => "expired without payment".to_string(),
        status => match &p.status_detail {
            Some(detail) => format!("was {status} ({detail})"),
            None => format!("was {status}"),
        },
    };
    format!("❌ PIX deposit {} of {} for {} {reason}", p.id, p.amount, p.user_id)
}

/// Wires the notifier into the engine's event hooks.
pub fn notification_hooks(notifier: OperatorNotifier) -> EventHooks {
    let mut hooks = EventHooks::default();
    let n = notifier.clone();
    hooks.on_deposit_created(move |ev| {
        let n = n.clone();
        Box::pin(async move { n.send(&deposit_created_message(&ev)).await })
    });
    let n = notifier.clone();
    hooks.on_deposit_approved(move |ev| {
        let n = n.clone();
        Box::pin(async move { n.send(&deposit_approved_message(&ev)).await })
    });
    hooks.on_deposit_annulled(move |ev| {
        let n = notifier.clone();
        Box::pin(async move { n.send(&deposit_annulled_message(&ev)).await })
    });
    hooks
}
