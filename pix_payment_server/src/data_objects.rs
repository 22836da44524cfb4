use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use pix_payment_engine::db_types::{Account, AccountEntry, Centavos, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub user_id: UserId,
    pub amount: Centavos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: UserId,
    pub balance: Centavos,
    pub history: Vec<AccountEntry>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self { user_id: account.user_id, balance: account.balance, history: account.history }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn online(now: DateTime<Utc>) -> Self {
        Self { status: "online".to_string(), timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true) }
    }
}

/// Mercado Pago can also identify the resource in the webhook URL, e.g. `?data.id=123&type=payment`, or, for the
/// older IPN format, `?id=123&topic=payment`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookQuery {
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub topic: Option<String>,
}

impl WebhookQuery {
    pub fn resource_id(&self) -> Option<&str> {
        self.data_id.as_deref().or(self.id.as_deref()).filter(|s| !s.is_empty())
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref().or(self.topic.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}
