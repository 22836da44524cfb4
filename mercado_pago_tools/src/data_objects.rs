use chrono::{DateTime, SecondsFormat, Utc};
use pix_common::Centavos;
use serde::{Deserialize, Serialize};

use crate::MercadoPagoApiError;

pub const PIX_PAYMENT_METHOD: &str = "pix";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// The body of `POST /v1/payments` for a PIX charge.
#[derive(Debug, Clone, Serialize)]
pub struct NewPixPayment {
    pub transaction_amount: f64,
    pub description: String,
    pub payment_method_id: String,
    pub payer: Payer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_expiration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
}

impl NewPixPayment {
    pub fn new<S: Into<String>>(amount: Centavos, description: S, payer: Payer) -> Self {
        Self {
            transaction_amount: amount.to_reais_f64(),
            description: description.into(),
            payment_method_id: PIX_PAYMENT_METHOD.to_string(),
            payer,
            notification_url: None,
            date_of_expiration: None,
            external_reference: None,
        }
    }

    pub fn with_notification_url(mut self, url: Option<String>) -> Self {
        self.notification_url = url;
        self
    }

    /// Mercado Pago wants ISO 8601 with milliseconds and an explicit offset.
    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.date_of_expiration = expires_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, false));
        self
    }

    pub fn with_external_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.external_reference = Some(reference.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointOfInteraction {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub transaction_data: Option<TransactionData>,
}

/// A payment as Mercado Pago reports it. Only the fields we use are listed; the API returns many more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpPayment {
    pub id: u64,
    pub status: String,
    pub status_detail: Option<String>,
    pub transaction_amount: f64,
    pub currency_id: Option<String>,
    pub description: Option<String>,
    pub date_created: Option<String>,
    pub date_approved: Option<String>,
    pub date_of_expiration: Option<String>,
    pub external_reference: Option<String>,
    pub point_of_interaction: Option<PointOfInteraction>,
}

impl MpPayment {
    pub fn transaction_data(&self) -> Option<&TransactionData> {
        self.point_of_interaction.as_ref().and_then(|p| p.transaction_data.as_ref())
    }

    pub fn qr_code(&self) -> Option<&str> {
        self.transaction_data().and_then(|d| d.qr_code.as_deref())
    }

    pub fn amount(&self) -> Result<Centavos, MercadoPagoApiError> {
        Centavos::try_from_reais_f64(self.transaction_amount)
            .map_err(|e| MercadoPagoApiError::InvalidCurrencyAmount(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub id: Option<String>,
}

/// A webhook delivery.
///
/// Mercado Pago identifies the event with `type` and sometimes `action` (`payment.created`, `payment.updated`). The
/// resource id may be a string or a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    #[serde(rename = "type", alias = "eventType", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "de::data_with_flexible_id")]
    pub data: NotificationData,
    #[serde(default)]
    pub live_mode: Option<bool>,
}

impl PaymentNotification {
    /// True if the notification is about a payment, as opposed to e.g. a merchant order or a chargeback.
    pub fn is_payment_event(&self) -> bool {
        self.event_type.as_deref() == Some("payment") ||
            self.action.as_deref().map(|a| a.starts_with("payment.")).unwrap_or(false)
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.data.id.as_deref().filter(|s| !s.is_empty())
    }
}

mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::NotificationData;

    pub fn data_with_flexible_id<'de, D: Deserializer<'de>>(d: D) -> Result<NotificationData, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        let id = value.as_ref().and_then(|v| match &v["id"] {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Ok(NotificationData { id })
    }
}
