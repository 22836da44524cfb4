use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MercadoPagoConfig,
    data_objects::{MpPayment, NewPixPayment},
    MercadoPagoApiError,
};

pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

#[derive(Clone)]
pub struct MercadoPagoApi {
    config: MercadoPagoConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for MercadoPagoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MercadoPagoApi ({})", self.config.api_url)
    }
}

impl MercadoPagoApi {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, MercadoPagoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MercadoPagoConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        headers: &[(&'static str, String)],
        body: Option<B>,
    ) -> Result<T, MercadoPagoApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MercadoPagoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(MercadoPagoApiError::QueryError { status, message })
        }
    }

    /// Creates a PIX payment. The idempotency key must be fresh for every logical request; Mercado Pago returns the
    /// original payment if it sees the same key twice.
    pub async fn create_pix_payment(
        &self,
        payment: &NewPixPayment,
        idempotency_key: &str,
    ) -> Result<MpPayment, MercadoPagoApiError> {
        debug!("💳️ Creating a PIX payment of R$ {:.2}", payment.transaction_amount);
        let headers = [(IDEMPOTENCY_HEADER, idempotency_key.to_string())];
        let result = self.rest_query::<MpPayment, _>(Method::POST, "/v1/payments", &headers, Some(payment)).await?;
        info!("💳️ Created PIX payment #{} ({})", result.id, result.status);
        Ok(result)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<MpPayment, MercadoPagoApiError> {
        let path = format!("/v1/payments/{payment_id}");
        debug!("💳️ Fetching payment #{payment_id}");
        let result = self.rest_query::<MpPayment, ()>(Method::GET, &path, &[], None).await?;
        debug!("💳️ Payment #{payment_id} is {}", result.status);
        Ok(result)
    }
}
