use std::time::Duration;

use log::*;
use pix_common::{parse_env_or_default, Secret};

pub const DEFAULT_MP_API_URL: &str = "https://api.mercadopago.com";
pub const DEFAULT_PROCESSOR_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    /// Base URL of the API, without a trailing slash
    pub api_url: String,
    pub access_token: Secret<String>,
    /// Applied to every request made by the client
    pub timeout: Duration,
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MP_API_URL.to_string(),
            access_token: Secret::default(),
            timeout: DEFAULT_PROCESSOR_TIMEOUT,
        }
    }
}

impl MercadoPagoConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PIX_MP_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_MP_API_URL.to_string());
        let access_token = Secret::new(std::env::var("PIX_MP_ACCESS_TOKEN").unwrap_or_else(|_| {
            error!("🪛️ PIX_MP_ACCESS_TOKEN is not set. Every call to Mercado Pago will be refused.");
            String::default()
        }));
        let timeout = parse_env_or_default("PIX_PROCESSOR_TIMEOUT", DEFAULT_PROCESSOR_TIMEOUT.as_secs())
            .map(Duration::from_secs)
            .unwrap_or_else(|e| {
                warn!("🪛️ {e}. Using the default of {}s", DEFAULT_PROCESSOR_TIMEOUT.as_secs());
                DEFAULT_PROCESSOR_TIMEOUT
            });
        Self { api_url, access_token, timeout }
    }
}
