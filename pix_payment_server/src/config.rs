use std::{env, fmt::Display, str::FromStr};

use chrono::Duration;
use log::*;
use mercado_pago_tools::MercadoPagoConfig;
use pix_common::{parse_boolean_flag, parse_env_or_default, Centavos, Secret};
use pix_payment_engine::{traits::PayerInfo, DepositOptions};

const DEFAULT_PIX_HOST: &str = "127.0.0.1";
const DEFAULT_PIX_PORT: u16 = 3000;
const DEFAULT_STORE_NAME: &str = "Wendizx Store";
const DEFAULT_UNPAID_DEPOSIT_TIMEOUT: Duration = Duration::minutes(30);
const DEFAULT_CLOSED_DEPOSIT_RETENTION: Duration = Duration::hours(24);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Credentials and endpoint for the Mercado Pago API
    pub mercado_pago: MercadoPagoConfig,
    /// The public URL of `POST /webhook/processor`. It is sent to the processor with every charge. If unset, the
    /// processor falls back to whatever is configured in its dashboard.
    pub notification_url: Option<String>,
    /// Used in the description of every charge.
    pub store_name: String,
    /// PIX charges need a payer. The service does not know who the payer is, so a fixed one is used.
    pub payer: PayerInfo,
    pub minimum_deposit: Centavos,
    /// Pending deposits older than this are reconciled one last time, then marked as expired.
    pub unpaid_deposit_timeout: Duration,
    /// Rejected and expired deposits are dropped from the ledger after this long.
    pub closed_deposit_retention: Duration,
    pub webhook: WebhookConfig,
    /// If set, operator notifications are POSTed here. Otherwise they are only logged.
    pub operator_webhook_url: Option<String>,
    pub event_buffer_size: usize,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    /// The secret Mercado Pago signs webhook deliveries with.
    pub secret: Secret<String>,
    /// If false, the `x-signature` header on webhook deliveries is not checked.
    pub signature_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PIX_HOST.to_string(),
            port: DEFAULT_PIX_PORT,
            mercado_pago: MercadoPagoConfig::default(),
            notification_url: None,
            store_name: DEFAULT_STORE_NAME.to_string(),
            payer: PayerInfo::default(),
            minimum_deposit: Centavos::from_reais(1),
            unpaid_deposit_timeout: DEFAULT_UNPAID_DEPOSIT_TIMEOUT,
            closed_deposit_retention: DEFAULT_CLOSED_DEPOSIT_RETENTION,
            webhook: WebhookConfig::default(),
            operator_webhook_url: None,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("PIX_HOST").ok().unwrap_or_else(|| DEFAULT_PIX_HOST.into());
        let port = env_or_default("PIX_PORT", DEFAULT_PIX_PORT);
        let mercado_pago = MercadoPagoConfig::new_from_env_or_default();
        let notification_url = non_empty_var("PIX_NOTIFICATION_URL");
        if notification_url.is_none() {
            info!("🪛️ PIX_NOTIFICATION_URL is not set. Charges will be created without a notification URL.");
        }
        let store_name = non_empty_var("PIX_STORE_NAME").unwrap_or(defaults.store_name);
        let payer = PayerInfo {
            email: non_empty_var("PIX_PAYER_EMAIL").unwrap_or(defaults.payer.email),
            first_name: non_empty_var("PIX_PAYER_FIRST_NAME").unwrap_or(defaults.payer.first_name),
            last_name: non_empty_var("PIX_PAYER_LAST_NAME").unwrap_or(defaults.payer.last_name),
        };
        let minimum_deposit = env_or_default("PIX_MINIMUM_DEPOSIT", defaults.minimum_deposit);
        if !minimum_deposit.is_positive() {
            warn!("🪛️ PIX_MINIMUM_DEPOSIT is {minimum_deposit}. Only positive amounts will be accepted.");
        }
        let unpaid_deposit_timeout =
            Duration::minutes(env_or_default("PIX_UNPAID_DEPOSIT_TIMEOUT", DEFAULT_UNPAID_DEPOSIT_TIMEOUT.num_minutes()));
        let closed_deposit_retention = Duration::hours(env_or_default(
            "PIX_CLOSED_DEPOSIT_RETENTION",
            DEFAULT_CLOSED_DEPOSIT_RETENTION.num_hours(),
        ));
        let webhook = WebhookConfig::from_env_or_default();
        let operator_webhook_url = non_empty_var("PIX_OPERATOR_WEBHOOK_URL");
        if operator_webhook_url.is_none() {
            info!("🪛️ PIX_OPERATOR_WEBHOOK_URL is not set. Operator notifications will only be logged.");
        }
        let event_buffer_size = match env_or_default("PIX_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE) {
            0 => {
                warn!("🪛️ PIX_EVENT_BUFFER_SIZE must be at least 1. Using {DEFAULT_EVENT_BUFFER_SIZE}.");
                DEFAULT_EVENT_BUFFER_SIZE
            },
            n => n,
        };
        Self {
            host,
            port,
            mercado_pago,
            notification_url,
            store_name,
            payer,
            minimum_deposit,
            unpaid_deposit_timeout,
            closed_deposit_retention,
            webhook,
            operator_webhook_url,
            event_buffer_size,
        }
    }

    /// The subset of the configuration that drives the deposit flow.
    pub fn deposit_options(&self) -> DepositOptions {
        DepositOptions::default()
            .with_minimum_deposit(self.minimum_deposit)
            .with_processor_timeout(self.mercado_pago.timeout)
            .with_store_name(self.store_name.clone())
            .with_payer(self.payer.clone())
            .with_notification_url(self.notification_url.clone())
            .with_charge_ttl(Some(self.unpaid_deposit_timeout))
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = Secret::new(env::var("PIX_WEBHOOK_SECRET").unwrap_or_default());
        let signature_checks = parse_boolean_flag(env::var("PIX_WEBHOOK_SIGNATURE_CHECKS").ok(), false);
        match (signature_checks, secret.is_empty()) {
            (true, true) => error!(
                "🪛️ PIX_WEBHOOK_SIGNATURE_CHECKS is on, but PIX_WEBHOOK_SECRET is not set. Every webhook delivery will \
                 be refused."
            ),
            (true, false) => info!("🪛️ Webhook signature checks are enabled."),
            (false, _) => warn!(
                "🚨️ Webhook signature checks are disabled. Anyone can trigger a reconciliation. Set \
                 PIX_WEBHOOK_SIGNATURE_CHECKS=1 in production."
            ),
        }
        Self { secret, signature_checks }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    parse_env_or_default(name, default).unwrap_or_else(|e| {
        warn!("🪛️ {e} Using the default, {default}, instead.");
        default
    })
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
