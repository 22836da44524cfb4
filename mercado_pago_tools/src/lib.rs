//! A small client for the parts of the Mercado Pago payments API that a PIX deposit flow needs: creating a PIX
//! payment and reading back its status.
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::{MercadoPagoApi, IDEMPOTENCY_HEADER};
pub use config::{MercadoPagoConfig, DEFAULT_MP_API_URL, DEFAULT_PROCESSOR_TIMEOUT};
pub use data_objects::{MpPayment, NewPixPayment, Payer, PaymentNotification};
pub use error::MercadoPagoApiError;
