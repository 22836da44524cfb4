use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MercadoPagoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach Mercado Pago: {0}")]
    RestResponseError(String),
    #[error("Mercado Pago did not answer in time: {0}")]
    Timeout(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl MercadoPagoApiError {
    /// Whether the same request could reasonably succeed if it were sent again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RestResponseError(_) | Self::Timeout(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for MercadoPagoApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}
