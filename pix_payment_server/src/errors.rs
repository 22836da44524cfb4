use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use pix_payment_engine::{
    traits::{AccountApiError, LedgerError},
    DepositFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    InvalidAmount(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    /// The processor could not be reached while creating a charge.
    #[error("{0}")]
    ProcessorUnavailable(String),
    /// The processor could not be reached while checking a deposit. The client should poll again later.
    #[error("{0}")]
    ProcessorTemporarilyUnavailable(String),
    #[error("{0}")]
    ProcessorRejected(String),
    #[error("{0}")]
    ProcessorResponseInvalid(String),
}

impl ServerError {
    /// Maps an error raised while reconciling on behalf of a polling client. Transient processor failures are reported
    /// as `503`, so the client knows that asking again is the right thing to do.
    pub fn from_poll_error(e: DepositFlowError) -> Self {
        match e {
            DepositFlowError::ProcessorUnavailable(_) => Self::ProcessorTemporarilyUnavailable(e.to_string()),
            e => Self::from(e),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ProcessorUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::ProcessorRejected(_) => StatusCode::BAD_GATEWAY,
            Self::ProcessorResponseInvalid(_) => StatusCode::BAD_GATEWAY,
            Self::ProcessorTemporarilyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<DepositFlowError> for ServerError {
    fn from(e: DepositFlowError) -> Self {
        match e {
            DepositFlowError::InvalidAmount { .. } => Self::InvalidAmount(e.to_string()),
            DepositFlowError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            DepositFlowError::ProcessorUnavailable(_) => Self::ProcessorUnavailable(e.to_string()),
            DepositFlowError::ProcessorRejected { .. } => Self::ProcessorRejected(e.to_string()),
            DepositFlowError::ProcessorResponseInvalid(_) => Self::ProcessorResponseInvalid(e.to_string()),
            DepositFlowError::AmountMismatch { .. } | DepositFlowError::LedgerError(_) => {
                error!("💻️ {e}");
                Self::BackendError(e.to_string())
            },
            DepositFlowError::AccountError(e) => Self::from(e),
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        Self::from(DepositFlowError::from(e))
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        Self::BackendError(e.to_string())
    }
}
