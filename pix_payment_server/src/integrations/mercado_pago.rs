//! Plugs the Mercado Pago client into the payment engine as its [`PaymentProcessor`].
use log::*;
use mercado_pago_tools::{MercadoPagoApi, MercadoPagoApiError, MpPayment, NewPixPayment, Payer};
use pix_payment_engine::{
    db_types::{PayablePayload, ProcessorId},
    traits::{ChargeStatus, NewCharge, PayerInfo, PaymentProcessor, ProcessorCharge, ProcessorError},
};

#[derive(Clone, Debug)]
pub struct MercadoPagoProcessor {
    api: MercadoPagoApi,
}

impl MercadoPagoProcessor {
    pub fn new(api: MercadoPagoApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &MercadoPagoApi {
        &self.api
    }
}

impl PaymentProcessor for MercadoPagoProcessor {
    async fn create_charge(&self, charge: NewCharge) -> Result<ProcessorCharge, ProcessorError> {
        let idempotency_key = charge.idempotency_key.clone();
        let payment = new_pix_payment(charge);
        let payment = self.api.create_pix_payment(&payment, &idempotency_key).await.map_err(processor_error)?;
        processor_charge(payment)
    }

    async fn fetch_charge(&self, id: &ProcessorId) -> Result<ProcessorCharge, ProcessorError> {
        let payment = self.api.get_payment(id.as_str()).await.map_err(processor_error)?;
        processor_charge(payment)
    }
}

fn new_pix_payment(charge: NewCharge) -> NewPixPayment {
    let NewCharge { amount, description, payer, notification_url, expires_at, .. } = charge;
    let PayerInfo { email, first_name, last_name } = payer;
    NewPixPayment::new(amount, description, Payer { email, first_name, last_name })
        .with_notification_url(notification_url)
        .with_expiration(expires_at)
}

fn processor_charge(payment: MpPayment) -> Result<ProcessorCharge, ProcessorError> {
    let amount = payment.amount().map_err(|e| ProcessorError::InvalidResponse(e.to_string()))?;
    let payable = payment.transaction_data().and_then(|data| {
        let qr_code = data.qr_code.clone()?;
        Some(PayablePayload {
            qr_code,
            qr_code_base64: data.qr_code_base64.clone(),
            ticket_url: data.ticket_url.clone(),
        })
    });
    Ok(ProcessorCharge {
        id: ProcessorId::from(payment.id.to_string()),
        status: ChargeStatus::from_processor_status(&payment.status),
        status_detail: payment.status_detail,
        amount,
        payable,
    })
}

fn processor_error(e: MercadoPagoApiError) -> ProcessorError {
    if e.is_transient() {
        return ProcessorError::Unavailable(e.to_string());
    }
    match e {
        MercadoPagoApiError::QueryError { status, message } => {
            debug!("💳️ Mercado Pago refused the request ({status}). {message}");
            ProcessorError::Rejected { status, message }
        },
        MercadoPagoApiError::Initialization(msg) => ProcessorError::Unavailable(msg),
        e => {
            error!("💳️ Unusable response from Mercado Pago. {e}");
            ProcessorError::InvalidResponse(e.to_string())
        },
    }
}
