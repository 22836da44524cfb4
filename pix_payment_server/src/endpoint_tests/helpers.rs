use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use pix_payment_engine::{
    db_types::{Centavos, PayablePayload, ProcessorId},
    traits::{ChargeStatus, ProcessorCharge},
};

use crate::server::json_config;

pub const PIX_CODE: &str = "00020126580014br.gov.bcb.pix0136a629532e-7693-4846-852d-1bbff817b5a8520400005303986";

/// Runs a single request against an app built by `configure`. Errors raised by middleware are turned into the
/// status and message a client would see.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), configure).await
}

pub async fn post_json<F>(path: &str, body: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post()
        .uri(path)
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_string());
    send_request(req, configure).await
}

pub fn pending_charge(id: &str, amount: Centavos) -> ProcessorCharge {
    ProcessorCharge {
        id: ProcessorId::from(id),
        status: ChargeStatus::Pending,
        status_detail: Some("pending_waiting_transfer".into()),
        amount,
        payable: Some(PayablePayload::new(PIX_CODE).with_image("iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk")),
    }
}

pub fn approved_charge(id: &str, amount: Centavos) -> ProcessorCharge {
    ProcessorCharge {
        status: ChargeStatus::Approved,
        status_detail: Some("accredited".into()),
        ..pending_charge(id, amount)
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
