use actix_web::{http::StatusCode, web, web::ServiceConfig};
use pix_payment_engine::{
    db_types::{Centavos, UserId},
    events::EventProducers,
    traits::{AccountManagement, PaymentLedger, ProcessorError},
    DepositFlowApi,
    DepositOptions,
    MemoryDatabase,
};

use super::{
    helpers::{approved_charge, get_request, json, pending_charge, post_json, PIX_CODE},
    mocks::MockProcessor,
};
use crate::routes::{CreateDepositRoute, DepositStatusRoute};

type Api = DepositFlowApi<MemoryDatabase, MockProcessor>;

fn new_api(db: &MemoryDatabase, processor: MockProcessor) -> web::Data<Api> {
    web::Data::new(DepositFlowApi::new(db.clone(), processor, EventProducers::default(), DepositOptions::default()))
}

fn configure(api: web::Data<Api>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(api)
            .service(CreateDepositRoute::<MemoryDatabase, MockProcessor>::new())
            .service(DepositStatusRoute::<MemoryDatabase, MockProcessor>::new());
    }
}

#[actix_web::test]
async fn create_deposit() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor
        .expect_create_charge()
        .withf(|charge| {
            charge.amount == Centavos::from(5000) &&
                charge.description == "Depósito Wendizx Store - R$ 50.00" &&
                charge.payer.email == "cliente@wendizx.com"
        })
        .times(1)
        .returning(|charge| Ok(pending_charge("1325462468", charge.amount)));
    let api = new_api(&db, processor);
    let (status, body) = post_json("/deposit", r#"{"userId": "u1", "amount": 50}"#, configure(api)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert!(body["paymentId"].as_str().unwrap().starts_with("pix_"));
    assert_eq!(body["processorChargeId"], "1325462468");
    assert_eq!(body["amount"], 50.0);
    assert_eq!(body["payablePayload"]["qr_code"], PIX_CODE);
    let record = db.fetch_payment("1325462468").await.unwrap();
    assert_eq!(record.id.as_str(), body["paymentId"].as_str().unwrap());
}

#[actix_web::test]
async fn deposits_below_the_minimum_are_refused() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_create_charge().never();
    let api = new_api(&db, processor);
    let (status, body) = post_json("/deposit", r#"{"userId": "u1", "amount": 0.5}"#, configure(api)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid deposit amount R$ 0.50. The minimum deposit is R$ 1.00"}"#);
}

#[actix_web::test]
async fn malformed_deposit_requests() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_create_charge().never();
    let api = new_api(&db, processor);
    let (status, body) = post_json("/deposit", r#"{"userId": "u1", "amount": "lots"}"#, configure(api.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));
    let (status, _) = post_json("/deposit", r#"{"amount": 10}"#, configure(api)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn processor_failures_on_create() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor
        .expect_create_charge()
        .times(1)
        .returning(|_| Err(ProcessorError::Unavailable("connection refused".into())));
    processor
        .expect_create_charge()
        .times(1)
        .returning(|_| Err(ProcessorError::Rejected { status: 400, message: "payer.email must be a valid email".into() }));
    let api = new_api(&db, processor);
    let (status, body) = post_json("/deposit", r#"{"userId": "u1", "amount": 10}"#, configure(api.clone())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json(&body)["error"], "The payment processor is unavailable. connection refused");
    let (status, body) = post_json("/deposit", r#"{"userId": "u1", "amount": 10}"#, configure(api)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json(&body)["error"], "The payment processor declined the request (400). payer.email must be a valid email");
    assert!(db.fetch_payments_for_user(&UserId::from("u1")).await.unwrap().is_empty());
}

#[actix_web::test]
async fn status_of_unknown_deposit() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().never();
    let api = new_api(&db, processor);
    let (status, body) = get_request("/deposit/pix_0000000000000000/status", configure(api)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "The data was not found. No deposit was found for pix_0000000000000000");
}

#[actix_web::test]
async fn polling_credits_the_account_once() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_create_charge().times(1).returning(|charge| Ok(pending_charge("1000001", charge.amount)));
    processor.expect_fetch_charge().times(1).returning(|id| Ok(approved_charge(id.as_str(), Centavos::from(5000))));
    let api = new_api(&db, processor);
    let receipt = api.create_deposit(UserId::from("u1"), Centavos::from(5000)).await.unwrap();

    let path = format!("/deposit/{}/status", receipt.payment_id);
    let (status, body) = get_request(&path, configure(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["statusDetail"], "accredited");
    assert_eq!(body["amount"], 50.0);
    assert_eq!(body["processorChargeId"], "1000001");

    // Approved deposits are answered from the ledger, by either id
    let (status, body) = get_request("/deposit/1000001/status", configure(api)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["paymentId"], receipt.payment_id.as_str());

    let account = db.fetch_account(&UserId::from("u1")).await.unwrap().unwrap();
    assert_eq!(account.balance, Centavos::from(5000));
    assert_eq!(account.deposits().count(), 1);
}

#[actix_web::test]
async fn pending_deposits_stay_pending() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_create_charge().times(1).returning(|charge| Ok(pending_charge("1000001", charge.amount)));
    processor.expect_fetch_charge().times(2).returning(|id| Ok(pending_charge(id.as_str(), Centavos::from(2500))));
    let api = new_api(&db, processor);
    let receipt = api.create_deposit(UserId::from("u1"), Centavos::from(2500)).await.unwrap();
    let path = format!("/deposit/{}/status", receipt.payment_id);
    for _ in 0..2 {
        let (status, body) = get_request(&path, configure(api.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "pending");
    }
    let account = db.fetch_or_create_account(&UserId::from("u1")).await.unwrap();
    assert_eq!(account.balance, Centavos::from(0));
}

#[actix_web::test]
async fn polling_while_the_processor_is_down() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_create_charge().times(1).returning(|charge| Ok(pending_charge("1000001", charge.amount)));
    processor.expect_fetch_charge().times(1).returning(|_| Err(ProcessorError::Unavailable("timeout".into())));
    let api = new_api(&db, processor);
    let receipt = api.create_deposit(UserId::from("u1"), Centavos::from(1000)).await.unwrap();
    let path = format!("/deposit/{}/status", receipt.payment_id);
    let (status, body) = get_request(&path, configure(api)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["error"], "The payment processor is unavailable. timeout");
    let record = db.fetch_payment(receipt.payment_id.as_str()).await.unwrap();
    assert_eq!(record.status.to_string(), "pending");
}
