use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use pix_common::Secret;
use pix_payment_engine::{
    db_types::{Centavos, UserId},
    events::EventProducers,
    traits::{AccountManagement, PaymentLedger},
    DepositFlowApi,
    DepositOptions,
    MemoryDatabase,
};

use super::{
    helpers::{approved_charge, json, pending_charge, post_json, send_request},
    mocks::MockProcessor,
};
use crate::{
    config::WebhookConfig,
    helpers::{calculate_hmac, signature_manifest},
    middleware::{REQUEST_ID_HEADER, SIGNATURE_HEADER},
    server::webhook_scope,
};

type Api = DepositFlowApi<MemoryDatabase, MockProcessor>;

const SECRET: &str = "b9a1c4e2f7d3";

fn configure(api: web::Data<Api>, webhook: WebhookConfig) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(api).service(webhook_scope::<MemoryDatabase, MockProcessor>(&webhook));
    }
}

fn unsigned() -> WebhookConfig {
    WebhookConfig { secret: Secret::default(), signature_checks: false }
}

fn signed() -> WebhookConfig {
    WebhookConfig { secret: Secret::new(SECRET.to_string()), signature_checks: true }
}

/// Creates a pending deposit of R$ 50.00 for `u1`, bound to charge `1000001`.
async fn api_with_deposit(db: &MemoryDatabase, mut processor: MockProcessor) -> web::Data<Api> {
    processor.expect_create_charge().times(1).returning(|charge| Ok(pending_charge("1000001", charge.amount)));
    let api = DepositFlowApi::new(db.clone(), processor, EventProducers::default(), DepositOptions::default());
    api.create_deposit(UserId::from("u1"), Centavos::from(5000)).await.unwrap();
    web::Data::new(api)
}

/// The webhook acknowledges before reconciling, so give the background task a moment to land.
async fn wait_for_balance(db: &MemoryDatabase, expected: Centavos) -> bool {
    for _ in 0..50 {
        if let Some(account) = db.fetch_account(&UserId::from("u1")).await.unwrap() {
            if account.balance == expected {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[actix_web::test]
async fn payment_notification_credits_the_account() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor
        .expect_fetch_charge()
        .withf(|id| id.as_str() == "1000001")
        .times(1)
        .returning(|id| Ok(approved_charge(id.as_str(), Centavos::from(5000))));
    let api = api_with_deposit(&db, processor).await;
    let body = r#"{"action":"payment.updated","type":"payment","data":{"id":"1000001"},"live_mode":false}"#;
    let (status, body) = post_json("/webhook/processor", body, configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], true);
    assert!(wait_for_balance(&db, Centavos::from(5000)).await);
    let record = db.fetch_payment("1000001").await.unwrap();
    assert_eq!(record.status.to_string(), "approved");
}

#[actix_web::test]
async fn numeric_ids_are_accepted() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().times(1).returning(|id| Ok(approved_charge(id.as_str(), Centavos::from(5000))));
    let api = api_with_deposit(&db, processor).await;
    let body = r#"{"type":"payment","data":{"id":1000001}}"#;
    let (status, _) = post_json("/webhook/processor", body, configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(wait_for_balance(&db, Centavos::from(5000)).await);
}

#[actix_web::test]
async fn notification_in_the_query_string() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().times(1).returning(|id| Ok(approved_charge(id.as_str(), Centavos::from(5000))));
    let api = api_with_deposit(&db, processor).await;
    let (status, _) = post_json("/webhook/processor?data.id=1000001&type=payment", "", configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(wait_for_balance(&db, Centavos::from(5000)).await);
}

#[actix_web::test]
async fn other_events_are_ignored() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().never();
    let api = api_with_deposit(&db, processor).await;
    let body = r#"{"type":"merchant_order","data":{"id":"1000001"}}"#;
    let (status, body) = post_json("/webhook/processor", body, configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Notification ignored");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let record = db.fetch_payment("1000001").await.unwrap();
    assert_eq!(record.status.to_string(), "pending");
}

#[actix_web::test]
async fn unknown_charges_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().never();
    let api = api_with_deposit(&db, processor).await;
    let body = r#"{"type":"payment","data":{"id":"999"}}"#;
    let (status, _) = post_json("/webhook/processor", body, configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let account = db.fetch_or_create_account(&UserId::from("u1")).await.unwrap();
    assert_eq!(account.balance, Centavos::from(0));
}

#[actix_web::test]
async fn garbage_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().never();
    let api = api_with_deposit(&db, processor).await;
    let (status, _) = post_json("/webhook/processor", "this is not json", configure(api.clone(), unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json("/webhook/processor", r#"{"type":"payment"}"#, configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn repeated_notifications_credit_once() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().times(1).returning(|id| Ok(approved_charge(id.as_str(), Centavos::from(5000))));
    let api = api_with_deposit(&db, processor).await;
    let body = r#"{"type":"payment","data":{"id":"1000001"}}"#;
    let (status, _) = post_json("/webhook/processor", body, configure(api.clone(), unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(wait_for_balance(&db, Centavos::from(5000)).await);
    // The deposit is final now, so the processor is not asked again
    let (status, _) = post_json("/webhook/processor", body, configure(api, unsigned())).await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let account = db.fetch_account(&UserId::from("u1")).await.unwrap().unwrap();
    assert_eq!(account.balance, Centavos::from(5000));
    assert_eq!(account.deposits().count(), 1);
}

fn signed_request(body: &'static str, signature: &str) -> TestRequest {
    TestRequest::post()
        .uri("/webhook/processor")
        .insert_header(("content-type", "application/json"))
        .insert_header((REQUEST_ID_HEADER, "bb56a2f1-6aae-46ac-982e-9dcd3581d08e"))
        .insert_header((SIGNATURE_HEADER, format!("ts=1704908010,v1={signature}")))
        .set_payload(body)
}

#[actix_web::test]
async fn signed_notification() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().times(1).returning(|id| Ok(approved_charge(id.as_str(), Centavos::from(5000))));
    let api = api_with_deposit(&db, processor).await;
    let manifest =
        signature_manifest(Some("1000001"), Some("bb56a2f1-6aae-46ac-982e-9dcd3581d08e"), "1704908010");
    let signature = calculate_hmac(SECRET, manifest.as_bytes());
    let req = signed_request(r#"{"type":"payment","data":{"id":"1000001"}}"#, &signature);
    let (status, _) = send_request(req, configure(api, signed())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(wait_for_balance(&db, Centavos::from(5000)).await);
}

#[actix_web::test]
async fn forged_notifications_are_refused() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let mut processor = MockProcessor::new();
    processor.expect_fetch_charge().never();
    let api = api_with_deposit(&db, processor).await;

    // Signed with the wrong secret
    let manifest =
        signature_manifest(Some("1000001"), Some("bb56a2f1-6aae-46ac-982e-9dcd3581d08e"), "1704908010");
    let signature = calculate_hmac("not-the-secret", manifest.as_bytes());
    let req = signed_request(r#"{"type":"payment","data":{"id":"1000001"}}"#, &signature);
    let (status, body) = send_request(req, configure(api.clone(), signed())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Invalid signature.");

    // A valid signature, but for a different charge
    let manifest = signature_manifest(Some("42"), Some("bb56a2f1-6aae-46ac-982e-9dcd3581d08e"), "1704908010");
    let signature = calculate_hmac(SECRET, manifest.as_bytes());
    let req = signed_request(r#"{"type":"payment","data":{"id":"1000001"}}"#, &signature);
    let (status, _) = send_request(req, configure(api.clone(), signed())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // No signature at all
    let body = r#"{"type":"payment","data":{"id":"1000001"}}"#;
    let (status, body) = post_json("/webhook/processor", body, configure(api.clone(), signed())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "No signature found.");

    // Checks are on, but there is nothing to check against
    let no_secret = WebhookConfig { secret: Secret::default(), signature_checks: true };
    let req = signed_request(r#"{"type":"payment","data":{"id":"1000001"}}"#, "00");
    let (status, _) = send_request(req, configure(api, no_secret)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let record = db.fetch_payment("1000001").await.unwrap();
    assert_eq!(record.status.to_string(), "pending");
}
