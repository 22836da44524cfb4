use actix_web::{http::StatusCode, web, web::ServiceConfig};
use pix_payment_engine::{
    db_types::{Centavos, NewAccountEntry, NewDeposit, PaymentId, ProcessorId, UserId},
    traits::{AccountManagement, DepositSettlement, PaymentLedger},
    AccountApi,
    MemoryDatabase,
};

use super::helpers::{get_request, json};
use crate::routes::{AccountDepositsRoute, AccountRoute};

fn configure(db: &MemoryDatabase) -> impl FnOnce(&mut ServiceConfig) {
    let api = web::Data::new(AccountApi::new(db.clone()));
    move |cfg| {
        cfg.app_data(api)
            .service(AccountRoute::<MemoryDatabase>::new())
            .service(AccountDepositsRoute::<MemoryDatabase>::new());
    }
}

#[actix_web::test]
async fn unknown_users_have_an_empty_account() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (status, body) = get_request("/account/nobody", configure(&db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["userId"], "nobody");
    assert_eq!(body["balance"], 0.0);
    assert_eq!(body["history"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn account_with_a_deposit() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let payment_id = PaymentId::random();
    let entry = NewAccountEntry::deposit(Centavos::from(5000), &payment_id).with_memo("PIX charge 1000001");
    db.credit(&UserId::from("u1"), entry).await.unwrap();

    let (status, body) = get_request("/account/u1", configure(&db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["balance"], 50.0);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["entry_type"], "deposit");
    assert_eq!(history[0]["amount"], 50.0);
    assert_eq!(history[0]["reference"], payment_id.as_str());
}

#[actix_web::test]
async fn deposits_for_a_user() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let user = UserId::from("u1");
    let first = db.create(NewDeposit::new(user.clone(), Centavos::from(5000))).await.unwrap();
    db.attach_processor_id(&first.id, &ProcessorId::from("1000001")).await.unwrap();
    db.approve_and_credit("1000001", Some("accredited".into()), "PIX charge 1000001".into()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = db.create(NewDeposit::new(user.clone(), Centavos::from(1000))).await.unwrap();
    db.create(NewDeposit::new(UserId::from("u2"), Centavos::from(700))).await.unwrap();

    let (status, body) = get_request("/account/u1/deposits", configure(&db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let deposits = body.as_array().unwrap();
    assert_eq!(deposits.len(), 2);
    assert_eq!(deposits[0]["paymentId"], second.id.as_str());
    assert_eq!(deposits[0]["status"], "pending");
    assert_eq!(deposits[1]["paymentId"], first.id.as_str());
    assert_eq!(deposits[1]["processorChargeId"], "1000001");
    assert_eq!(deposits[1]["status"], "approved");
    assert_eq!(deposits[1]["amount"], 50.0);

    let (status, body) = get_request("/account/nobody/deposits", configure(&db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 0);
}
