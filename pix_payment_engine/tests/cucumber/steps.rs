use std::{sync::Arc, time::Duration};

use cucumber::{then, when};
use pix_payment_engine::{
    db_types::{Centavos, PaymentStatus, UserId},
    traits::ProcessorError,
    AccountManagement,
    DepositFlowError,
    PaymentLedger,
};

use crate::cucumber::DepositWorld;

fn reais(amount: f64) -> Centavos {
    Centavos::try_from_reais_f64(amount).expect("Not a valid amount")
}

#[when(expr = "'{word}' requests a deposit of {float} reais as '{word}'")]
async fn request_deposit(world: &mut DepositWorld, user: String, amount: f64, label: String) {
    let result = world.api().create_deposit(UserId::from(user), reais(amount)).await;
    match result {
        Ok(receipt) => {
            world.deposits.insert(label, receipt);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "'{word}' requests a deposit of {float} reais")]
async fn request_unlabelled_deposit(world: &mut DepositWorld, user: String, amount: f64) {
    request_deposit(world, user, amount, "unlabelled".into()).await;
}

#[when(expr = "the processor approves '{word}'")]
async fn processor_approves(world: &mut DepositWorld, label: String) {
    let id = world.deposit(&label).processor_charge_id.clone();
    world.system().processor.approve(id.as_str());
}

#[when(expr = "the processor rejects '{word}'")]
async fn processor_rejects(world: &mut DepositWorld, label: String) {
    let id = world.deposit(&label).processor_charge_id.clone();
    world.system().processor.reject(id.as_str());
}

#[when("the processor goes down")]
async fn processor_down(world: &mut DepositWorld) {
    let processor = &world.system().processor;
    processor.fail_creates_with(Some(ProcessorError::Unavailable("connection refused".into())));
    processor.fail_fetches_with(Some(ProcessorError::Unavailable("connection refused".into())));
}

#[when("the processor comes back up")]
async fn processor_up(world: &mut DepositWorld) {
    let processor = &world.system().processor;
    processor.fail_creates_with(None);
    processor.fail_fetches_with(None);
    processor.set_delay(None);
}

#[when(expr = "the processor takes {int}ms to answer")]
async fn processor_slow(world: &mut DepositWorld, ms: u64) {
    world.system().processor.set_delay(Some(Duration::from_millis(ms)));
}

#[when(expr = "the client polls '{word}' {int} time(s)")]
async fn client_polls(world: &mut DepositWorld, label: String, count: usize) {
    let id = world.deposit(&label).payment_id.to_string();
    for _ in 0..count {
        let result = world.api().reconcile(&id).await;
        if let Err(e) = result {
            world.last_error = Some(e);
        }
    }
}

#[when(expr = "the processor notifies us about '{word}' {int} time(s)")]
async fn processor_notifies(world: &mut DepositWorld, label: String, count: usize) {
    let id = world.deposit(&label).processor_charge_id.to_string();
    for _ in 0..count {
        world.api().handle_processor_notification(&id).await;
    }
}

#[when(expr = "polls and notifications for '{word}' race {int} times each")]
async fn race(world: &mut DepositWorld, label: String, count: usize) {
    let receipt = world.deposit(&label).clone();
    let mut tasks = Vec::new();
    for _ in 0..count {
        let api = Arc::clone(&world.system().api);
        let key = receipt.payment_id.to_string();
        tasks.push(tokio::spawn(async move { api.reconcile(&key).await.map(|_| ()) }));
        let api = Arc::clone(&world.system().api);
        let key = receipt.processor_charge_id.to_string();
        tasks.push(tokio::spawn(async move {
            api.handle_processor_notification(&key).await;
            Ok(())
        }));
    }
    for task in tasks {
        task.await.expect("Task panicked").expect("Reconciliation failed");
    }
}

#[when(expr = "a notification arrives for the unknown charge '{word}'")]
async fn unknown_notification(world: &mut DepositWorld, id: String) {
    let result = world.api().handle_processor_notification(&id).await;
    assert!(result.is_none());
}

#[when("unpaid deposits are expired")]
async fn expire_unpaid(world: &mut DepositWorld) {
    tokio::time::sleep(Duration::from_millis(5)).await;
    world
        .api()
        .expire_stale_deposits(chrono::Duration::zero(), chrono::Duration::hours(24))
        .await
        .expect("Expiry job failed");
}

#[then(expr = "deposit '{word}' is {word}")]
async fn check_status(world: &mut DepositWorld, label: String, status: String) {
    let receipt = world.deposit(&label);
    let expected = status.parse::<PaymentStatus>().expect("Not a valid status");
    let db = &world.system().db;
    let by_internal = db.fetch_payment(receipt.payment_id.as_str()).await.expect("Deposit not found");
    let by_processor = db.fetch_payment(receipt.processor_charge_id.as_str()).await.expect("Deposit not found");
    assert_eq!(by_internal, by_processor);
    assert_eq!(by_internal.status, expected);
}

#[then(expr = "the balance of '{word}' is {float} reais")]
async fn check_balance(world: &mut DepositWorld, user: String, amount: f64) {
    let account = world.system().db.fetch_or_create_account(&UserId::from(user)).await.expect("Account error");
    assert_eq!(account.balance, reais(amount));
}

#[then(expr = "'{word}' has {int} deposit(s) in their history")]
async fn check_history(world: &mut DepositWorld, user: String, count: usize) {
    let history = world.system().db.history(&UserId::from(user)).await.expect("Account error");
    assert_eq!(history.iter().filter(|e| e.entry_type.is_credit()).count(), count);
}

#[then(expr = "the processor was queried {int} time(s)")]
async fn check_fetch_calls(world: &mut DepositWorld, count: usize) {
    assert_eq!(world.system().processor.fetch_calls(), count);
}

#[then(expr = "the processor was asked for {int} charge(s)")]
async fn check_create_calls(world: &mut DepositWorld, count: usize) {
    assert_eq!(world.system().processor.create_calls(), count);
}

#[then("the request is refused as an invalid amount")]
async fn check_invalid_amount(world: &mut DepositWorld) {
    assert!(matches!(world.last_error, Some(DepositFlowError::InvalidAmount { .. })), "{:?}", world.last_error);
}

#[then("the request fails because the processor is unavailable")]
async fn check_unavailable(world: &mut DepositWorld) {
    assert!(matches!(world.last_error, Some(DepositFlowError::ProcessorUnavailable(_))), "{:?}", world.last_error);
}

#[then(expr = "'{word}' has {int} deposit record(s)")]
async fn check_records(world: &mut DepositWorld, user: String, count: usize) {
    let records = world.system().db.fetch_payments_for_user(&UserId::from(user)).await.expect("Ledger error");
    assert_eq!(records.len(), count);
}
