//! Request handlers.
//!
//! Handlers stay thin: they unpack the request, call into the engine API held in `web::Data` and turn the result into
//! a response. Anything that is more than a few lines belongs in the engine.
//!
//! Every handler is async, and everything that touches the network or a lock is awaited. A handler that blocks stalls
//! its whole worker thread, and with it every other request queued on that worker.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use mercado_pago_tools::PaymentNotification;
use pix_payment_engine::{
    db_types::UserId,
    traits::{AccountManagement, DepositSettlement, PaymentLedger, PaymentProcessor},
    AccountApi,
    DepositFlowApi,
    DepositStatusReport,
};

use crate::{
    data_objects::{AccountResponse, DepositRequest, HealthResponse, JsonResponse, WebhookQuery},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where processor: $processor:ty) => {
        paste::paste! { pub struct [<$name:camel Route>]<B, P>(core::marker::PhantomData<fn() -> (B, P)>);}
        paste::paste! { impl<B, P> [<$name:camel Route>]<B, P> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (B, P)>)
            }
        }}
        paste::paste! { impl<B, P> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B, P>
        where
            B: $($bounds +)+ 'static,
            P: $processor + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B, P>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(HealthResponse::online(Utc::now()))
}

//----------------------------------------------   Deposits  ----------------------------------------------------
route!(create_deposit => Post "/deposit" impl DepositSettlement where processor: PaymentProcessor);
/// Creates a PIX charge for the requested amount and returns the code the payer needs to complete the transfer.
pub async fn create_deposit<B, P>(
    body: web::Json<DepositRequest>,
    api: web::Data<DepositFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: DepositSettlement,
    P: PaymentProcessor,
{
    let DepositRequest { user_id, amount } = body.into_inner();
    debug!("💻️ Deposit of {amount} requested for {user_id}");
    let receipt = api.create_deposit(user_id, amount).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

route!(deposit_status => Get "/deposit/{payment_id}/status" impl DepositSettlement where processor: PaymentProcessor);
/// Reconciles the deposit with the processor and reports where it stands. Either of the deposit's ids is accepted.
///
/// Polling is one of the two ways a deposit gets credited (the webhook is the other), so this is not a pure read.
pub async fn deposit_status<B, P>(
    path: web::Path<String>,
    api: web::Data<DepositFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: DepositSettlement,
    P: PaymentProcessor,
{
    let key = path.into_inner();
    trace!("💻️ Status check for deposit {key}");
    let record = api.reconcile(&key).await.map_err(ServerError::from_poll_error)?;
    Ok(HttpResponse::Ok().json(DepositStatusReport::from(record)))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(processor_webhook => Post "/processor" impl DepositSettlement where processor: PaymentProcessor);
/// Receives payment notifications from the processor.
///
/// The processor is always answered with `200` straight away. Reconciliation runs in the background and its outcome
/// is only visible in the logs, the account and the next status poll.
pub async fn processor_webhook<B, P>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<DepositFlowApi<B, P>>,
) -> HttpResponse
where
    B: DepositSettlement + 'static,
    P: PaymentProcessor + 'static,
{
    trace!("💻️ Received webhook notification");
    let notification = serde_json::from_slice::<PaymentNotification>(&body).unwrap_or_else(|e| {
        debug!("💻️ Webhook body is not a notification ({e}). Checking the query string.");
        PaymentNotification::default()
    });
    let query = web::Query::<WebhookQuery>::from_query(req.query_string()).map(|q| q.into_inner()).unwrap_or_default();
    let is_payment_event = notification.is_payment_event() || query.event_type() == Some("payment");
    if !is_payment_event {
        let kind = notification.event_type.as_deref().or(query.event_type()).unwrap_or("unknown");
        debug!("💻️ Ignoring '{kind}' webhook notification");
        return HttpResponse::Ok().json(JsonResponse::success("Notification ignored"));
    }
    let Some(processor_id) = notification.payment_id().or(query.resource_id()).map(String::from) else {
        warn!("💻️ Payment notification without a payment id. Ignoring it.");
        return HttpResponse::Ok().json(JsonResponse::success("Notification ignored"));
    };
    info!("💻️ Payment notification received for charge {processor_id}");
    let api = api.clone();
    actix_web::rt::spawn(async move {
        api.handle_processor_notification(&processor_id).await;
    });
    HttpResponse::Ok().json(JsonResponse::success("Notification received"))
}

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(account => Get "/account/{user_id}" impl AccountManagement);
/// The balance and history for a user. Users that have never been seen get an empty account.
pub async fn account<A: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = UserId::from(path.into_inner());
    trace!("💻️ Fetching account for {user_id}");
    let account = api.account_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}

route!(account_deposits => Get "/account/{user_id}/deposits" impl AccountManagement, PaymentLedger);
/// Every deposit attempt the ledger still holds for a user, newest first. Closed attempts disappear once they are
/// purged.
pub async fn account_deposits<A>(
    path: web::Path<String>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + PaymentLedger,
{
    let user_id = UserId::from(path.into_inner());
    trace!("💻️ Fetching deposits for {user_id}");
    let deposits = api.payments_for_user(&user_id).await?;
    let deposits = deposits.into_iter().map(DepositStatusReport::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(deposits))
}
