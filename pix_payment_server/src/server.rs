use std::time::Duration;

use actix_web::{
    dev::{HttpServiceFactory, Server},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use log::*;
use mercado_pago_tools::MercadoPagoApi;
use pix_payment_engine::{
    events::{EventHandlers, EventProducers},
    traits::{DepositSettlement, PaymentProcessor},
    AccountApi,
    DepositFlowApi,
    MemoryDatabase,
};

use crate::{
    config::{ServerConfig, WebhookConfig},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::mercado_pago::MercadoPagoProcessor,
    middleware::SignatureMiddlewareFactory,
    notifier::{notification_hooks, OperatorNotifier},
    routes::{
        health,
        AccountDepositsRoute,
        AccountRoute,
        CreateDepositRoute,
        DepositStatusRoute,
        ProcessorWebhookRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = MemoryDatabase::new();
    let api = MercadoPagoApi::new(config.mercado_pago.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the Mercado Pago client. {e}")))?;
    let processor = MercadoPagoProcessor::new(api);
    let notifier = OperatorNotifier::new(config.operator_webhook_url.clone())?;
    let handlers = EventHandlers::new(config.event_buffer_size, notification_hooks(notifier));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _worker = start_expiry_worker(
        db.clone(),
        processor.clone(),
        producers.clone(),
        config.deposit_options(),
        config.unpaid_deposit_timeout,
        config.closed_deposit_retention,
    );
    let srv = create_server_instance(config, db, processor, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B, P>(
    config: ServerConfig,
    db: B,
    processor: P,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    B: DepositSettlement + Send + 'static,
    P: PaymentProcessor + Clone + Send + 'static,
{
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let deposits_api =
            DepositFlowApi::new(db.clone(), processor.clone(), producers.clone(), config.deposit_options());
        let accounts_api = AccountApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pix::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(deposits_api))
            .app_data(web::Data::new(accounts_api))
            .service(health)
            .service(CreateDepositRoute::<B, P>::new())
            .service(DepositStatusRoute::<B, P>::new())
            .service(AccountRoute::<B>::new())
            .service(AccountDepositsRoute::<B>::new())
            .service(webhook_scope::<B, P>(&config.webhook))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Listening on {host}:{port}");
    Ok(srv)
}

/// Processor webhooks live under `/webhook`, behind the signature check.
pub fn webhook_scope<B, P>(config: &WebhookConfig) -> impl HttpServiceFactory
where
    B: DepositSettlement + 'static,
    P: PaymentProcessor + 'static,
{
    web::scope("/webhook")
        .wrap(SignatureMiddlewareFactory::new(config.secret.clone(), config.signature_checks))
        .service(ProcessorWebhookRoute::<B, P>::new())
}

/// Malformed JSON bodies get the same `{"error": ...}` treatment as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
