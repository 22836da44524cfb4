use chrono::Duration;
use log::*;
use pix_payment_engine::{
    db_types::PaymentRecord,
    events::EventProducers,
    DepositFlowApi,
    DepositOptions,
    MemoryDatabase,
};
use tokio::task::JoinHandle;

use crate::integrations::mercado_pago::MercadoPagoProcessor;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_expiry_worker(
    db: MemoryDatabase,
    processor: MercadoPagoProcessor,
    producers: EventProducers,
    options: DepositOptions,
    unpaid_timeout: Duration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = DepositFlowApi::new(db, processor, producers, options);
        info!("🕰️ Unpaid deposit expiry worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running unpaid deposit expiry job");
            match api.expire_stale_deposits(unpaid_timeout, retention).await {
                Ok(result) => {
                    if result.expired_count() > 0 {
                        info!("🕰️ {} deposits expired: {}", result.expired_count(), deposit_list(&result.expired));
                    }
                    if result.purged_count() > 0 {
                        debug!("🕰️ {} closed deposits purged: {}", result.purged_count(), deposit_list(&result.purged));
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid deposit expiry job: {e}");
                },
            }
        }
    })
}

fn deposit_list(deposits: &[PaymentRecord]) -> String {
    deposits
        .iter()
        .map(|d| format!("[{}] user: {} amount: {}", d.id, d.user_id, d.amount))
        .collect::<Vec<String>>()
        .join(", ")
}
