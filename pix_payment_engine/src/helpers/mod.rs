use chrono::Utc;

use crate::db_types::Centavos;

/// A fresh idempotency token for a single charge-creation call. The timestamp keeps keys roughly sortable in the
/// processor's dashboards; the random part makes them unique.
pub fn new_idempotency_key() -> String {
    format!("{}-{:016x}", Utc::now().timestamp_millis(), rand::random::<u64>())
}

/// The human-readable description attached to a charge, e.g. `Depósito Wendizx Store - R$ 50.00`.
pub fn charge_description(store_name: &str, amount: Centavos) -> String {
    format!("Depósito {store_name} - {amount}")
}
