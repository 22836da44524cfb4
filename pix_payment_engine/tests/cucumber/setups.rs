use std::time::Duration;

use cucumber::given;
use pix_payment_engine::{db_types::Centavos, DepositOptions};

use crate::cucumber::{deposit_world::DepositSystem, DepositWorld};

#[given("a fresh install")]
async fn fresh_install(world: &mut DepositWorld) {
    world.system = Some(DepositSystem::new(DepositOptions::default()));
}

#[given(expr = "a fresh install with a minimum deposit of {float} reais")]
async fn fresh_install_with_minimum(world: &mut DepositWorld, minimum: f64) {
    let minimum = Centavos::try_from_reais_f64(minimum).expect("Invalid minimum");
    let options = DepositOptions::default().with_minimum_deposit(minimum);
    world.system = Some(DepositSystem::new(options));
}

#[given(expr = "a fresh install with a processor timeout of {int}ms")]
async fn fresh_install_with_timeout(world: &mut DepositWorld, ms: u64) {
    let options = DepositOptions::default().with_processor_timeout(Duration::from_millis(ms));
    world.system = Some(DepositSystem::new(options));
}
