mod deposit_world;
mod setups;
mod steps;

pub use deposit_world::DepositWorld;
