//! Value types shared by the PIX deposit service crates.
mod centavos;
mod helpers;

pub mod op;
mod secret;

pub use centavos::{Centavos, CentavosConversionError, BRL_CURRENCY_CODE};
pub use helpers::{parse_boolean_flag, parse_env_or_default};
pub use secret::Secret;
