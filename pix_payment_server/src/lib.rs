//! # PIX deposit server
//! This crate hosts the HTTP server for PIX deposits. It is responsible for:
//! Accepting deposit requests and creating the matching PIX charges with Mercado Pago.
//! Answering status polls, which reconcile the deposit with Mercado Pago on the way.
//! Listening for Mercado Pago's payment webhooks and reconciling in the background.
//! Telling an operator about new, approved and annulled deposits.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route.
//! * `/deposit`: Creates a deposit.
//! * `/deposit/{payment_id}/status`: Reconciles a deposit and reports its status.
//! * `/webhook/processor`: The webhook route for Mercado Pago payment notifications.
//! * `/account/{user_id}`: A user's balance and history.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod notifier;
pub mod routes;
pub mod server;
