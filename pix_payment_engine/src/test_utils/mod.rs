//! Test doubles for the engine, shared by the integration and cucumber tests.
mod scripted_processor;

pub use scripted_processor::ScriptedProcessor;
