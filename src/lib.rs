#![forbid(unsafe_code)]

pub mod anthropic;
pub mod cli;
pub mod companion;
pub mod config;
pub mod formats;
pub mod library;
pub mod logging;
pub mod position;
pub mod progress;
pub mod session;
pub mod store;
