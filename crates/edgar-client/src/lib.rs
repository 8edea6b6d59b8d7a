pub mod client;
pub mod config;
pub mod models;

pub use client::EdgarClient;
pub use config::EdgarConfig;
pub use models::*;
