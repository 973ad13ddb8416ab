pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod playlist;
pub mod realtime;
pub mod service;
pub mod slug;

pub use config::Config;
pub use error::{Error, Result};
