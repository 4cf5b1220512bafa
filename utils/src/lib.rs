pub mod aggregate;
pub mod alloy;
pub mod analysis;
pub mod cache;
pub mod chain;
pub mod config;
pub mod discovery;
pub mod disk_storage;
pub mod earnings;
pub mod error;
pub mod feeds;
pub mod gas;
pub mod position;
pub mod price;
pub mod snapshot;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, UtilsError as Error};
