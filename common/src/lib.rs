pub mod amount;
pub mod contracts;
pub mod error;

pub use amount::RawAmount;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
