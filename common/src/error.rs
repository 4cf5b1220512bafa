use alloy::primitives::{utils::UnitsError, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to format {value} with {decimals} decimals. (Error: {error})")]
    FormatUnitsFailed {
        value: U256,
        decimals: u8,
        error: UnitsError,
    },

    #[error("Failed to parse formatted amount '{0}' as a float. (Error: {1})")]
    ParseFloatFailed(String, std::num::ParseFloatError),
}
