use alloy::primitives::{utils::format_units, U256};

/// An on-chain integer amount together with the precision it was minted with.
///
/// Tokens in a single position do not share decimals (a 6 decimal stablecoin vault can
/// pay rewards in an 18 decimal token), so amounts are carried raw and only normalized
/// at the edge, each with its own precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawAmount {
    pub value: U256,
    pub decimals: u8,
}

impl RawAmount {
    pub fn new(value: U256, decimals: u8) -> Self {
        Self { value, decimals }
    }

    /// Exactly one whole unit, `10^decimals`.
    pub fn one(decimals: u8) -> Self {
        Self {
            value: U256::from(10u8).pow(U256::from(decimals)),
            decimals,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn to_f64(&self) -> crate::Result<f64> {
        let formatted =
            format_units(self.value, self.decimals).map_err(|error| crate::Error::FormatUnitsFailed {
                value: self.value,
                decimals: self.decimals,
                error,
            })?;

        formatted
            .parse::<f64>()
            .map_err(|e| crate::Error::ParseFloatFailed(formatted, e))
    }
}
