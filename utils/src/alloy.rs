use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};

pub trait StringExt {
    fn parse_as_address(&self) -> crate::Result<Address>;

    fn to_alloy_provider(&self) -> crate::Result<DynProvider>;
}

impl StringExt for str {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.trim()
            .parse::<Address>()
            .map_err(|_| crate::Error::InvalidAddress(self.to_string()))
    }

    fn to_alloy_provider(&self) -> crate::Result<DynProvider> {
        self.parse()
            .map_err(|e| crate::Error::UrlParsingFailed(self.to_string(), e))
            .map(|rpc_url| ProviderBuilder::new().connect_http(rpc_url).erased())
    }
}

impl StringExt for String {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.as_str().parse_as_address()
    }

    fn to_alloy_provider(&self) -> crate::Result<DynProvider> {
        self.as_str().to_alloy_provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_as_address() {
        let parsed = " 0xae7ab96520de3a18e5e111b5eaab095312d7fe84 "
            .parse_as_address()
            .unwrap();
        assert_eq!(parsed, crate::config::LIDO_STETH);

        assert!(matches!(
            "0x1234".parse_as_address(),
            Err(crate::Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_invalid_rpc_url() {
        assert!(matches!(
            "not a url".to_alloy_provider(),
            Err(crate::Error::UrlParsingFailed(_, _))
        ));
    }
}
