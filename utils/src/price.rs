use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use yieldscope_common::RawAmount;

use crate::{
    cache::AppendOnlyCache,
    chain::{ChainReader, FeedAnswer},
};

/// USD prices resolved during one analysis run, keyed by asset address.
pub type PriceCache = AppendOnlyCache<Address, f64>;

/// Resolves USD prices of assets through their Chainlink feeds.
///
/// A price of `0.0` means "unpriced": either no feed is configured for the asset or the
/// feed could not be read. Callers decide on their own fallback.
pub struct PriceResolver<R> {
    reader: Arc<R>,
    feeds: HashMap<Address, Address>,
    cache: Arc<PriceCache>,
}

impl<R: ChainReader> PriceResolver<R> {
    pub fn new(reader: Arc<R>, feeds: HashMap<Address, Address>, cache: Arc<PriceCache>) -> Self {
        Self {
            reader,
            feeds,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    pub async fn resolve(&self, asset: Address) -> f64 {
        if let Some(price) = self.cache.get(&asset) {
            return price;
        }

        let Some(feed) = self.feeds.get(&asset).copied() else {
            tracing::warn!(%asset, "No Chainlink feed configured");
            return 0.0;
        };

        match self.read_feed(feed).await {
            Ok(price) => self.cache.insert_if_absent(asset, price),
            Err(error) => {
                tracing::warn!(
                    %asset,
                    %feed,
                    %error,
                    "Chainlink read failed, asset is unpriced unless a fallback applies"
                );
                0.0
            }
        }
    }

    async fn read_feed(&self, feed: Address) -> crate::Result<f64> {
        let FeedAnswer { answer, decimals } = self.reader.feed_answer(feed).await?;

        if answer.is_negative() {
            return Err(crate::Error::ChainlinkNegativePrice {
                feed,
                price: answer.to_string(),
            });
        }

        Ok(RawAmount::new(answer.into_raw(), decimals).to_f64()?)
    }
}

/// Prices a stablecoin-denominated asset at $1 when its oracle lookup came back empty.
pub fn stablecoin_fallback(symbol: &str, price: f64, stablecoin_symbols: &[String]) -> f64 {
    if price != 0.0 {
        return price;
    }

    let normalized = symbol.to_uppercase();
    if stablecoin_symbols
        .iter()
        .any(|ticker| normalized.contains(&ticker.to_uppercase()))
    {
        tracing::info!(symbol, "Applying $1.00 stablecoin fallback price");
        1.0
    } else {
        0.0
    }
}
