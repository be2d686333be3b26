use std::sync::Arc;

use async_trait::async_trait;
use l2_sdk::codec::LegacyRecord;
use l2_sdk::{Address, Error, HttpTransport, Network, Result, Transport, Utxo, UtxoSource};
use serde_json::Value as Json;

use crate::config::L1Config;

/// Blockfrost's maximum page size.
const PAGE_SIZE: usize = 100;
/// Stop paging after this many pages.
const MAX_PAGES: usize = 1_000;

/// [`UtxoSource`] backed by a Blockfrost-compatible Layer-1 REST API.
pub struct BlockfrostSource {
    transport: Arc<dyn Transport>,
}

impl BlockfrostSource {
    /// Build an HTTP client for `network`, authenticated with `config.project_id`.
    pub fn new(config: &L1Config, network: Network) -> Result<Self> {
        let transport = HttpTransport::new(&config.transport_config(network))?
            .with_header("project_id", &config.project_id)?;
        log::debug!("l1: using {}", transport.base_url());
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// One page of raw records. `None` when the address is unknown.
    async fn page(&self, address: &Address, page: usize) -> Result<Option<Vec<Json>>> {
        let path = format!("addresses/{address}/utxos?page={page}&count={PAGE_SIZE}");
        let body = match self.transport.get(&path).await {
            Ok(payload) => payload.into_json()?,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        match body {
            Json::Array(records) => Ok(Some(records)),
            other => Err(Error::InvalidResponse(format!(
                "l1 utxo page is not a list: {other}"
            ))),
        }
    }
}

#[async_trait]
impl UtxoSource for BlockfrostSource {
    async fn utxos_for_address(&self, address: &Address) -> Result<Vec<Utxo>> {
        let mut utxos = Vec::new();
        let mut seen = 0;

        for page in 1..=MAX_PAGES {
            let Some(records) = self.page(address, page).await? else {
                if page == 1 {
                    log::debug!("l1: {address} has no history");
                }
                break;
            };
            seen += records.len();

            for raw in &records {
                match LegacyRecord::parse(raw) {
                    Ok(record) => utxos.push(record.into_utxo()),
                    Err(e) => log::warn!("l1: dropping undecodable record {raw}: {e}"),
                }
            }

            if records.len() < PAGE_SIZE {
                break;
            }
            if page == MAX_PAGES {
                log::warn!("l1: {address} still has utxos after {MAX_PAGES} pages, truncating");
            }
        }

        if seen > 0 && utxos.is_empty() {
            return Err(Error::InvalidResponse(format!(
                "none of {seen} l1 records for {address} could be decoded"
            )));
        }
        log::debug!("l1: {} utxos for {address}", utxos.len());
        Ok(utxos)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use l2_sdk::Payload;
    use l2_sdk::testing::legacy_json;
    use serde_json::json;

    use super::*;

    /// Serves a fixed answer per page number and records requested paths.
    #[derive(Default)]
    struct Pages {
        /// Page number to body, or to an HTTP status.
        pages: HashMap<usize, std::result::Result<Payload, u16>>,
        paths: Mutex<Vec<String>>,
    }

    impl Pages {
        fn with(mut self, page: usize, answer: std::result::Result<Payload, u16>) -> Self {
            self.pages.insert(page, answer);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.paths.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Pages {
        async fn get(&self, path: &str) -> Result<Payload> {
            self.paths.lock().unwrap().push(path.to_string());
            let page: usize = path
                .split("page=")
                .nth(1)
                .and_then(|rest| rest.split('&').next())
                .and_then(|n| n.parse().ok())
                .unwrap();
            match self.pages.get(&page) {
                Some(Ok(payload)) => Ok(payload.clone()),
                Some(Err(status)) => Err(Error::Transport {
                    status: *status,
                    message: format!("HTTP {status}"),
                }),
                None => Ok(Payload::Json(json!([]))),
            }
        }

        async fn post(&self, _path: &str, _body: Option<&Json>) -> Result<Payload> {
            unreachable!("l1 source never posts")
        }
    }

    fn full_page(tag: u8) -> Payload {
        let records: Vec<Json> = (0..PAGE_SIZE as u32)
            .map(|i| legacy_json(tag, i, "addrP", 1_000 + u64::from(i)))
            .collect();
        Payload::Json(Json::Array(records))
    }

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[tokio::test]
    async fn pages_until_a_short_page() {
        let pages = Arc::new(
            Pages::default()
                .with(1, Ok(full_page(1)))
                .with(2, Ok(Payload::Json(json!([legacy_json(2, 0, "addrP", 5)])))),
        );
        let source = BlockfrostSource::with_transport(pages.clone());

        let utxos = source.utxos_for_address(&addr("addrP")).await.unwrap();
        assert_eq!(utxos.len(), PAGE_SIZE + 1);
        assert_eq!(
            pages.requested(),
            [
                "addresses/addrP/utxos?page=1&count=100",
                "addresses/addrP/utxos?page=2&count=100",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_address_is_empty() {
        let pages = Arc::new(Pages::default().with(1, Err(404)));
        let utxos = BlockfrostSource::with_transport(pages)
            .utxos_for_address(&addr("addrNew"))
            .await
            .unwrap();
        assert!(utxos.is_empty());
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let pages = Arc::new(Pages::default().with(1, Err(503)));
        let err = BlockfrostSource::with_transport(pages)
            .utxos_for_address(&addr("addrP"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn non_list_page_is_invalid() {
        let pages = Arc::new(Pages::default().with(1, Ok(Payload::Json(json!({"error": "x"})))));
        let err = BlockfrostSource::with_transport(pages)
            .utxos_for_address(&addr("addrP"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn undecodable_records_are_dropped() {
        let pages = Arc::new(Pages::default().with(
            1,
            Ok(Payload::Json(json!([
                {"tx_hash": "zz"},
                legacy_json(7, 1, "addrP", 9),
            ]))),
        ));
        let utxos = BlockfrostSource::with_transport(pages)
            .utxos_for_address(&addr("addrP"))
            .await
            .unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].output.value.coins, 9);
    }
}
