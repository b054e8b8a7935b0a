use crate::models::{MarketResponse, Page, PositionResponse, VaultResponse};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

const PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct IndexerClient {
    client: Client,
    base_url: String,
    chain_id: u64,
}

impl IndexerClient {
    pub fn new(base_url: &str, chain_id: u64) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            chain_id,
        }
    }

    pub async fn fetch_markets(&self) -> Result<Vec<MarketResponse>> {
        self.fetch_paged("markets").await
    }

    pub async fn fetch_vaults(&self) -> Result<Vec<VaultResponse>> {
        self.fetch_paged("vaults").await
    }

    pub async fn fetch_positions(&self, wallet: &str) -> Result<Vec<PositionResponse>> {
        let path = format!("users/{}/positions", urlencoding::encode(wallet));
        self.fetch_paged(&path).await
    }

    async fn fetch_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        let mut all_items = Vec::new();
        let mut skip = 0usize;
        loop {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("chainId", self.chain_id.to_string()),
                    ("first", PAGE_SIZE.to_string()),
                    ("skip", skip.to_string()),
                ])
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", path))?;
            let status = response.status();
            let text = response.text().await.context("Failed to read response body")?;
            if !status.is_success() {
                return Err(anyhow::anyhow!("Indexer error: {} - {}", status, text));
            }

            let page = parse_page::<T>(&text)?;
            let received = page.items.len();
            all_items.extend(page.items);
            tracing::debug!(path, skip, received, "fetched page");
            if !page.page_info.has_more || received == 0 {
                break;
            }
            skip += received;
        }
        Ok(all_items)
    }
}

fn parse_page<T: DeserializeOwned>(text: &str) -> Result<Page<T>> {
    serde_json::from_str(text).context(format!(
        "Parse error. Response: {}",
        text.chars().take(200).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paged_positions() {
        let body = r#"{
            "items": [
                { "marketKey": "0x01", "supplyAssets": "10", "borrowAssets": "0", "collateral": "5" }
            ],
            "pageInfo": { "hasMore": true }
        }"#;
        let page = parse_page::<PositionResponse>(body).unwrap();
        assert!(page.page_info.has_more);
        assert_eq!(page.items[0].market_key, "0x01");
    }

    #[test]
    fn missing_page_info_means_last_page() {
        let page = parse_page::<VaultResponse>(r#"{ "items": [] }"#).unwrap();
        assert!(!page.page_info.has_more);
    }

    #[test]
    fn parse_errors_quote_the_body() {
        let err = parse_page::<MarketResponse>("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("<html>bad gateway"));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = IndexerClient::new("https://indexer.example/api/", 8453);
        assert_eq!(client.base_url, "https://indexer.example/api");
        assert_eq!(client.chain_id, 8453);
    }
}
