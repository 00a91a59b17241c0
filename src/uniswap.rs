use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ AppError, Result };

/// Read-side price source for the evaluator. One implementation speaks to
/// the Uniswap v2 subgraph; tests swap in scripted fakes.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current ETH price in USD, shared by every pair in a pass.
    async fn eth_price(&self) -> Result<f64>;

    /// Pair price denominated in ETH.
    async fn derived_eth(&self, pair_address: &str) -> Result<f64>;
}

// ── Subgraph response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BundlesResponse {
    data: BundlesData,
}

#[derive(Debug, Deserialize)]
struct BundlesData {
    bundles: Vec<Bundle>,
}

#[derive(Debug, Deserialize)]
struct Bundle {
    #[serde(rename = "ethPrice")]
    eth_price: String,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    data: TokensData,
}

#[derive(Debug, Deserialize)]
struct TokensData {
    tokens: Vec<Token>,
}

#[derive(Debug, Deserialize)]
struct Token {
    #[serde(rename = "derivedETH")]
    derived_eth: String,
}

// ── Query documents ─────────────────────────────────────────────────

fn bundle_query() -> serde_json::Value {
    json!({
        "query": r#"query bundles { bundles(where: { id: "1" }) { ethPrice } }"#
    })
}

fn token_query(pair_address: &str) -> serde_json::Value {
    json!({
        "query": format!(
            r#"query tokens {{ tokens(where: {{ id: "{}" }}) {{ id name symbol derivedETH totalLiquidity }} }}"#,
            pair_address
        )
    })
}

// ── Implementation ──────────────────────────────────────────────────

pub struct UniswapClient {
    client: reqwest::Client,
    graph_url: String,
}

impl UniswapClient {
    pub fn new(graph_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
            graph_url,
        }
    }

    async fn query(&self, body: &serde_json::Value) -> Result<String> {
        let response = self.client
            .post(&self.graph_url)
            .json(body)
            .send().await
            .map_err(|e| AppError::Oracle(format!("subgraph request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Oracle(format!("subgraph returned {}", status)));
        }

        response
            .text().await
            .map_err(|e| AppError::Oracle(format!("failed to read subgraph response: {}", e)))
    }
}

#[async_trait]
impl PriceOracle for UniswapClient {
    async fn eth_price(&self) -> Result<f64> {
        let body = self.query(&bundle_query()).await?;
        parse_eth_price(&body)
    }

    async fn derived_eth(&self, pair_address: &str) -> Result<f64> {
        let body = self.query(&token_query(pair_address)).await?;
        parse_derived_eth(&body)
    }
}

fn parse_eth_price(body: &str) -> Result<f64> {
    let response: BundlesResponse = serde_json
        ::from_str(body)
        .map_err(|e| AppError::Oracle(format!("malformed bundles response: {}", e)))?;

    let bundle = response.data.bundles
        .first()
        .ok_or_else(|| AppError::Oracle("no bundle in subgraph response".to_string()))?;

    bundle.eth_price
        .parse::<f64>()
        .map_err(|_| AppError::Oracle(format!("ethPrice is not a number: {}", bundle.eth_price)))
}

fn parse_derived_eth(body: &str) -> Result<f64> {
    let response: TokensResponse = serde_json
        ::from_str(body)
        .map_err(|e| AppError::Oracle(format!("malformed tokens response: {}", e)))?;

    let token = response.data.tokens
        .first()
        .ok_or_else(|| AppError::Oracle("no token in subgraph response".to_string()))?;

    token.derived_eth
        .parse::<f64>()
        .map_err(|_| AppError::Oracle(format!("derivedETH is not a number: {}", token.derived_eth)))
}
