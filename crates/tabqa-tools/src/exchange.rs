//! Currency pair-rate tool for converting compensation figures.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tabqa_core::{Error, Result};

use crate::schema::{ArgumentType, ToolSchema};
use crate::tool::{Tool, ToolInput, ToolOutput};

/// Fetches the live conversion rate between two currencies from an
/// exchange-rate API's pair endpoint.
pub struct ExchangeRateTool {
    client: Client,
    /// Base URL of the exchange-rate API, key included by the deployment.
    base_url: String,
}

/// Pair-endpoint response, reduced to the field the router needs.
#[derive(Debug, Deserialize)]
struct PairResponse {
    /// Units of the target currency per unit of the source currency.
    conversion_rate: f64,
}

impl ExchangeRateTool {
    /// Creates the tool against the given API base URL.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Tool for ExchangeRateTool {
    fn name(&self) -> &'static str {
        "get_exchange_rate"
    }

    fn description(&self) -> &'static str {
        "Gets the current exchange rate between two currencies. Use this to \
         convert compensation figures, reporting final amounts in the \
         requested currency."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description())
            .required(
                "from_currency",
                ArgumentType::String,
                "ISO code of the source currency, e.g. INR",
            )
            .required(
                "to_currency",
                ArgumentType::String,
                "ISO code of the target currency, e.g. USD",
            )
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let from = require_code(&input.params, "from_currency")?;
        let to = require_code(&input.params, "to_currency")?;

        let url = format!("{}/pair/{from}/{to}", self.base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(tool = self.name(), %status, "exchange-rate API error");
            return Err(Error::ExchangeService(format!(
                "lookup for {from}/{to} failed with status {status}"
            )));
        }

        let pair: PairResponse = response.json().await.map_err(|_| {
            Error::ExchangeService(format!("no conversion rate returned for {from}/{to}"))
        })?;

        Ok(ToolOutput::with_data(
            format!("1 {from} = {} {to}", pair.conversion_rate),
            json!({ "conversion_rate": pair.conversion_rate }),
        ))
    }
}

fn require_code<'input>(params: &'input Value, key: &str) -> Result<&'input str> {
    let code = params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument(format!("'{key}' must be a string")))?;
    if code.is_empty() || !code.chars().all(|chr| chr.is_ascii_alphabetic()) {
        return Err(Error::InvalidArgument(format!(
            "'{key}' must be an alphabetic currency code"
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_declares_both_codes() {
        let tool = ExchangeRateTool::new(Client::new(), "http://localhost:9/v6/key");
        let schema = tool.schema();
        assert_eq!(schema.arguments.len(), 2);
        assert!(schema.arguments.iter().all(|arg| arg.required));
    }

    #[tokio::test]
    async fn test_rejects_non_alphabetic_codes() {
        let tool = ExchangeRateTool::new(Client::new(), "http://localhost:9/v6/key");
        let error = tool
            .execute(ToolInput::new(json!({
                "from_currency": "IN R",
                "to_currency": "USD",
            })))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unreachable_api_surfaces_request_error() {
        // Port 9 (discard) refuses connections; no real network dependency.
        let tool = ExchangeRateTool::new(Client::new(), "http://127.0.0.1:9/v6/key");
        let error = tool
            .execute(ToolInput::new(json!({
                "from_currency": "INR",
                "to_currency": "USD",
            })))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Request(_)));
    }
}
