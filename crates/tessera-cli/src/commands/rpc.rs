//! Raw JSON-RPC requests

use clap::Args;

use super::connect;
use crate::args::parse_param;
use crate::{config::Config, output::Output, CliError};

/// Send one JSON-RPC request and print its result
#[derive(Debug, Args)]
pub struct RpcArgs {
    /// Method name, e.g. eth_blockNumber
    pub method: String,
    /// Parameters, each parsed as JSON or taken as a string
    #[arg(allow_hyphen_values = true)]
    pub params: Vec<String>,
}

impl RpcArgs {
    pub async fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let params = self.params.iter().map(|p| parse_param(p)).collect();
        let mut client = connect(config).await?;
        let result = client.call(&self.method, params).await?;
        client.close().await?;

        let text = match &result {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other)?,
        };
        Output::new(json)
            .field("method", &self.method)
            .field_value("result", result)
            .message(&text)
            .print();
        Ok(())
    }
}
