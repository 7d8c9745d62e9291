//! Read-only contract calls

use clap::Args;
use serde_json::Value;
use tessera_sdk::CallOrchestrator;

use super::{connect, plain_lines, record_path};
use crate::args::{parse_args, token_to_json};
use crate::record::BuildRecord;
use crate::{config::Config, output::Output, CliError};

/// Call a deployed contract without sending a transaction
#[derive(Debug, Args)]
pub struct CallArgs {
    /// Contract name in the build record
    pub contract: String,
    /// Function name
    pub function: String,
    /// Function arguments
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl CallArgs {
    pub async fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let tokens = parse_args(&self.args)?;
        let record = BuildRecord::load(&record_path()?)?;
        let contract = record.get(&self.contract)?.contract()?;
        let signature = contract.resolve(&self.function, &tokens)?.signature.clone();

        let mut orchestrator = CallOrchestrator::new(connect(config).await?, config.orchestrator_config()?);
        let output = orchestrator.call(&contract, &self.function, &tokens).await?;
        orchestrator.into_client().close().await?;

        let values: Vec<Value> = output.iter().map(token_to_json).collect();
        Output::new(json)
            .field("contract", &self.contract)
            .field("function", &signature)
            .field_value("result", Value::Array(values.clone()))
            .message(&plain_lines(&values))
            .print();
        Ok(())
    }
}
