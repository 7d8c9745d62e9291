//! Contract transactions

use clap::Args;
use tessera_sdk::CallOrchestrator;

use super::{connect, record_path};
use crate::args::parse_args;
use crate::record::BuildRecord;
use crate::{config::Config, output::Output, CliError};

/// Call a contract function in a transaction and wait for it to be mined
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Contract name in the build record
    pub contract: String,
    /// Function name
    pub function: String,
    /// Function arguments
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl SendArgs {
    pub async fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let tokens = parse_args(&self.args)?;
        let record = BuildRecord::load(&record_path()?)?;
        let contract = record.get(&self.contract)?.contract()?;
        let signature = contract.resolve(&self.function, &tokens)?.signature.clone();

        let mut orchestrator = CallOrchestrator::new(connect(config).await?, config.orchestrator_config()?);
        let receipt = orchestrator.transact(&contract, &self.function, &tokens).await?;
        orchestrator.into_client().close().await?;

        let tx_hash = format!("{:?}", receipt.transaction_hash);
        let mut out = Output::new(json)
            .field("contract", &self.contract)
            .field("function", &signature)
            .field("tx_hash", &tx_hash);
        if let Some(block) = receipt.block_number {
            out = out.field("block_number", &block.to_string());
        }
        if let Some(status) = receipt.status {
            out = out.field_u64("status", status.low_u64());
        }
        if let Some(gas) = receipt.gas_used {
            out = out.field("gas_used", &gas.to_string());
        }
        out.message(&format!("Transaction {} mined\n  {}", tx_hash, signature))
            .print();
        Ok(())
    }
}
