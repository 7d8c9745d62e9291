//! Contract deployment

use std::path::{Path, PathBuf};

use clap::Args;
use tessera_sdk::types::format_address;
use tessera_sdk::CallOrchestrator;
use tracing::{debug, info};

use super::{connect, record_path};
use crate::compiler::ExternalCompiler;
use crate::record::{BuildRecord, ContractRecord, RECORD_DIR};
use crate::{config::Config, output::Output, CliError};

/// Compile a contract, deploy it and add it to the build record
#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Contract source file
    pub source: PathBuf,
    /// Name in the build record, defaults to the file stem
    #[arg(long)]
    pub name: Option<String>,
    /// Compiler executable, overrides the configured one
    #[arg(long)]
    pub compiler: Option<String>,
}

impl DeployArgs {
    pub async fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let name = match self.name {
            Some(name) => name,
            None => self
                .source
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    CliError::InvalidInput(format!("cannot derive a name from {}", self.source.display()))
                })?,
        };
        let path = record_path()?;
        let mut record = BuildRecord::load(&path)?;

        // Imports resolve against the record, so the compiler sees a generated source
        let source = std::fs::read_to_string(&self.source)?;
        let compile_path = match record.resolve_imports(&source)? {
            Some(resolved) => {
                let file_name = self.source.file_name().unwrap_or(self.source.as_os_str());
                let generated = generated_sources_dir(&path).join(file_name);
                if let Some(parent) = generated.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&generated, resolved)?;
                debug!(source = %generated.display(), "Resolved imports");
                generated
            }
            None => self.source.clone(),
        };

        let compiler = ExternalCompiler::new(self.compiler.as_deref().unwrap_or(&config.compiler));
        let compiled = compiler.build(&compile_path)?;
        info!(contract = %name, bytes = compiled.bytecode.len(), "Compiled");

        let mut orchestrator = CallOrchestrator::new(connect(config).await?, config.orchestrator_config()?);
        let deployment = orchestrator.deploy(&compiled.bytecode).await?;
        orchestrator.into_client().close().await?;

        let address = format_address(&deployment.address);
        record.insert(
            name.clone(),
            ContractRecord::new(&name, address.clone(), &compiled.signature, compiled.full_signature),
        );
        record.save(&path)?;

        Output::new(json)
            .field("contract", &name)
            .field("address", &address)
            .field("tx_hash", &format!("{:?}", deployment.tx_hash))
            .field("record", &path.display().to_string())
            .message(&format!("Deployed {} at {}", name, address))
            .print();
        Ok(())
    }
}

/// Import-resolved sources live next to the build record
fn generated_sources_dir(record_path: &Path) -> PathBuf {
    record_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(RECORD_DIR))
        .join("sources")
}
