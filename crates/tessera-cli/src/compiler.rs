//! External contract compiler
//!
//! The compiler is a separate executable driven through three subcommands:
//! `compile <source>` prints the bytecode as hex, `mk_signature <source>`
//! prints the extern declaration other contracts import, and
//! `mk_full_signature <source>` prints the signature document as JSON.

use std::path::Path;
use std::process::Command;

use tessera_sdk::contract::SignatureEntry;
use tracing::debug;

use crate::CliError;

/// Compiler output for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledContract {
    /// Deployable bytecode
    pub bytecode: Vec<u8>,
    /// Extern declaration, naming the contract `main`
    pub signature: String,
    /// Full signature document
    pub full_signature: Vec<SignatureEntry>,
}

/// Compiler invoked as a child process
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
    program: String,
}

impl ExternalCompiler {
    /// Compiler at `program`, looked up on `PATH` when not a path
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Bytecode and signature document for `source`
    pub fn build(&self, source: &Path) -> Result<CompiledContract, CliError> {
        let code = self.run("compile", source)?;
        let digits = code.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let bytecode = hex::decode(digits)
            .map_err(|e| CliError::Compiler(format!("bytecode is not hex: {}", e)))?;
        if bytecode.is_empty() {
            return Err(CliError::Compiler(format!("{} produced no bytecode", source.display())));
        }

        let signature = self.run("mk_signature", source)?.trim().to_string();
        let document = self.run("mk_full_signature", source)?;
        let full_signature = serde_json::from_str(document.trim())
            .map_err(|e| CliError::Compiler(format!("bad signature document: {}", e)))?;

        Ok(CompiledContract {
            bytecode,
            signature,
            full_signature,
        })
    }

    fn run(&self, subcommand: &str, source: &Path) -> Result<String, CliError> {
        debug!(program = %self.program, subcommand, source = %source.display(), "Running compiler");
        let output = Command::new(&self.program)
            .arg(subcommand)
            .arg(source)
            .output()
            .map_err(|e| CliError::Compiler(format!("cannot run '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CliError::Compiler(format!(
                "{} {} failed ({}): {}",
                self.program,
                subcommand,
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| CliError::Compiler(format!("output is not UTF-8: {}", e)))
    }
}
