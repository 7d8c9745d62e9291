//! Build record of deployed contracts
//!
//! Stored as `.tessera/build.json` in the project directory. Each entry maps
//! a contract's short name to where it was deployed and how to call it.
//! Sources refer to recorded contracts with `import <name> as <Alias>`,
//! which [`BuildRecord::resolve_imports`] expands before compiling.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_sdk::contract::SignatureEntry;
use tessera_sdk::types::parse_address;
use tessera_sdk::Contract;

use crate::CliError;

/// Directory holding the record, relative to the project root
pub const RECORD_DIR: &str = ".tessera";

/// Record file name
pub const RECORD_FILE: &str = "build.json";

/// One deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Deployed address, `0x`-prefixed
    pub address: String,
    /// Extern declaration under the contract's short name
    #[serde(default)]
    pub signature: String,
    /// Full signature document as produced by the compiler
    #[serde(default)]
    pub full_signature: Vec<SignatureEntry>,
}

fn is_import(line: &str) -> bool {
    line.starts_with("import ")
}

impl ContractRecord {
    /// Record for contract `name`; the compiler's extern declaration names
    /// every contract `main`, so the first occurrence is renamed
    pub fn new(name: &str, address: String, signature: &str, full_signature: Vec<SignatureEntry>) -> Self {
        Self {
            address,
            signature: signature.trim().replacen("main", name, 1),
            full_signature,
        }
    }

    /// Bound contract handle for calls and transactions
    pub fn contract(&self) -> Result<Contract, CliError> {
        let address = parse_address(&self.address)?;
        Ok(Contract::from_entries(Some(address), &self.full_signature)?)
    }
}

/// Contract short name to deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildRecord {
    contracts: BTreeMap<String, ContractRecord>,
}

impl BuildRecord {
    /// Record path for `start`: the nearest ancestor already holding a
    /// record, otherwise a new one under `start` itself
    pub fn locate(start: &Path) -> PathBuf {
        start
            .ancestors()
            .map(|dir| dir.join(RECORD_DIR).join(RECORD_FILE))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| start.join(RECORD_DIR).join(RECORD_FILE))
    }

    /// Load the record at `path`; a missing file is an empty record
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::BuildRecord(format!("{}: {}", path.display(), e)))
    }

    /// Write the record to `path`, creating its directory
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Add or replace an entry
    pub fn insert(&mut self, name: impl Into<String>, record: ContractRecord) {
        self.contracts.insert(name.into(), record);
    }

    /// Look up a contract by short name
    pub fn get(&self, name: &str) -> Result<&ContractRecord, CliError> {
        self.contracts
            .get(name)
            .ok_or_else(|| CliError::BuildRecord(format!("no contract named '{}' has been deployed", name)))
    }

    /// Expand `import <name> as <Alias>` lines into the recorded extern
    /// declaration followed by `<Alias> = <address>`.
    ///
    /// Returns `None` when the source imports nothing.
    pub fn resolve_imports(&self, source: &str) -> Result<Option<String>, CliError> {
        if !source.lines().any(is_import) {
            return Ok(None);
        }

        let mut lines = Vec::new();
        for line in source.lines() {
            if !is_import(line) {
                lines.push(line.trim_end().to_string());
                continue;
            }
            let words: Vec<&str> = line.split_whitespace().collect();
            let (name, alias) = match words.as_slice() {
                ["import", name, "as", alias] => (*name, *alias),
                _ => {
                    return Err(CliError::InvalidInput(format!(
                        "expected 'import <name> as <Alias>', got '{}'",
                        line.trim()
                    )))
                }
            };
            let imported = self.get(name)?;
            if imported.signature.is_empty() {
                return Err(CliError::BuildRecord(format!("'{}' has no recorded signature", name)));
            }
            lines.push(imported.signature.clone());
            lines.push(format!("{} = {}", alias, imported.address));
        }
        Ok(Some(lines.join("\n")))
    }

    /// Recorded short names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"[
        {"name": "set(uint256)", "type": "function", "inputs": [{"name": "v", "type": "uint256"}]},
        {"name": "Changed(uint256)", "type": "event"}
    ]"#;

    const ADDRESS: &str = "0x407d73d8a49eeb85d32cf465507dd71d507100c1";

    fn entry() -> ContractRecord {
        let doc: Vec<SignatureEntry> = serde_json::from_str(DOCUMENT).unwrap();
        ContractRecord::new("counter", ADDRESS.to_string(), "extern main: [set:[int256]:_]\n", doc)
    }

    #[test]
    fn test_signature_renamed_to_short_name() {
        assert_eq!(entry().signature, "extern counter: [set:[int256]:_]");
    }

    #[test]
    fn test_resolve_imports() {
        let mut record = BuildRecord::default();
        record.insert("counter", entry());

        let source = "import counter as C\ndef bump():\n    C.set(1)\n";
        let resolved = record.resolve_imports(source).unwrap().unwrap();
        assert_eq!(
            resolved,
            format!("extern counter: [set:[int256]:_]\nC = {}\ndef bump():\n    C.set(1)", ADDRESS)
        );
    }

    #[test]
    fn test_source_without_imports_is_untouched() {
        let record = BuildRecord::default();
        assert!(record.resolve_imports("def get():\n    return(7)\n").unwrap().is_none());
    }

    #[test]
    fn test_import_errors() {
        let mut record = BuildRecord::default();
        assert!(matches!(
            record.resolve_imports("import ghost as G"),
            Err(CliError::BuildRecord(_))
        ));

        record.insert("counter", entry());
        assert!(matches!(
            record.resolve_imports("import counter"),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = BuildRecord::locate(dir.path());
        assert_eq!(path, dir.path().join(".tessera").join("build.json"));

        let mut record = BuildRecord::default();
        record.insert("counter", entry());
        record.save(&path).unwrap();

        let loaded = BuildRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["counter"]);
    }

    #[test]
    fn test_locate_walks_up_to_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let root_record = dir.path().join(".tessera").join("build.json");
        BuildRecord::default().save(&root_record).unwrap();

        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(BuildRecord::locate(&nested), root_record);
    }

    #[test]
    fn test_unknown_name_is_error() {
        let record = BuildRecord::default();
        assert!(matches!(record.get("missing"), Err(CliError::BuildRecord(_))));
    }

    #[test]
    fn test_contract_binds_address() {
        let contract = entry().contract().unwrap();
        assert!(contract.address().is_some());
        assert_eq!(contract.functions().len(), 1);
    }

    #[test]
    fn test_corrupt_record_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(BuildRecord::load(&path), Err(CliError::BuildRecord(_))));
    }
}
