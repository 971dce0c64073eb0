use crate::error::{Error, Result};
use alloy_primitives::{Address, address};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "descriptors.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: Paths,
    /// Directory entries that are never treated as documents.
    pub ignored_entries: Vec<String>,
    pub defaults: Defaults,
    pub on_invalid: FailurePolicy,
    /// Pretty-print JSON output instead of the compact form.
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: Paths::default(),
            ignored_entries: vec![".DS_Store".into(), "_template.jsx".into()],
            defaults: Defaults::default(),
            on_invalid: FailurePolicy::Abort,
            pretty: false,
        }
    }
}

/// Inputs and outputs, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub metadata_dir: PathBuf,
    pub descriptors_dir: PathBuf,
    pub sources_dir: PathBuf,
    pub methods_file: PathBuf,
    pub libraries_file: PathBuf,
    pub database_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            metadata_dir: "solidity-metadata-files".into(),
            descriptors_dir: "contract-descriptor-files".into(),
            sources_dir: "contracts".into(),
            methods_file: "BlocklyLibrariesList.json".into(),
            libraries_file: "LibsAndContractsList.json".into(),
            database_file: "smartContractDescriptorsDB.json".into(),
        }
    }
}

impl Paths {
    /// Resolve every relative path against `root`.
    pub fn rooted_at(&self, root: &Path) -> Self {
        Self {
            metadata_dir: root.join(&self.metadata_dir),
            descriptors_dir: root.join(&self.descriptors_dir),
            sources_dir: root.join(&self.sources_dir),
            methods_file: root.join(&self.methods_file),
            libraries_file: root.join(&self.libraries_file),
            database_file: root.join(&self.database_file),
        }
    }
}

/// Values written into a descriptor when neither the compiler output nor a
/// legacy descriptor carries them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub author: String,
    pub contract_type: String,
    pub contract_version: String,
    pub descriptor_version: String,
    /// Placeholder deployment address. Real deployment data is merged in later.
    pub address: Address,
    pub network_id: u64,
    pub chain_id: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            author: "Unknown".into(),
            contract_type: "generic_contract".into(),
            contract_version: "1.0".into(),
            descriptor_version: "1.0".into(),
            address: address!("0x314159265dd8dbb310642f98f50c066173c1259b"),
            network_id: 1,
            chain_id: 1,
        }
    }
}

/// What to do with a document that parses but has the wrong shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole batch on the first bad document.
    #[default]
    Abort,
    /// Log the document, leave it out of the output and carry on.
    Skip,
}

impl Settings {
    /// Load settings from `explicit` (which must exist), or from
    /// [`DEFAULT_CONFIG_FILE`] under `workdir` when present, or fall back to
    /// the built-in defaults.
    pub fn load(workdir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => workdir.join(path),
            None => {
                let candidate = workdir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let contents = fs::read_to_string(&path).map_err(|source| Error::Config {
            path: path.clone(),
            message: source.to_string(),
        })?;
        let settings = Self::from_toml(&contents).map_err(|message| Error::Config {
            path: path.clone(),
            message,
        })?;
        tracing::debug!(config = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }
}
