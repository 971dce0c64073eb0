//! The canonical contract descriptor and adapters for the legacy layouts.
//!
//! Descriptors found on disk come in three layouts:
//!
//! * **flat**: `{contract: {name, abi, ...}, deployment_information, compiler, descriptor}`.
//!   This is the canonical layout, written by the normalizer.
//! * **nested**: `{contract: {descriptor: {name, abi, ...}, endpoint, dev}}`.
//! * **bare**: `{abi, ...}`, a library descriptor with only top-level fields.
//!
//! [`ContractDescriptor::from_document`] recognises the layout once; everything
//! downstream works on [`ContractDescriptor`] alone.

use crate::abi;
use crate::error::SchemaViolation;
use crate::settings::Defaults;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    pub contract: ContractInfo,
    pub deployment_information: DeploymentInformation,
    pub compiler: CompilerInfo,
    pub descriptor: DescriptorInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub name: String,
    pub author: String,
    pub language: String,
    pub contract_type: String,
    pub contract_version: String,
    pub abi: Vec<Value>,
    pub userdoc: Value,
    pub devdoc: Value,
    /// Kept for provenance only.
    pub sources: Value,
    pub libraries: Value,
}

/// Where the contract is deployed. Placeholder values until a caller merges
/// in real deployment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInformation {
    pub address: Address,
    #[serde(rename = "networkID")]
    pub network_id: u64,
    #[serde(rename = "chainID")]
    pub chain_id: u64,
}

impl DeploymentInformation {
    pub fn placeholder(defaults: &Defaults) -> Self {
        Self {
            address: defaults.address,
            network_id: defaults.network_id,
            chain_id: defaults.chain_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerInfo {
    pub version: String,
    #[serde(rename = "evmVersion")]
    pub evm_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorInfo {
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Flat,
    Nested,
    Bare,
}

impl Layout {
    pub fn detect(doc: &Value) -> Option<Self> {
        if doc.pointer("/contract/descriptor").is_some_and(Value::is_object) {
            Some(Self::Nested)
        } else if doc.get("contract").is_some_and(Value::is_object) {
            Some(Self::Flat)
        } else if doc.get("abi").is_some() {
            Some(Self::Bare)
        } else {
            None
        }
    }
}

impl ContractDescriptor {
    /// Project a stored document of any known layout into the canonical form.
    ///
    /// `name` is the logical name of the document and is used when the
    /// document does not carry a name itself. Fields absent from the
    /// document are taken from `defaults`.
    pub fn from_document(
        doc: &Value,
        name: &str,
        defaults: &Defaults,
    ) -> Result<Self, SchemaViolation> {
        let (_, abi) = abi::locate(doc)?;
        let abi = abi.to_vec();
        match Layout::detect(doc).ok_or(SchemaViolation::MissingAbi)? {
            Layout::Flat => from_flat(doc, abi, name, defaults),
            Layout::Nested => from_nested(doc, abi, name, defaults),
            Layout::Bare => from_bare(doc, abi, name, defaults),
        }
    }

    pub fn name(&self) -> &str {
        &self.contract.name
    }

    pub fn is_library(&self) -> bool {
        self.contract.contract_type == "library"
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

fn from_flat(
    doc: &Value,
    abi: Vec<Value>,
    name: &str,
    defaults: &Defaults,
) -> Result<ContractDescriptor, SchemaViolation> {
    let f = Fields::new(doc);
    Ok(ContractDescriptor {
        contract: ContractInfo {
            name: f.string("/contract/name")?.unwrap_or_else(|| name.to_owned()),
            author: f.string_or("/contract/author", &defaults.author)?,
            language: f.string_or("/contract/language", "")?,
            contract_type: f.string_or("/contract/contract_type", &defaults.contract_type)?,
            contract_version: f
                .string_or("/contract/contract_version", &defaults.contract_version)?,
            abi,
            userdoc: f.object("/contract/userdoc"),
            devdoc: f.object("/contract/devdoc"),
            sources: f.object("/contract/sources"),
            libraries: f.object("/contract/libraries"),
        },
        deployment_information: f.deployment("/deployment_information", defaults)?,
        compiler: CompilerInfo {
            version: f.string_or("/compiler/version", "")?,
            evm_version: f.string_or("/compiler/evmVersion", "")?,
        },
        descriptor: DescriptorInfo {
            version: f.string_or("/descriptor/version", &defaults.descriptor_version)?,
        },
    })
}

fn from_nested(
    doc: &Value,
    abi: Vec<Value>,
    name: &str,
    defaults: &Defaults,
) -> Result<ContractDescriptor, SchemaViolation> {
    let f = Fields::new(doc);
    Ok(ContractDescriptor {
        contract: ContractInfo {
            name: f
                .string("/contract/descriptor/name")?
                .unwrap_or_else(|| name.to_owned()),
            author: f.string_or("/contract/descriptor/author", &defaults.author)?,
            language: f.string_or("/contract/descriptor/language", "")?,
            contract_type: f
                .string_or("/contract/descriptor/contract_type", &defaults.contract_type)?,
            contract_version: f.string_or(
                "/contract/descriptor/contract_version",
                &defaults.contract_version,
            )?,
            abi,
            userdoc: f.object("/contract/descriptor/userdoc"),
            devdoc: f.object("/contract/dev/devdoc"),
            sources: f.object("/contract/dev/sources"),
            libraries: f.object("/contract/dev/libraries"),
        },
        deployment_information: f.deployment("/contract/endpoint", defaults)?,
        compiler: CompilerInfo {
            version: f.string_or("/contract/dev/compiler/version", "")?,
            evm_version: f.string_or("/contract/dev/compiler/evmVersion", "")?,
        },
        descriptor: DescriptorInfo {
            version: f.string_or(
                "/contract/descriptor/descriptor_version",
                &defaults.descriptor_version,
            )?,
        },
    })
}

fn from_bare(
    doc: &Value,
    abi: Vec<Value>,
    name: &str,
    defaults: &Defaults,
) -> Result<ContractDescriptor, SchemaViolation> {
    let f = Fields::new(doc);
    Ok(ContractDescriptor {
        contract: ContractInfo {
            name: f.string("/name")?.unwrap_or_else(|| name.to_owned()),
            author: f.string_or("/author", &defaults.author)?,
            language: f.string_or("/language", "")?,
            contract_type: f.string_or("/contract_type", &defaults.contract_type)?,
            contract_version: f.string_or("/contract_version", &defaults.contract_version)?,
            abi,
            userdoc: f.object("/userdoc"),
            devdoc: f.object("/devdoc"),
            sources: f.object("/sources"),
            libraries: f.object("/libraries"),
        },
        deployment_information: DeploymentInformation::placeholder(defaults),
        compiler: CompilerInfo {
            version: f.string_or("/compiler/version", "")?,
            evm_version: f.string_or("/compiler/evmVersion", "")?,
        },
        descriptor: DescriptorInfo {
            version: f.string_or("/descriptor_version", &defaults.descriptor_version)?,
        },
    })
}

/// Typed reads from a JSON document addressed by JSON pointer.
struct Fields<'a> {
    doc: &'a Value,
}

impl<'a> Fields<'a> {
    fn new(doc: &'a Value) -> Self {
        Self { doc }
    }

    fn string(&self, pointer: &str) -> Result<Option<String>, SchemaViolation> {
        match self.doc.pointer(pointer) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(SchemaViolation::invalid(abi::dotted(pointer), "a string")),
        }
    }

    fn string_or(&self, pointer: &str, default: &str) -> Result<String, SchemaViolation> {
        Ok(self.string(pointer)?.unwrap_or_else(|| default.to_owned()))
    }

    /// Free-form documentation objects; anything absent becomes `{}`.
    fn object(&self, pointer: &str) -> Value {
        match self.doc.pointer(pointer) {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value.clone(),
        }
    }

    fn id(&self, pointer: &str, default: u64) -> Result<u64, SchemaViolation> {
        match self.doc.pointer(pointer) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| SchemaViolation::invalid(abi::dotted(pointer), "an unsigned integer")),
            Some(Value::String(s)) => s
                .parse()
                .map_err(|_| SchemaViolation::invalid(abi::dotted(pointer), "an unsigned integer")),
            Some(_) => Err(SchemaViolation::invalid(
                abi::dotted(pointer),
                "an unsigned integer",
            )),
        }
    }

    fn deployment(
        &self,
        base: &str,
        defaults: &Defaults,
    ) -> Result<DeploymentInformation, SchemaViolation> {
        let address_pointer = format!("{base}/address");
        let address = match self.string(&address_pointer)? {
            Some(s) => Address::from_str(&s).map_err(|_| {
                SchemaViolation::invalid(abi::dotted(&address_pointer), "a 20-byte hex address")
            })?,
            None => defaults.address,
        };
        Ok(DeploymentInformation {
            address,
            network_id: self.id(&format!("{base}/networkID"), defaults.network_id)?,
            chain_id: self.id(&format!("{base}/chainID"), defaults.chain_id)?,
        })
    }
}
