use crate::descriptor::ContractDescriptor;
use serde::Serialize;
use std::collections::BTreeMap;

/// Contract name -> callable member names, in ABI order.
pub type MethodIndex = BTreeMap<String, Vec<String>>;

/// One entry of the standalone-mode descriptor database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandaloneRecord {
    pub name: String,
    pub contract_type: String,
    #[serde(rename = "JSON")]
    pub json: ContractDescriptor,
    /// Contract source text, embedded verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A document left out of a run under the skip policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub id: String,
    pub reason: String,
}

/// Result of one batch job.
#[derive(Debug)]
pub struct RunReport<T> {
    pub output: T,
    pub skipped: Vec<Skipped>,
}
