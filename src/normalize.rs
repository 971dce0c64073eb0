use crate::abi::dotted;
use crate::descriptor::{
    CompilerInfo, ContractDescriptor, ContractInfo, DeploymentInformation, DescriptorInfo,
};
use crate::error::SchemaViolation;
use crate::settings::Defaults;
use serde_json::{Map, Value};

/// Build a descriptor from solc metadata (`--metadata` / standard JSON output).
///
/// Either every required field is present and a complete descriptor is
/// returned, or the first missing one is reported. Required fields, in the
/// order they are checked: `language`, `compiler.version`,
/// `settings.evmVersion`, `output.abi`, `settings.compilationTarget`.
///
/// Deployment information is never derived from the metadata; it is filled
/// with the placeholders from `defaults`.
pub fn normalize(
    metadata: &Value,
    defaults: &Defaults,
) -> Result<ContractDescriptor, SchemaViolation> {
    let language = required_str(metadata, "/language")?;
    let compiler_version = required_str(metadata, "/compiler/version")?;
    let evm_version = required_str(metadata, "/settings/evmVersion")?;
    let abi = required(metadata, "/output/abi")?
        .as_array()
        .ok_or_else(|| SchemaViolation::invalid("output.abi", "an array"))?;
    let name = compilation_target(metadata)?;

    let devdoc = optional(metadata, "/output/devdoc");
    let author = devdoc
        .get("author")
        .and_then(Value::as_str)
        .unwrap_or(&defaults.author)
        .to_owned();

    Ok(ContractDescriptor {
        contract: ContractInfo {
            name,
            author,
            language: language.to_owned(),
            contract_type: defaults.contract_type.clone(),
            contract_version: defaults.contract_version.clone(),
            abi: abi.clone(),
            userdoc: optional(metadata, "/output/userdoc"),
            devdoc,
            sources: optional(metadata, "/sources"),
            libraries: optional(metadata, "/settings/libraries"),
        },
        deployment_information: DeploymentInformation::placeholder(defaults),
        compiler: CompilerInfo {
            version: compiler_version.to_owned(),
            evm_version: evm_version.to_owned(),
        },
        descriptor: DescriptorInfo {
            version: defaults.descriptor_version.clone(),
        },
    })
}

/// `settings.compilationTarget` maps one source path to one contract name.
fn compilation_target(metadata: &Value) -> Result<String, SchemaViolation> {
    let target = required(metadata, "/settings/compilationTarget")?
        .as_object()
        .ok_or_else(|| SchemaViolation::invalid("settings.compilationTarget", "an object"))?;

    let mut names = target.values();
    match (names.next(), names.next()) {
        (Some(Value::String(name)), None) => Ok(name.clone()),
        (Some(_), None) => Err(SchemaViolation::invalid(
            "settings.compilationTarget",
            "a mapping to a contract name",
        )),
        _ => Err(SchemaViolation::AmbiguousCompilationTarget {
            count: target.len(),
        }),
    }
}

fn required<'a>(doc: &'a Value, pointer: &str) -> Result<&'a Value, SchemaViolation> {
    match doc.pointer(pointer) {
        None | Some(Value::Null) => Err(SchemaViolation::missing(dotted(pointer))),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(doc: &'a Value, pointer: &str) -> Result<&'a str, SchemaViolation> {
    required(doc, pointer)?
        .as_str()
        .ok_or_else(|| SchemaViolation::invalid(dotted(pointer), "a string"))
}

fn optional(doc: &Value, pointer: &str) -> Value {
    doc.pointer(pointer)
        .filter(|value| !value.is_null())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}
