use crate::error::SchemaViolation;
use serde_json::Value;

/// Where an ABI may live in a stored document, most specific first.
pub const ABI_POINTERS: [&str; 3] = ["/contract/descriptor/abi", "/contract/abi", "/abi"];

/// Kind of a JSON ABI entry, taken from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind<'a> {
    Function,
    Constructor,
    /// `event`, `error`, `fallback`, `receive` and anything unknown.
    Other(&'a str),
}

impl<'a> EntryKind<'a> {
    /// An entry without `type` is a function.
    pub fn of(entry: &'a Value) -> Self {
        match entry.get("type").and_then(Value::as_str) {
            None | Some("function") => Self::Function,
            Some("constructor") => Self::Constructor,
            Some(other) => Self::Other(other),
        }
    }
}

/// Find the ABI array of `doc`, trying every known location in turn.
pub fn locate(doc: &Value) -> Result<(&'static str, &[Value]), SchemaViolation> {
    for pointer in ABI_POINTERS {
        if let Some(abi) = doc.pointer(pointer) {
            let entries = abi
                .as_array()
                .ok_or_else(|| SchemaViolation::invalid(dotted(pointer), "an array"))?;
            return Ok((pointer, entries));
        }
    }
    Err(SchemaViolation::MissingAbi)
}

/// Names of the callable members of a contract, in ABI order.
///
/// Every function contributes its `name`. The constructor has no name of its
/// own and is listed as `contract`. A contract has at most one constructor;
/// an ABI with none simply lists its functions.
pub fn extract_methods(abi: &[Value], contract: &str) -> Result<Vec<String>, SchemaViolation> {
    let mut methods = Vec::with_capacity(abi.len());
    let mut seen_constructor = false;
    for (i, entry) in abi.iter().enumerate() {
        if !entry.is_object() {
            return Err(SchemaViolation::invalid(format!("abi[{i}]"), "an object"));
        }
        match EntryKind::of(entry) {
            EntryKind::Function => {
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SchemaViolation::missing(format!("abi[{i}].name")))?;
                methods.push(name.to_owned());
            }
            EntryKind::Constructor if seen_constructor => {
                let count = abi
                    .iter()
                    .filter(|entry| EntryKind::of(entry) == EntryKind::Constructor)
                    .count();
                return Err(SchemaViolation::MultipleConstructors { count });
            }
            EntryKind::Constructor => {
                seen_constructor = true;
                methods.push(contract.to_owned());
            }
            EntryKind::Other(_) => {}
        }
    }
    Ok(methods)
}

/// `/contract/abi` -> `contract.abi`
pub(crate) fn dotted(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}
