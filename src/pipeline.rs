use crate::abi;
use crate::descriptor::ContractDescriptor;
use crate::error::{Error, Result, SchemaViolation};
use crate::normalize::normalize;
use crate::settings::{Defaults, FailurePolicy};
use crate::store::{DocumentStore, SourceLookup, logical_name};
use crate::types::{MethodIndex, RunReport, Skipped, StandaloneRecord};
use std::collections::BTreeMap;

/// Which descriptors end up in a method index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexScope {
    #[default]
    All,
    /// Only descriptors whose `contract_type` is `library`.
    LibrariesOnly,
}

/// Shared state of one batch run.
struct Batch {
    policy: FailurePolicy,
    skipped: Vec<Skipped>,
}

impl Batch {
    fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            skipped: Vec::new(),
        }
    }

    /// Turn a per-document failure into `None` when the policy allows
    /// skipping it, or propagate it.
    fn admit<T>(&mut self, id: &str, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_schema_violation() && self.policy == FailurePolicy::Skip => {
                tracing::warn!(%id, error = %e, "skipping invalid document");
                self.skipped.push(Skipped {
                    id: id.to_owned(),
                    reason: e.to_string(),
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn finish<T>(self, output: T) -> RunReport<T> {
        RunReport {
            output,
            skipped: self.skipped,
        }
    }
}

/// Load `id` from `store` as a canonical descriptor whose name matches its id.
pub fn load_descriptor(
    store: &dyn DocumentStore,
    id: &str,
    defaults: &Defaults,
) -> Result<ContractDescriptor> {
    let name = logical_name(id);
    let doc = store.load(id)?;
    let descriptor = ContractDescriptor::from_document(&doc, name, defaults)
        .map_err(|violation| Error::schema(id, violation))?;
    if descriptor.name() != name {
        return Err(Error::schema(
            id,
            SchemaViolation::NameMismatch {
                expected: name.to_owned(),
                found: descriptor.name().to_owned(),
            },
        ));
    }
    Ok(descriptor)
}

/// Normalize every metadata document of `source` into `target`.
///
/// Each descriptor is stored as `<contract name>.json`, whatever the name of
/// the metadata file it came from. Two metadata files naming the same contract
/// are a schema violation of the second one. Nothing is written unless every
/// document normalizes (or is skipped under [`FailurePolicy::Skip`]).
/// Returns the ids written, in order.
pub fn convert(
    source: &dyn DocumentStore,
    target: &dyn DocumentStore,
    defaults: &Defaults,
    policy: FailurePolicy,
) -> Result<RunReport<Vec<String>>> {
    let mut batch = Batch::new(policy);
    // target id -> (metadata id, descriptor)
    let mut converted: BTreeMap<String, (String, ContractDescriptor)> = BTreeMap::new();

    for id in source.list()? {
        let metadata = source.load(&id)?;
        let result = normalize(&metadata, defaults)
            .and_then(|descriptor| {
                let target_id = format!("{}.json", descriptor.name());
                match converted.get(&target_id) {
                    Some((first, _)) => Err(SchemaViolation::DuplicateContract {
                        name: descriptor.name().to_owned(),
                        first: first.clone(),
                    }),
                    None => Ok((target_id, descriptor)),
                }
            })
            .map_err(|v| Error::schema(id.as_str(), v));
        if let Some((target_id, descriptor)) = batch.admit(&id, result)? {
            tracing::debug!(%id, %target_id, "normalized metadata");
            converted.insert(target_id, (id, descriptor));
        }
    }

    let mut written = Vec::with_capacity(converted.len());
    for (target_id, (_, descriptor)) in converted {
        let doc = descriptor.to_value().map_err(|e| Error::StorageWrite {
            path: target_id.clone().into(),
            source: e.into(),
        })?;
        target.save(&target_id, &doc)?;
        written.push(target_id);
    }

    tracing::info!(
        converted = written.len(),
        skipped = batch.skipped.len(),
        "converted metadata files"
    );
    Ok(batch.finish(written))
}

/// Build the contract name -> method names index over every descriptor.
pub fn index_methods(
    store: &dyn DocumentStore,
    scope: IndexScope,
    defaults: &Defaults,
    policy: FailurePolicy,
) -> Result<RunReport<MethodIndex>> {
    let mut batch = Batch::new(policy);
    let mut index = MethodIndex::new();

    for id in store.list()? {
        let result = load_descriptor(store, &id, defaults).and_then(|descriptor| {
            let methods = abi::extract_methods(&descriptor.contract.abi, descriptor.name())
                .map_err(|v| Error::schema(id.as_str(), v))?;
            Ok((descriptor, methods))
        });
        let Some((descriptor, methods)) = batch.admit(&id, result)? else {
            continue;
        };
        if scope == IndexScope::LibrariesOnly && !descriptor.is_library() {
            tracing::trace!(%id, "not a library");
            continue;
        }
        tracing::debug!(%id, methods = methods.len(), "indexed descriptor");
        index.insert(descriptor.contract.name, methods);
    }

    tracing::info!(contracts = index.len(), ?scope, "built method index");
    Ok(batch.finish(index))
}

/// Collect every descriptor, optionally paired with its source text, into the
/// standalone-mode database.
pub fn bundle(
    store: &dyn DocumentStore,
    sources: Option<&dyn SourceLookup>,
    defaults: &Defaults,
    policy: FailurePolicy,
) -> Result<RunReport<Vec<StandaloneRecord>>> {
    let mut batch = Batch::new(policy);
    let mut records = Vec::new();

    for id in store.list()? {
        let Some(descriptor) = batch.admit(&id, load_descriptor(store, &id, defaults))? else {
            continue;
        };
        let code = sources
            .map(|sources| sources.source_of(descriptor.name()))
            .transpose()?;
        records.push(StandaloneRecord {
            name: descriptor.contract.name.clone(),
            contract_type: descriptor.contract.contract_type.clone(),
            json: descriptor,
            code,
        });
    }

    tracing::info!(records = records.len(), "bundled descriptors");
    Ok(batch.finish(records))
}
