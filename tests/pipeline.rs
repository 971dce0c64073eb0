use descriptor_tools::abi::extract_methods;
use descriptor_tools::normalize::normalize;
use descriptor_tools::output::write_json;
use descriptor_tools::{
    ContractDescriptor, Defaults, Error, FailurePolicy, FsStore, IndexScope, SchemaViolation,
    SourceDir, SourceLookup, bundle, convert, index_methods,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

fn ownable_metadata() -> Value {
    json!({
        "compiler": {"version": "0.4.24+commit.e67f0147"},
        "language": "Solidity",
        "output": {
            "abi": [
                {"anonymous": false, "inputs": [], "name": "OwnershipRenounced", "type": "event"},
                {"constant": false, "inputs": [{"name": "newOwner", "type": "address"}],
                 "name": "transferOwnership", "outputs": [], "payable": false,
                 "stateMutability": "nonpayable", "type": "function"},
                {"inputs": [], "payable": false, "stateMutability": "nonpayable", "type": "constructor"},
                {"constant": true, "inputs": [], "name": "owner",
                 "outputs": [{"name": "", "type": "address"}], "payable": false,
                 "stateMutability": "view", "type": "function"}
            ],
            "devdoc": {"methods": {}, "title": "Ownable"},
            "userdoc": {"methods": {}}
        },
        "settings": {
            "compilationTarget": {"contracts/Ownable.sol": "Ownable"},
            "evmVersion": "byzantium",
            "libraries": {},
            "optimizer": {"enabled": false, "runs": 200},
            "remappings": []
        },
        "sources": {"contracts/Ownable.sol": {"keccak256": "0x01", "urls": []}},
        "version": 1
    })
}

fn write_doc(dir: &Path, name: &str, doc: &Value) {
    fs::write(dir.join(name), serde_json::to_vec(doc).unwrap()).unwrap();
}

fn store(dir: &Path) -> FsStore {
    FsStore::new(dir).ignoring([".DS_Store"])
}

#[test]
fn extraction_agrees_before_and_after_normalization() {
    // given
    let metadata = ownable_metadata();
    let direct_abi = metadata["output"]["abi"].as_array().unwrap();

    // when
    let descriptor = normalize(&metadata, &Defaults::default()).unwrap();
    let stored = descriptor.to_value().unwrap();
    let reloaded =
        ContractDescriptor::from_document(&stored, "Ownable", &Defaults::default()).unwrap();

    // then
    let direct = extract_methods(direct_abi, "Ownable").unwrap();
    let normalized = extract_methods(&reloaded.contract.abi, reloaded.name()).unwrap();
    assert_eq!(vec!["transferOwnership", "Ownable", "owner"], direct);
    assert_eq!(direct, normalized);
}

#[test]
fn hidden_metadata_entries_are_not_indexed() {
    // given
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".DS_Store"), [0u8, 0, 0, 1, 66, 117, 100, 49]).unwrap();
    write_doc(
        dir.path(),
        "A.json",
        &json!({"contract": {"name": "A", "abi": [{"type": "function", "name": "a"}]}}),
    );
    write_doc(dir.path(), "B.json", &json!({"contract": {"name": "B", "abi": []}}));

    // when
    let report = index_methods(
        &store(dir.path()),
        IndexScope::All,
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap();

    // then
    assert_eq!(2, report.output.len());
    assert_eq!(Some(&vec!["a".to_owned()]), report.output.get("A"));
    assert_eq!(Some(&Vec::<String>::new()), report.output.get("B"));
}

#[test]
fn method_index_output_is_deterministic() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let descriptors = dir.path().join("descriptors");
    fs::create_dir(&descriptors).unwrap();
    for name in ["Zeta", "Alpha", "Mid"] {
        write_doc(
            &descriptors,
            &format!("{name}.json"),
            &json!({"contract": {"name": name, "abi": [
                {"type": "constructor"},
                {"type": "function", "name": "run"}
            ]}}),
        );
    }
    let run = |out: &str| {
        let report = index_methods(
            &store(&descriptors),
            IndexScope::All,
            &Defaults::default(),
            FailurePolicy::Abort,
        )
        .unwrap();
        let path = dir.path().join(out);
        write_json(&path, &report.output, false).unwrap();
        fs::read(path).unwrap()
    };

    // when
    let first = run("first.json");
    let second = run("second.json");

    // then
    assert_eq!(first, second);
    assert_eq!(
        r#"{"Alpha":["Alpha","run"],"Mid":["Mid","run"],"Zeta":["Zeta","run"]}"#,
        String::from_utf8(first).unwrap()
    );
}

#[test]
fn convert_writes_descriptors_with_defaults() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let metadata_dir = dir.path().join("solidity-metadata-files");
    let descriptors_dir = dir.path().join("contract-descriptor-files");
    fs::create_dir(&metadata_dir).unwrap();
    write_doc(&metadata_dir, "Ownable.json", &ownable_metadata());

    // when
    let report = convert(
        &store(&metadata_dir),
        &store(&descriptors_dir),
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap();

    // then
    assert_eq!(vec!["Ownable.json"], report.output);
    let written: Value =
        serde_json::from_slice(&fs::read(descriptors_dir.join("Ownable.json")).unwrap()).unwrap();
    assert_eq!(json!("Ownable"), written["contract"]["name"]);
    assert_eq!(json!("Unknown"), written["contract"]["author"]);
    assert_eq!(json!("generic_contract"), written["contract"]["contract_type"]);
    assert_eq!(json!("byzantium"), written["compiler"]["evmVersion"]);
    assert_eq!(
        json!({
            "address": "0x314159265dd8dbb310642f98f50c066173c1259b",
            "networkID": 1,
            "chainID": 1
        }),
        written["deployment_information"]
    );
}

#[test]
fn converted_descriptors_are_named_after_the_contract() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let metadata_dir = dir.path().join("metadata");
    let descriptors_dir = dir.path().join("descriptors");
    fs::create_dir(&metadata_dir).unwrap();
    write_doc(&metadata_dir, "Ownable_metadata.json", &ownable_metadata());

    // when
    let converted = convert(
        &store(&metadata_dir),
        &store(&descriptors_dir),
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap();
    let index = index_methods(
        &store(&descriptors_dir),
        IndexScope::All,
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap();

    // then
    assert_eq!(vec!["Ownable.json"], converted.output);
    assert!(descriptors_dir.join("Ownable.json").is_file());
    assert!(!descriptors_dir.join("Ownable_metadata.json").exists());
    assert_eq!(
        Some(&vec![
            "transferOwnership".to_owned(),
            "Ownable".to_owned(),
            "owner".to_owned()
        ]),
        index.output.get("Ownable")
    );
}

#[test]
fn convert_failure_leaves_no_output_file() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let metadata_dir = dir.path().join("metadata");
    let descriptors_dir = dir.path().join("descriptors");
    fs::create_dir(&metadata_dir).unwrap();
    fs::create_dir(&descriptors_dir).unwrap();
    let mut broken = ownable_metadata();
    broken["settings"]
        .as_object_mut()
        .unwrap()
        .remove("evmVersion");
    write_doc(&metadata_dir, "Ownable.json", &broken);

    // when
    let err = convert(
        &store(&metadata_dir),
        &store(&descriptors_dir),
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap_err();

    // then
    match err {
        Error::Schema { id, violation } => {
            assert_eq!("Ownable.json", id);
            assert_eq!(SchemaViolation::missing("settings.evmVersion"), violation);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(0, fs::read_dir(&descriptors_dir).unwrap().count());
}

#[test]
fn malformed_json_aborts_even_when_skipping() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Bad.json"), "{\"contract\":").unwrap();

    let err = index_methods(
        &store(dir.path()),
        IndexScope::All,
        &Defaults::default(),
        FailurePolicy::Skip,
    )
    .unwrap_err();

    assert_eq!(3, err.exit_code());
    assert!(err.to_string().contains("Bad.json"), "{err}");
}

#[test]
fn legacy_nested_descriptors_are_indexed_and_bundled() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let descriptors = dir.path().join("contract-descriptor-files");
    let contracts = dir.path().join("contracts");
    fs::create_dir(&descriptors).unwrap();
    fs::create_dir(&contracts).unwrap();
    write_doc(
        &descriptors,
        "SafeMath.json",
        &json!({"contract": {
            "descriptor": {
                "name": "SafeMath",
                "contract_type": "library",
                "abi": [{"type": "function", "name": "add"}, {"type": "function", "name": "sub"}]
            },
            "endpoint": {"address": "0x314159265dd8dbb310642f98f50c066173c1259b", "networkID": 1, "chainID": 1},
            "dev": {"compiler": {"version": "0.4.24", "evmVersion": "byzantium"}}
        }}),
    );
    fs::write(contracts.join("SafeMath.sol"), "library SafeMath {}\n").unwrap();

    // when
    let libraries = index_methods(
        &store(&descriptors),
        IndexScope::LibrariesOnly,
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap();
    let sources = SourceDir::new(&contracts);
    let database = bundle(
        &store(&descriptors),
        Some(&sources as &dyn SourceLookup),
        &Defaults::default(),
        FailurePolicy::Abort,
    )
    .unwrap();

    // then
    assert_eq!(
        Some(&vec!["add".to_owned(), "sub".to_owned()]),
        libraries.output.get("SafeMath")
    );
    let record = serde_json::to_value(&database.output).unwrap();
    assert_eq!(json!("SafeMath"), record[0]["name"]);
    assert_eq!(json!("library"), record[0]["contract_type"]);
    assert_eq!(json!("library SafeMath {}\n"), record[0]["code"]);
    assert_eq!(json!("SafeMath"), record[0]["JSON"]["contract"]["name"]);
    assert_eq!(json!("0.4.24"), record[0]["JSON"]["compiler"]["version"]);
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("contract-descriptor-files");

    let err = bundle(&store(&missing), None, &Defaults::default(), FailurePolicy::Abort)
        .unwrap_err();

    assert!(matches!(&err, Error::DirectoryNotFound { path } if path == &missing), "{err:?}");
}
