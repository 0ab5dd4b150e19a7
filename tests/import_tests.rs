mod common;

use std::fs;

use common::*;
use octofhir_hl7validator::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn selectors(compiled: &CompiledRules) -> Vec<String> {
    compiled
        .rules()
        .iter()
        .map(|r| r.selector.path().to_string())
        .collect()
}

fn write(dir: &TempDir, name: &str, text: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn test_import_preserves_rule_order() {
    let imported = "\"MSH.9.1\" must be \"OML\"\n\"MSH.9.2\" must be \"O21\"\n";
    let local = "\"PID.3.1\" must be int\n\"PID.8\" may be one of \"F\", \"M\"\n";

    let loader = MemoryLoader::new().with_resource("pkg://common/msh.rules", imported);
    let combined = Validator::new(format!("import \"pkg://common/msh.rules\"\n{local}"))
        .with_loader(loader)
        .compile()
        .unwrap();

    let first = Validator::new(imported).compile().unwrap();
    let second = Validator::new(local).compile().unwrap();
    let mut expected = selectors(&first);
    expected.extend(selectors(&second));

    assert_eq!(selectors(&combined), expected);
    let rules: Vec<ValidationRule> = first
        .rules()
        .iter()
        .chain(second.rules())
        .cloned()
        .collect();
    // declaration lines differ between the standalone and combined compilations
    let strip = |r: &ValidationRule| ValidationRule { line: None, ..r.clone() };
    assert_eq!(
        combined.rules().iter().map(strip).collect::<Vec<_>>(),
        rules.iter().map(strip).collect::<Vec<_>>()
    );
}

#[test]
fn test_relative_file_import_uses_base_dir() {
    let dir = TempDir::new().unwrap();
    write(&dir, "shared/header.rules", "MSH\n\"MSH.3.1\" must be \"SrcSystem\"\n");

    let config = ValidatorConfig::new().with_import_base_dir(dir.path());
    let context = Validator::new("import \"file://shared/header.rules\"\n\"PID.3.1\" must be int")
        .with_config(config)
        .validate(lab_order())
        .unwrap();

    assert!(context.is_valid(), "{:?}", context.errors());
    assert_eq!(context.log().len(), 3);
}

#[test]
fn test_absolute_file_import() {
    let dir = TempDir::new().unwrap();
    write(&dir, "base.rules", "\"MSH.9.1\" must be \"ADT\"\n");
    let location = format!("file://{}", dir.path().join("base.rules").display());

    let context = Validator::new(format!("import \"{location}\""))
        .validate(lab_order())
        .unwrap();
    assert!(!context.is_valid());
    assert_eq!(error_selectors(&context), vec!["MSH.9.1".to_string()]);
}

#[test]
fn test_file_import_path_is_used_as_written() {
    let dir = TempDir::new().unwrap();
    write(&dir, "my rules/base.rules", "\"MSH.9.1\" must be \"OML\"\n");
    write(&dir, "Shared/Header.rules", "MSH\n");

    let absolute = format!("file://{}", dir.path().join("my rules/base.rules").display());
    let context = Validator::new(format!("import \"{absolute}\""))
        .validate(lab_order())
        .unwrap();
    assert!(context.is_valid(), "{:?}", context.errors());
    assert_eq!(context.log().len(), 1);

    let config = ValidatorConfig::new().with_import_base_dir(dir.path());
    let context = Validator::new("import \"file://Shared/Header.rules\"")
        .with_config(config)
        .validate(lab_order())
        .unwrap();
    assert!(context.is_valid(), "{:?}", context.errors());
    assert_eq!(context.log()[0].message, "Structure MSH 1: ok");
}

#[test]
fn test_package_import_and_nested_imports() {
    let dir = TempDir::new().unwrap();
    write(&dir, "v25/header.rules", "import \"pkg://hl7/v25/msh.rules\"\nPID\n");
    write(&dir, "v25/msh.rules", "MSH\n\"MSH.12\" must be \"2.5\"\n");

    let config = ValidatorConfig::new().with_package("hl7", dir.path());
    let compiled = Validator::new("import \"pkg://hl7/v25/header.rules\"\n\"PID.8\" must be \"M\"")
        .with_config(config)
        .compile()
        .unwrap();

    assert_eq!(selectors(&compiled), vec!["MSH.12", "PID.8"]);
    let roots: Vec<&str> = compiled.structure().iter().map(|n| n.code()).collect();
    assert_eq!(roots, vec!["MSH", "PID"]);

    let context = validate_compiled(&compiled, lab_order());
    assert!(context.is_valid(), "{:?}", context.errors());
}

#[test]
fn test_missing_import_fails_compilation() {
    let dir = TempDir::new().unwrap();
    let config = ValidatorConfig::new().with_import_base_dir(dir.path());

    let err = Validator::new("import \"file://missing.rules\"")
        .with_config(config)
        .validate(lab_order())
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Compile(CompileError::Import(ImportError::Read { .. }))
    ));
}

#[test]
fn test_unregistered_package_fails_compilation() {
    let err = Validator::new("import \"pkg://nowhere/a.rules\"")
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Compile(CompileError::Import(ImportError::UnknownPackage { .. }))
    ));
}

#[test]
fn test_unsupported_scheme_fails_compilation() {
    let err = Validator::new("import \"https://example.com/profile.rules\"")
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Compile(CompileError::Import(ImportError::UnsupportedScheme { .. }))
    ));
}

#[test]
fn test_self_import_is_cut_off() {
    let dir = TempDir::new().unwrap();
    write(&dir, "loop.rules", "import \"file://loop.rules\"\n");

    let config = ValidatorConfig::new()
        .with_import_base_dir(dir.path())
        .with_max_import_depth(4);
    let err = Validator::new("import \"file://loop.rules\"")
        .with_config(config)
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Compile(CompileError::Import(ImportError::DepthExceeded { limit: 4, .. }))
    ));
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    write(&dir, "rules/msh.rules", "MSH\n");
    let config = ValidatorConfig::new()
        .with_package("local", dir.path().join("rules"))
        .with_max_import_depth(3);
    write(&dir, "config.json", &serde_json::to_string(&config).unwrap());

    let loaded = ValidatorConfig::from_json_file(dir.path().join("config.json")).unwrap();
    assert_eq!(loaded, config);

    let context = Validator::new("import \"pkg://local/msh.rules\"")
        .with_config(loaded)
        .validate(lab_order())
        .unwrap();
    assert!(context.is_valid());
}
