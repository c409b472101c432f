use std::io::Write;

use sweep_spec::{FunctionRegistry, Spec, SpecError, SpecLoader, SpecPath};

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_loads_json_file() {
    let file = write_temp(
        ".json",
        r#"{"batch_size": {"grid_search": [16, 32]}, "epochs": 10}"#,
    );
    let spec = SpecLoader::new().from_file(file.path()).unwrap();

    assert!(matches!(
        spec.get_path(&SpecPath::from_keys(["batch_size"])),
        Some(Spec::Grid(_))
    ));
    assert_eq!(
        spec.get_path(&SpecPath::from_keys(["epochs"])),
        Some(&Spec::from(10))
    );
}

#[test]
fn test_loads_yaml_file_with_eval() {
    let file = write_temp(
        ".yml",
        "optimizer:\n  name: adam\n  warmup:\n    eval: coin\n",
    );
    let loader = SpecLoader::with_registry(FunctionRegistry::with_builtins());
    let spec = loader.from_file(file.path()).unwrap();

    assert!(matches!(
        spec.get_path(&"optimizer.warmup".parse().unwrap()),
        Some(Spec::Domain(_))
    ));
}

#[test]
fn test_missing_file_reports_path() {
    let err = SpecLoader::new()
        .from_file(std::path::Path::new("/definitely/not/here.json"))
        .unwrap_err();
    assert!(matches!(err, SpecError::Io { .. }));
    assert!(err.to_string().contains("/definitely/not/here.json"));
}

#[test]
fn test_invalid_json_file() {
    let file = write_temp(".json", "{not json");
    let err = SpecLoader::new().from_file(file.path()).unwrap_err();
    assert!(matches!(err, SpecError::InvalidJson(_)));
}
