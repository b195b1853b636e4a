//! Integration tests for registry parsing

use vecgen_profiles::{from_path, from_str, ProfileError, Registry, SemanticCategory};

#[test]
fn test_builtin_categories() {
    let registry = Registry::builtin().unwrap();

    let of = |category: SemanticCategory| -> Vec<&str> {
        registry
            .profiles()
            .iter()
            .filter(|p| p.category == category)
            .map(|p| p.short_tag.as_str())
            .collect()
    };

    assert_eq!(of(SemanticCategory::Boolean), vec!["b"]);
    assert_eq!(
        of(SemanticCategory::NarrowInteger),
        vec!["i8", "ui8", "i16", "ui16"]
    );
    assert_eq!(of(SemanticCategory::WideCharacter), vec!["Wc"]);
    assert_eq!(of(SemanticCategory::StandardNumeric).len(), 8);
}

#[test]
fn test_builtin_metadata() {
    let registry = Registry::builtin().unwrap();

    let ui8 = registry.lookup("ui8").unwrap();
    assert_eq!(ui8.symbol, "std::uint8_t");
    assert_eq!(ui8.file_tag, "Ui8");
    assert_eq!(ui8.byte_size, 1);
    assert_eq!(ui8.range, "0 to 255");
    assert_eq!(ui8.include_label, "VectorUi8.h");

    let ld = registry.lookup("Ld").unwrap();
    assert_eq!(ld.default_literal, "0.0L");
    assert_eq!(ld.range, registry.canonical().range);
}

#[test]
fn test_canonical_override() {
    let toml = r#"
        [canonical]
        export_token = "MY_EXPORT"

        [[profile]]
        symbol = "float"
        short_tag = "f"
        file_tag = "F"
        default_literal = "0.f"
        byte_size = 4
        range = "3.4E +/- 38  precision: (7 digits)"
        include_label = "VectorF.h"
        category = "standard-numeric"
    "#;

    let registry = from_str(toml).unwrap();
    assert_eq!(registry.canonical().export_token, "MY_EXPORT");
    // Unspecified conventions keep their defaults
    assert_eq!(registry.canonical().symbol, "std::double_t");
}

#[test]
fn test_unknown_category_rejected() {
    let toml = r#"
        [[profile]]
        symbol = "half"
        short_tag = "h"
        file_tag = "H"
        default_literal = "0"
        byte_size = 2
        range = "?"
        include_label = "VectorH.h"
        category = "half-float"
    "#;

    assert!(matches!(from_str(toml), Err(ProfileError::Parse(_))));
}

#[test]
fn test_unknown_profile_field_rejected() {
    let toml = r#"
        [[profile]]
        symbol = "std::int32_t"
        short_tag = "i32"
        file_tag = "i32"
        default_literal = "0"
        byte_size = 4
        range = "-2.147.483.648 to 2.147.483.647"
        include_label = "Vectori32.h"
        category = "standard-numeric"
        signed = true
    "#;

    assert!(matches!(from_str(toml), Err(ProfileError::Parse(_))));
}

#[test]
fn test_from_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("profiles.toml");
    std::fs::write(&path, vecgen_profiles::BUILTIN_REGISTRY).unwrap();

    let registry = from_path(&path).unwrap();
    assert_eq!(registry.len(), 14);

    let missing = from_path(dir.path().join("missing.toml"));
    assert!(matches!(missing, Err(ProfileError::Io(_))));
}
