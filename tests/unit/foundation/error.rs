use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MatteError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(MatteError::asset("x").to_string().contains("asset error:"));
    assert!(MatteError::input("x").to_string().contains("input error:"));
    assert!(
        MatteError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn only_resource_errors_are_fatal() {
    assert!(MatteError::resource("device lost").is_fatal());
    assert!(!MatteError::asset("404").is_fatal());
    assert!(!MatteError::input("no mask").is_fatal());
    assert!(!MatteError::validation("nan").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MatteError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_fatal());
}
