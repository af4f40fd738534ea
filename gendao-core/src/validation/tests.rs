//! Tests for identifier validation.

use super::*;

#[test]
fn test_plain_identifiers_are_accepted() {
    for name in ["person", "Person", "_hidden", "col_1", "price$usd", "a"] {
        assert!(validate_identifier(name).is_ok(), "{} should be valid", name);
    }
}

#[test]
fn test_qualified_identifiers_are_accepted() {
    assert!(validate_identifier("dbo.person").is_ok());
    assert!(validate_identifier("public.orders_2024").is_ok());
}

#[test]
fn test_unsafe_identifiers_are_rejected() {
    let cases = [
        "",
        "1person",
        "person name",
        "person;",
        "person--",
        "a.b.c",
        ".person",
        "person.",
        "\"person\"",
        "[person]",
        "name)",
    ];

    for name in cases {
        let err = validate_identifier(name).unwrap_err();
        assert!(
            matches!(err, GenDaoError::InvalidIdentifier { ref identifier } if identifier == name),
            "{:?} should be rejected",
            name
        );
    }
}

#[test]
fn test_validate_identifiers_stops_at_first_failure() {
    assert!(validate_identifiers(["id", "name", "age"]).is_ok());

    let err = validate_identifiers(["id", "bad name", "also bad"]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid SQL identifier: 'bad name'");
}

#[test]
fn test_split_qualified() {
    assert_eq!(split_qualified("dbo.person"), (Some("dbo"), "person"));
    assert_eq!(split_qualified("person"), (None, "person"));
}
