use crate::{
    formula::Assignment,
    oracle::{Claim, ClaimError},
};

#[test]
fn parses_satisfiable_claim() {
    let claim = Claim::parse(
        r#"{"satisfiable": true, "assignment": [true, false, true]}"#,
        3,
    )
    .unwrap();
    assert_eq!(claim, Claim::Sat(Assignment::new(vec![true, false, true])));
}

#[test]
fn unsatisfiable_claim_ignores_assignment() {
    for content in &[
        r#"{"satisfiable": false}"#,
        r#"{"satisfiable": false, "assignment": null}"#,
        r#"{"satisfiable": false, "assignment": [1, 2]}"#,
    ] {
        assert_eq!(Claim::parse(content, 4).unwrap(), Claim::Unsat);
    }
}

#[test]
fn strips_markdown_fence() {
    let content = "```json\n{\"satisfiable\": true, \"assignment\": [false]}\n```\n";
    assert_eq!(
        Claim::parse(content, 1).unwrap(),
        Claim::Sat(Assignment::new(vec![false]))
    );

    let bare = "```{\"satisfiable\": false}```";
    assert_eq!(Claim::parse(bare, 1).unwrap(), Claim::Unsat);
}

#[test]
fn rejects_invalid_json() {
    assert!(matches!(
        Claim::parse("the formula is satisfiable", 2),
        Err(ClaimError::InvalidJson { .. })
    ));
}

#[test]
fn rejects_non_object() {
    assert!(matches!(
        Claim::parse("[true, false]", 2),
        Err(ClaimError::NotAnObject { .. })
    ));
}

#[test]
fn rejects_missing_or_non_boolean_verdict() {
    assert!(matches!(
        Claim::parse(r#"{"assignment": [true]}"#, 1),
        Err(ClaimError::MissingField {
            field: "satisfiable"
        })
    ));
    assert!(matches!(
        Claim::parse(r#"{"satisfiable": "yes"}"#, 1),
        Err(ClaimError::NonBooleanVerdict { .. })
    ));
}

#[test]
fn rejects_satisfiable_claim_without_assignment() {
    for content in &[
        r#"{"satisfiable": true}"#,
        r#"{"satisfiable": true, "assignment": null}"#,
    ] {
        assert!(matches!(
            Claim::parse(content, 2),
            Err(ClaimError::MissingField {
                field: "assignment"
            })
        ));
    }
    assert!(matches!(
        Claim::parse(r#"{"satisfiable": true, "assignment": "TF"}"#, 2),
        Err(ClaimError::NotAnArray { .. })
    ));
}

#[test]
fn rejects_wrong_length() {
    for content in &[
        r#"{"satisfiable": true, "assignment": [true]}"#,
        r#"{"satisfiable": true, "assignment": [true, true, true]}"#,
    ] {
        assert!(matches!(
            Claim::parse(content, 2),
            Err(ClaimError::WrongLength { expected: 2, .. })
        ));
    }
}

#[test]
fn rejects_non_boolean_entry() {
    assert!(matches!(
        Claim::parse(r#"{"satisfiable": true, "assignment": [true, 0, false]}"#, 3),
        Err(ClaimError::NonBooleanEntry { index: 1, .. })
    ));
}
