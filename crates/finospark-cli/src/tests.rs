//! CLI command tests

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use finospark_core::{ErrorResult, Strategy};

use crate::cli::{Cli, Commands};
use crate::commands;

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const REQUEST: &str = r#"{
    "user_id": "user_123",
    "transactions": [
        {"date": "2025-10-20", "amount": 1500, "merchant": "Swiggy", "category": "Food"},
        {"date": "2025-10-21", "amount": 3000, "merchant": "Amazon", "category": "Shopping"},
        {"date": "2025-10-22", "amount": 500, "merchant": "Uber", "category": "Transport"}
    ],
    "notes": "Feeling stressed about money"
}"#;

// ========== Argument Parsing Tests ==========

#[test]
fn test_serve_defaults() {
    let cli = Cli::try_parse_from(["finospark", "serve"]).unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Serve { host, port } => {
            assert_eq!(host, "0.0.0.0");
            assert_eq!(port, 8000);
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_serve_overrides() {
    let cli =
        Cli::try_parse_from(["finospark", "serve", "--host", "127.0.0.1", "-p", "9000", "-v"])
            .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Serve { host, port } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(port, 9000);
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_file_commands_require_file() {
    assert!(Cli::try_parse_from(["finospark", "analyze"]).is_err());
    assert!(Cli::try_parse_from(["finospark", "recover"]).is_err());

    let cli = Cli::try_parse_from(["finospark", "recover", "--file", "reply.txt"]).unwrap();
    assert!(matches!(cli.command, Commands::Recover { file } if file.ends_with("reply.txt")));
}

// ========== Request Loading Tests ==========

#[test]
fn test_load_request() {
    let file = temp_file(REQUEST);
    let request = commands::load_request(file.path()).unwrap();

    assert_eq!(request.user_id, "user_123");
    assert_eq!(request.transactions.len(), 3);
    assert_eq!(request.transactions[0].currency, "INR");
}

#[test]
fn test_load_request_rejects_empty_transactions() {
    let file = temp_file(r#"{"user_id": "u1", "transactions": []}"#);
    let err = commands::load_request(file.path()).unwrap_err();
    assert!(err.to_string().contains("At least one transaction"));
}

#[test]
fn test_load_request_invalid_json() {
    let file = temp_file("not json");
    assert!(commands::load_request(file.path()).is_err());
}

#[test]
fn test_load_request_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::load_request(&dir.path().join("missing.json")).is_err());
}

// ========== Command Tests ==========

#[test]
fn test_cmd_prompt() {
    let file = temp_file(REQUEST);
    assert!(commands::cmd_prompt(file.path()).is_ok());
}

#[test]
fn test_cmd_recover_fenced_reply() {
    let reply = r#"```json
{"emotion": "stressed", "financial_profile": "spender", "confidence": 0.7,
 "top_insights": ["Food delivery is frequent"],
 "recommendations": [{"title": "Cook at home", "desc": "Plan weekday meals", "priority": 1}],
 "savings_plan": {"target_amount": 1500, "steps": ["Limit delivery to weekends"]}}
```"#;
    let file = temp_file(reply);

    let (outcome, strategy) = commands::recover_file(file.path()).unwrap();
    assert!(outcome.is_success());
    assert_eq!(strategy, Some(Strategy::Direct));
    assert!(commands::cmd_recover(file.path()).is_ok());
}

#[test]
fn test_recover_file_prose_wrapped_reply() {
    let reply = r#"Here is your analysis: {"emotion": "anxious", "financial_profile": "balanced",
 "confidence": 0.6, "top_insights": [], "recommendations": [],
 "savings_plan": {"target_amount": 0, "steps": []}} Let me know!"#;
    let file = temp_file(reply);

    let (outcome, strategy) = commands::recover_file(file.path()).unwrap();
    assert!(outcome.is_success());
    assert_eq!(strategy, Some(Strategy::OuterObject));
}

#[test]
fn test_recover_file_garbage() {
    let file = temp_file("I think you're doing great.");

    let (outcome, strategy) = commands::recover_file(file.path()).unwrap();
    assert_eq!(strategy, None);
    let error = outcome.error().unwrap();
    assert_eq!(error.error, ErrorResult::EXTRACTION_FAILED);
    assert_eq!(error.raw_response.as_deref(), Some("I think you're doing great."));

    // Printing the failure is not a command error
    assert!(commands::cmd_recover(file.path()).is_ok());
}

#[test]
fn test_recover_file_schema_violation() {
    let file = temp_file(r#"{"emotion": "happy", "confidence": 0.5}"#);

    let (outcome, strategy) = commands::recover_file(file.path()).unwrap();
    assert_eq!(strategy, Some(Strategy::Direct));
    assert_eq!(outcome.error().unwrap().error, ErrorResult::VALIDATION_FAILED);
}

#[test]
fn test_recover_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::recover_file(&dir.path().join("reply.txt")).is_err());
}
