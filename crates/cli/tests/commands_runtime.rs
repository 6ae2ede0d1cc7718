use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use approval_chain_cli::commands::{self, batch, chain, process, EXIT_CONFIG, EXIT_UNHANDLED};
use approval_chain_core::PurchaseRequest;
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

const TWO_LEVEL_CHAIN: &str = r#"
[[chain.approvers]]
name = "TeamLeader"
role = "team_leader"
max_price = 5000

[[chain.approvers]]
name = "HigherApprover"
role = "manager"
max_price = 10000
"#;

const TERMINATED_CHAIN: &str = r#"
[chain]
require_terminal = true

[[chain.approvers]]
name = "TeamLeader"
role = "team_leader"
max_price = 5000

[[chain.approvers]]
name = "Director"
role = "director"
"#;

#[test]
fn process_team_leader_approves_within_limit_without_forwarding() {
    with_env(&[], || {
        let config = commands::load_config(None).expect("default config should load");
        let result = process::run(&config, &PurchaseRequest::new(1, Decimal::from(3000)), true);
        assert_eq!(result.exit_code, 0, "expected approval");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "process");
        assert_eq!(payload["status"], "approved");
        assert_eq!(payload["message"], "TeamLeader审批了1号请求，价格为3000");
        assert_eq!(payload["outcome"]["approved_by"], "TeamLeader");
        assert_eq!(payload["outcome"]["request_id"], 1);
        assert_eq!(payload["outcome"]["forwarded_by"], Value::Array(Vec::new()));
    });
}

#[test]
fn process_lone_team_leader_reports_missing_approver_above_limit() {
    with_env(&[], || {
        let config = commands::load_config(None).expect("default config should load");
        let result = process::run(&config, &PurchaseRequest::new(2, Decimal::from(9000)), true);
        assert_eq!(result.exit_code, EXIT_UNHANDLED);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "no_approver_available");
        assert!(payload["message"].as_str().unwrap_or_default().contains("TeamLeader"));
    });
}

#[test]
fn process_forwards_to_higher_approver() {
    with_env(&[("APPROVAL_CHAIN_LOCALE", "english")], || {
        let (_dir, path) = write_config(TWO_LEVEL_CHAIN);
        let config = commands::load_config(Some(path)).expect("config file should load");
        let result = process::run(&config, &PurchaseRequest::new(3, Decimal::from(8000)), true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["outcome"]["approved_by"], "HigherApprover");
        assert_eq!(payload["outcome"]["position"], 1);
        assert_eq!(payload["outcome"]["forwarded_by"][0], "TeamLeader");
        assert_eq!(payload["message"], "HigherApprover approved request #3, price 8000");
    });
}

#[test]
fn process_boundary_price_stays_with_team_leader() {
    with_env(&[], || {
        let (_dir, path) = write_config(TWO_LEVEL_CHAIN);
        let config = commands::load_config(Some(path)).expect("config file should load");

        let at_limit = process::run(&config, &PurchaseRequest::new(4, Decimal::from(5000)), true);
        let above = process::run(&config, &PurchaseRequest::new(5, Decimal::new(500_001, 2)), true);

        assert_eq!(parse_payload(&at_limit.output)["outcome"]["approved_by"], "TeamLeader");
        assert_eq!(parse_payload(&above.output)["outcome"]["approved_by"], "HigherApprover");
    });
}

#[test]
fn process_text_mode_signals_failure_explicitly() {
    with_env(&[], || {
        let config = commands::load_config(None).expect("default config should load");

        let approved = process::run(&config, &PurchaseRequest::new(6, Decimal::from(10)), false);
        assert_eq!(approved.exit_code, 0);
        assert!(approved.output.is_empty(), "approval line goes straight to stdout");

        let unhandled = process::run(&config, &PurchaseRequest::new(7, Decimal::from(9000)), false);
        assert_eq!(unhandled.exit_code, EXIT_UNHANDLED);
        assert!(unhandled.output.starts_with("no approver available for request 7"));
    });
}

#[test]
fn batch_reports_partial_when_a_request_has_no_approver() {
    with_env(&[], || {
        let config = commands::load_config(None).expect("default config should load");
        let dir = TempDir::new().expect("temp dir");
        let file = dir.path().join("requests.json");
        fs::write(
            &file,
            r#"[{"id": 1, "price": 3000}, {"id": 2, "price": "5000"}, {"id": 3, "price": 9000}]"#,
        )
        .expect("write requests");

        let result = batch::run(&config, &file);
        assert_eq!(result.exit_code, EXIT_UNHANDLED);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "partial");
        assert_eq!(payload["approved"], 2);
        assert_eq!(payload["unhandled"], 1);
        assert_eq!(payload["results"][1]["message"], "TeamLeader审批了2号请求，价格为5000");
        assert_eq!(payload["results"][2]["status"], "unhandled");
        assert_eq!(payload["results"][2]["approved_by"], Value::Null);
    });
}

#[test]
fn batch_with_terminated_chain_approves_everything() {
    with_env(&[], || {
        let (dir, path) = write_config(TERMINATED_CHAIN);
        let config = commands::load_config(Some(path)).expect("config file should load");
        let file = dir.path().join("requests.json");
        fs::write(&file, r#"[{"id": 1, "price": 100}, {"id": 2, "price": 1000000}]"#)
            .expect("write requests");

        let result = batch::run(&config, &file);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["results"][0]["approved_by"], "TeamLeader");
        assert_eq!(payload["results"][1]["approved_by"], "Director");
    });
}

#[test]
fn batch_rejects_malformed_request_file() {
    with_env(&[], || {
        let config = commands::load_config(None).expect("default config should load");
        let dir = TempDir::new().expect("temp dir");
        let file = dir.path().join("requests.json");
        fs::write(&file, r#"{"id": 1}"#).expect("write requests");

        let result = batch::run(&config, &file);
        assert_eq!(result.exit_code, EXIT_CONFIG);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "batch");
        assert_eq!(payload["error_class"], "input");
    });
}

#[test]
fn chain_lists_configured_approvers_in_order() {
    with_env(&[], || {
        let (_dir, path) = write_config(TERMINATED_CHAIN);
        let config = commands::load_config(Some(path)).expect("config file should load");

        let result = chain::run(&config, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["terminated"], true);
        assert_eq!(payload["approvers"][0]["name"], "TeamLeader");
        assert_eq!(payload["approvers"][1]["name"], "Director");
        assert_eq!(payload["approvers"][1]["limit"]["kind"], "unbounded");

        let text = chain::run(&config, false);
        assert!(text.output.contains("1. Director [director] unbounded"));
        assert!(!text.output.contains("note:"));
    });
}

#[test]
fn config_failure_is_reported_with_config_exit_code() {
    with_env(&[("APPROVAL_CHAIN_REQUIRE_TERMINAL", "true")], || {
        let result = commands::load_config(None).expect_err("default chain is not terminated");
        assert_eq!(result.exit_code, EXIT_CONFIG);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("approval-chain.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "APPROVAL_CHAIN_LOG_LEVEL",
        "APPROVAL_CHAIN_LOG_FORMAT",
        "APPROVAL_CHAIN_LOCALE",
        "APPROVAL_CHAIN_REQUIRE_TERMINAL",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
