use std::process::Command;

fn run(fixture: &str, args: &[&str]) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    let output = Command::new(env!("CARGO_BIN_EXE_partner-fraud-engine"))
        .arg(&path)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn opposite_trading_report() {
    let (stdout, stderr, success) = run("snapshot.json", &["opposite"]);

    assert!(success);
    assert!(stderr.is_empty());

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines[0],
        "partner_a,partner_b,client_a,client_b,confidence,timing_correlation,pnl_correlation,opposite_pairs,estimated_value,evidence"
    );
    assert!(lines[1].starts_with("P1,P2,CA,CB,0.920,0.800,0.000,1,552.00,"));
    assert_eq!(lines.len(), 2);
}

#[test]
fn opposite_trading_by_partner() {
    let (stdout, stderr, success) = run("snapshot.json", &["opposite", "--by-partner"]);

    assert!(success);
    assert!(stderr.is_empty());
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["partner,schemes,clients,total_value", "P1,1,1,552.00", "P2,1,1,552.00"]);
}

#[test]
fn bonus_abuse_report() {
    let (stdout, _, success) = run("snapshot.json", &["bonus"]);

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("CC,P3,15,no_trades;major_withdrawal;small_deposit;inactive,150.00,0,"));
}

#[test]
fn risk_report_ranks_partners() {
    let (stdout, _, success) = run("snapshot.json", &["risk"]);

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "partner,name,risk_score,flags,rings,referrals");
    assert_eq!(lines[1], "P1,Alpha Media,95,3,2,1");
    assert_eq!(lines[2], "P2,Delta Partners,45,0,1,1");
    assert_eq!(lines.len(), 3);
}

#[test]
fn summary_is_json() {
    let (stdout, _, success) = run("snapshot.json", &["summary"]);

    assert!(success);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["summary"]["total_schemes"], 4);
    assert_eq!(report["summary"]["high_confidence"], 3);
    assert_eq!(report["summary"]["total_estimated_value"], 4067.0);
    assert_eq!(report["top_partners"][0]["partner_id"], "P1");
    assert_eq!(report["opposite"][0]["total_trades"], 2);
    assert!(stdout.ends_with("}\n"));
}

#[test]
fn malformed_dataset_fails() {
    let (stdout, stderr, success) = run("malformed.json", &["rings"]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to parse dataset"));
}
