#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    missing_debug_implementations,
    clippy::clone_on_ref_ptr,
    unreachable_pub
)]

use printdrop_server::config::PrintConfig;
use printdrop_server::print::{Platform, PrintDispatcher};
use reqwest::StatusCode;

mod common;

fn print_config() -> PrintConfig {
    PrintConfig {
        lp_program: "lp".to_string(),
        windows_shell_program: "powershell".to_string(),
        windows_fallback_program: "rundll32".to_string(),
        command_timeout_secs: 10,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_print_via_lp_success() {
    let dir = tempfile::tempdir().unwrap();
    let lp = common::write_stub_script(&dir, "lp", r#"echo "request id is OfficeLaser-17 (1 file(s))""#);

    let app = common::TestApp::spawn_with(move |config| {
        config.print.lp_program = lp;
    })
    .await;

    let code = app.upload("memo.txt", b"print me", 5).await;

    let resp = app
        .client
        .post(format!("{}/v1/documents/{code}/print", app.server_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Print job sent successfully");

    let trace = json["debugTrace"].as_str().unwrap();
    assert!(trace.contains("System: Unix"), "trace was:\n{trace}");
    assert!(trace.contains("Temporary file created at:"));
    assert!(trace.contains("Print command:"));
    assert!(trace.contains("Print job ID: request id is OfficeLaser-17"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_print_passes_printer_name_to_lp() {
    let dir = tempfile::tempdir().unwrap();
    // The stub echoes its arguments so the trace captures what lp received
    let lp = common::write_stub_script(&dir, "lp", r#"echo "args: $@""#);

    let app = common::TestApp::spawn_with(move |config| {
        config.print.lp_program = lp;
    })
    .await;

    let code = app.upload("memo.txt", b"print me", 5).await;

    let resp = app
        .client
        .post(format!("{}/v1/documents/{code}/print", app.server_url))
        .json(&serde_json::json!({"printerName": "FrontDesk"}))
        .send()
        .await
        .unwrap();

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    let trace = json["debugTrace"].as_str().unwrap();
    assert!(trace.contains("-d FrontDesk"), "trace was:\n{trace}");
}

#[tokio::test]
async fn test_print_unknown_code_is_404_without_dispatch() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .post(format!("{}/v1/documents/PRNT0-NONE/print", app.server_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Invalid code or document expired");
}

#[cfg(unix)]
#[tokio::test]
async fn test_print_command_failure_captures_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let lp = common::write_stub_script(
        &dir,
        "lp",
        "echo 'lp: The printer or class does not exist.' >&2\nexit 1",
    );

    let app = common::TestApp::spawn_with(move |config| {
        config.print.lp_program = lp;
    })
    .await;

    let code = app.upload("memo.txt", b"print me", 5).await;

    let resp = app
        .client
        .post(format!("{}/v1/documents/{code}/print", app.server_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("The printer or class does not exist"), "message was: {message}");

    let trace = json["debugTrace"].as_str().unwrap();
    assert!(trace.contains("Command failed: lp: The printer or class does not exist."), "trace was:\n{trace}");
}

#[cfg(unix)]
#[tokio::test]
async fn test_print_command_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let lp = common::write_stub_script(&dir, "lp", "sleep 5");

    let app = common::TestApp::spawn_with(move |config| {
        config.print.lp_program = lp;
        config.print.command_timeout_secs = 1;
    })
    .await;

    let code = app.upload("memo.txt", b"print me", 5).await;

    let resp = app
        .client
        .post(format!("{}/v1/documents/{code}/print", app.server_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("timed out after 1s"), "message was: {message}");
}

#[cfg(unix)]
#[tokio::test]
async fn test_temp_file_removed_on_every_path() {
    let dir = tempfile::tempdir().unwrap();
    let lp_ok = common::write_stub_script(&dir, "lp_ok", "echo done");
    let lp_fail = common::write_stub_script(&dir, "lp_fail", "exit 1");

    for lp in [lp_ok, lp_fail] {
        let mut config = print_config();
        config.lp_program = lp;
        let dispatcher = PrintDispatcher::with_platform(Platform::Unix, config);

        let outcome = dispatcher.dispatch(b"content", None).await;
        let temp_line = outcome
            .debug_trace
            .lines()
            .find_map(|l| l.strip_prefix("Temporary file created at: "))
            .expect("trace must record the temp path");
        assert!(!std::path::Path::new(temp_line).exists(), "temp file {temp_line} must be removed");
    }
}

/// Stub standing in for the Windows shell host: answers the printer
/// enumeration, the default-printer query, and the print verb.
#[cfg(unix)]
fn windows_shell_stub(dir: &tempfile::TempDir) -> String {
    common::write_stub_script(
        dir,
        "shellhost",
        r#"case "$3" in
  *Get-Printer*) printf 'OfficeLaser\nFrontDesk\n' ;;
  *Win32_Printer*) printf 'OfficeLaser\n' ;;
  *Start-Process*) exit 0 ;;
  *) exit 2 ;;
esac"#,
    )
}

#[cfg(unix)]
#[tokio::test]
async fn test_windows_unknown_printer_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = print_config();
    config.windows_shell_program = windows_shell_stub(&dir);

    let dispatcher = PrintDispatcher::with_platform(Platform::Windows, config);
    let outcome = dispatcher.dispatch(b"content", Some("Ghost")).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("Printer 'Ghost' not found"), "message was: {}", outcome.message);
    assert!(outcome.message.contains("OfficeLaser, FrontDesk"));
    assert!(outcome.debug_trace.contains("Available printers: OfficeLaser, FrontDesk"));
    // Validation failed before any print command was attempted
    assert!(!outcome.debug_trace.contains("Attempting to print to:"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_windows_resolves_default_printer() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = print_config();
    config.windows_shell_program = windows_shell_stub(&dir);

    let dispatcher = PrintDispatcher::with_platform(Platform::Windows, config);
    let outcome = dispatcher.dispatch(b"content", None).await;

    assert!(outcome.success, "trace was:\n{}", outcome.debug_trace);
    assert_eq!(outcome.message, "Print job sent successfully");
    assert!(outcome.debug_trace.contains("Using default printer: OfficeLaser"));
    assert!(outcome.debug_trace.contains("Attempting to print to: OfficeLaser"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_windows_named_printer_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = print_config();
    config.windows_shell_program = windows_shell_stub(&dir);

    let dispatcher = PrintDispatcher::with_platform(Platform::Windows, config);
    let outcome = dispatcher.dispatch(b"content", Some("FrontDesk")).await;

    assert!(outcome.success, "trace was:\n{}", outcome.debug_trace);
    assert!(outcome.debug_trace.contains("Attempting to print to: FrontDesk"));
    // A known printer skips default resolution
    assert!(!outcome.debug_trace.contains("Using default printer:"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_windows_fallback_when_shell_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = print_config();
    config.windows_shell_program = "/nonexistent/printdrop-shellhost".to_string();
    config.windows_fallback_program = common::write_stub_script(&dir, "fallback", "echo spooled");

    let dispatcher = PrintDispatcher::with_platform(Platform::Windows, config);
    let outcome = dispatcher.dispatch(b"content", Some("OfficeLaser")).await;

    assert!(outcome.success, "trace was:\n{}", outcome.debug_trace);
    assert_eq!(outcome.message, "Print job sent via fallback method");
    assert!(outcome.debug_trace.contains("using fallback method"));
    assert!(outcome.debug_trace.contains("Fallback command:"));
    assert!(outcome.debug_trace.contains("Exit code: 0"));
    assert!(outcome.debug_trace.contains("/d:OfficeLaser"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_windows_fallback_nonzero_exit_is_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = print_config();
    config.windows_shell_program = "/nonexistent/printdrop-shellhost".to_string();
    config.windows_fallback_program =
        common::write_stub_script(&dir, "fallback", "echo 'spooler unavailable' >&2\nexit 3");

    let dispatcher = PrintDispatcher::with_platform(Platform::Windows, config);
    let outcome = dispatcher.dispatch(b"content", None).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("fallback print command failed"), "message was: {}", outcome.message);
    assert!(outcome.debug_trace.contains("Exit code: 3"));
    assert!(outcome.debug_trace.contains("Error: spooler unavailable"));
}

#[tokio::test]
async fn test_unsupported_platform_is_fatal_per_request() {
    let dispatcher = PrintDispatcher::with_platform(Platform::Unsupported("beos"), print_config());
    let outcome = dispatcher.dispatch(b"content", None).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("Unsupported operating system: beos"), "message was: {}", outcome.message);
    assert!(!outcome.debug_trace.is_empty());
    assert!(outcome.debug_trace.contains("System: beos"));
}
