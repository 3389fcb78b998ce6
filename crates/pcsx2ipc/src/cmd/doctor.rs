use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pcsx2ipc_transport::connect_with_timeouts;
use serde::Serialize;

use crate::cmd::{Context, DoctorArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    socket: String,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, ctx: &Context) -> CliResult<i32> {
    let path = ctx.config.resolved_socket_path();
    let checks = run_checks(ctx, &path);

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        socket: path.display().to_string(),
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, ctx.format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

/// Later checks are skipped once an earlier one fails.
fn run_checks(ctx: &Context, path: &Path) -> Vec<CheckResult> {
    let mut checks = vec![socket_path_check(ctx)];

    let file = socket_file_check(path);
    let reachable = file.status == CheckStatus::Pass;
    checks.push(file);

    if reachable {
        checks.push(connect_check(ctx, path));
    } else {
        checks.push(CheckResult::new(
            "connect",
            CheckStatus::Skip,
            "socket file unavailable",
        ));
    }
    checks
}

fn socket_path_check(ctx: &Context) -> CheckResult {
    let source = if ctx.config.socket_path.is_some() {
        "--socket / PCSX2_IPC_SOCKET"
    } else if std::env::var_os("XDG_RUNTIME_DIR").is_some_and(|dir| !dir.is_empty()) {
        "XDG_RUNTIME_DIR"
    } else {
        "fallback /tmp"
    };
    CheckResult::new("socket_path", CheckStatus::Info, format!("resolved from {source}"))
}

fn socket_file_check(path: &Path) -> CheckResult {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            CheckResult::new("socket_file", CheckStatus::Pass, "socket present")
        }
        Ok(_) => CheckResult::new(
            "socket_file",
            CheckStatus::Fail,
            format!("{} exists but is not a socket", path.display()),
        ),
        Err(err) => CheckResult::new(
            "socket_file",
            CheckStatus::Fail,
            format!("{}: {err} (is PCSX2 running with IPC enabled?)", path.display()),
        ),
    }
}

fn connect_check(ctx: &Context, path: &Path) -> CheckResult {
    match connect_with_timeouts(
        path,
        ctx.config.read_timeout,
        ctx.config.write_timeout,
    ) {
        Ok(stream) => {
            let _ = stream.shutdown();
            CheckResult::new("connect", CheckStatus::Pass, "connection accepted")
        }
        Err(err) => CheckResult::new("connect", CheckStatus::Fail, err.to_string()),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHECK", "STATUS", "DETAIL"]);
            for c in &output.checks {
                table.add_row(vec![c.name, status_text(c.status), c.detail.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("pcsx2ipc doctor ({})\n", output.socket);
            for c in &output.checks {
                println!("  [{:>4}] {:<12} {}", status_text(c.status), c.name, c.detail);
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}
