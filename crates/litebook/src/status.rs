// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `litebook status` command implementation.
//!
//! Probes the configured local file, the mirror and the stored baseline.
//! Read-only: nothing is created, checkpointed or uploaded.

use std::io::IsTerminal;
use std::sync::Arc;

use litebook_config::model::LitebookConfig;
use litebook_core::{FileStatus, LitebookError};
use litebook_storage::FsMirror;
use litebook_storage::checksum::short;
use litebook_sync::{SnapshotService, StatusReport};

/// Format a byte count for humans.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Run the `litebook status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(
    config: &LitebookConfig,
    json: bool,
    plain: bool,
) -> Result<(), LitebookError> {
    let service = SnapshotService::new(config, Arc::new(FsMirror::new(config.remote_path())));
    let report = StatusReport::collect(&service, None).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_report(&report, use_color);
    }
    Ok(())
}

fn describe(file: &FileStatus) -> String {
    if file.exists {
        format!("{} ({})", file.path.display(), format_size(file.size))
    } else {
        format!("{} (missing)", file.path.display())
    }
}

fn print_report(report: &StatusReport, use_color: bool) {
    println!();
    println!("  litebook status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };
        println!("    Local:    {} {}", mark(report.local.exists), describe(&report.local));
        println!("    Mirror:   {} {}", mark(report.remote.exists), describe(&report.remote));
    } else {
        let mark = |ok: bool| if ok { "[OK]" } else { "[FAIL]" };
        println!("    Local:    {} {}", mark(report.local.exists), describe(&report.local));
        println!("    Mirror:   {} {}", mark(report.remote.exists), describe(&report.remote));
    }

    match (&report.checksum, report.checksum_recorded_at) {
        (Some(hash), Some(at)) => println!(
            "    Baseline: {} (recorded {})",
            short(hash),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        (Some(hash), None) => println!("    Baseline: {}", short(hash)),
        (None, _) => println!("    Baseline: none (next sync uploads)"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_size_bytes() {
        assert_eq!(format_size(512), "512 B");
    }

    #[test]
    fn format_size_kib() {
        assert_eq!(format_size(4096), "4.0 KiB");
    }

    #[test]
    fn format_size_mib() {
        assert_eq!(format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MiB");
    }

    #[test]
    fn describe_missing_file() {
        let file = FileStatus {
            path: PathBuf::from("/mnt/gcs/app.db"),
            exists: false,
            size: 0,
        };
        assert_eq!(describe(&file), "/mnt/gcs/app.db (missing)");
    }

    #[test]
    fn report_serializes_without_state() {
        let report = StatusReport {
            ok: false,
            local: FileStatus {
                path: PathBuf::from("/tmp/app.db"),
                exists: true,
                size: 4096,
            },
            remote: FileStatus {
                path: PathBuf::from("/mnt/gcs/app.db"),
                exists: false,
                size: 0,
            },
            checksum: None,
            checksum_recorded_at: None,
            finalized: false,
            state: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["local"]["size"], 4096);
        assert!(json.get("state").is_none());
    }
}
