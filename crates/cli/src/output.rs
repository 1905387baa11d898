use crate::error::CliError;
use engine_config::report::summary::{EntityStatus, SyncReport};

fn generate_report_json(report: &SyncReport) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

pub async fn write_report(report: &SyncReport, path: &str) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report_json(report: &SyncReport) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    println!("{report_json}");
    Ok(())
}

pub fn print_summary(report: &SyncReport) {
    print!("{}", render_summary(report));
}

fn status_label(status: EntityStatus) -> &'static str {
    match status {
        EntityStatus::Succeeded => "ok",
        EntityStatus::Failed => "FAILED",
        EntityStatus::Skipped => "skipped",
    }
}

fn render_summary(report: &SyncReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:<20} {:<8} {:>8} {:>8} {:>8} {:>8} {:>9}\n",
        "Entity", "Table", "Status", "Fetched", "Written", "Skipped", "Dropped", "Time (ms)"
    ));
    out.push_str(&format!("{}\n", "-".repeat(92)));

    for entity in &report.entities {
        let m = &entity.metrics;
        out.push_str(&format!(
            "{:<16} {:<20} {:<8} {:>8} {:>8} {:>8} {:>8} {:>9}\n",
            entity.entity,
            entity.table,
            status_label(entity.status),
            m.records_fetched,
            m.rows_written,
            m.records_skipped,
            m.records_dropped,
            entity.duration_ms
        ));
        if let Some(error) = &entity.error {
            let stage = entity
                .failed_stage
                .map(|s| format!(" at {s}"))
                .unwrap_or_default();
            out.push_str(&format!("  -> {error}{stage}\n"));
        }
    }

    out.push_str(&format!(
        "\n{} succeeded, {} failed, {} rows written\n",
        report.succeeded(),
        report.failed(),
        report.rows_written()
    ));
    out
}

/// Two-column listing used by `count` and `rows`.
pub fn print_counts(heading: &str, counts: &[(String, String, Result<u64, String>)]) {
    println!("{:<16} {:<24} {:>10}", "Entity", heading, "Count");
    println!("{}", "-".repeat(52));
    for (entity, target, count) in counts {
        match count {
            Ok(n) => println!("{entity:<16} {target:<24} {n:>10}"),
            Err(e) => println!("{entity:<16} {target:<24} {:>10}  ({e})", "error"),
        }
    }
}
