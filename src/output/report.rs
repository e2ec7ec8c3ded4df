//! Human-readable rendering of a [`SyncReport`]

use crate::sync::{DependentStatus, SyncReport};
use std::fmt::Write;

/// Renders the report as the text printed by [`print_report`]
pub fn format_report(report: &SyncReport) -> String {
    let mut out = String::new();
    let duration = report.finished_at - report.started_at;

    let _ = writeln!(out, "=== {} run {} ===\n", report.workflow, report.run_id);
    let _ = writeln!(
        out,
        "Started: {}  Duration: {:.1}s",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        duration.num_milliseconds() as f64 / 1000.0
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Catalog ({}):", report.catalog.table);
    let _ = writeln!(out, "  Scraped rows: {}", report.catalog.scraped);
    let _ = writeln!(
        out,
        "  Replaced: {} deleted, {} inserted",
        report.catalog.replaced.deleted, report.catalog.replaced.inserted
    );
    let _ = writeln!(out, "  Keys read from store: {}", report.catalog_keys);
    let _ = writeln!(out);

    let _ = writeln!(out, "Dependents:");
    let _ = writeln!(out, "  Keys synced: {}", report.synced_count());
    let _ = writeln!(out, "  Keys failed: {}", report.failed_count());
    let _ = writeln!(out, "  Records scraped: {}", report.dependent_records());
    if let Some(aggregate) = report.aggregate {
        let _ = writeln!(
            out,
            "  Aggregated write: {} deleted, {} inserted",
            aggregate.deleted, aggregate.inserted
        );
    }

    if report.has_failures() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failures:");
        for outcome in report.failures() {
            if let DependentStatus::Failed { stage, error } = &outcome.status {
                let _ = writeln!(out, "  - {} [{}] {}", outcome.key, stage, error);
            }
        }
    }

    out
}

/// Prints the report to stdout
pub fn print_report(report: &SyncReport) {
    print!("{}", format_report(report));
}
