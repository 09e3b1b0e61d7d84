//! Terminal presentation of run summaries and the capability matrix.

use crate::driver::{RunOutcome, RunSummary};
use crate::{Capabilities, IndexingStyle, WorkloadOperation};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

/// Print the per-operation measurement table and the final status line.
pub fn print_summary(summary: &RunSummary) {
    println!(
        "\n{}",
        format!("━━━ {} ━━━", summary.engine).bold().cyan()
    );

    if !summary.records.is_empty() || !summary.failures.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
        table.set_header(vec![
            "Operation",
            "Duration(s)",
            "CPU(%)",
            "Memory(MB)",
            "Notes",
        ]);

        for op in WorkloadOperation::ALL {
            if let Some(r) = summary.records.iter().find(|r| r.operation == op) {
                table.add_row(vec![
                    Cell::new(op.label()),
                    Cell::new(format!("{:.6}", r.duration_seconds)),
                    Cell::new(format!("{:.1}", r.cpu_percent)),
                    Cell::new(format!("{:.1}", r.memory_mb)),
                    Cell::new(r.notes.as_deref().unwrap_or("")),
                ]);
            } else if let Some(f) = summary.failures.iter().find(|f| f.operation == op) {
                table.add_row(vec![
                    Cell::new(op.label()).fg(Color::Red),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new(&f.message).fg(Color::Red),
                ]);
            }
        }
        println!("{table}");
    }

    for e in &summary.sink_errors {
        println!(
            "  {} some results were not persisted: {}",
            "WARN".yellow().bold(),
            e
        );
    }

    match summary.outcome {
        RunOutcome::Done if summary.failures.is_empty() => {
            println!("  {} ran to completion", "OK".green().bold());
        }
        RunOutcome::Done => {
            println!(
                "  {} completed with {}/{} operations failing",
                "PARTIAL".yellow().bold(),
                summary.failures.len(),
                WorkloadOperation::ALL.len()
            );
        }
        RunOutcome::AbortedSetup => {
            println!(
                "  {} aborted during setup: {}",
                "ABORT".red().bold(),
                summary.abort_reason.as_deref().unwrap_or("unknown")
            );
        }
        RunOutcome::AbortedLoad => {
            println!(
                "  {} aborted during load: {}",
                "ABORT".red().bold(),
                summary.abort_reason.as_deref().unwrap_or("unknown")
            );
        }
    }
}

/// Print the compiled-in engines and their declared capabilities.
pub fn print_capabilities(matrix: &[(&str, Capabilities)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec!["Engine", "Indexing", "Mixed sub-steps"]);

    for (name, caps) in matrix {
        let indexing = match caps.indexing {
            IndexingStyle::SecondaryIndex => Cell::new("secondary index"),
            IndexingStyle::FilteredScan => Cell::new("filtered scan (fallback)").fg(Color::Yellow),
        };
        let skipped = caps.skipped_substeps();
        let substeps = if skipped.is_empty() {
            Cell::new("insert, point_read, update, delete")
        } else {
            Cell::new(format!("skips: {}", skipped.join(", "))).fg(Color::Yellow)
        };
        table.add_row(vec![Cell::new(name), indexing, substeps]);
    }
    println!("{table}");
}
