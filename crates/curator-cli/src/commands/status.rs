//! Status command - show review progress and summary.

use std::path::PathBuf;

use colored::Colorize;
use curator::{DecisionStatus, ReviewSession};
use indexmap::IndexMap;

pub fn run(
    file: PathBuf,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!(
            "Session file not found: {}\nRun 'curator review <FILE> --schema <MODEL>' first.",
            file.display()
        )
        .into());
    }

    let session = ReviewSession::load(&file)?;
    let summary = session.summary();

    // Pending and total per column, in review order
    let mut columns: IndexMap<&str, (usize, usize)> = IndexMap::new();
    for discrepancy in session.list_discrepancies(None) {
        let entry = columns.entry(discrepancy.column.as_str()).or_default();
        entry.1 += 1;
        if session.status(&discrepancy.id) == DecisionStatus::Pending {
            entry.0 += 1;
        }
    }

    let source = session.source.as_ref().map(|s| s.file.as_str()).unwrap_or("?");

    if json_output {
        let status = serde_json::json!({
            "file": source,
            "schema": session.schema_source,
            "progress": session.progress(),
            "total_discrepancies": summary.total(),
            "decisions": summary,
            "columns": columns
                .iter()
                .map(|(column, (pending, total))| (column.to_string(), serde_json::json!({"pending": pending, "total": total})))
                .collect::<serde_json::Map<_, _>>(),
            "unmapped": session.unmapped(),
            "approved": session.is_approved(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{} {}", "Review status for".cyan().bold(), source.white());
    println!();

    // Progress bar
    let progress = session.progress();
    let bar_width = 30;
    let filled = (progress * bar_width as f64).round() as usize;
    let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);

    println!(
        "Progress: {} {}/{} ({:.0}%)",
        bar.cyan(),
        summary.decided().to_string().white().bold(),
        summary.total(),
        progress * 100.0
    );
    println!();

    println!("{}", "Decisions:".yellow().bold());
    println!("  Pending:    {}", summary.pending.to_string().white());
    println!("  Accepted:   {}", summary.accepted.to_string().green());
    println!("  Overridden: {}", summary.overridden.to_string().blue());
    println!("  Rejected:   {}", summary.rejected.to_string().red());
    println!("  Skipped:    {}", summary.skipped.to_string().dimmed());
    println!();

    if !columns.is_empty() {
        println!("{}", "Columns:".yellow().bold());
        for (column, (pending, total)) in &columns {
            println!("  {:24} {} pending of {}", column, pending.to_string().white(), total);
        }
        println!();
    }

    if !session.unmapped().is_empty() {
        println!("{}", "Skipped columns:".yellow().bold());
        for unmapped in session.unmapped() {
            println!("  {:24} {}", unmapped.column, unmapped.reason.dimmed());
        }
        println!();
    }

    // Next steps
    if session.is_approved() {
        println!("{}", "This review has been approved.".green().bold());
    } else if session.can_approve() {
        println!(
            "All discrepancies reviewed. Run {} to freeze the plan.",
            format!("curator approve {}", file.display()).cyan().bold()
        );
    } else {
        println!(
            "Run {} or {} to continue.",
            "curator review".cyan().bold(),
            format!("curator batch {}", file.display()).cyan().bold()
        );
    }

    Ok(())
}
