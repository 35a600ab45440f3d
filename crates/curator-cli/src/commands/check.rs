//! Check command - list discrepancies without starting a review.

use std::path::PathBuf;

use colored::Colorize;
use curator::{Curator, CuratorConfig, Discrepancy};

pub fn run(
    file: PathBuf,
    schema: String,
    columns: Vec<String>,
    json_output: bool,
    mut config: CuratorConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate input file exists
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    if !columns.is_empty() {
        config = config.with_columns(columns);
    }

    let curator = Curator::with_config(config);

    if json_output {
        let result = curator.check(&file, &schema)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} against {}",
        "Checking".cyan().bold(),
        file.display().to_string().white(),
        schema.white()
    );

    let result = curator.check(&file, &schema)?;
    let summary = &result.summary;

    println!(
        "Checked {} column(s), {} row(s)",
        summary.columns_checked.to_string().white().bold(),
        result.source.row_count
    );

    if !result.detection.unmapped.is_empty() {
        println!(
            "{} {} column(s) skipped",
            "Note:".yellow(),
            summary.columns_unmapped
        );
        if verbose {
            for unmapped in &result.detection.unmapped {
                println!("  {} {} ({})", "•".dimmed(), unmapped.column, unmapped.reason.dimmed());
            }
        }
    }
    println!();

    if summary.is_clean() {
        println!("{}", "No discrepancies found - all values match the vocabulary!".green());
        return Ok(());
    }

    let mut current_column = "";
    for discrepancy in &result.detection.discrepancies {
        if discrepancy.column != current_column {
            current_column = &discrepancy.column;
            println!("{}", format!("{}:", current_column).yellow().bold());
        }
        print_discrepancy(discrepancy);
    }

    println!();
    println!(
        "Found {} discrepancies in {} cell(s) across {} column(s)",
        summary.discrepancies.to_string().white().bold(),
        summary.affected_cells.to_string().white(),
        summary.columns_with_discrepancies
    );
    if summary.without_suggestions > 0 {
        println!(
            "  {} without any suggestion (manual value needed)",
            summary.without_suggestions.to_string().yellow()
        );
    }
    println!(
        "Run {} to review them",
        format!("curator review {} --schema {}", file.display(), schema)
            .cyan()
            .bold()
    );

    Ok(())
}

/// One line per discrepancy: value, occurrences, kind and best candidates.
pub fn print_discrepancy(discrepancy: &Discrepancy) {
    let candidates = if discrepancy.suggestions.is_empty() {
        "no suggestion".dimmed().to_string()
    } else {
        discrepancy
            .suggestions
            .iter()
            .take(3)
            .map(|s| format!("{} ({:.2})", s.value, s.confidence))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!(
        "  [{}] {:24} x{:<4} {:18} -> {}",
        discrepancy.id.dimmed(),
        format!("'{}'", discrepancy.value).white(),
        discrepancy.count,
        discrepancy.kind.label(),
        candidates
    );
}
