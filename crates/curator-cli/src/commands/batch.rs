//! Batch command - accept confident suggestions at once.

use std::path::PathBuf;

use colored::Colorize;
use curator::{DecisionStatus, ReviewSession};

pub fn run(
    file: PathBuf,
    min_confidence: f64,
    column: Option<String>,
    reject_rest: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Session file not found: {}", file.display()).into());
    }

    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(format!("--min-confidence must be between 0 and 1, got {}", min_confidence).into());
    }

    let mut session = ReviewSession::load(&file)?;

    let candidates: Vec<String> = session
        .pending()
        .iter()
        .filter(|d| column.as_deref().is_none_or(|c| d.column == c))
        .map(|d| d.id.clone())
        .collect();

    if candidates.is_empty() {
        println!(
            "{} No pending discrepancies match the filter criteria.",
            "Note:".yellow()
        );
        return Ok(());
    }

    println!(
        "{} suggestions with confidence >= {:.2} for {} discrepancy(ies)...",
        "Accepting".cyan().bold(),
        min_confidence,
        candidates.len().to_string().white().bold()
    );

    let accepted = session.accept_above(min_confidence, column.as_deref())?;

    if verbose {
        for id in &candidates {
            if session.status(id) != DecisionStatus::Accepted {
                continue;
            }
            let (Ok(discrepancy), Some(decision)) = (session.discrepancy(id), session.decision(id))
            else {
                continue;
            };
            println!(
                "  {} {} [{}] '{}' -> '{}'",
                "•".dimmed(),
                id,
                discrepancy.column.cyan(),
                discrepancy.value,
                decision.value.as_deref().unwrap_or("")
            );
        }
    }

    let rejected = if reject_rest {
        session.reject_pending(column.as_deref())?
    } else {
        0
    };

    // Save the updated session
    session.save(&file)?;

    println!();
    println!(
        "{} {} accepted, {} rejected",
        "Done:".green().bold(),
        accepted.to_string().white().bold(),
        rejected.to_string().white().bold()
    );

    let pending = session.summary().pending;
    if pending > 0 {
        println!(
            "  {} pending discrepancy(ies) remaining",
            pending.to_string().yellow()
        );
    } else {
        println!("  {} All discrepancies have been decided!", "✓".green());
        println!(
            "Run {} to freeze the plan",
            format!("curator approve {}", file.display()).cyan().bold()
        );
    }

    Ok(())
}
