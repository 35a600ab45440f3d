//! Approve command - freeze a completed review into a correction plan.

use std::path::PathBuf;

use colored::Colorize;
use curator::ReviewSession;

pub fn run(file: PathBuf, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Session file not found: {}", file.display()).into());
    }

    let mut session = ReviewSession::load(&file)?;
    let plan = session.approve()?;

    // <stem>.session.json -> <stem>.plan.json
    let output_path = output.unwrap_or_else(|| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        let stem = name
            .strip_suffix(".session.json")
            .or_else(|| name.strip_suffix(".json"))
            .unwrap_or(&name);
        file.with_file_name(format!("{}.plan.json", stem))
    });

    plan.save(&output_path)?;
    session.save(&file)?;

    let summary = plan.summary();
    println!(
        "{} {}",
        "Plan saved to".green().bold(),
        output_path.display().to_string().white()
    );
    println!(
        "  {} change(s) across {} entity(ies); {} rejected, {} skipped",
        summary.changes().to_string().white().bold(),
        plan.touched_entities().len(),
        summary.rejected,
        summary.skipped
    );

    let terms = plan.new_terms();
    if !terms.is_empty() {
        println!();
        println!("{}", "Proposed new vocabulary terms:".yellow().bold());
        for term in &terms {
            println!("  {} {}: '{}'", "•".dimmed(), term.property.cyan(), term.value);
        }
    }

    println!();
    println!(
        "Run {} to apply it",
        format!("curator apply {} --table <FILE>", output_path.display())
            .cyan()
            .bold()
    );

    Ok(())
}
