//! Review command - decide discrepancies one at a time in the console.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use curator::curation::{plan_path, session_path};
use curator::{Curator, CuratorConfig, Discrepancy, ReviewAction, ReviewSession};

pub fn run(
    file: PathBuf,
    schema: String,
    session: Option<PathBuf>,
    plan: Option<PathBuf>,
    config: CuratorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let session_file = session.unwrap_or_else(|| session_path(&file));
    let plan_file = plan.unwrap_or_else(|| plan_path(&file));

    // Resume an earlier review, or start one
    let mut session = if session_file.exists() {
        println!(
            "{} {}",
            "Resuming review from".cyan().bold(),
            session_file.display().to_string().white()
        );
        ReviewSession::load(&session_file)?
    } else {
        if !file.exists() {
            return Err(format!("File not found: {}", file.display()).into());
        }
        println!(
            "{} {}",
            "Checking".cyan().bold(),
            file.display().to_string().white()
        );
        Curator::with_config(config).review(&file, &schema)?
    };

    if session.is_approved() {
        println!(
            "{} This review has already been approved. Run {} to apply it.",
            "Note:".yellow(),
            format!("curator apply {} --table {}", plan_file.display(), file.display()).cyan()
        );
        return Ok(());
    }

    for unmapped in session.unmapped() {
        println!(
            "{} column '{}' skipped: {}",
            "Warning:".yellow(),
            unmapped.column,
            unmapped.reason
        );
    }

    let total = session.list_discrepancies(None).len();
    if total == 0 {
        println!("{}", "No discrepancies found - nothing to review.".green());
        return Ok(());
    }

    println!();
    println!(
        "Commands: {} accept top, {} pick suggestion, {} override, {} reject, {} skip, {} back, {} quit",
        "a".bold(),
        "1-9".bold(),
        "o".bold(),
        "r".bold(),
        "s".bold(),
        "b".bold(),
        "q".bold()
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut history: Vec<String> = Vec::new();

    while let Some(discrepancy) = session.next_pending().cloned() {
        let decided = session.summary().decided();
        show_discrepancy(&discrepancy, decided + 1, total);

        let Some(line) = prompt(&mut input, "> ")? else {
            return quit(&session, &session_file);
        };

        let outcome = match line.as_str() {
            "q" | "quit" => return quit(&session, &session_file),
            "b" | "back" => {
                match history.pop() {
                    Some(previous) => {
                        session.reopen(&previous)?;
                    }
                    None => println!("{}", "Nothing to go back to.".yellow()),
                }
                continue;
            }
            "" => session.accept(&discrepancy.id).map(|_| ()),
            choice if choice.parse::<usize>().is_ok() => {
                let index = choice.parse::<usize>().unwrap_or(0);
                match index.checked_sub(1).and_then(|i| discrepancy.suggestions.get(i)) {
                    Some(suggestion) => session
                        .decide(&discrepancy.id, ReviewAction::Accept, Some(&suggestion.value))
                        .map(|_| ()),
                    None => {
                        println!("{} No suggestion #{}", "Invalid:".red(), choice);
                        continue;
                    }
                }
            }
            other => match other.parse::<ReviewAction>() {
                Ok(ReviewAction::Override) => {
                    let Some(value) = prompt(&mut input, "New value (empty clears the cell): ")?
                    else {
                        return quit(&session, &session_file);
                    };
                    session.override_value(&discrepancy.id, &value).map(|_| ())
                }
                Ok(action) => session.decide(&discrepancy.id, action, None).map(|_| ()),
                Err(e) => {
                    println!("{} {}", "Invalid:".red(), e);
                    continue;
                }
            },
        };

        match outcome {
            Ok(()) => history.push(discrepancy.id.clone()),
            Err(e) => println!("{} {}", "Invalid:".red(), e),
        }
    }

    // Every discrepancy is decided
    let summary = session.summary();
    println!();
    println!(
        "{} {} accepted, {} overridden, {} rejected, {} skipped",
        "Review complete:".green().bold(),
        summary.accepted.to_string().green(),
        summary.overridden.to_string().blue(),
        summary.rejected.to_string().red(),
        summary.skipped.to_string().dimmed()
    );

    let answer = prompt(
        &mut input,
        &format!("Approve and write the plan to {}? [y/N] ", plan_file.display()),
    )?;

    if matches!(answer.as_deref(), Some("y") | Some("yes")) {
        let plan = session.approve()?;
        plan.save(&plan_file)?;
        session.save(&session_file)?;

        println!(
            "{} {}",
            "Plan saved to".green().bold(),
            plan_file.display().to_string().white()
        );
        for term in plan.new_terms() {
            println!(
                "  {} new term for {}: '{}'",
                "•".dimmed(),
                term.property.cyan(),
                term.value
            );
        }
        println!(
            "Run {} to apply it",
            format!("curator apply {} --table {}", plan_file.display(), file.display())
                .cyan()
                .bold()
        );
    } else {
        session.save(&session_file)?;
        println!(
            "Session saved. Run {} when ready.",
            format!("curator approve {}", session_file.display()).cyan().bold()
        );
    }

    Ok(())
}

fn show_discrepancy(discrepancy: &Discrepancy, position: usize, total: usize) {
    println!();
    println!(
        "{} column {} value {} ({} cell(s), {})",
        format!("[{}/{}]", position, total).dimmed(),
        discrepancy.column.cyan().bold(),
        format!("'{}'", discrepancy.value).white().bold(),
        discrepancy.count,
        discrepancy.kind.label()
    );

    if discrepancy.suggestions.is_empty() {
        println!("  {}", "No suggestions - override with a value, reject or skip.".yellow());
    }
    for (i, suggestion) in discrepancy.suggestions.iter().enumerate() {
        println!(
            "  {} {:30} {:.2}  {}",
            format!("{}.", i + 1).bold(),
            suggestion.value,
            suggestion.confidence,
            suggestion.rationale.dimmed()
        );
    }
}

/// Print a prompt and read one trimmed line. `None` at end of input.
fn prompt(input: &mut impl BufRead, message: &str) -> io::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn quit(session: &ReviewSession, session_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    session.save(session_file)?;
    let summary = session.summary();
    println!();
    println!(
        "{} {} ({} of {} decided)",
        "Session saved to".yellow().bold(),
        session_file.display().to_string().white(),
        summary.decided(),
        summary.total()
    );
    Ok(())
}
