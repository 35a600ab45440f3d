//! Apply command - apply an approved plan and write the corrected table.

use std::path::PathBuf;

use colored::Colorize;
use curator::{CorrectionPlan, Curator, CuratorConfig};
use tokio_util::sync::CancellationToken;

pub fn run(
    file: PathBuf,
    table: PathBuf,
    output: Option<PathBuf>,
    concurrency: Option<usize>,
    json_output: bool,
    mut config: CuratorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Plan file not found: {}", file.display()).into());
    }
    if !table.exists() {
        return Err(format!("File not found: {}", table.display()).into());
    }

    if let Some(n) = concurrency {
        if n == 0 {
            return Err("--concurrency must be at least 1".into());
        }
        config.apply = config.apply.with_concurrency(n);
    }

    // Rejected before any write if a decision is still pending
    let plan = CorrectionPlan::load(&file)?;
    plan.ensure_frozen()?;

    let curator = Curator::with_config(config);
    let (snapshot, source) = curator.load_table(&table)?;

    if let Some(reviewed) = plan.source() {
        if reviewed.hash != source.hash {
            eprintln!(
                "{} {} changed since it was reviewed; edited cells will be reported as conflicts.",
                "Warning:".yellow().bold(),
                table.display()
            );
        }
    }

    let entities = plan.touched_entities().len();
    if entities == 0 {
        println!("{} The plan changes no cells.", "Note:".yellow());
        return Ok(());
    }

    if !json_output {
        println!(
            "{} corrections to {} entity(ies) ({} in flight)",
            "Applying".cyan().bold(),
            entities.to_string().white().bold(),
            curator.config().apply.concurrency
        );
        println!("Press {} to stop dispatching", "Ctrl+C".yellow().bold());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let cancel = CancellationToken::new();
    let (report, corrected) = runtime.block_on(async {
        // Set up Ctrl+C handler
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!();
                eprintln!("{}", "Cancelling remaining updates...".yellow());
                watcher.cancel();
            }
        });

        curator.apply_to_table(&plan, snapshot, cancel.clone()).await
    })?;

    // Determine output path
    let output_path = output.unwrap_or_else(|| {
        let stem = table.file_stem().unwrap_or_default().to_string_lossy();
        let ext = table
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "tsv".to_string());
        table.with_file_name(format!("{}_curated.{}", stem, ext))
    });
    corrected.write_file(&output_path)?;

    // Failed and cancelled entities can be re-run from a narrowed plan
    let failed = report.failed_entities();
    let retry_path = (!failed.is_empty()).then(|| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        let stem = name.strip_suffix(".plan.json").unwrap_or(&name).to_string();
        file.with_file_name(format!("{}.retry.plan.json", stem))
    });
    if let Some(path) = &retry_path {
        plan.restricted_to(&failed).save(path)?;
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    for result in report.results.iter().filter(|r| !r.success) {
        println!(
            "  {} {} {}",
            "✗".red(),
            result.entity.white(),
            result.error_detail().unwrap_or_default().dimmed()
        );
    }

    println!(
        "{} {} succeeded, {} failed, {} cancelled",
        "Done:".green().bold(),
        report.succeeded().to_string().green(),
        (report.failed() - report.cancelled()).to_string().red(),
        report.cancelled().to_string().yellow()
    );
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    if let Some(path) = retry_path {
        println!(
            "Run {} to retry the failed entities",
            format!("curator apply {} --table {}", path.display(), output_path.display())
                .cyan()
                .bold()
        );
    }

    Ok(())
}
