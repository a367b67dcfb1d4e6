//! Lint command - check a meta info file and values against it

use console::style;
use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_meta_info, load_values};
use crate::error::CliError;

pub fn run(metainfo: &Path, values_files: &[PathBuf], strict: bool) -> Result<()> {
    println!(
        "{} Linting meta info at {}",
        style("→").blue(),
        metainfo.display()
    );

    let meta_info = load_meta_info(metainfo)?;
    let report = meta_info.lint();

    let errors = report.issues.len();
    let mut warnings = 0;

    if report.is_clean() {
        println!(
            "  {} Meta info is valid ({} value check(s))",
            style("✓").green(),
            report.checks.len()
        );
    } else {
        for issue in &report.issues {
            println!("  {} {}", style("✗").red(), issue);
        }
    }

    if !values_files.is_empty() {
        println!();
        println!("{} Checking values against meta info...", style("→").blue());

        let values = load_values(values_files, &[])?;
        let issues = report.check_values(values.inner());

        if issues.is_empty() {
            println!("  {} Values match the meta info", style("✓").green());
        } else {
            for issue in &issues {
                println!("  {} {}", style("⚠").yellow(), issue);
            }
            warnings = issues.len();
        }
    }

    // Summary
    println!();
    if errors > 0 || (strict && warnings > 0) {
        println!(
            "{} Linting failed with {} error(s) and {} warning(s)",
            style("✗").red().bold(),
            errors,
            warnings
        );
        return Err(CliError::lint_failed(errors, warnings).into());
    } else if warnings > 0 {
        println!(
            "{} Linting passed with {} warning(s)",
            style("⚠").yellow().bold(),
            warnings
        );
    } else {
        println!("{} Linting passed!", style("✓").green().bold());
    }

    Ok(())
}
