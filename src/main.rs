mod analysis;
mod data;
mod report;

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use log::{debug, info};

use analysis::config::AnalysisConfig;
use analysis::homogeneity;
use analysis::reconcile;
use data::{groups, loader};

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args_os().nth(1).map(PathBuf::from);
    let table = match &path {
        Some(p) => loader::load_file(p)?,
        None => {
            info!("no input file given, using the bundled example dataset");
            loader::load_example()?
        }
    };
    info!(
        "loaded {} rows, {} columns",
        table.len(),
        table.column_names.len()
    );

    let config = AnalysisConfig::load(path.as_deref())?;
    let (target, grouping) = config.resolve_selection(&table)?;
    info!("target variable '{target}', grouping variables {grouping:?}");

    println!("{}", report::render_head(&table, 5));

    let recon = reconcile::reconcile(&table, &target, &grouping, &config)?;
    println!();
    if recon.is_empty() {
        println!("No outliers detected");
    } else {
        println!("Outliers ({} rows flagged):", recon.flagged_indices().len());
        println!("{}", report::render_outliers(&recon, &grouping, &target));
    }
    debug!("outlier report: {}", report::to_json(&recon)?);

    let rows = if config.exclude_outliers {
        let kept = recon.cleaned_indices(&table);
        println!();
        println!(
            "Outliers excluded: {} of {} rows kept for testing",
            kept.len(),
            table.len()
        );
        kept
    } else {
        groups::all_indices(&table)
    };

    for group in &grouping {
        let samples = groups::grouped_samples_in(&table, &rows, &target, group);
        println!();
        println!("Homogeneity of '{target}' across '{group}':");
        let outcomes = homogeneity::run_all(&samples);
        if outcomes.is_empty() {
            println!("  not enough data in the groups to run the tests");
            continue;
        }
        println!("{}", report::render_tests(&outcomes));
    }

    Ok(())
}
