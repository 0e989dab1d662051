//! pima-explorer - Main Entry Point
//!
//! Runs the full clustering analysis by default.

use clap::Parser;
use pima_explorer::cli::{
    cmd_cluster, cmd_info, cmd_preprocess, cmd_run, Cli, Commands, DataArgs,
};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pima_explorer=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            data,
            min_clusters,
            max_clusters,
            min_m,
            max_m,
            plot_dir,
            no_plot,
            skip_preprocess,
            report,
        }) => {
            cmd_run(
                &data,
                min_clusters,
                max_clusters,
                min_m,
                max_m,
                plot_dir.as_deref(),
                no_plot,
                skip_preprocess,
                report.as_deref(),
            )?;
        }
        Some(Commands::Preprocess { data }) => {
            cmd_preprocess(&data)?;
        }
        Some(Commands::Cluster { data, algorithm, clusters, m }) => {
            cmd_cluster(&data, algorithm, clusters, m)?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        None => {
            // Default: full analysis with the built-in configuration
            cmd_run(&DataArgs::default(), None, None, None, None, None, false, false, None)?;
        }
    }

    Ok(())
}
