use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tripwise_core::config;

mod display;
mod onboard;
mod planner;
mod session;

use planner::Planner;

#[derive(Parser)]
#[command(name = "tripwise")]
#[command(about = "tripwise - Autonomous travel planner", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure provider, model and tool keys
    Onboard,
    /// Plan one trip and exit
    Plan {
        /// Free-text trip request
        request: Option<String>,
        /// Use the built-in example request
        #[arg(long, conflicts_with = "request")]
        demo: bool,
        /// Also save the plan as PDF
        #[arg(long, value_name = "PATH")]
        pdf: Option<PathBuf>,
        /// Print the answer as returned, without the results view
        #[arg(long)]
        raw: bool,
        /// Hide reasoning progress
        #[arg(short, long)]
        quiet: bool,
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Interactive planning session
    Session,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn onboard() -> Result<()> {
    let onboard_config = onboard::run_onboard().map_err(|e| {
        eprintln!("❌ Onboarding failed: {}", e);
        anyhow::anyhow!("Onboarding failed: {}", e)
    })?;
    config::save_config(&onboard_config)
}

async fn plan_once(
    request: Option<String>,
    demo: bool,
    pdf: Option<PathBuf>,
    raw: bool,
    quiet: bool,
    max_iterations: Option<usize>,
) -> Result<()> {
    let request = match (request, demo) {
        (_, true) => session::DEMO_REQUEST.to_string(),
        (Some(request), false) if !request.trim().is_empty() => request,
        _ => anyhow::bail!("No trip request given. Pass one as an argument or use --demo."),
    };

    let config = config::load_config()?;
    let mut planner = Planner::from_config(&config, max_iterations, !quiet)?;

    if !quiet {
        println!("{}", style("🧭 Analysis and search in progress...").cyan());
    }
    let plan = match planner.plan(&request).await {
        Ok(plan) => plan,
        Err(e) => {
            display::print_plan_error(&e);
            return Err(e).context("Planning failed");
        }
    };

    display::print_plan(&plan, &planner.markers, raw);

    if let Some(path) = pdf {
        display::export_pdf(&plan, &path)?;
    }
    Ok(())
}

async fn interactive() -> Result<()> {
    let config = config::load_config()?;
    let mut planner = Planner::from_config(&config, None, true)?;
    session::run(&mut planner).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Session
        }
    });

    match command {
        Commands::Onboard => onboard(),
        Commands::Plan {
            request,
            demo,
            pdf,
            raw,
            quiet,
            max_iterations,
        } => plan_once(request, demo, pdf, raw, quiet, max_iterations).await,
        Commands::Session => interactive().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_flags() {
        let cli = Cli::parse_from(["tripwise", "-v", "plan", "--demo", "--pdf", "ny.pdf", "--quiet"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Plan { demo, pdf, quiet, raw, .. }) => {
                assert!(demo);
                assert!(quiet);
                assert!(!raw);
                assert_eq!(pdf, Some(PathBuf::from("ny.pdf")));
            }
            _ => panic!("expected plan command"),
        }
    }

    #[test]
    fn demo_conflicts_with_request() {
        let result = Cli::try_parse_from(["tripwise", "plan", "Rome", "--demo"]);
        assert!(result.is_err());
    }
}
