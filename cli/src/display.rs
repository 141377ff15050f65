use anyhow::Result;
use console::style;
use std::path::Path;
use termimad::MadSkin;
use tracing::warn;
use tripwise_core::agent::LoopEvent;
use tripwise_core::report::{DayMarkers, PdfOptions, PlanView, TripSummary, check_plan, write_pdf};
use tripwise_core::tools::truncate_chars;

pub const DEFAULT_PDF_PATH: &str = "My_Travel.pdf";

const OBSERVATION_PREVIEW: usize = 240;

pub fn print_event(event: &LoopEvent) {
    match event {
        LoopEvent::Thought(thought) => {
            println!("  {} {}", style("💭").dim(), style(thought.trim()).dim());
        }
        LoopEvent::Action(invocation) => {
            println!(
                "  {} {} {}",
                style("→").cyan(),
                style(invocation.tool).cyan().bold(),
                invocation.input
            );
        }
        LoopEvent::Observation(observation) => {
            let preview = truncate_chars(&observation.replace('\n', " "), OBSERVATION_PREVIEW);
            println!("    {}", style(preview).dim());
        }
        LoopEvent::Correction(reason) => {
            println!("  {} {}", style("!").yellow(), style(reason).yellow());
        }
        LoopEvent::Finished { iterations } => {
            println!(
                "  {} Done after {} iteration(s)",
                style("✓").green(),
                iterations
            );
        }
    }
}

fn print_heading(title: &str) {
    println!();
    println!("{}", style(title).white().bold().underlined());
    println!();
}

fn print_summary(summary: &TripSummary) {
    let cards = [
        ("Destination", &summary.destination),
        ("Period", &summary.period),
        ("Budget", &summary.budget),
        ("Style", &summary.style),
    ];
    for (label, value) in cards {
        println!("  {:<12} {}", style(label).cyan().bold(), value);
    }
    println!(
        "  {:<12} {}",
        style("Weather").yellow().bold(),
        summary.weather
    );
}

/// Results view: summary cards, practical and transport blocks, then one
/// entry per itinerary day. Falls back to the raw answer when no day is found.
pub fn print_plan(plan: &str, markers: &DayMarkers, raw: bool) {
    let skin = MadSkin::default();

    if raw {
        skin.print_text(plan);
        return;
    }

    let check = check_plan(plan, markers);
    if !check.is_well_formed() {
        warn!(problems = ?check.problems(), "plan does not follow the requested layout");
    }

    let view = PlanView::parse(plan, markers);

    println!();
    println!("{}", style("Trip planned successfully!").green().bold());

    print_heading("Trip Summary");
    print_summary(&view.summary);

    if let Some(practical) = view.practical {
        print_heading("Practical Info (Visa, Luggage)");
        skin.print_text(practical);
    }
    if let Some(transport) = view.transport {
        print_heading("Transport & Car");
        skin.print_text(transport);
    }

    print_heading("Itinerary");
    if view.needs_raw_fallback() {
        println!("{}", style("Raw display:").yellow());
        skin.print_text(plan);
        return;
    }

    for day in &view.days {
        println!(
            "{} : {}",
            style(&day.title).magenta().bold(),
            style(&day.subtitle).bold()
        );
        skin.print_text(&day.content);
        println!();
    }
}

pub fn export_pdf(plan: &str, path: &Path) -> Result<()> {
    write_pdf(plan, path, &PdfOptions::stamped())?;
    println!(
        "  {} PDF saved to {}",
        style("✓").green(),
        style(path.display()).cyan()
    );
    Ok(())
}

pub fn print_plan_error(err: &tripwise_core::PlanError) {
    if err.is_incomplete() {
        eprintln!(
            "{} {}",
            style("⚠ Planning incomplete:").yellow().bold(),
            err
        );
        eprintln!(
            "  {}",
            style("Try a more specific request or raise max_iterations in the config.").dim()
        );
    } else {
        eprintln!("{} {}", style("❌ Error:").red().bold(), err);
    }
}
