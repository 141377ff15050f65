use crate::display;
use crate::planner::Planner;
use anyhow::{Context, Result};
use console::style;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tracing::debug;
use tripwise_core::config::{ensure_tripwise_dir, get_history_path};

pub const DEMO_REQUEST: &str = "I want to go to New York for Christmas (December 20 to 27) with my fiancée. \
Comfortable budget. We like museums, gastronomy, and seeing snow. \
Find me flights, a nice hotel, and romantic activities.";

/// Request text and last plan for one interactive user.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanningSession {
    pub input_text: String,
    pub plan_result: Option<String>,
}

impl PlanningSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.input_text.clear();
        self.plan_result = None;
    }

    pub fn fill_demo(&mut self) {
        self.input_text = DEMO_REQUEST.to_string();
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    pub fn set_plan(&mut self, plan: impl Into<String>) {
        self.plan_result = Some(plan.into());
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan_result.as_deref()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Plan,
    Demo,
    Reset,
    Show,
    Pdf(Option<PathBuf>),
    Help,
    Quit,
    Unknown(String),
    Request(String),
}

fn parse_command(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Request(line.to_string());
    };

    let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let arg = arg.trim();
    match name.to_lowercase().as_str() {
        "plan" => Command::Plan,
        "demo" => Command::Demo,
        "reset" => Command::Reset,
        "show" => Command::Show,
        "pdf" => Command::Pdf((!arg.is_empty()).then(|| PathBuf::from(arg))),
        "help" | "h" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(name.to_string()),
    }
}

fn print_help() {
    println!("  {:16} Plan the current request", style(":plan").yellow());
    println!("  {:16} Fill in an example request", style(":demo").yellow());
    println!("  {:16} Clear the request and the plan", style(":reset").yellow());
    println!("  {:16} Show the last plan again", style(":show").yellow());
    println!(
        "  {:16} Save the last plan as PDF (default {})",
        style(":pdf [PATH]").yellow(),
        display::DEFAULT_PDF_PATH
    );
    println!("  {:16} Leave", style(":quit").yellow());
    println!("  Anything else is taken as a trip request.");
}

async fn run_plan(session: &mut PlanningSession, planner: &mut Planner) {
    if session.input_text.trim().is_empty() {
        println!("{}", style("Nothing to plan yet. Describe your trip or use :demo.").yellow());
        return;
    }

    println!();
    println!("{}", style("🧭 Analysis and search in progress...").cyan());
    match planner.plan(&session.input_text).await {
        Ok(plan) => {
            display::print_plan(&plan, &planner.markers, false);
            session.set_plan(plan);
        }
        Err(e) => display::print_plan_error(&e),
    }
}

pub async fn run(planner: &mut Planner) -> Result<()> {
    let mut rl = DefaultEditor::new().context("Failed to initialize line editor")?;
    let history_path = ensure_tripwise_dir().map(|_| get_history_path()).ok();
    if let Some(path) = &history_path
        && rl.load_history(path).is_err()
    {
        debug!(path = %path.display(), "no readline history yet");
    }

    let mut session = PlanningSession::new();

    println!("{}", style("🧭 Tripwise, autonomous travel planner").cyan().bold());
    println!(
        "{}",
        style("Describe your trip (Ctrl+D to exit, :help for commands).").dim()
    );
    println!();

    loop {
        let line = match rl.readline(&format!("{} ", style(">").green())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        match parse_command(line) {
            Command::Request(text) => {
                session.set_input(text);
                run_plan(&mut session, planner).await;
            }
            Command::Plan => run_plan(&mut session, planner).await,
            Command::Demo => {
                session.fill_demo();
                println!("{}", style(&session.input_text).dim());
                println!("{}", style("Type :plan to start planning.").dim());
            }
            Command::Reset => {
                session.reset();
                println!("{}", style("Session cleared.").dim());
            }
            Command::Show => match session.plan() {
                Some(plan) => display::print_plan(plan, &planner.markers, false),
                None => println!("{}", style("No plan yet.").yellow()),
            },
            Command::Pdf(path) => match session.plan() {
                Some(plan) => {
                    let path = path.unwrap_or_else(|| PathBuf::from(display::DEFAULT_PDF_PATH));
                    if let Err(e) = display::export_pdf(plan, &path) {
                        eprintln!("{} {:#}", style("❌ Error:").red().bold(), e);
                    }
                }
                None => println!("{}", style("No plan to export yet.").yellow()),
            },
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(name) => {
                println!("{} :{}", style("Unknown command").yellow(), name);
                print_help();
            }
        }
        println!();
    }

    if let Some(path) = &history_path
        && let Err(e) = rl.save_history(path)
    {
        debug!(error = %e, "could not save readline history");
    }
    println!("\n👋 Goodbye!");
    Ok(())
}
