//! Probes which providers and models are usable with the credentials in the
//! environment.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use polyllm::core::{CallOutput, ConfigSnapshot, Error, ProviderKind};
use polyllm::probe::{self, ProbeOptions, ProbeReport};

const BAR_CHAR: &str = "▎";

#[derive(Parser, Debug)]
#[command(name = "polyllm", version, about)]
struct Args {
    /// Provider to probe (openai, groq, gemini, ollama). Repeatable.
    #[arg(long = "provider", value_name = "P")]
    providers: Vec<ProviderKind>,

    /// Model to probe instead of the default matrix.
    #[arg(long, value_name = "M")]
    model: Option<String>,

    /// Also request 65000 output tokens and print the budget actually used.
    #[arg(long)]
    large_output: bool,

    /// Also send this prompt and print the reply.
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ConfigSnapshot::from_env();
    let options = ProbeOptions {
        large_output: args.large_output,
        prompt: args.prompt,
    };

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let mut failures = 0;
    for target in probe::select_targets(&args.providers, args.model.as_deref())
    {
        let name = format!("{}/{}", target.provider, target.model);
        let Some(provider) = probe::build_provider(&target, &config) else {
            println!(
                "{}{} {}",
                BAR_CHAR.bright_black(),
                name.bright_white(),
                "skipped (no credential)".bright_black()
            );
            continue;
        };

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message(format!("Probing {name}..."));
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        let report = probe::run(&provider, &options).await;
        progress_bar.finish_and_clear();

        if !report.passed() {
            failures += 1;
        }
        print_report(&name, &report);
    }

    if failures > 0 {
        eprintln!("{failures} probe(s) failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn print_report(name: &str, report: &ProbeReport) {
    match report.connection.error() {
        None => println!(
            "{}{} {}",
            BAR_CHAR.bright_green(),
            name.bright_white().bold(),
            "ok".bright_green()
        ),
        Some(err) => {
            println!(
                "{}{} {}",
                BAR_CHAR.bright_red(),
                name.bright_white().bold(),
                "failed".bright_red()
            );
            print_error(err);
            return;
        }
    }

    if let Some(result) = &report.large_output {
        match result {
            Ok(output) => println!(
                "{}large output: {} chars, max_completion_tokens {}{}",
                BAR_CHAR.bright_cyan(),
                output.content.len(),
                output.max_completion_tokens,
                clamp_note(output)
            ),
            Err(err) => print_error(err),
        }
    }

    if let Some(result) = &report.reply {
        match result {
            Ok(output) => println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                output.content.bright_white()
            ),
            Err(err) => print_error(err),
        }
    }
}

fn print_error(err: &Error) {
    println!("{}{}", BAR_CHAR.bright_red(), err.to_string().red());
}

fn clamp_note(output: &CallOutput) -> String {
    if output.was_clamped() {
        format!(" (clamped from {})", output.requested_max_completion_tokens)
    } else {
        String::new()
    }
}
