// UI layer: the terminal rendition of the analysis form, built on
// `dialoguer`. The menu loop owns the `FormState` and passes it to the
// submission controller; each submission is driven to completion on the
// caller's single-threaded runtime.

use crate::api::{LocalTransport, Outcome};
use crate::form::{validate, FormState, OutcomeKind};
use crate::submit::{Settlement, SubmissionController, SubmitRejected};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Main interactive menu. Runs until the user chooses "Exit".
pub fn main_menu<T: LocalTransport>(
    controller: &SubmissionController<T>,
    runtime: &Runtime,
) -> Result<()> {
    let mut form = FormState::new();
    println!("{}", "Financial Analysis".bold());

    loop {
        show_fields(&form);
        let items = vec![
            "Set config path",
            "Set base directory",
            "Run analysis",
            "Exit",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                let value = prompt_field("Config path", form.config_path())?;
                form.set_config_path(value);
            }
            1 => {
                let value = prompt_field("Base directory", form.base_dir())?;
                form.set_base_dir(value);
            }
            2 => {
                // Required-field check happens here so an empty form never
                // reaches the controller.
                if let Err(reason) = validate(&form) {
                    println!("{}", reason.to_string().yellow());
                    continue;
                }
                run_analysis(&mut form, controller, runtime)?;
            }
            3 => break,
            _ => {}
        }
    }
    Ok(())
}

fn show_fields(form: &FormState) {
    println!();
    println!("  Config path:    {}", display_or_placeholder(form.config_path()));
    println!("  Base directory: {}", display_or_placeholder(form.base_dir()));
}

fn display_or_placeholder(value: &str) -> String {
    if value.is_empty() {
        "(required)".dark_grey().to_string()
    } else {
        value.to_string()
    }
}

/// Prompt for a field, pre-filled with its current value.
fn prompt_field(prompt: &str, current: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?;
    Ok(value)
}

fn run_analysis<T: LocalTransport>(
    form: &mut FormState,
    controller: &SubmissionController<T>,
    runtime: &Runtime,
) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").context("Invalid spinner template")?,
    );
    spinner.set_message("Running analysis... (Ctrl-C to cancel)");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let cancel = async {
        // If the handler can't be installed, just wait for the transport.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let result = runtime.block_on(controller.submit_until(form, cancel));
    spinner.finish_and_clear();

    match result {
        Ok(Settlement::Applied(outcome)) => show_message(form, &outcome),
        Ok(Settlement::Cancelled) => println!("{}", "Analysis cancelled".yellow()),
        Ok(Settlement::Stale) => {}
        Err(SubmitRejected::InFlight) => {
            println!("{}", "An analysis is already running".yellow())
        }
        Err(SubmitRejected::Invalid(reason)) => println!("{}", reason.to_string().yellow()),
    }
    Ok(())
}

fn show_message(form: &FormState, outcome: &Outcome) {
    let message = form.message();
    match form.last_outcome() {
        Some(OutcomeKind::Succeeded) => println!("{}", message.green()),
        Some(OutcomeKind::Failed) => println!("{}", message.red()),
        None => println!("{message}"),
    }
    if let Ok(response) = outcome {
        if let Some(path) = &response.output_path {
            println!("Results written to {path}");
        }
    }
}
