// Entrypoint for the analysis form.
// - Starts file logging and loads client config (file + environment).
// - Builds the HTTP transport and a single-threaded runtime, then hands
//   both to the UI loop.

use analysis_form::{
    api::HttpTransport, config::ClientConfig, logging, submit::SubmissionController, ui::main_menu,
};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    if let Err(e) = logging::init() {
        eprintln!("Logging disabled: {e:#}");
    }
    let config = ClientConfig::load().context("Failed to load configuration")?;

    let transport = HttpTransport::new().context("Failed to build HTTP client")?;
    let controller = SubmissionController::new(transport, &config.base_url)
        .with_timeout(config.timeout)
        .with_policy(config.flight_policy);
    tracing::info!(url = controller.url(), timeout = ?config.timeout, "controller ready");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    // Blocks until the user picks "Exit".
    main_menu(&controller, &runtime)?;
    Ok(())
}
