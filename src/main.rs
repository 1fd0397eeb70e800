use color_eyre::eyre::Result;
use projectx_ratatui::{app::App, logging, settings::Settings};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (settings, env_file) = Settings::from_env();
    if let Err(e) = logging::init(&settings.data_dir, settings.debug_mode) {
        eprintln!("File logging disabled: {e}");
    }
    env_file.log();
    log::info!(
        "Project X v{} starting, data in {}",
        env!("CARGO_PKG_VERSION"),
        settings.data_dir.display()
    );

    if !settings.completion_configured() {
        log::warn!("VENICE_API_KEY is not set, agents will report that completion is not configured");
    }

    let mut app = App::new(settings)?;
    app.run().await
}
