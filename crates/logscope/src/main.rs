mod bootstrap;
mod summary;

use anyhow::Result;
use bootstrap::LogTarget;
use logscope_core::error::LogScopeError;
use logscope_core::settings::Settings;
use logscope_core::time_utils::resolve_timezone;
use logscope_data::{load_file, IngestOptions};
use logscope_runtime::{LogLoader, Session};
use logscope_ui::{App, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    let target = if settings.summary {
        LogTarget::Stderr
    } else {
        let logs_dir = bootstrap::ensure_directories()?;
        LogTarget::File(
            settings
                .log_file
                .clone()
                .unwrap_or_else(|| bootstrap::default_log_file(&logs_dir)),
        )
    };
    bootstrap::setup_logging(&settings.log_level, &target)?;

    tracing::info!("logscope v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Timezone: {}, Theme: {}, Marker delay: {} ms",
        settings.timezone,
        settings.theme,
        settings.marker_delay_ms
    );

    let options = IngestOptions::new(resolve_timezone(&settings.timezone))
        .with_x_column(settings.x_column.clone());

    if settings.summary {
        return print_summary(&settings, &options);
    }

    let (loader, rx) = LogLoader::new(options);
    let mut app = App::new(
        AppConfig {
            theme: settings.theme.clone(),
            timezone: settings.timezone.clone(),
            window: settings.window,
            channels: settings.channels.clone(),
            marker_delay: settings.marker_delay(),
        },
        loader,
    );
    if let Some(file) = settings.file.clone() {
        app.open(file);
    }

    // Raw mode delivers Ctrl+C as a key event; the loop exits on it and on 'q'.
    app.run(rx).await?;
    tracing::info!("logscope exiting");

    Ok(())
}

fn print_summary(settings: &Settings, options: &IngestOptions) -> Result<()> {
    let path = settings
        .file
        .as_ref()
        .ok_or_else(|| LogScopeError::Config("--summary needs a log file".to_string()))?;
    let log = load_file(path, options)?;
    let session = Session::new(log, settings.window).with_selection(&settings.channels)?;
    println!("{}", summary::to_json(&session)?);
    Ok(())
}
