use crate::routines::output::OutputFile;
use crate::routines::settings::Settings;
use eyre::{eyre, Result};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Setup logging for the library
///
/// This function sets up logging for the library. It uses the `tracing` crate, and the `tracing-subscriber` crate for formatting.
///
/// The log level is defined in the configuration file, and defaults to `INFO`.
///
/// If output is enabled, the log is also written to `log.file` inside the output folder.
///
/// Returns an error instead of panicking if a global subscriber is already set.
pub fn setup_log(settings: &Settings) -> Result<()> {
    // Use the log level defined in configuration file
    let env_filter = EnvFilter::try_new(settings.log.level.as_str())
        .map_err(|e| eyre!("Invalid log level '{}': {}", settings.log.level, e))?;

    // Define a registry with that level as an environment filter
    let subscriber = Registry::default().with(env_filter);

    // Define layer for file
    let file_layer = if settings.output.write {
        let outputfile = OutputFile::new(&settings.output.path, &settings.log.file)?;
        Some(
            fmt::layer()
                .with_writer(outputfile.file_owned())
                .with_ansi(false)
                .with_timer(CompactTimestamp),
        )
    } else {
        None
    };

    // Define layer for stdout
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(CompactTimestamp);

    // Combine layers with subscriber
    subscriber
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| eyre!("Failed to set the global subscriber: {}", e))?;

    tracing::debug!("Logging initialized at level {}", settings.log.level);
    Ok(())
}

#[derive(Clone, Copy)]
struct CompactTimestamp;

impl FormatTime for CompactTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> Result<(), std::fmt::Error> {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S"))
    }
}
