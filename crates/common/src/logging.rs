use error_stack::{Report, ResultExt};
use log::LevelFilter;

use crate::error::AdapterError;

/// Initialize logging for the application.
///
/// Should be called once at the start of `main()`. Records are written to
/// stderr with an RFC 3339 timestamp and their level.
///
/// # Errors
///
/// Returns [`AdapterError::Configuration`] if a global logger is already set.
pub fn init_logging(level: LevelFilter) -> Result<(), Report<AdapterError>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .change_context(AdapterError::Configuration {
            message: "Failed to initialize logger".to_string(),
        })
}
