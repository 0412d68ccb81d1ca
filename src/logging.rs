use log::LevelFilter;

use crate::error::{Error, Result};

/// Route `log` records to stderr. Dependencies only get to speak at `warn` and above,
/// so that debug output stays about the probes rather than connection pools.
pub fn init_logging(level: &str) -> Result<()> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| Error::InvalidParameter(format!("unknown log level '{level}'")))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn.min(level))
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
