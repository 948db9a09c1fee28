use crate::errors::{MmsError, MmsResult};
use chrono::Local;
use log::{LevelFilter, debug};
use simplelog::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Level filter named by a `[logging] level` value.
pub fn level_filter(level: &str) -> MmsResult<LevelFilter> {
    match level {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" => Ok(LevelFilter::Off),
        _ => Err(MmsError::Config(format!(
            "loglevel must be debug, info, warn, error or off, got '{}'",
            level
        ))),
    }
}

/// Log file used when none is configured, stamped with the start time.
pub fn default_log_file() -> PathBuf {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from(format!("log_{}.txt", date_and_time))
}

/// Installs a terminal logger and a file logger and returns whether they were installed.
/// A logger installed earlier stays in place.
pub fn init_logger(level: &str, file: Option<&Path>) -> MmsResult<bool> {
    let log_option = level_filter(level)?;
    if log_option == LevelFilter::Off {
        return Ok(false);
    }
    let path = file.map_or_else(default_log_file, Path::to_path_buf);
    let log_file = File::create(&path).map_err(|e| MmsError::io(&path, e))?;
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(log_option, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(log_option, Config::default(), log_file),
    ];
    if let Err(e) = CombinedLogger::init(loggers) {
        // already installed, e.g. by an earlier study in the same process
        debug!("logger kept from an earlier set-up: {}", e);
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(level_filter("off").unwrap(), LevelFilter::Off);
        assert!(matches!(level_filter("verbose"), Err(MmsError::Config(_))));
    }

    #[test]
    fn test_default_log_file_is_stamped() {
        let name = default_log_file().to_string_lossy().into_owned();
        assert!(name.starts_with("log_20"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_init_twice_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mms.log");
        init_logger("warn", Some(&path)).unwrap();
        // whichever test installs the global logger first, a later call keeps it
        assert!(!init_logger("warn", Some(&path)).unwrap());
        assert!(path.exists());
        assert!(!init_logger("off", None).unwrap());
    }
}
