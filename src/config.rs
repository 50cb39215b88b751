use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".component-librarian";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "components.sqlite";
/// Log file written next to the database; the terminal belongs to the UI.
const LOG_FILE_NAME: &str = "components.log";
/// Environment variable that relocates the database when no flag is given.
pub const DATABASE_ENV: &str = "COMPONENT_LIBRARIAN_DB";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: PathBuf,
    pub log_file: PathBuf,
    pub verbose: bool,
}

/// Values supplied explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    /// Resolve settings from flags, then `COMPONENT_LIBRARIAN_DB`, then the
    /// home-directory default.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        Self::resolve_with(overrides, std::env::var_os(DATABASE_ENV), default_database)
    }

    fn resolve_with(
        overrides: Overrides,
        env_database: Option<OsString>,
        fallback: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let database = match (overrides.database, env_database) {
            (Some(path), _) => path,
            (None, Some(value)) if !value.is_empty() => PathBuf::from(value),
            _ => fallback()?,
        };

        let log_file = overrides
            .log_file
            .unwrap_or_else(|| database.with_file_name(LOG_FILE_NAME));

        Ok(Self {
            database,
            log_file,
            verbose: overrides.verbose,
        })
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_database() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> Result<PathBuf> {
        Ok(PathBuf::from("/home/user").join(DATA_DIR_NAME).join(DB_FILE_NAME))
    }

    #[test]
    fn flag_beats_environment() {
        let config = Config::resolve_with(
            Overrides {
                database: Some(PathBuf::from("/tmp/flag.sqlite")),
                ..Overrides::default()
            },
            Some(OsString::from("/tmp/env.sqlite")),
            fallback,
        )
        .unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/flag.sqlite"));
        assert_eq!(config.log_file, PathBuf::from("/tmp").join(LOG_FILE_NAME));
    }

    #[test]
    fn environment_beats_default() {
        let config = Config::resolve_with(
            Overrides::default(),
            Some(OsString::from("/srv/lib.sqlite")),
            fallback,
        )
        .unwrap();
        assert_eq!(config.database, PathBuf::from("/srv/lib.sqlite"));
    }

    #[test]
    fn blank_environment_falls_back_to_home() {
        let config = Config::resolve_with(
            Overrides {
                log_file: Some(PathBuf::from("/var/log/lib.log")),
                verbose: true,
                ..Overrides::default()
            },
            Some(OsString::new()),
            fallback,
        )
        .unwrap();
        assert_eq!(config.database, fallback().unwrap());
        assert_eq!(config.log_file, PathBuf::from("/var/log/lib.log"));
        assert!(config.verbose);
    }
}
