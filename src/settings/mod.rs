//! audioconf settings handling
//!
//! The console keeps a single `audioconf.toml` which points it at the
//! persisted environment (the envars file every zynthian service
//! sources) and at the flag files used to request updates and reboots.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let s = Settings::init(Settings::default_path())?;
//! println!("{:?}", s.app().env_file);
//! ```
//!
//! A missing or broken file is replaced by the defaults, and
//! [`sync()`](Settings::sync) writes the tree back.

mod app;
pub use app::AppSettings;

use crate::error::Error;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const FILE_NAME: &str = "audioconf.toml";

/// Main settings tree
#[derive(Debug, Default)]
pub struct Settings {
    path: PathBuf,
    app: AppSettings,
}

impl Settings {
    /// Create a new settings tree from a settings file path
    pub fn init(path: impl AsRef<Path>) -> Result<Settings, Error> {
        let path = path.as_ref().to_path_buf();
        let this = Self {
            app: load_path(&path),
            path,
        };
        this.sync()?;
        Ok(this)
    }

    /// Resolve where the settings file lives
    ///
    /// `AUDIOCONF_CONFIG` wins, otherwise the platform config
    /// directory is used.
    pub fn default_path() -> PathBuf {
        if let Some(p) = env::var_os("AUDIOCONF_CONFIG") {
            return PathBuf::from(p);
        }

        match ProjectDirs::from("org", "zynthian", "audioconf") {
            Some(dirs) => dirs.config_dir().join(FILE_NAME),
            None => PathBuf::from(FILE_NAME),
        }
    }

    /// Sync the settings back to disk
    pub fn sync(&self) -> Result<(), Error> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, toml::to_string_pretty(&self.app)?)?;
        Ok(())
    }

    pub fn app(&self) -> &AppSettings {
        &self.app
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_path<T: Default + DeserializeOwned>(path: &Path) -> T {
    fs::read_to_string(path)
        .map_err(Error::from)
        .and_then(|s| toml::from_str(&s).map_err(Into::into))
        .unwrap_or_else(|e| {
            match e {
                Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                    debug!("no settings at {}, using defaults", path.display())
                }
                e => warn!("ignoring settings at {}: {}", path.display(), e),
            }
            T::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gets_defaults_and_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);

        let s = Settings::init(&path).unwrap();
        assert_eq!(s.app(), &AppSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "env_file = \"/tmp/envars.sh\"\n").unwrap();

        let s = Settings::init(&path).unwrap();
        assert_eq!(s.app().env_file, PathBuf::from("/tmp/envars.sh"));
        assert_eq!(s.app().reboot_flag, AppSettings::default().reboot_flag);
    }

    #[test]
    fn broken_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "env_file = [").unwrap();

        let s = Settings::init(&path).unwrap();
        assert_eq!(s.app(), &AppSettings::default());
        let reread: AppSettings = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread, AppSettings::default());
    }
}
