//! The base configurator every console section talks to
//!
//! A section builds its fields and hands them over for rendering, and
//! hands submitted values over for persistence.  Where pages end up
//! and where values are stored is the configurator's business.

use crate::env::{EnvFile, Environment};
use crate::error::Error;
use crate::model::{FieldMap, FormField, Page};
use crate::settings::AppSettings;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{error, info};

pub trait Configurator {
    /// The persisted environment, as of now
    fn env(&self) -> &dyn Environment;

    /// Show a section with its fields and the errors of the last save
    fn render(
        &mut self,
        title: &str,
        fields: Vec<FormField>,
        errors: Option<Vec<String>>,
    ) -> Result<(), Error>;

    /// Store `fields`, returning user facing errors if that failed
    fn persist(&mut self, fields: &FieldMap) -> Option<Vec<String>>;

    /// Use `fields` for this session without storing them
    fn apply_environment(&mut self, fields: &FieldMap);

    /// The system needs an update run before the change takes effect
    fn flag_pending_system_update(&mut self);

    /// The saved configuration needs a reboot
    fn request_reboot(&mut self);
}

/// Configurator over the envars file, rendering pages as JSON
pub struct EnvConfigurator<W: Write> {
    env: EnvFile,
    out: W,
    update_sys_flag: PathBuf,
    reboot_flag: PathBuf,
}

impl<W: Write> EnvConfigurator<W> {
    pub fn new(env: EnvFile, settings: &AppSettings, out: W) -> Self {
        Self {
            env,
            out,
            update_sys_flag: settings.update_sys_flag.clone(),
            reboot_flag: settings.reboot_flag.clone(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn touch(path: &Path) -> Result<(), Error> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

impl<W: Write> Configurator for EnvConfigurator<W> {
    fn env(&self) -> &dyn Environment {
        &self.env
    }

    fn render(
        &mut self,
        title: &str,
        fields: Vec<FormField>,
        errors: Option<Vec<String>>,
    ) -> Result<(), Error> {
        let page = Page {
            title: title.to_owned(),
            fields,
            errors,
        };
        serde_json::to_writer_pretty(&mut self.out, &page)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn persist(&mut self, fields: &FieldMap) -> Option<Vec<String>> {
        self.apply_environment(fields);
        match self.env.save() {
            Ok(()) => None,
            Err(e) => {
                error!("failed to save the environment: {}", e);
                Some(vec![format!("Can't save the configuration: {}", e)])
            }
        }
    }

    fn apply_environment(&mut self, fields: &FieldMap) {
        for (key, value) in fields.iter() {
            self.env.set_var(key, value);
        }
    }

    fn flag_pending_system_update(&mut self) {
        match touch(&self.update_sys_flag) {
            Ok(()) => info!("flagged a pending system update"),
            Err(e) => error!("can't flag a system update at {}: {}", self.update_sys_flag.display(), e),
        }
    }

    fn request_reboot(&mut self) {
        match touch(&self.reboot_flag) {
            Ok(()) => info!("reboot requested"),
            Err(e) => error!("can't request a reboot at {}: {}", self.reboot_flag.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;
    use std::fs;

    fn settings(dir: &Path) -> AppSettings {
        AppSettings {
            env_file: dir.join("envars.sh"),
            update_sys_flag: dir.join("update_sys"),
            reboot_flag: dir.join("reboot"),
        }
    }

    #[test]
    fn persist_writes_the_envars_file() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        fs::write(&s.env_file, "export SOUNDCARD_NAME=\"PiSound\"\n").unwrap();

        let mut c = EnvConfigurator::new(EnvFile::load(&s.env_file).unwrap(), &s, Vec::new());
        let mut fields = FieldMap::new();
        fields.insert("SOUNDCARD_NAME".into(), "Dummy device".into());
        fields.insert("JACKD_OPTIONS".into(), "-d alsa -d hw:0".into());
        assert_eq!(c.persist(&fields), None);
        assert_eq!(c.env().var("SOUNDCARD_NAME"), Some("Dummy device"));

        let text = fs::read_to_string(&s.env_file).unwrap();
        assert!(text.contains("export SOUNDCARD_NAME=\"Dummy device\""));
        assert!(text.contains("export JACKD_OPTIONS=\"-d alsa -d hw:0\""));
    }

    #[test]
    fn persist_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path());
        s.env_file = dir.path().join("missing").join("envars.sh");

        let mut c = EnvConfigurator::new(EnvFile::load(&s.env_file).unwrap(), &s, Vec::new());
        let errors = c.persist(&FieldMap::new()).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Can't save the configuration"));
    }

    #[test]
    fn apply_environment_does_not_save() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        let mut c = EnvConfigurator::new(EnvFile::load(&s.env_file).unwrap(), &s, Vec::new());
        let mut fields = FieldMap::new();
        fields.insert("ALSA_DEVICE".into(), "0".into());
        c.apply_environment(&fields);
        assert_eq!(c.env().var("ALSA_DEVICE"), Some("0"));
        assert!(!s.env_file.exists());
    }

    #[test]
    fn flags_are_touched() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        let mut c = EnvConfigurator::new(EnvFile::default(), &s, Vec::new());
        c.flag_pending_system_update();
        c.request_reboot();
        assert!(s.update_sys_flag.exists());
        assert!(s.reboot_flag.exists());
    }

    #[test]
    fn render_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        let mut c = EnvConfigurator::new(EnvFile::default(), &s, Vec::new());
        c.render(
            "Audio",
            vec![FormField::new("JACKD_OPTIONS", "Jackd Options", FieldKind::Text).value("-d alsa")],
            Some(vec!["oops".into()]),
        )
        .unwrap();

        let out: serde_json::Value = serde_json::from_slice(&c.into_inner()).unwrap();
        assert_eq!(out["title"], "Audio");
        assert_eq!(out["fields"][0]["type"], "text");
        assert_eq!(out["fields"][0]["value"], "-d alsa");
        assert_eq!(out["errors"][0], "oops");
    }
}
