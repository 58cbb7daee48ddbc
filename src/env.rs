//! The persisted environment
//!
//! Every zynthian service sources one shell file full of
//! `export KEY="value"` lines.  [`EnvFile`] loads that file into a
//! key/value store and writes changes back, keeping comments and lines
//! it does not understand where they were.

use crate::error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)=(.*)$").expect("valid assignment regex")
});

/// Read access to environment-shaped state
pub trait Environment {
    fn var(&self, key: &str) -> Option<&str>;

    fn var_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.var(key).unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    /// An assignment, with its text as loaded until the value changes
    Var { key: String, raw: Option<String> },
    /// Anything else, kept verbatim
    Verbatim(String),
}

/// Environment store backed by a shell envars file
#[derive(Debug, Default)]
pub struct EnvFile {
    path: Option<PathBuf>,
    lines: Vec<Line>,
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    /// Load the store from `path`, a missing file is an empty store
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no environment at {}, starting empty", path.display());
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut this = Self::parse(&text);
        this.path = Some(path.to_path_buf());
        debug!("loaded {} variables from {}", this.vars.len(), path.display());
        Ok(this)
    }

    /// Build a store that is never written anywhere
    pub fn parse(text: &str) -> Self {
        let mut this = Self::default();
        for raw in text.lines() {
            match ASSIGNMENT.captures(raw) {
                Some(caps) if !raw.trim_start().starts_with('#') => {
                    let key = caps[1].to_owned();
                    this.vars.insert(key.clone(), read_value(&caps[2]));
                    this.lines.push(Line::Var {
                        key,
                        raw: Some(raw.to_owned()),
                    });
                }
                _ => this.lines.push(Line::Verbatim(raw.to_owned())),
            }
        }
        this
    }

    /// Set `key`, only lines of changed keys are rewritten on save
    pub fn set_var(&mut self, key: &str, value: &str) {
        if self.vars.get(key).map(String::as_str) == Some(value) {
            return;
        }
        self.vars.insert(key.to_owned(), value.to_owned());

        // the last assignment is the one the shell ends up with
        let last = self.lines.iter_mut().rev().find_map(|l| match l {
            Line::Var { key: k, raw } if k == key => Some(raw),
            _ => None,
        });
        match last {
            Some(raw) => *raw = None,
            None => self.lines.push(Line::Var {
                key: key.to_owned(),
                raw: None,
            }),
        }
    }

    /// Render the store as shell text
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        for line in self.lines.iter() {
            match line {
                Line::Var { raw: Some(raw), .. } => out.push_str(raw),
                Line::Var { key, raw: None } => {
                    let value = self.vars.get(key).map(String::as_str).unwrap_or("");
                    out.push_str(&format!("export {}=\"{}\"", key, quote(value)));
                }
                Line::Verbatim(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    /// Write the store back to the file it was loaded from
    pub fn save(&self) -> Result<(), Error> {
        match self.path {
            Some(ref path) => {
                fs::write(path, self.to_shell())?;
                info!("saved environment to {}", path.display());
            }
            None => debug!("environment has no backing file, not saving"),
        }
        Ok(())
    }
}

impl Environment for EnvFile {
    fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '$' => out.push_str("\\$"),
            '`' => out.push_str("\\`"),
            c => out.push(c),
        }
    }
    out
}

/// Read the value of an assignment, up to where the shell word ends
///
/// Quoted parts are unquoted, anything after the word (a trailing
/// `# comment`) is ignored.
fn read_value(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' => out.extend(chars.by_ref().take_while(|c| *c != '\'')),
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some('n') => out.push('\n'),
                            Some(c) => out.push(c),
                            None => out.push('\\'),
                        },
                        c => out.push(c),
                    }
                }
            }
            '\\' => {
                if let Some(c) = chars.next() {
                    out.push(c);
                }
            }
            c if c.is_whitespace() => break,
            c => out.push(c),
        }
    }
    out
}
