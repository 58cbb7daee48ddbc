use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Toml(toml::de::Error),
    TomlSer(toml::ser::Error),
    Alsa(alsa::Error),
    Pattern(regex::Error),
    /// A jackd command line that could not be understood
    CommandLine(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::Json(e) => write!(f, "json error: {}", e),
            Self::Toml(e) => write!(f, "invalid settings: {}", e),
            Self::TomlSer(e) => write!(f, "failed to encode settings: {}", e),
            Self::Alsa(e) => write!(f, "alsa error: {}", e),
            Self::Pattern(e) => write!(f, "bad pattern: {}", e),
            Self::CommandLine(msg) => write!(f, "bad jackd options: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::TomlSer(e)
    }
}

impl From<alsa::Error> for Error {
    fn from(e: alsa::Error) -> Self {
        Self::Alsa(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::Pattern(e)
    }
}
