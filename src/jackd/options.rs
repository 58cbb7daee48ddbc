use crate::error::Error;
use std::fmt;

/// Backend flags that never take a value
const BARE_FLAGS: [&str; 10] = [
    "-s",
    "-S",
    "-H",
    "-M",
    "-D",
    "--softmode",
    "--shorts",
    "--hwmon",
    "--hwmeter",
    "--duplex",
];

/// A single backend token
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Flag {
        name: String,
        value: Option<String>,
        /// Written as `-p256` rather than `-p 256`
        attached: bool,
    },
    /// A stray word that belongs to no flag
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Flag {
                name,
                value: Some(v),
                attached: true,
            } => write!(f, "{}{}", name, v),
            Token::Flag {
                name,
                value: Some(v),
                ..
            } => write!(f, "{} {}", name, v),
            Token::Flag { name, value: None, .. } => f.write_str(name),
            Token::Word(w) => f.write_str(w),
        }
    }
}

/// A jackd command line, split at the `-d alsa` driver marker
///
/// Everything in front of the marker belongs to the server and is
/// kept as the text it was.  Everything after it is tokenized into
/// flags for the ALSA backend, so single options can be replaced
/// without disturbing the rest.
#[derive(Clone, Debug, PartialEq)]
pub struct JackdOptions {
    server: String,
    backend: Vec<Token>,
}

fn is_flag(tok: &str) -> bool {
    let mut chars = tok.chars();
    chars.next() == Some('-') && chars.next().map_or(false, |c| c.is_ascii_alphabetic() || c == '-')
}

/// Split a short flag with its value attached, `-p256` into `-p`, `256`
///
/// Bare flag letters are never split, so clustered `-sS` stays whole.
fn split_attached(tok: &str) -> Option<(&str, &str)> {
    if tok.starts_with("--") || tok.len() <= 2 || !tok.is_char_boundary(2) {
        return None;
    }
    let (name, value) = tok.split_at(2);
    if BARE_FLAGS.contains(&name) {
        return None;
    }
    Some((name, value))
}

impl JackdOptions {
    pub fn parse(line: &str) -> Result<Self, Error> {
        // Word offsets, so the server part can be kept byte for byte
        let mut words = Vec::new();
        let mut start = None;
        for (i, c) in line.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    words.push((s, &line[s..i]));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            words.push((s, &line[s..]));
        }

        let markers: Vec<usize> = words
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0].1 == "-d" && w[1].1 == "alsa")
            .map(|(i, _)| i)
            .collect();

        let marker = match markers.as_slice() {
            [m] => *m,
            [] => return Err(Error::CommandLine(format!("no '-d alsa' in '{}'", line))),
            _ => {
                return Err(Error::CommandLine(format!(
                    "'-d alsa' appears {} times in '{}'",
                    markers.len(),
                    line
                )))
            }
        };

        let server = line[..words[marker].0].trim_end().to_owned();
        let mut backend = Vec::new();
        let mut rest = words[marker + 2..].iter().map(|(_, w)| *w).peekable();
        while let Some(tok) = rest.next() {
            if !is_flag(tok) {
                backend.push(Token::Word(tok.to_owned()));
                continue;
            }
            if let Some((name, value)) = split_attached(tok) {
                backend.push(Token::Flag {
                    name: name.to_owned(),
                    value: Some(value.to_owned()),
                    attached: true,
                });
                continue;
            }

            let takes_value =
                !BARE_FLAGS.contains(&tok) && rest.peek().map_or(false, |next| !is_flag(next));
            let value = if takes_value {
                rest.next().map(str::to_owned)
            } else {
                None
            };
            backend.push(Token::Flag {
                name: tok.to_owned(),
                value,
                attached: false,
            });
        }

        Ok(Self { server, backend })
    }

    /// Server flags, verbatim
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Value of the first backend flag called `flag`
    pub fn value(&self, flag: &str) -> Option<&str> {
        self.backend.iter().find_map(|t| match t {
            Token::Flag { name, value, .. } if name == flag => value.as_deref(),
            _ => None,
        })
    }

    /// Replace the value of `flag` in place, or append it
    pub fn set_value(&mut self, flag: &str, new: impl Into<String>) {
        let new = new.into();
        let existing = self.backend.iter_mut().find_map(|t| match t {
            Token::Flag { name, value, .. } if name == flag && value.is_some() => Some(value),
            _ => None,
        });

        match existing {
            Some(value) => *value = Some(new),
            None => self.backend.push(Token::Flag {
                name: flag.to_owned(),
                value: Some(new),
                attached: false,
            }),
        }
    }

    /// Is the value-less `flag` given to the backend
    pub fn has_bare(&self, flag: &str) -> bool {
        self.backend
            .iter()
            .any(|t| matches!(t, Token::Flag { name, value: None, .. } if name == flag))
    }

    /// Is the value-less `flag` given to the server
    pub fn server_has(&self, flag: &str) -> bool {
        self.server.split_whitespace().any(|w| w == flag)
    }

    /// Add the value-less `flag` to the backend if missing, or remove
    /// every copy of it
    pub fn set_bare(&mut self, flag: &str, on: bool) {
        if on {
            if !self.has_bare(flag) {
                self.backend.push(Token::Flag {
                    name: flag.to_owned(),
                    value: None,
                    attached: false,
                });
            }
        } else {
            self.backend
                .retain(|t| !matches!(t, Token::Flag { name, value: None, .. } if name == flag));
        }
    }

    /// Drop every `flag` word from the server part
    pub fn strip_server_flag(&mut self, flag: &str) {
        if self.server_has(flag) {
            self.server = self
                .server
                .split_whitespace()
                .filter(|w| *w != flag)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }
}

impl fmt::Display for JackdOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.server.is_empty() {
            write!(f, "{} ", self.server)?;
        }
        f.write_str("-d alsa")?;
        for t in self.backend.iter() {
            write!(f, " {}", t)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESET: &str = "-P 70 -s -S -d alsa -d hw:sndrpihifiberry -r 48000 -p 256 -n 2 -o 2 -i 2 -X raw";

    #[test]
    fn splits_server_and_backend() {
        let o = JackdOptions::parse(PRESET).unwrap();
        assert_eq!(o.server(), "-P 70 -s -S");
        assert_eq!(o.value("-d"), Some("hw:sndrpihifiberry"));
        assert_eq!(o.value("-r"), Some("48000"));
        assert_eq!(o.value("-X"), Some("raw"));
        assert_eq!(o.value("-o"), Some("2"));
        assert!(!o.has_bare("-s"));
        assert!(o.server_has("-s"));
        assert!(o.server_has("-S"));
        assert_eq!(o.to_string(), PRESET);
    }

    #[test]
    fn bare_flags_take_no_value() {
        let o = JackdOptions::parse("-d alsa -d hw:CODEC -s -S -r 48000 -H").unwrap();
        assert_eq!(o.server(), "");
        assert!(o.has_bare("-s"));
        assert!(o.has_bare("-S"));
        assert!(o.has_bare("-H"));
        assert_eq!(o.value("-r"), Some("48000"));
        assert_eq!(o.to_string(), "-d alsa -d hw:CODEC -s -S -r 48000 -H");
    }

    #[test]
    fn marker_must_appear_once() {
        assert!(matches!(
            JackdOptions::parse("-P 70 -d dummy -r 48000"),
            Err(Error::CommandLine(_))
        ));
        assert!(JackdOptions::parse("-d alsa -d alsa").is_err());
        assert!(JackdOptions::parse("").is_err());
        // "-d alsafoo" is not the marker
        assert!(JackdOptions::parse("-d alsafoo -r 1").is_err());
    }

    #[test]
    fn server_text_is_kept_verbatim() {
        let o = JackdOptions::parse("-P  70\t-t 2000   -d alsa -r 44100").unwrap();
        assert_eq!(o.server(), "-P  70\t-t 2000");
    }

    #[test]
    fn set_value_replaces_in_place_or_appends() {
        let mut o = JackdOptions::parse("-d alsa -r 48000 -X raw").unwrap();
        o.set_value("-r", "96000");
        o.set_value("-p", "128");
        assert_eq!(o.to_string(), "-d alsa -r 96000 -X raw -p 128");
    }

    #[test]
    fn set_bare_does_not_double_add() {
        let mut o = JackdOptions::parse("-P 70 -d alsa -S -r 48000 -X raw").unwrap();
        o.set_bare("-S", true);
        assert_eq!(o.to_string(), "-P 70 -d alsa -S -r 48000 -X raw");
        o.set_bare("-S", false);
        assert_eq!(o.to_string(), "-P 70 -d alsa -r 48000 -X raw");
        o.set_bare("-s", true);
        assert_eq!(o.to_string(), "-P 70 -d alsa -r 48000 -X raw -s");
    }

    #[test]
    fn strip_server_flag_leaves_neighbours() {
        let mut o = JackdOptions::parse("-P 70 -s -t 2000 -d alsa -r 48000").unwrap();
        o.strip_server_flag("-s");
        assert_eq!(o.to_string(), "-P 70 -t 2000 -d alsa -r 48000");
        // "-S" is not "-s"
        let mut o = JackdOptions::parse("-P 70 -S -d alsa").unwrap();
        o.strip_server_flag("-s");
        assert_eq!(o.server(), "-P 70 -S");
    }

    #[test]
    fn attached_values_are_split() {
        let mut o = JackdOptions::parse("-P 70 -d alsa -dhw:0 -r 48000 -p256 -n 2 -sS").unwrap();
        assert_eq!(o.value("-d"), Some("hw:0"));
        assert_eq!(o.value("-p"), Some("256"));
        assert_eq!(o.value("-n"), Some("2"));
        assert!(!o.has_bare("-s"));
        assert_eq!(o.to_string(), "-P 70 -d alsa -dhw:0 -r 48000 -p256 -n 2 -sS");

        o.set_value("-p", "128");
        assert_eq!(o.to_string(), "-P 70 -d alsa -dhw:0 -r 48000 -p128 -n 2 -sS");
    }

    #[test]
    fn stray_words_are_carried() {
        let o = JackdOptions::parse("-d alsa -s extra -r 48000").unwrap();
        assert!(o.has_bare("-s"));
        assert_eq!(o.value("-r"), Some("48000"));
        assert_eq!(o.to_string(), "-d alsa -s extra -r 48000");
    }
}
