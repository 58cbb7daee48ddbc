//! What the console needs to know about the sound hardware
//!
//! The form only ever asks three questions: which mixer controls
//! exist, which on-board audio route the Raspberry Pi exposes, and
//! which hardware PCM devices are plugged in.

use crate::error::Error;
use regex::Regex;
use serde::Serialize;

mod alsa_card;
pub use alsa_card::AlsaHardware;

/// ALSA card id of the looped-back virtual card, never a real device
pub const LOOPBACK_CARD: &str = "Loopback";

/// How the on-board Raspberry Pi audio shows up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioRoute {
    /// Separate `Headphones` and HDMI cards (newer kernels)
    Headphones,
    /// A single combined `ALSA` card (older kernels)
    Alsa,
}

/// A mixer control exposed by a card
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControlDescriptor {
    pub card: String,
    pub index: u32,
    pub name: String,
    pub is_playback: bool,
    pub has_switch: bool,
    pub volume_min: i64,
    pub volume_max: i64,
}

/// Mixer control discovery
pub trait MixerControls {
    /// List the controls whose name matches a shell-style `pattern`
    fn list_controls(&self, pattern: &str) -> Result<Vec<ControlDescriptor>, Error>;

    /// Find out which on-board route is active, if any
    fn detected_board_audio_route(&self) -> Result<Option<AudioRoute>, Error>;
}

/// Hardware PCM enumeration
pub trait SystemAudio {
    /// Card ids of every hardware PCM device, loopback excluded
    fn list_hardware_pcm_devices(&self) -> Result<Vec<String>, Error>;
}

/// Compile a shell-style pattern (`*`, `?`) into an anchored regex
pub(crate) fn glob(pattern: &str) -> Result<Regex, Error> {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Ok(Regex::new(&re)?)
}

/// Pick the route out of the card ids present on the system
pub(crate) fn route_from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<AudioRoute> {
    let (mut headphones, mut alsa) = (false, false);
    for id in ids {
        match id {
            "Headphones" => headphones = true,
            "ALSA" => alsa = true,
            _ => {}
        }
    }

    match (headphones, alsa) {
        (true, false) => Some(AudioRoute::Headphones),
        (false, true) => Some(AudioRoute::Alsa),
        (true, true) => {
            tracing::warn!("both 'Headphones' and 'ALSA' cards present, ignoring on-board audio");
            None
        }
        (false, false) => None,
    }
}

/// Card id out of a `hw:CARD=<id>,DEV=<n>` hint
pub(crate) fn card_of_hint(hint: &str) -> Option<&str> {
    let card = hint.strip_prefix("hw:CARD=")?;
    card.split(',').next().filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob("*").unwrap().is_match("Digital Left"));
        assert!(glob("Digital*").unwrap().is_match("Digital Right"));
        assert!(!glob("Digital*").unwrap().is_match("ADC Left"));
        assert!(glob("HDMI ?eft").unwrap().is_match("HDMI Left"));
        assert!(glob("a.b").unwrap().is_match("a.b"));
        assert!(!glob("a.b").unwrap().is_match("axb"));
    }

    #[test]
    fn routes() {
        assert_eq!(route_from_ids(vec!["vc4hdmi", "Headphones"]), Some(AudioRoute::Headphones));
        assert_eq!(route_from_ids(vec!["ALSA"]), Some(AudioRoute::Alsa));
        assert_eq!(route_from_ids(vec!["Headphones", "ALSA"]), None);
        assert_eq!(route_from_ids(vec!["sndrpihifiberry"]), None);
    }

    #[test]
    fn hints() {
        assert_eq!(card_of_hint("hw:CARD=Headphones,DEV=0"), Some("Headphones"));
        assert_eq!(card_of_hint("hw:CARD=UMC1820"), Some("UMC1820"));
        assert_eq!(card_of_hint("plughw:CARD=UMC1820,DEV=0"), None);
        assert_eq!(card_of_hint("default"), None);
    }
}
