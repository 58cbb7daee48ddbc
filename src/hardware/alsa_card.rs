use super::{
    card_of_hint, glob, route_from_ids, AudioRoute, ControlDescriptor, MixerControls,
    SystemAudio, LOOPBACK_CARD,
};
use crate::error::Error;
use alsa::card::{Card, Iter as CardIter};
use alsa::device_name::HintIter;
use alsa::mixer::{Mixer, Selem};
use alsa::Ctl;
use std::ffi::CString;
use std::io;
use tracing::{debug, warn};

/// Hardware queries answered by ALSA itself
#[derive(Debug, Default)]
pub struct AlsaHardware;

impl AlsaHardware {
    pub fn new() -> Self {
        Self
    }

    /// Every card ALSA knows about, unreadable ones are skipped
    fn cards() -> impl Iterator<Item = Card> {
        CardIter::new().filter_map(|c| match c {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("skipping unreadable card: {}", e);
                None
            }
        })
    }

    fn card_id(card: &Card) -> Result<String, Error> {
        let ctl = Ctl::new(&format!("hw:{}", card.get_index()), false)?;
        let info = ctl.card_info()?;
        let id = info.get_id()?.to_owned();
        Ok(id)
    }

    fn card_controls(card: &Card, pattern: &regex::Regex) -> Result<Vec<ControlDescriptor>, Error> {
        let card_id = Self::card_id(card)?;
        let mixer = Mixer::new(&format!("hw:{}", card.get_index()), false)?;

        let mut controls = Vec::new();
        for elem in mixer.iter() {
            let s = match Selem::new(elem) {
                Some(s) => s,
                None => continue,
            };

            let name = s.get_id().get_name()?.to_string();
            if !pattern.is_match(&name) {
                continue;
            }

            let (is_playback, has_switch, (volume_min, volume_max)) = if s.has_capture_volume() {
                (false, s.has_capture_switch(), s.get_capture_volume_range())
            } else if s.has_playback_volume() {
                (true, s.has_playback_switch(), s.get_playback_volume_range())
            } else {
                // switch-only or enumerated controls
                (
                    s.has_playback_switch(),
                    s.has_playback_switch() || s.has_capture_switch(),
                    (0, 0),
                )
            };

            debug!("Card {}, control {}: {}", card_id, s.get_id().get_index(), name);
            controls.push(ControlDescriptor {
                card: card_id.clone(),
                index: s.get_id().get_index(),
                name,
                is_playback,
                has_switch,
                volume_min,
                volume_max,
            });
        }
        Ok(controls)
    }
}

impl MixerControls for AlsaHardware {
    fn list_controls(&self, pattern: &str) -> Result<Vec<ControlDescriptor>, Error> {
        let pattern = glob(pattern)?;
        let mut controls = Vec::new();
        for card in Self::cards() {
            match Self::card_controls(&card, &pattern) {
                Ok(mut c) => controls.append(&mut c),
                Err(e) => warn!("card {}: {}", card.get_index(), e),
            }
        }
        Ok(controls)
    }

    fn detected_board_audio_route(&self) -> Result<Option<AudioRoute>, Error> {
        let ids = Self::cards()
            .map(|card| Self::card_id(&card))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(route_from_ids(ids.iter().map(String::as_str)))
    }
}

impl SystemAudio for AlsaHardware {
    fn list_hardware_pcm_devices(&self) -> Result<Vec<String>, Error> {
        let iface = CString::new("pcm").map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut devices: Vec<String> = Vec::new();
        for hint in HintIter::new(None, &iface)? {
            let card = match hint.name.as_deref().and_then(card_of_hint) {
                Some(c) => c,
                None => continue,
            };
            if card != LOOPBACK_CARD && !devices.iter().any(|d| d == card) {
                devices.push(card.to_owned());
            }
        }
        Ok(devices)
    }
}
