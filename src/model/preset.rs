//! Soundcard presets
//!
//! A preset bundles what a known board needs: the device-tree overlay
//! lines for `config.txt`, a complete jackd command line and the mixer
//! controls worth showing.

use crate::hardware::{AudioRoute, MixerControls};
use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::{info, warn};

pub const RBPI_HEADPHONES: &str = "RBPi Headphones";
pub const RBPI_HDMI: &str = "RBPi HDMI";

/// Replaced by the on-board card id once the route is known
const DEVNAME: &str = "#DEVNAME#";
/// Replaced by the board dependent I2S buffer settings
const BUFREQ: &str = "#BUFREQ#";

/// (name, device tree config, jackd options, mixer controls)
const PRESETS: [(&str, &str, &str, &str); 41] = [
    (
        "V5 ADAC",
        "dtoverlay=hifiberry-dacplusadcpro\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -i 2 -X raw",
        "Digital Left,Digital Right,ADC Left,ADC Right,ADC Left Input,ADC Right Input,PGA Gain Left,PGA Gain Right",
    ),
    (
        "Z2 ADAC",
        "dtoverlay=hifiberry-dacplusadcpro\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -i 2 -X raw",
        "Digital Left,Digital Right,PGA Gain Left,PGA Gain Right,ADC Left Input,ADC Right Input,ADC Left,ADC Right",
    ),
    (
        "ZynADAC",
        "dtoverlay=hifiberry-dacplusadcpro\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -i 2 -X raw",
        "Digital Left,PGA Gain Left,Digital Right,PGA Gain Right,ADC Left Input,ADC Left,ADC Right Input,ADC Right",
    ),
    (
        "HifiBerry DAC8X",
        "dtoverlay=hifiberry-dac8x\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry -r 48000 -p 256 -n 2 -o 8 -X raw",
        "",
    ),
    (
        "HifiBerry DAC+ ADC PRO",
        "dtoverlay=hifiberry-dacplusadcpro\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -i 2 -X raw",
        "Digital Left,PGA Gain Left,Digital Right,PGA Gain Right,ADC Left Input,ADC Left,ADC Right Input,ADC Right",
    ),
    (
        "HifiBerry DAC+ ADC",
        "dtoverlay=hifiberry-dacplusadc\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -i 2 -X raw",
        "Digital Left,Digital Right",
    ),
    (
        "HifiBerry DAC+",
        "dtoverlay=hifiberry-dacplus\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -X raw",
        "Digital Left,Digital Right",
    ),
    (
        "HifiBerry DAC+ light",
        "dtoverlay=hifiberry-dac\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -X raw",
        "Digital Left,Digital Right",
    ),
    (
        "HifiBerry DAC+ RTC",
        "dtoverlay=hifiberry-dac\ndtoverlay=i2c-rtc,ds130\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -X raw",
        "Digital Left,Digital Right",
    ),
    (
        "HifiBerry Digi",
        "dtoverlay=hifiberry-digi\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "HifiBerry Amp",
        "dtoverlay=hifiberry-amp\nforce_eeprom_read=0",
        "-P 70 -s -S -d alsa -d hw:sndrpihifiberry #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "AlloBoss - Innomaker - PCM5142",
        "dtoverlay=allo-boss-dac-pcm512x-audio",
        "-P 70 -s -S -d alsa -d hw:BossDAC #BUFREQ# -o 2 -X raw",
        "Digital Left,PGA Gain Left,Digital Right,PGA Gain Right,ADC Left Input,ADC Left,ADC Right Input,ADC Right",
    ),
    (
        "AudioInjector",
        "dtoverlay=audioinjector-wm8731-audio",
        "-P 70 -s -S -d alsa -d hw:audioinjectorpi #BUFREQ# -o 2 -i 2 -X raw",
        "Master Left,Capture Left,Master Right,Capture Right",
    ),
    (
        "AudioInjector Isolated",
        "dtoverlay=audioinjector-isolated-soundcard",
        "-P 70 -s -S -d alsa -d hw:audioinjectoris #BUFREQ# -o 2 -i 2 -X raw",
        "Master Left,Master Right",
    ),
    (
        "AudioInjector Ultra",
        "dtoverlay=audioinjector-ultra",
        "-P 70 -s -S -d alsa -d hw:audioinjectorul #BUFREQ# -o 2 -i 2 -X raw",
        "DAC Left,DAC Right,PGA",
    ),
    (
        "Fe-Pi Audio",
        "dtoverlay=fe-pi-audio",
        "-P 70 -s -S -d alsa -d hw:0 #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "IQAudio DAC",
        "dtoverlay=iqaudio-dac",
        "-P 70 -s -S -d alsa -d hw:IQaudIODAC #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "IQAudio DAC+",
        "dtoverlay=iqaudio-dacplus",
        "-P 70 -s -S -d alsa -d hw:IQaudIODAC #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "IQAudio Digi",
        "dtoverlay=iqaudio-digi-wm8804-audio",
        "-P 70 -s -S -d alsa -d hw:0 #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "JustBoom DAC",
        "dtoverlay=justboom-dac",
        "-P 70 -s -S -d alsa -d hw:0 #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "JustBoom Digi",
        "dtoverlay=justboom-digi",
        "-P 70 -s -S -d alsa -d hw:0 #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "PiSound",
        "dtoverlay=pisound",
        "-P 70 -s -S -d alsa -d hw:pisound #BUFREQ# -o 2 -X raw",
        "",
    ),
    (
        "Generic USB device",
        "",
        "-P 70 -s -d alsa -d hw:0 -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "Behringer UCA222",
        "",
        "-P 70 -s -d alsa -d hw:CODEC -r 48000 -p 256 -n 3 -s -S -X raw",
        "PCM",
    ),
    (
        "Behringer UMC404HD",
        "",
        "-P 70 -s -d alsa -d hw:U192k -r 48000 -p 256 -n 3 -s -S -X raw",
        "UMC404HD_192k_Output,Mic",
    ),
    (
        "Behringer UMC1820",
        "",
        "-P 70 -s -d alsa -d hw:UMC1820 -r 48000 -p 256 -n 2 -s -S -X raw",
        "UMC1820 Output",
    ),
    (
        "Behringer X18XR18",
        "",
        "-P 70 -s -d alsa -d hw:X18XR18 -r 48000 -p 256 -n 2 -s -S -X raw",
        "",
    ),
    (
        "C-Media Electronics (Unitek Y-247A)",
        "",
        "-P 70 -s -d alsa -d hw:Device -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "Creative-EMU 0202",
        "",
        "-P 70 -s -d alsa -d hw:USB -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "Edirol UA1-EX",
        "",
        "-P 70 -s -d alsa -d hw:UA1EX -r 48000 -p 1024 -n 2 -S -X raw",
        "",
    ),
    (
        "GeneralPlus USB",
        "",
        "-P 70 -s -d alsa -d hw:Device -r 48000 -p 256 -n 2 -X raw",
        "Speaker Left,Speaker Right,Mic Left,Mic Right,Auto Gain Control",
    ),
    (
        "Lexicon Alpha",
        "",
        "-P 70 -s -d alsa -d hw:Alpha -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "M-Audio M-Track Plus 2",
        "",
        "-P 70 -s -d alsa -d hw:Plus -r 48000 -p 256 -n 2 -X raw",
        "Mic Left,Mic Right,M-Audio M-Track Plus Left,M-Audio M-Track Plus Right",
    ),
    (
        "LogicLink UA0099",
        "",
        "-P 70 -s -d alsa -d hw:ICUSBAUDIO7D -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "Steinberg UR22 MKII",
        "",
        "-P 70 -s -d alsa -d hw:UR22mkII -r 48000 -p 256 -n 2 -X raw",
        "Clock_Source_41_Validity",
    ),
    (
        "Yamaha VKB-100 Vocaloid",
        "",
        "-P 70 -s -d alsa -d hw:Keyboard -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "Yeti Microphone",
        "",
        "-P 70 -s -d alsa -d hw:Microphone -r 48000 -p 256 -n 2 -X raw",
        "Speaker Left,Mic Left,Speaker Right,Mic Right",
    ),
    (
        RBPI_HEADPHONES,
        "dtparam=audio=on\naudio_pwm_mode=2",
        "-P 70 -s -d alsa -d hw:#DEVNAME# -r 48000 -p 512 -n 3 -o 2 -X raw",
        "Headphone",
    ),
    (
        RBPI_HDMI,
        "dtparam=audio=on",
        "-P 70 -s -d alsa -d hw:#DEVNAME# -r 48000 -p 512 -n 2 -o 2 -X raw",
        "HDMI Left,HDMI Right",
    ),
    (
        "Dummy device",
        "",
        "-P 70 -s -d alsa -d hw:0 -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
    (
        "Custom device",
        "",
        "-P 70 -s -S -d alsa -d hw:0 -r 48000 -p 256 -n 2 -X raw",
        "",
    ),
];

/// The Raspberry Pi the console runs on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Board {
    /// Major board version, `RBPI_VERSION_NUMBER`
    pub version: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self { version: 4 }
    }
}

impl Board {
    /// Read the board version, anything unparsable counts as a Pi 4
    pub fn from_version(raw: Option<&str>) -> Self {
        let version = raw
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(Board::default().version);
        Self { version }
    }

    /// Default I2S buffer settings for this board
    pub fn i2s_buffer(&self) -> &'static str {
        if self.version == 5 {
            "-r 48000 -p 128 -n 2"
        } else {
            "-r 48000 -p 256 -n 2"
        }
    }

    /// Older boards have on-board audio that can be switched off
    pub fn has_rbpi_audio_switch(&self) -> bool {
        self.version <= 4
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SoundcardPreset {
    pub name: String,
    /// `config.txt` lines loading the driver overlay
    pub device_tree_config: String,
    /// Complete `JACKD_OPTIONS`
    pub command_line_template: String,
    pub mixer_controls: Vec<String>,
}

impl SoundcardPreset {
    /// Mixer controls in the comma separated `SOUNDCARD_MIXER` form
    pub fn mixer_string(&self) -> String {
        self.mixer_controls.join(",")
    }
}

/// Ordered collection of soundcard presets
///
/// Serialised as an object keyed by preset name, in catalog order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PresetCatalog {
    presets: Vec<SoundcardPreset>,
}

impl Serialize for PresetCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.presets.len()))?;
        for p in self.presets.iter() {
            map.serialize_entry(&p.name, p)?;
        }
        map.end()
    }
}

impl PresetCatalog {
    /// Build the catalog for `board`
    ///
    /// The on-board presets point at the card of the detected `route`,
    /// without one they are dropped.
    pub fn build(board: &Board, route: Option<AudioRoute>) -> Self {
        let (headphones, hdmi) = match route {
            Some(AudioRoute::Headphones) => (Some("Headphones"), Some("b1")),
            Some(AudioRoute::Alsa) => (Some("ALSA"), Some("ALSA")),
            None => (None, None),
        };

        let presets = PRESETS
            .iter()
            .filter_map(|(name, config, options, mixer)| {
                let options = options.replace(BUFREQ, board.i2s_buffer());
                let options = match *name {
                    RBPI_HEADPHONES => options.replace(DEVNAME, headphones?),
                    RBPI_HDMI => options.replace(DEVNAME, hdmi?),
                    _ => options,
                };

                Some(SoundcardPreset {
                    name: name.to_string(),
                    device_tree_config: config.to_string(),
                    command_line_template: options,
                    mixer_controls: mixer
                        .split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_owned)
                        .collect(),
                })
            })
            .collect();

        Self { presets }
    }

    /// Probe the hardware once and build the catalog
    ///
    /// A failed probe is treated as "no on-board audio".
    pub fn detect(board: &Board, mixer: &dyn MixerControls) -> Self {
        let route = match mixer.detected_board_audio_route() {
            Ok(route) => route,
            Err(e) => {
                warn!("RBPi audio detection failed: {}", e);
                None
            }
        };
        info!("RBPi audio route: {:?}", route);
        if route.is_none() {
            warn!("no RBPi audio route, '{}' and '{}' are unavailable", RBPI_HEADPHONES, RBPI_HDMI);
        }
        Self::build(board, route)
    }

    pub fn get(&self, name: &str) -> Option<&SoundcardPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// A copy without the on-board RBPi presets
    pub fn without_rbpi(&self) -> Self {
        Self {
            presets: self
                .presets
                .iter()
                .filter(|p| p.name != RBPI_HEADPHONES && p.name != RBPI_HDMI)
                .cloned()
                .collect(),
        }
    }
}
