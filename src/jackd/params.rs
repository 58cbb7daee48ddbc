use super::JackdOptions;
use crate::error::Error;
use serde::Serialize;
use std::str::FromStr;
use tracing::error;

/// Suffix the device list puts on devices it could not find
pub const NOT_DETECTED: &str = " (Not detected)";

/// The ALSA backend settings the form lets users edit
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlsaParams {
    /// Card name or number, without the `hw:` prefix
    pub device: String,
    pub sample_rate: u32,
    /// Frames per period
    pub frames: u32,
    /// Periods per buffer
    pub periods: u32,
    /// Ignore xruns reported by the driver (`-s`)
    pub soft_mode: bool,
    /// 16-bit samples instead of 32-bit (`-S`)
    pub shorts: bool,
}

impl Default for AlsaParams {
    fn default() -> Self {
        Self {
            device: "0".into(),
            sample_rate: 48000,
            frames: 1024,
            periods: 2,
            soft_mode: false,
            shorts: false,
        }
    }
}

fn number<T: FromStr>(flag: &str, raw: &str) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| Error::CommandLine(format!("'{}' is not a valid value for {}", raw, flag)))
}

/// Strip decorations and the `hw:` prefix off a device label
pub fn device_name(label: &str) -> &str {
    let label = label.trim();
    let n = NOT_DETECTED.len();
    let label = if label.len() >= n
        && label.is_char_boundary(label.len() - n)
        && label[label.len() - n..].eq_ignore_ascii_case(NOT_DETECTED)
    {
        label[..label.len() - n].trim_end()
    } else {
        label
    };
    label.strip_prefix("hw:").unwrap_or(label)
}

impl AlsaParams {
    /// Read the backend settings out of a jackd command line
    pub fn parse(line: &str) -> Result<Self, Error> {
        let opts = JackdOptions::parse(line)?;
        let defaults = Self::default();

        let params = Self {
            device: opts
                .value("-d")
                .map(|d| device_name(d).to_owned())
                .unwrap_or(defaults.device),
            sample_rate: opts
                .value("-r")
                .map(|v| number("-r", v))
                .transpose()?
                .unwrap_or(defaults.sample_rate),
            frames: opts
                .value("-p")
                .map(|v| number("-p", v))
                .transpose()?
                .unwrap_or(defaults.frames),
            periods: opts
                .value("-n")
                .map(|v| number("-n", v))
                .transpose()?
                .unwrap_or(defaults.periods),
            soft_mode: opts.has_bare("-s") || opts.server_has("-s"),
            shorts: opts.has_bare("-S"),
        };
        params.validate()?;
        Ok(params)
    }

    /// Like [`parse`](Self::parse), but a bad line is logged and
    /// replaced by the defaults
    pub fn parse_or_default(line: &str) -> Self {
        Self::parse(line).unwrap_or_else(|e| {
            error!("Bad jack configuration: {}", e);
            Self::default()
        })
    }

    fn validate(&self) -> Result<(), Error> {
        if self.sample_rate == 0 || self.frames == 0 || self.periods == 0 {
            return Err(Error::CommandLine(format!(
                "rate, frames and periods must be positive ({}/{}/{})",
                self.sample_rate, self.frames, self.periods
            )));
        }
        if self.device.is_empty() {
            return Err(Error::CommandLine("empty device".into()));
        }
        Ok(())
    }

    /// Estimated software latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        1000.0 * f64::from(self.periods) * f64::from(self.frames) / f64::from(self.sample_rate)
    }

    /// Write these settings into `opts`
    ///
    /// Value flags are replaced where they are or appended, untouched
    /// flags keep their place.
    pub fn apply(&self, opts: &mut JackdOptions) -> Result<(), Error> {
        self.validate()?;
        opts.set_value("-d", format!("hw:{}", device_name(&self.device)));
        opts.set_value("-r", self.sample_rate.to_string());
        opts.set_value("-p", self.frames.to_string());
        opts.set_value("-n", self.periods.to_string());

        opts.set_bare("-s", self.soft_mode);
        if !self.soft_mode {
            opts.strip_server_flag("-s");
        }
        opts.set_bare("-S", self.shorts);
        Ok(())
    }

    /// Rebuild `previous` with these settings
    pub fn rebuild(&self, previous: &str) -> Result<String, Error> {
        let mut opts = JackdOptions::parse(previous)?;
        self.apply(&mut opts)?;
        Ok(opts.to_string())
    }

    /// Overlay submitted form values on top of these settings
    ///
    /// `get` looks up a submitted value by field name.  Fields that
    /// were not submitted keep their current value.
    pub fn merge<'a>(&self, get: impl Fn(&str) -> Option<&'a str>) -> Result<Self, Error> {
        let mut next = self.clone();
        if let Some(d) = get("ALSA_DEVICE") {
            next.device = device_name(d).to_owned();
        }
        if let Some(v) = get("ALSA_SAMPLERATE") {
            next.sample_rate = number("sample rate", v.trim())?;
        }
        if let Some(v) = get("ALSA_NUM_FRAMES") {
            next.frames = number("buffer size", v.trim())?;
        }
        if let Some(v) = get("ALSA_NUM_PERIODS") {
            next.periods = number("number of buffers", v.trim())?;
        }
        if let Some(v) = get("ALSA_MODE_SOFT") {
            next.soft_mode = is_on(v);
        }
        if let Some(v) = get("ALSA_MODE_16") {
            next.shorts = is_on(v);
        }
        next.validate()?;
        Ok(next)
    }
}

/// Boolean form values
pub fn is_on(v: &str) -> bool {
    matches!(v.trim(), "1" | "on" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const LINE: &str = "-P 70 -t 2000 -s -d alsa -d hw:0 -r 48000 -p 256 -n 2";

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_default_line() {
        let p = AlsaParams::parse(LINE).unwrap();
        assert_eq!(
            p,
            AlsaParams {
                device: "0".into(),
                sample_rate: 48000,
                frames: 256,
                periods: 2,
                soft_mode: true,
                shorts: false,
            }
        );
    }

    #[test]
    fn latency_estimate() {
        let p = AlsaParams::parse(LINE).unwrap();
        assert!((p.latency_ms() - 10.7).abs() < 0.05);
        assert!((AlsaParams::default().latency_ms() - 42.67).abs() < 0.01);
    }

    #[test]
    fn bad_lines_fall_back_to_defaults() {
        assert_eq!(AlsaParams::parse_or_default("-P 70 -d dummy"), AlsaParams::default());
        assert_eq!(
            AlsaParams::parse_or_default("-d alsa -r fast"),
            AlsaParams::default()
        );
        assert_eq!(AlsaParams::parse_or_default("-d alsa -r 0"), AlsaParams::default());
    }

    #[test]
    fn missing_flags_use_defaults() {
        let p = AlsaParams::parse("-d alsa -d hw:pisound -S").unwrap();
        assert_eq!(p.device, "pisound");
        assert_eq!(p.sample_rate, 48000);
        assert_eq!(p.frames, 1024);
        assert!(p.shorts);
        assert!(!p.soft_mode);
    }

    #[test]
    fn server_sync_flag_is_not_16_bit() {
        let p = AlsaParams::parse("-P 70 -s -S -d alsa -d hw:0 -r 48000 -p 256 -n 2").unwrap();
        assert!(p.soft_mode);
        assert!(!p.shorts);
    }

    #[test]
    fn rate_change_keeps_order() {
        let p = AlsaParams::parse(LINE).unwrap();
        let f = form(&[("ALSA_SAMPLERATE", "96000")]);
        let next = p.merge(|k| f.get(k).map(String::as_str)).unwrap();
        assert_eq!(
            next.rebuild(LINE).unwrap(),
            "-P 70 -t 2000 -s -d alsa -d hw:0 -r 96000 -p 256 -n 2 -s"
        );
    }

    #[test]
    fn toggling_16_bit() {
        let line = "-P 70 -d alsa -d hw:CODEC -r 48000 -p 256 -n 3 -X raw";
        let mut p = AlsaParams::parse(line).unwrap();
        p.shorts = true;
        let on = p.rebuild(line).unwrap();
        assert_eq!(on, "-P 70 -d alsa -d hw:CODEC -r 48000 -p 256 -n 3 -X raw -S");

        let line = "-P 70 -d alsa -d hw:CODEC -r 48000 -S -p 256 -n 3 -X raw";
        let mut p = AlsaParams::parse(line).unwrap();
        assert!(p.shorts);
        p.shorts = false;
        assert_eq!(
            p.rebuild(line).unwrap(),
            "-P 70 -d alsa -d hw:CODEC -r 48000 -p 256 -n 3 -X raw"
        );
    }

    #[test]
    fn soft_mode_off_strips_both_parts() {
        let line = "-P 70 -s -d alsa -d hw:0 -r 48000 -p 256 -n 2 -s -X raw";
        let mut p = AlsaParams::parse(line).unwrap();
        p.soft_mode = false;
        assert_eq!(
            p.rebuild(line).unwrap(),
            "-P 70 -d alsa -d hw:0 -r 48000 -p 256 -n 2 -X raw"
        );
    }

    #[test]
    fn not_detected_device_is_normalised() {
        assert_eq!(device_name("UMC1820 (Not detected)"), "UMC1820");
        assert_eq!(device_name("UMC1820 (not detected)"), "UMC1820");
        assert_eq!(device_name("hw:UMC1820"), "UMC1820");
        assert_eq!(device_name("Headphones"), "Headphones");

        let p = AlsaParams::parse(LINE).unwrap();
        let f = form(&[("ALSA_DEVICE", "UMC1820 (Not detected)")]);
        let next = p.merge(|k| f.get(k).map(String::as_str)).unwrap();
        assert_eq!(
            next.rebuild(LINE).unwrap(),
            "-P 70 -t 2000 -s -d alsa -d hw:UMC1820 -r 48000 -p 256 -n 2 -s"
        );
    }

    #[test]
    fn merge_rejects_garbage() {
        let p = AlsaParams::default();
        let f = form(&[("ALSA_NUM_FRAMES", "lots")]);
        assert!(p.merge(|k| f.get(k).map(String::as_str)).is_err());
        let f = form(&[("ALSA_NUM_PERIODS", "0")]);
        assert!(p.merge(|k| f.get(k).map(String::as_str)).is_err());
    }

    #[test]
    fn missing_values_are_appended() {
        let line = "-P 70 -d alsa -X raw";
        let p = AlsaParams::default();
        assert_eq!(
            p.rebuild(line).unwrap(),
            "-P 70 -d alsa -X raw -d hw:0 -r 48000 -p 1024 -n 2"
        );
    }

    #[test]
    fn attached_frames_are_read_and_replaced() {
        let line = "-P 70 -d alsa -d hw:0 -r 48000 -p256 -n 2";
        let p = AlsaParams::parse(line).unwrap();
        assert_eq!(p.frames, 256);

        let f = form(&[("ALSA_SAMPLERATE", "96000")]);
        let next = p.merge(|k| f.get(k).map(String::as_str)).unwrap();
        assert_eq!(
            next.rebuild(line).unwrap(),
            "-P 70 -d alsa -d hw:0 -r 96000 -p256 -n 2"
        );
    }
}
