//! The jackd command line
//!
//! `JACKD_OPTIONS` is the single source of truth for how the audio
//! server is launched.  The form edits a handful of ALSA backend
//! settings inside it and must leave everything else alone.

mod options;
mod params;

pub use options::JackdOptions;
pub use params::{AlsaParams, NOT_DETECTED};

/// Used when the environment has no jackd options at all
pub const DEFAULT_JACKD_OPTIONS: &str = "-P 70 -t 2000 -s -d alsa -d hw:0 -r 48000 -p 256 -n 2";

/// Form fields that feed the ALSA backend settings
pub const ALSA_FIELDS: [&str; 6] = [
    "ALSA_DEVICE",
    "ALSA_SAMPLERATE",
    "ALSA_NUM_FRAMES",
    "ALSA_NUM_PERIODS",
    "ALSA_MODE_SOFT",
    "ALSA_MODE_16",
];
