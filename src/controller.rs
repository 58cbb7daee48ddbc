//! The audio section of the configuration console
//!
//! GET turns the persisted environment into form fields, POST turns
//! the submitted fields back into environment values.  The ALSA fields
//! are a view into `JACKD_OPTIONS`: they are parsed out of it for the
//! form and written back into it on submission, never stored on their
//! own.

use crate::configurator::Configurator;
use crate::env::Environment;
use crate::error::Error;
use crate::hardware::{MixerControls, SystemAudio, LOOPBACK_CARD};
use crate::jackd::{AlsaParams, ALSA_FIELDS, DEFAULT_JACKD_OPTIONS, NOT_DETECTED};
use crate::model::{
    Board, FieldKind, FieldMap, FormField, FormSubmission, PresetCatalog, RBPI_HEADPHONES,
};
use tracing::{debug, error, info};

const TITLE: &str = "Audio";

const DEFAULT_AUBIONOTES_OPTIONS: &str = "-O complex -t 0.5 -s -88  -p yinfft -l 0.5";

const SAMPLE_RATES: [&str; 4] = ["32000", "44100", "48000", "96000"];
const BUFFER_SIZES: [&str; 6] = ["64", "128", "256", "512", "1024", "2048"];
const PERIOD_COUNTS: [&str; 2] = ["2", "3"];

const CUSTOM_KIT_WARNING: &str = "<div class='alert alert-warning'>Some config options are disabled. \
     You may want to <a href='/hw-kit'>choose Custom Kit</a> for enabling all options.</div>";

/// Environment keys owned by this section
pub mod keys {
    pub const SOUNDCARD_NAME: &str = "SOUNDCARD_NAME";
    pub const SOUNDCARD_CONFIG: &str = "SOUNDCARD_CONFIG";
    pub const SOUNDCARD_MIXER: &str = "SOUNDCARD_MIXER";
    pub const JACKD_OPTIONS: &str = "JACKD_OPTIONS";
    pub const AUBIONOTES_OPTIONS: &str = "ZYNTHIAN_AUBIONOTES_OPTIONS";
    pub const DISABLE_RBPI_AUDIO: &str = "ZYNTHIAN_DISABLE_RBPI_AUDIO";
    pub const RBPI_HEADPHONES: &str = "ZYNTHIAN_RBPI_HEADPHONES";
    pub const KIT_VERSION: &str = "ZYNTHIAN_KIT_VERSION";
    pub const RBPI_VERSION: &str = "RBPI_VERSION_NUMBER";
}

/// Prefixes of submitted fields that are never persisted
const TRANSIENT_PREFIXES: [&str; 2] = ["ALSA_", "ZYNTHIAN_CONTROLLER"];

pub struct AudioConfigController<'a> {
    catalog: &'a PresetCatalog,
    board: Board,
    mixer: &'a dyn MixerControls,
    audio: &'a dyn SystemAudio,
}

fn select(options: &[&str], current: &str) -> FieldKind {
    let mut options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    if !options.iter().any(|o| o == current) {
        options.push(current.to_owned());
    }
    FieldKind::Select {
        options,
        presets: None,
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

impl<'a> AudioConfigController<'a> {
    pub fn new(
        catalog: &'a PresetCatalog,
        board: Board,
        mixer: &'a dyn MixerControls,
        audio: &'a dyn SystemAudio,
    ) -> Self {
        Self {
            catalog,
            board,
            mixer,
            audio,
        }
    }

    /// Render the section
    pub fn get<C: Configurator + ?Sized>(
        &self,
        conf: &mut C,
        errors: Option<Vec<String>>,
    ) -> Result<(), Error> {
        let fields = self.fields(conf.env());
        conf.render(TITLE, fields, errors)
    }

    /// Handle a submission and render the section again
    pub fn post<C: Configurator + ?Sized>(
        &self,
        conf: &mut C,
        mut form: FormSubmission,
    ) -> Result<(), Error> {
        // unchecked boxes are not submitted at all
        for key in [keys::DISABLE_RBPI_AUDIO, keys::RBPI_HEADPHONES].iter() {
            if form.get(key).is_none() {
                form.set(key, "0");
            }
        }

        let env = conf.env();
        let previous_card = env.var(keys::SOUNDCARD_NAME).map(str::to_owned);
        let previous_options = form
            .get(keys::JACKD_OPTIONS)
            .or_else(|| env.var(keys::JACKD_OPTIONS))
            .unwrap_or(DEFAULT_JACKD_OPTIONS)
            .to_owned();

        let chosen = if form.touched(keys::SOUNDCARD_NAME) {
            form.get(keys::SOUNDCARD_NAME)
                .and_then(|name| self.catalog.get(name))
        } else {
            None
        };
        let options = match chosen {
            Some(preset) => {
                info!("loading preset '{}'", preset.name);
                form.set(keys::SOUNDCARD_CONFIG, preset.device_tree_config.as_str());
                form.set(keys::SOUNDCARD_MIXER, preset.mixer_string());
                preset.command_line_template.clone()
            }
            None => self.serialize(&previous_options, &form),
        };
        form.set(keys::JACKD_OPTIONS, options);

        let card = form.get(keys::SOUNDCARD_NAME).map(str::to_owned);
        if let Some(card) = card {
            if card.starts_with("AudioInjector") && previous_card.as_deref() != Some(card.as_str()) {
                info!("'{}' needs a system update", card);
                conf.flag_pending_system_update();
            }
            if card == RBPI_HEADPHONES {
                form.set(keys::RBPI_HEADPHONES, "0");
            }
        }

        let errors = if form.is_refresh() {
            debug!("refreshing without saving");
            conf.apply_environment(&form.fields);
            None
        } else {
            let fields: FieldMap = form
                .fields
                .into_iter()
                .filter(|(k, _)| !TRANSIENT_PREFIXES.iter().any(|p| k.starts_with(p)))
                .collect();
            let errors = conf.persist(&fields);
            if errors.is_none() {
                conf.request_reboot();
            }
            errors
        };

        self.get(conf, errors)
    }

    /// Write the touched ALSA fields of `form` into `previous`
    ///
    /// Without touched ALSA fields, or when the result can't be built,
    /// `previous` comes back unchanged.
    pub fn serialize(&self, previous: &str, form: &FormSubmission) -> String {
        if !ALSA_FIELDS.iter().any(|f| form.touched(f)) {
            return previous.to_owned();
        }

        let lookup = |k: &str| {
            form.get(k).or_else(|| {
                // a touched checkbox that was not submitted got unchecked
                let checkbox = k == "ALSA_MODE_SOFT" || k == "ALSA_MODE_16";
                if checkbox && form.touched(k) {
                    Some("0")
                } else {
                    None
                }
            })
        };

        match AlsaParams::parse(previous)
            .and_then(|current| current.merge(lookup))
            .and_then(|next| next.rebuild(previous))
        {
            Ok(line) => {
                debug!("jackd options: '{}' -> '{}'", previous, line);
                line
            }
            Err(e) => {
                error!("can't update jackd options '{}': {}", previous, e);
                previous.to_owned()
            }
        }
    }

    /// Hardware PCM devices, plus `current` if it went missing
    ///
    /// Returns the list and the entry standing for `current`.
    pub fn device_list(&self, current: &str) -> (Vec<String>, String) {
        let mut devices = self.audio.list_hardware_pcm_devices().unwrap_or_else(|e| {
            error!("can't list audio devices: {}", e);
            Vec::new()
        });
        devices.retain(|d| d != LOOPBACK_CARD);

        if devices.iter().any(|d| d == current) {
            (devices, current.to_owned())
        } else {
            let missing = format!("{}{}", current, NOT_DETECTED);
            devices.push(missing.clone());
            (devices, missing)
        }
    }

    /// Build the fields of the section from the environment
    pub fn fields(&self, env: &dyn Environment) -> Vec<FormField> {
        let controllers = self.mixer.list_controls("*").unwrap_or_else(|e| {
            error!("can't list mixer controls: {}", e);
            Vec::new()
        });

        let jackd_options = env.var_or(keys::JACKD_OPTIONS, DEFAULT_JACKD_OPTIONS);
        let params = AlsaParams::parse_or_default(jackd_options);
        let (devices, device) = self.device_list(&params.device);

        let custom_disabled = env.var(keys::KIT_VERSION) != Some("Custom");
        let rbpi_disabled = env.var_or(keys::DISABLE_RBPI_AUDIO, "0") == "1";
        let presets = if rbpi_disabled {
            self.catalog.without_rbpi()
        } else {
            self.catalog.clone()
        };

        let mut fields = Vec::new();
        if custom_disabled {
            fields.push(FormField::new(
                "ZYNTHIAN_MESSAGE",
                "",
                FieldKind::Html {
                    content: CUSTOM_KIT_WARNING.into(),
                },
            ));
        }

        fields.push(
            FormField::new(
                keys::SOUNDCARD_NAME,
                "Soundcard",
                FieldKind::Select {
                    options: presets.names().map(str::to_owned).collect(),
                    presets: Some(presets),
                },
            )
            .maybe_value(env.var(keys::SOUNDCARD_NAME))
            .disabled(custom_disabled)
            .refresh_on_change(),
        );
        fields.push(
            FormField::new(
                keys::SOUNDCARD_CONFIG,
                "Driver Config",
                FieldKind::Textarea {
                    cols: 50,
                    rows: 4,
                    controllers: None,
                },
            )
            .maybe_value(env.var(keys::SOUNDCARD_CONFIG))
            .advanced()
            .disabled(custom_disabled),
        );
        fields.push(
            FormField::new(
                "ALSA_DEVICE",
                "Soundcard Device",
                FieldKind::Select {
                    options: devices,
                    presets: None,
                },
            )
            .value(device)
            .refresh_on_change(),
        );
        fields.push(
            FormField::new(
                "ALSA_SAMPLERATE",
                "Samplerate",
                select(&SAMPLE_RATES, &params.sample_rate.to_string()),
            )
            .value(params.sample_rate.to_string())
            .refresh_on_change(),
        );
        fields.push(
            FormField::new(
                "ALSA_NUM_FRAMES",
                "Buffer Size",
                select(&BUFFER_SIZES, &params.frames.to_string()),
            )
            .value(params.frames.to_string())
            .refresh_on_change(),
        );
        fields.push(
            FormField::new(
                "ALSA_NUM_PERIODS",
                "Number of Buffers",
                select(&PERIOD_COUNTS, &params.periods.to_string()),
            )
            .value(params.periods.to_string())
            .refresh_on_change(),
        );
        fields.push(
            FormField::new("ALSA_MODE_16", "16-bit", FieldKind::Boolean)
                .value(flag(params.shorts))
                .refresh_on_change(),
        );
        fields.push(
            FormField::new("ALSA_MODE_SOFT", "Soft x-run mode", FieldKind::Boolean)
                .value(flag(params.soft_mode))
                .refresh_on_change(),
        );
        fields.push(
            FormField::new("ALSA_LATENCY", "Latency", FieldKind::Info)
                .value(format!("{:.1} ms", params.latency_ms())),
        );
        fields.push(
            FormField::new(keys::JACKD_OPTIONS, "Jackd Options", FieldKind::Text)
                .value(jackd_options)
                .advanced()
                .disabled(custom_disabled),
        );
        fields.push(
            FormField::new(keys::AUBIONOTES_OPTIONS, "Aubionotes Options", FieldKind::Text)
                .value(env.var_or(keys::AUBIONOTES_OPTIONS, DEFAULT_AUBIONOTES_OPTIONS))
                .advanced(),
        );

        if self.board.has_rbpi_audio_switch() {
            fields.push(
                FormField::new(keys::DISABLE_RBPI_AUDIO, "Disable RBPi Audio", FieldKind::Boolean)
                    .value(env.var_or(keys::DISABLE_RBPI_AUDIO, "0"))
                    .advanced()
                    .refresh_on_change(),
            );
            if !rbpi_disabled && env.var(keys::SOUNDCARD_NAME) != Some(RBPI_HEADPHONES) {
                fields.push(
                    FormField::new(keys::RBPI_HEADPHONES, "RBPi Headphones", FieldKind::Boolean)
                        .value(env.var_or(keys::RBPI_HEADPHONES, "0")),
                );
            }
        }

        fields.push(
            FormField::new(
                keys::SOUNDCARD_MIXER,
                "Mixer Controls",
                FieldKind::Textarea {
                    cols: 50,
                    rows: 3,
                    controllers: Some(controllers),
                },
            )
            .maybe_value(env.var(keys::SOUNDCARD_MIXER))
            .advanced(),
        );

        fields
    }
}
