mod configurator;
mod controller;
mod env;
mod error;
mod hardware;
mod jackd;
mod log;
mod model;
mod settings;
mod tail;

use crate::{
    configurator::EnvConfigurator,
    controller::{keys, AudioConfigController},
    env::{EnvFile, Environment},
    error::Error,
    hardware::AlsaHardware,
    log::oops,
    model::{Board, FormSubmission, PresetCatalog},
    settings::Settings,
};
use std::{env as std_env, fs, io, path::Path};
use tracing::info;

fn print_usage() -> ! {
    eprintln!("usage: audioconf [form|submit <file.json>|presets|tail <file>]");
    std::process::exit(2);
}

fn tail(path: &Path) -> Result<(), Error> {
    let reader = tail::AsyncFileReader::open(path)?;
    let close = reader.closer();
    if let Err(e) = ctrlc::set_handler(move || close()) {
        tracing::warn!("can't install the Ctrl-C handler: {}", e);
    }

    async_std::task::block_on(async {
        let mut out = async_std::io::stdout();
        let n = tail::forward(&reader, &mut out).await?;
        info!("forwarded {} lines, eof: {}", n, reader.eof());
        Ok::<(), Error>(())
    })
}

fn run(settings: &Settings, args: &[String]) -> Result<(), Error> {
    info!("using settings from {}", settings.path().display());
    let app = settings.app();
    let env = EnvFile::load(&app.env_file)?;
    let board = Board::from_version(env.var(keys::RBPI_VERSION));
    let hw = AlsaHardware::new();
    let catalog = PresetCatalog::detect(&board, &hw);
    info!("{} soundcard presets for board {}", catalog.len(), board.version);

    let controller = AudioConfigController::new(&catalog, board, &hw, &hw);
    let mut conf = EnvConfigurator::new(env, app, io::stdout());

    match args[1].as_str() {
        "form" => controller.get(&mut conf, None),
        "submit" => {
            let path = args.get(2).unwrap_or_else(|| print_usage());
            let form: FormSubmission = serde_json::from_str(&fs::read_to_string(path)?)?;
            controller.post(&mut conf, form)
        }
        "presets" => {
            serde_json::to_writer_pretty(io::stdout(), &catalog)?;
            println!();
            Ok(())
        }
        _ => print_usage(),
    }
}

fn main() {
    let args: Vec<String> = std_env::args().collect();
    if args.len() < 2 {
        print_usage();
    }

    log::parse_log_level();

    // tail works on any file and needs neither settings nor hardware
    if args[1] == "tail" {
        let path = args.get(2).unwrap_or_else(|| print_usage());
        if let Err(e) = tail(Path::new(path)) {
            oops(format!("tail failed: {}", e), 1);
        }
        return;
    }

    let settings = match Settings::init(Settings::default_path()) {
        Ok(s) => s,
        Err(e) => oops(format!("failed to load settings: {}", e), 1),
    };

    if let Err(e) = run(&settings, &args) {
        oops(format!("{}", e), 1);
    }
}
