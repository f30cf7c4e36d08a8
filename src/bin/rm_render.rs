//! Render a reMarkable document bundle to PDF.
//!
//! Usage:
//!   rm-render <root> <uuid> --out <dir> [--templates <dir>] [--landscape]
//!             [--strict] [--no-compress] [--verbose]
//!
//! Writes `<uuid>.pdf` and, when `<root>/<uuid>.pdf` exists,
//! `<uuid>.annotated-only.pdf`.

use rm_lines::bundle::{render_bundle, DocumentBundle};
use rm_lines::config::RenderOptions;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: rm-render <root> <uuid> --out <dir> [--templates <dir>] [--landscape] [--strict] [--no-compress] [--verbose]";

struct CliConfig {
    root: PathBuf,
    uuid: String,
    out: PathBuf,
    options: RenderOptions,
    verbose: bool,
}

impl CliConfig {
    fn from_args(args: &[String]) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut out = None;
        let mut options = RenderOptions::new();
        let mut verbose = false;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--out" | "-o" => {
                    i += 1;
                    out = Some(PathBuf::from(args.get(i).ok_or("--out needs a directory")?));
                },
                "--templates" => {
                    i += 1;
                    options = options.with_templates_dir(args.get(i).ok_or("--templates needs a directory")?);
                },
                "--landscape" => options = options.with_landscape(true),
                "--strict" => options = options.with_strict(true),
                "--no-compress" => options = options.with_compress(false),
                "--verbose" | "-v" => verbose = true,
                flag if flag.starts_with('-') => return Err(format!("unknown option {}", flag)),
                value => positional.push(value.to_string()),
            }
            i += 1;
        }

        let [root, uuid] = <[String; 2]>::try_from(positional).map_err(|_| "expected <root> and <uuid>".to_string())?;
        Ok(Self {
            root: PathBuf::from(root),
            uuid,
            out: out.ok_or("--out is required")?,
            options,
            verbose,
        })
    }
}

fn run(config: &CliConfig) -> rm_lines::Result<()> {
    let bundle = DocumentBundle::open(&config.root, config.uuid.as_str())?;
    let output = render_bundle(&bundle, &config.options)?;

    for warning in output.warnings() {
        eprintln!("warning: {}", warning);
    }
    std::fs::create_dir_all(&config.out)?;
    for path in output.save(&config.out, &config.uuid)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match CliConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}\n{}", e, USAGE);
            return ExitCode::from(2);
        },
    };

    let default_filter = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
