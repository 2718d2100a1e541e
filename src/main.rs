//! configure CLI - generate build settings from install-path variables

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use tracing::debug;

use configure::error::{FixSuggestion, Result};
use configure::{Configuration, Schema, Settings, Version, DEFAULT_SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "configure")]
#[command(about = "Generate a Makefile fragment and a Rust config module from install-path variables")]
#[command(version)]
struct Cli {
    /// Output directory (also used to deduce the build target)
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    directory: PathBuf,

    /// Settings file [default: DIR/configure.toml, if present]
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Makefile fragment to generate
    #[arg(long, value_name = "FILE")]
    makefile: Option<PathBuf>,

    /// Do not generate the Makefile fragment
    #[arg(long, conflicts_with = "makefile")]
    no_makefile: bool,

    /// Rust module to generate
    #[arg(long, value_name = "FILE")]
    rust_config: Option<PathBuf>,

    /// Do not generate the Rust module
    #[arg(long, conflicts_with = "rust_config")]
    no_rust_config: bool,

    /// Name of the generated struct
    #[arg(long, value_name = "IDENT")]
    struct_name: Option<String>,

    /// Name of the generated constant
    #[arg(long, value_name = "IDENT")]
    const_name: Option<String>,

    /// Build target name [default: name of DIR]
    #[arg(long, value_name = "NAME")]
    target: Option<String>,

    /// Application version, e.g. 1.4.2
    #[arg(long, value_name = "X.Y.Z")]
    app_version: Option<Version>,

    /// Print every expanded variable in dependency order
    #[arg(long)]
    print: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line flags take precedence over the settings file
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.makefile {
            settings.makefile = path.clone();
        }
        if self.no_makefile {
            settings.makefile = PathBuf::new();
        }
        if let Some(path) = &self.rust_config {
            settings.rust_config = path.clone();
        }
        if self.no_rust_config {
            settings.rust_config = PathBuf::new();
        }
        if let Some(name) = &self.struct_name {
            settings.struct_name = name.clone();
        }
        if let Some(name) = &self.const_name {
            settings.const_name = name.clone();
        }
        if let Some(target) = &self.target {
            settings.target = Some(target.clone());
        }
        if let Some(version) = &self.app_version {
            settings.version = version.clone();
        }
    }

    fn load_settings(&self) -> Result<Settings> {
        match &self.settings {
            Some(path) => Settings::load(path),
            None => Settings::load_or_default(&self.directory.join(DEFAULT_SETTINGS_FILE)),
        }
    }
}

fn main() {
    // Logging has to be up before the schema is bound to the command line
    init_tracing(verbose_requested(std::env::args_os().skip(1)));

    let schema = Schema::standard();
    let matches = schema.augment_command(Cli::command()).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    debug!(verbose = cli.verbose, directory = %cli.directory.display(), "parsed command line");

    if let Err(e) = run(&schema, &cli, &matches) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// `-v`/`--verbose` ahead of the full parse; arguments after `--` are values
fn verbose_requested<I>(args: I) -> bool
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .take_while(|arg| arg != "--")
        .any(|arg| arg == "-v" || arg == "--verbose")
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn run(schema: &Schema, cli: &Cli, matches: &ArgMatches) -> Result<()> {
    let mut settings = cli.load_settings()?;
    cli.apply(&mut settings);
    settings.validate()?;

    let mut values = schema.default_values();
    values.extend(&settings.variables)?;
    schema.read_matches(matches, &mut values)?;

    let target = settings.resolve_target(&cli.directory)?;
    let config = Configuration::new(schema.clone(), &values, settings, target);

    let written = config.write_artifacts(&cli.directory)?;
    for path in &written {
        println!("{} Wrote {}", "✓".green(), display_relative(path, &cli.directory).cyan());
    }

    if cli.print {
        for name in config.emission_order() {
            println!("{} = {}", name.bold(), config.expand(name).unwrap_or_default());
        }
    }

    Ok(())
}

fn display_relative(path: &Path, dir: &Path) -> String {
    path.strip_prefix(dir).unwrap_or(path).display().to_string()
}
