//! Butaca CLI: seat-map selection for cinema booking tests
//!
//! ## Usage
//!
//! ```bash
//! butaca plan -f seat_map.yaml                    # Last available seat
//! butaca plan -f seat_map.yaml -s random -n 4     # Four random seats
//! butaca inspect -f seat_map.yaml                 # Parsed seats and matrix
//! butaca config --format json                     # Effective configuration
//! butaca run /compra/123/butacas -s gap-pair      # Live page (browser feature)
//! ```

use butaca_cli::{
    handlers, init_tracing, Cli, CliConfig, CliResult, ColorChoice, Commands, Reporter, Verbosity,
};
use clap::Parser;
use std::io::Write as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    console::set_colors_enabled(config.color.should_color());
    console::set_colors_enabled_stderr(config.color.should_color());
    init_tracing(&config);

    let selector_config = handlers::load_selector_config(cli.config.as_deref())?;
    let output = match cli.command {
        Commands::Plan(ref args) => handlers::plan(args, selector_config, &config)?,
        Commands::Inspect(ref args) => handlers::inspect(args, &selector_config, &config)?,
        Commands::Config(ref args) => handlers::show_config(args, &selector_config)?,
        Commands::Run(ref args) => {
            let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
            match handlers::run_live(args, selector_config, &config, &reporter) {
                Ok(output) => output,
                Err(e) => {
                    reporter.failure("seat selection failed");
                    return Err(e);
                }
            }
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_json_logs(cli.log_json)
}
