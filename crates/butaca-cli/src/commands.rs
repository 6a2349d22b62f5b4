//! CLI command definitions using clap

use butaca::{SeatError, Strategy};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Butaca: plan and run seat-map selection strategies for cinema booking tests
#[derive(Parser, Debug)]
#[command(name = "butaca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Selector configuration file (YAML)
    #[arg(short, long, global = true, env = "BUTACA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a strategy against a seat-map fixture, offline
    Plan(PlanArgs),

    /// Show the parsed seats of a fixture
    Inspect(InspectArgs),

    /// Show the effective selector configuration
    Config(ConfigArgs),

    /// Run a strategy on a live seat-map page (requires the `browser` feature)
    Run(RunArgs),
}

/// Strategy selection shared by `plan` and `run`
#[derive(clap::Args, Debug, Clone)]
pub struct StrategyArgs {
    /// Strategy name: last-available, random, gap-pair, split-in-row,
    /// split-across-rows (`name:N` selects N seats)
    #[arg(short, long, default_value = "last-available")]
    pub strategy: String,

    /// Number of seats for last-available and random
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Seed for random strategies
    #[arg(long)]
    pub seed: Option<u64>,
}

impl StrategyArgs {
    /// Resolve the strategy; `--count` wins over a `:N` suffix
    pub fn resolve(&self) -> Result<Strategy, SeatError> {
        match self.count {
            Some(count) => {
                let name = self
                    .strategy
                    .split_once(':')
                    .map_or(self.strategy.as_str(), |(name, _)| name);
                Strategy::from_name(name, Some(count))
            }
            None => self.strategy.parse(),
        }
    }
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Seat-map fixture (YAML or JSON)
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Strategy options
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Seat-map fixture (YAML or JSON)
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, default_value = "yaml")]
    pub format: ConfigFormatArg,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Seat-map page: a path joined onto the site base URL, or a full URL
    pub url: String,

    /// Strategy options
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Chain under test (overrides the configuration)
    #[arg(long)]
    pub chain: Option<String>,

    /// Environment: production or preproduction (overrides the configuration)
    #[arg(long)]
    pub env: Option<String>,

    /// Click continue and wait for the backend after selecting
    #[arg(long)]
    pub confirm: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the Chromium sandbox
    #[arg(long)]
    pub no_sandbox: bool,

    /// Path to a Chromium binary
    #[arg(long)]
    pub chromium: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Result output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Configuration output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormatArg {
    /// YAML, loadable with --config
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("butaca").chain(args.iter().copied())).unwrap()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_plan_defaults() {
            let cli = parse(&["plan", "--fixture", "map.yaml"]);
            let Commands::Plan(args) = cli.command else {
                panic!("expected plan");
            };
            assert_eq!(args.fixture, PathBuf::from("map.yaml"));
            assert_eq!(args.strategy.strategy, "last-available");
            assert_eq!(args.format, FormatArg::Text);
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = parse(&["inspect", "-f", "map.yaml", "-vv", "--color", "never"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_run_args() {
            let cli = parse(&[
                "run",
                "/compra/123/butacas",
                "--strategy",
                "gap-pair",
                "--chain",
                "uci",
                "--confirm",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.url, "/compra/123/butacas");
            assert_eq!(args.chain.as_deref(), Some("uci"));
            assert!(args.confirm);
        }

        #[test]
        fn test_plan_requires_fixture() {
            assert!(Cli::try_parse_from(["butaca", "plan"]).is_err());
        }
    }

    mod strategy_tests {
        use super::*;

        fn args(strategy: &str, count: Option<usize>) -> StrategyArgs {
            StrategyArgs {
                strategy: strategy.to_string(),
                count,
                seed: None,
            }
        }

        #[test]
        fn test_resolve_name() {
            assert_eq!(args("gap-pair", None).resolve().unwrap(), Strategy::GapPair);
        }

        #[test]
        fn test_resolve_suffix() {
            assert_eq!(
                args("random:4", None).resolve().unwrap(),
                Strategy::RandomN(4)
            );
        }

        #[test]
        fn test_count_wins_over_suffix() {
            assert_eq!(
                args("last-available:4", Some(2)).resolve().unwrap(),
                Strategy::LastAvailableN(2)
            );
        }

        #[test]
        fn test_count_on_fixed_strategy() {
            assert!(args("gap-pair", Some(2)).resolve().is_err());
        }
    }
}
