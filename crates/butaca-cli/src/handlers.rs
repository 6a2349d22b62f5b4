//! Command handlers

use crate::commands::{ConfigArgs, ConfigFormatArg, FormatArg, InspectArgs, PlanArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render_snapshot_text, Reporter, SelectionReport};
use butaca::{
    MockSeatMap, SeatMapFixture, SeatMapSelector, SeatSnapshot, SelectionTiming, SelectorConfig,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load the selector configuration: defaults, then `path`, then `BUTACA_*`
pub fn load_selector_config(path: Option<&Path>) -> CliResult<SelectorConfig> {
    SelectorConfig::load(path).map_err(|e| match path {
        Some(path) => CliError::config(format!("{}: {e}", path.display())),
        None => CliError::config(e.to_string()),
    })
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create runtime: {e}")))
}

fn load_fixture(path: &Path) -> CliResult<SeatMapFixture> {
    SeatMapFixture::from_path(path)
        .map_err(|e| CliError::invalid_argument(format!("{}: {e}", path.display())))
}

/// In-memory seat map for a fixture, set up with the configured locators
/// and poll interval
#[must_use]
pub fn offline_map(fixture: SeatMapFixture, config: &SelectorConfig) -> MockSeatMap {
    MockSeatMap::from_fixture(fixture)
        .with_locators(&config.locators)
        .with_poll_interval(config.timing.poll_interval())
}

/// Run a strategy against a fixture and render the result
pub fn plan(args: &PlanArgs, selector_config: SelectorConfig, cli: &CliConfig) -> CliResult<String> {
    let strategy = args.strategy.resolve()?;
    let fixture = load_fixture(&args.fixture)?;
    info!(
        fixture = fixture.name.as_deref().unwrap_or("unnamed"),
        seats = fixture.seats.len(),
        %strategy,
        "planning offline"
    );

    // the in-memory map reacts instantly; no pauses needed
    let config = selector_config.with_timing(SelectionTiming::immediate());
    let map = Arc::new(offline_map(fixture, &config));
    let mut selector = SeatMapSelector::from_page(Arc::clone(&map), config);
    if let Some(seed) = args.strategy.seed {
        selector = selector.with_seed(seed);
    }

    let (seats, after) = runtime()?.block_on(async {
        let seats = selector.select_with(strategy).await?;
        let after = selector.snapshot().await?;
        Ok::<_, CliError>((seats, after))
    })?;

    let report = SelectionReport::new(strategy, &seats, &after);
    match args.format {
        FormatArg::Text => Ok(report.render_text(cli.color.should_color())),
        FormatArg::Json => Ok(serde_json::to_string_pretty(&report)? + "\n"),
    }
}

/// Parse a fixture and render its snapshot
pub fn inspect(
    args: &InspectArgs,
    selector_config: &SelectorConfig,
    cli: &CliConfig,
) -> CliResult<String> {
    let fixture = load_fixture(&args.fixture)?;
    let map = MockSeatMap::from_fixture(fixture);
    let snapshot = runtime()?.block_on(SeatSnapshot::capture(&map, selector_config.label_parsing))?;

    match args.format {
        FormatArg::Text => Ok(render_snapshot_text(&snapshot, cli.color.should_color())),
        FormatArg::Json => Ok(serde_json::to_string_pretty(&snapshot)? + "\n"),
    }
}

/// Render the effective configuration
pub fn show_config(args: &ConfigArgs, selector_config: &SelectorConfig) -> CliResult<String> {
    match args.format {
        ConfigFormatArg::Yaml => Ok(selector_config.to_yaml()?),
        ConfigFormatArg::Json => Ok(serde_json::to_string_pretty(selector_config)? + "\n"),
    }
}

/// Run a strategy on a live page
#[cfg(feature = "browser")]
pub fn run_live(
    args: &RunArgs,
    selector_config: SelectorConfig,
    cli: &CliConfig,
    reporter: &Reporter,
) -> CliResult<String> {
    use butaca::{ChromiumSeatMap, LaunchOptions, SeatMapPage};

    let strategy = args.strategy.resolve()?;
    let mut config = selector_config;
    if let Some(ref chain) = args.chain {
        config.site.chain = chain.parse()?;
    }
    if let Some(ref environment) = args.env {
        config.site.environment = environment.parse()?;
    }
    let url = config.site.url(&args.url);

    let mut options = LaunchOptions::default();
    if args.headed {
        options = options.headed();
    }
    if args.no_sandbox {
        options = options.with_no_sandbox();
    }
    if let Some(ref path) = args.chromium {
        options = options.with_chromium_path(path);
    }

    let page_object = SeatMapPage::new(&config);
    if !page_object.matches_url(&url) {
        tracing::warn!(%url, pattern = %config.locators.url_pattern, "url does not look like a seat-map page");
    }

    runtime()?.block_on(async {
        let page = ChromiumSeatMap::launch(&options, &config.locators.seat)
            .await?
            .with_poll_interval(config.timing.poll_interval());
        let page = Arc::new(page);
        page.goto(&url).await?;
        page_object.wait_until_loaded(page.as_ref()).await?;

        let mut selector = SeatMapSelector::from_page(Arc::clone(&page), config);
        if let Some(seed) = args.strategy.seed {
            selector = selector.with_seed(seed);
        }
        let seats = selector.select_with(strategy).await?;
        let after = selector.snapshot().await?;
        reporter.success(&format!("selected {} seat(s) on {url}", seats.len()));

        if args.confirm {
            page_object.confirm_selection(page.as_ref()).await?;
            reporter.success("selection confirmed");
        }

        let report = SelectionReport::new(strategy, &seats, &after);
        let rendered = match args.format {
            FormatArg::Text => report.render_text(cli.color.should_color()),
            FormatArg::Json => serde_json::to_string_pretty(&report)? + "\n",
        };
        drop(selector);
        if let Ok(page) = Arc::try_unwrap(page) {
            page.close().await?;
        }
        Ok::<_, CliError>(rendered)
    })
}

/// Run a strategy on a live page
#[cfg(not(feature = "browser"))]
pub fn run_live(
    _args: &RunArgs,
    _selector_config: SelectorConfig,
    _cli: &CliConfig,
    _reporter: &Reporter,
) -> CliResult<String> {
    Err(CliError::runtime(
        "live runs need the browser feature. Rebuild with --features browser",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::StrategyArgs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const FIXTURE: &str = "\
name: test map
seats:
  - { label: \"1-1\", class_names: \"seat seat--available\" }
  - { label: \"1-2\", class_names: \"seat seat--available\" }
  - { label: \"1-3\", class_names: \"seat seat--available\" }
  - { label: \"2-1\", class_names: \"seat seat--unavailable\" }
  - { label: \"2-2\", class_names: \"seat seat--vip seat--available\" }
";

    fn fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.yaml");
        std::fs::write(&path, FIXTURE).unwrap();
        (dir, path)
    }

    fn plan_args(fixture: PathBuf, strategy: &str, format: FormatArg) -> PlanArgs {
        PlanArgs {
            fixture,
            strategy: StrategyArgs {
                strategy: strategy.to_string(),
                count: None,
                seed: Some(1),
            },
            format,
        }
    }

    #[test]
    fn test_plan_text() {
        let (_dir, path) = fixture();
        let out = plan(
            &plan_args(path, "last-available", FormatArg::Text),
            SelectorConfig::default(),
            &CliConfig::default(),
        )
        .unwrap();
        assert!(out.contains("row 2 seat 2 (vip)"));
        assert!(out.contains("Selected 1 seat(s); 3 still available"));
    }

    #[test]
    fn test_plan_json() {
        let (_dir, path) = fixture();
        let out = plan(
            &plan_args(path, "gap-pair", FormatArg::Json),
            SelectorConfig::default(),
            &CliConfig::default(),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["seats"][0]["seat_number"], 1);
        assert_eq!(value["seats"][1]["seat_number"], 3);
        assert_eq!(value["summary"]["selected"], 2);
    }

    #[test]
    fn test_plan_not_found() {
        let (_dir, path) = fixture();
        let err = plan(
            &plan_args(path, "split-in-row", FormatArg::Text),
            SelectorConfig::default(),
            &CliConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Seat(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_missing_fixture() {
        let err = plan(
            &plan_args(PathBuf::from("/nonexistent/map.yaml"), "random", FormatArg::Text),
            SelectorConfig::default(),
            &CliConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_inspect_text() {
        let (_dir, path) = fixture();
        let out = inspect(
            &InspectArgs {
                fixture: path,
                format: FormatArg::Text,
            },
            &SelectorConfig::default(),
            &CliConfig::default(),
        )
        .unwrap();
        assert!(out.contains("Seats: 5"));
        assert!(out.contains("  1 | 1 2 3"));
    }

    #[test]
    fn test_offline_map_uses_configured_poll_interval() {
        let (_dir, path) = fixture();
        let fixture = SeatMapFixture::from_path(&path).unwrap();
        let mut config = SelectorConfig::default();
        config.timing.poll_interval_ms = 17;
        let map = offline_map(fixture, &config);
        assert_eq!(map.poll_interval(), std::time::Duration::from_millis(17));
    }

    #[test]
    fn test_show_config_yaml() {
        let out = show_config(
            &ConfigArgs {
                format: ConfigFormatArg::Yaml,
            },
            &SelectorConfig::default(),
        )
        .unwrap();
        let parsed = SelectorConfig::from_yaml_str(&out).unwrap();
        assert_eq!(parsed, SelectorConfig::default());
    }
}
