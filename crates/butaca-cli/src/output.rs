//! Output formatting

use butaca::{Seat, SeatSnapshot, SeatState, SnapshotSummary, Strategy};
use console::{style, Term};
use serde::Serialize;
use std::fmt::Write as _;

/// Status reporter on stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }
}

/// Machine-readable result of a strategy run
#[derive(Debug, Serialize)]
pub struct SelectionReport<'a> {
    /// Strategy as given on the command line
    pub strategy: String,
    /// Seats in click order
    pub seats: &'a [Seat],
    /// Map after the selection
    pub summary: SnapshotSummary,
}

impl<'a> SelectionReport<'a> {
    /// Build a report
    #[must_use]
    pub fn new(strategy: Strategy, seats: &'a [Seat], after: &SeatSnapshot) -> Self {
        Self {
            strategy: strategy.to_string(),
            seats,
            summary: after.summary(),
        }
    }

    /// Render as text
    #[must_use]
    pub fn render_text(&self, use_color: bool) -> String {
        let mut out = String::new();
        let heading = format!("Strategy: {}", self.strategy);
        let _ = writeln!(out, "{}", paint(&heading, use_color, |s| s.bold()));
        for (i, seat) in self.seats.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. row {} seat {} ({})",
                i + 1,
                seat.row(),
                seat.seat_number(),
                seat.seat_type()
            );
        }
        let _ = writeln!(
            out,
            "Selected {} seat(s); {} still available",
            self.summary.selected, self.summary.available
        );
        out
    }
}

/// Text rendering of a snapshot: counts, then the available-seat matrix
#[must_use]
pub fn render_snapshot_text(snapshot: &SeatSnapshot, use_color: bool) -> String {
    let summary = snapshot.summary();
    let mut out = String::new();
    let _ = writeln!(out, "Seats: {}", summary.total);
    for (state, count) in [
        (SeatState::Available, summary.available),
        (SeatState::Selected, summary.selected),
        (SeatState::Unavailable, summary.unavailable),
        (SeatState::Unknown, summary.unknown),
    ] {
        let label = format!("{:<12}", state.as_str());
        let label = match state {
            SeatState::Available => paint(&label, use_color, |s| s.green()),
            SeatState::Unavailable => paint(&label, use_color, |s| s.red()),
            _ => label,
        };
        let _ = writeln!(out, "  {label} {count}");
    }
    let types: Vec<String> = summary
        .by_type
        .iter()
        .map(|(name, count)| format!("{name}={count}"))
        .collect();
    let _ = writeln!(out, "Types: {}", types.join(", "));
    let _ = writeln!(out, "Available by row (back to front):");
    out.push_str(&snapshot.matrix().render());
    out
}

fn paint(
    text: &str,
    use_color: bool,
    f: impl FnOnce(console::StyledObject<&str>) -> console::StyledObject<&str>,
) -> String {
    if use_color {
        f(style(text)).force_styling(true).to_string()
    } else {
        text.to_string()
    }
}
