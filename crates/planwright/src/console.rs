//! Colorful console output for solver events.
//!
//! Provides a custom `tracing` layer that formats solver events with colors.
//! Initialized by the solver entry points when the `console` feature is
//! enabled.

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the solver console output.
///
/// Safe to call multiple times; only the first call has effect. A global
/// subscriber installed earlier wins.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SolverConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats solver events with colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverConsoleLayer;

impl<S: Subscriber> Layer<S> for SolverConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("planwright_solver") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_solver_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    phase: Option<String>,
    phase_index: Option<u64>,
    duration_ms: Option<u64>,
    steps: Option<u64>,
    phases: Option<u64>,
    calculation_count: Option<u64>,
    step: Option<u64>,
    score: Option<String>,
    best_score: Option<String>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "phase_index" => self.phase_index = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "steps" => self.steps = Some(value),
            "phases" => self.phases = Some(value),
            "calculation_count" => self.calculation_count = Some(value),
            "step" => self.step = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let value = value.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(value),
            "phase" => self.phase = Some(value),
            "score" => self.score = Some(strip_some(&value)),
            "best_score" => self.best_score = Some(strip_some(&value)),
            _ => {}
        }
    }
}

/// Debug-formatted optional scores arrive as `Some(..)`.
fn strip_some(value: &str) -> String {
    value
        .strip_prefix("Some(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(value)
        .to_string()
}

fn format_solver_event(v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("solve_start") => format_solving_started(v),
        Some("phase_start") => format_phase_start(v),
        Some("phase_end") => format_phase_end(v),
        Some("solve_end") => format_solving_ended(v),
        _ => String::new(),
    }
}

fn format_solving_started(v: &EventVisitor) -> String {
    format!(
        "{} {} {} solving started: phases ({}), initial score ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        v.phases.unwrap_or(0).to_string().bright_yellow(),
        format_score(v.score.as_deref().unwrap_or("N/A")),
    )
}

fn format_phase_start(v: &EventVisitor) -> String {
    let phase = v.phase.as_deref().unwrap_or("Unknown");
    format!(
        "{} {} {} {} phase ({}) started",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", phase).bright_cyan(),
        phase.white().bold(),
        v.phase_index.unwrap_or(0).to_string().yellow(),
    )
}

fn format_phase_end(v: &EventVisitor) -> String {
    let phase = v.phase.as_deref().unwrap_or("Unknown");
    format!(
        "{} {} {} {} phase ({}) ended: time spent ({}), step score ({}), step total ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", phase).bright_cyan(),
        phase.white().bold(),
        v.phase_index.unwrap_or(0).to_string().yellow(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        format_score(v.score.as_deref().unwrap_or("N/A")),
        v.steps.unwrap_or(0).to_formatted_string(&Locale::en).white(),
    )
}

fn format_solving_ended(v: &EventVisitor) -> String {
    let duration_ms = v.duration_ms.unwrap_or(0);
    let calculation_count = v.calculation_count.unwrap_or(0);
    let speed = if duration_ms == 0 {
        calculation_count
    } else {
        calculation_count * 1000 / duration_ms
    };
    format!(
        "{} {} {} solving ended: time spent ({}), best score ({}), score calculation speed ({}/sec), step total ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration_ms(duration_ms).yellow(),
        format_score(v.best_score.as_deref().unwrap_or("N/A")),
        speed.to_formatted_string(&Locale::en).bright_magenta().bold(),
        v.steps.unwrap_or(0).to_formatted_string(&Locale::en).white(),
    )
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{:5}.{:03}", d.as_secs() % 100_000, d.subsec_millis()))
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

/// Colors a score by its sign; scores with an init part are uninitialized.
fn format_score(score: &str) -> String {
    if score.contains("init") {
        return score.yellow().to_string();
    }
    if score.contains("hard") {
        if let Some((hard, soft)) = score.split_once('/') {
            let hard_str = if hard.starts_with('-') {
                hard.bright_red().to_string()
            } else {
                hard.bright_green().to_string()
            };
            let soft_str = if soft.starts_with('-') {
                soft.yellow().to_string()
            } else {
                soft.white().to_string()
            };
            return format!("{}/{}", hard_str, soft_str);
        }
    }
    match score.parse::<i64>() {
        Ok(n) if n < 0 => score.bright_red().to_string(),
        Ok(n) if n > 0 => score.bright_green().to_string(),
        _ => score.white().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_some() {
        assert_eq!(strip_some("Some(-3)"), "-3");
        assert_eq!(strip_some("None"), "None");
    }

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_only_known_events_are_printed() {
        let visitor = EventVisitor {
            event: Some("move_evaluated".to_string()),
            ..Default::default()
        };
        assert!(format_solver_event(&visitor).is_empty());

        let visitor = EventVisitor {
            event: Some("phase_start".to_string()),
            phase: Some("ConstructionHeuristic".to_string()),
            ..Default::default()
        };
        assert!(format_solver_event(&visitor).contains("phase"));
    }
}
