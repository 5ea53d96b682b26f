use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use waystone_game::{CatalogLoader, Persisted, ProgressStorage, ProgressTracker, RegionSummary, Step};

/// Snapshot of the query surface, as printed by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub region_id: String,
    pub region_name: Option<String>,
    pub current_step: Option<Step>,
    pub next_step: Option<Step>,
    pub previous_region: Option<String>,
    pub next_region: Option<String>,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<Persisted>,
}

impl StatusReport {
    pub fn capture<L, S>(tracker: &ProgressTracker<L, S>, persisted: Option<Persisted>) -> Self
    where
        L: CatalogLoader,
        S: ProgressStorage,
    {
        Self {
            region_id: tracker.state().current_region_id.clone(),
            region_name: tracker.current_region().map(|r| r.name.clone()),
            current_step: tracker.current_step().cloned(),
            next_step: tracker.next_step().cloned(),
            previous_region: tracker.previous_region().map(|r| r.id.clone()),
            next_region: tracker.next_region().map(|r| r.id.clone()),
            progress: tracker.progress(),
            persisted,
        }
    }
}

fn step_line(step: &Step) -> String {
    if step.title.is_empty() {
        format!("#{}", step.id)
    } else {
        format!("#{} {}", step.id, step.title)
    }
}

pub fn write_console_status(out: &mut dyn Write, report: &StatusReport) -> Result<()> {
    if report.persisted == Some(Persisted::Failed) {
        writeln!(
            out,
            "{}",
            "⚠️  Could not save progress; changes last for this session only".yellow()
        )?;
    }

    let Some(name) = report.region_name.as_deref() else {
        writeln!(out, "{} {}", "No region available:".red(), report.region_id)?;
        return Ok(());
    };

    writeln!(out, "{} {}", "🗺️ ".bright_cyan(), name.bright_cyan().bold())?;
    writeln!(out, "Progress: {:.2}%", report.progress)?;
    match &report.current_step {
        Some(step) => writeln!(out, "Current step: {}", step_line(step).bold())?,
        None => writeln!(out, "Current step: -")?,
    }
    match &report.next_step {
        Some(step) => writeln!(out, "Next step: {}", step_line(step))?,
        None => writeln!(out, "Next step: {}", "none remaining".green())?,
    }
    writeln!(
        out,
        "Previous region: {}",
        report.previous_region.as_deref().unwrap_or("-")
    )?;
    writeln!(
        out,
        "Next region: {}",
        report.next_region.as_deref().unwrap_or("-")
    )?;
    Ok(())
}

pub fn write_console_overview(
    out: &mut dyn Write,
    summaries: &[RegionSummary],
    current_region_id: &str,
) -> Result<()> {
    writeln!(out, "{}", "📊 Region Progress".bright_cyan().bold())?;
    writeln!(out, "{}", "==================".cyan())?;
    if summaries.is_empty() {
        writeln!(out, "No regions available.")?;
        return Ok(());
    }
    for summary in summaries {
        let marker = if summary.id == current_region_id { "▶" } else { " " };
        let figures = format!(
            "{}/{} ({:.1}%)",
            summary.completed, summary.total, summary.percent
        );
        let figures = if summary.total > 0 && summary.completed == summary.total {
            figures.green()
        } else {
            figures.normal()
        };
        writeln!(out, "{marker} {:25} {figures}", summary.id)?;
    }
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use waystone_game::{JsonCatalog, MemoryStorage, TrackerConfig};

    fn tracker() -> ProgressTracker<JsonCatalog, MemoryStorage> {
        ProgressTracker::open(
            JsonCatalog::new(
                r#"{"regions":[{"id":"west-limgrave","name":"West Limgrave",
                    "steps":[{"id":1,"title":"Begin"},{"id":2}]}]}"#,
            ),
            MemoryStorage::new(),
            TrackerConfig::default(),
        )
    }

    #[test]
    fn console_status_lists_steps() {
        colored::control::set_override(false);
        let mut tracker = tracker();
        let persisted = tracker.complete_step(1);
        let report = StatusReport::capture(&tracker, Some(persisted));
        let mut out = Vec::new();
        write_console_status(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("West Limgrave"));
        assert!(text.contains("Progress: 50.00%"));
        assert!(text.contains("Current step: #2"));
        assert!(text.contains("Next step: none remaining"));
    }

    #[test]
    fn json_status_is_machine_readable() {
        let tracker = tracker();
        let report = StatusReport::capture(&tracker, None);
        let mut out = Vec::new();
        write_json(&mut out, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["region_id"], "west-limgrave");
        assert_eq!(value["current_step"]["id"], 1);
        assert_eq!(value["next_step"]["id"], 2);
        assert!(value.get("persisted").is_none());
    }

    #[test]
    fn overview_marks_current_region() {
        colored::control::set_override(false);
        let tracker = tracker();
        let mut out = Vec::new();
        write_console_overview(&mut out, &tracker.overview(), "west-limgrave").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("▶ west-limgrave"));
        assert!(text.contains("0/2 (0.0%)"));
    }
}
