//! Output formatters for run summaries
//!
//! Provides table, JSON, CSV, and one-line summary formats.

use std::io::Write;
use std::str::FromStr;
use tracing::warn;

use crate::models::{RunSummary, UnitResult, UnitStatus};

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "csv" => Ok(OutputFormat::Csv),
            "summary" => Ok(OutputFormat::Summary),
            other => Err(format!("Unknown output format: {other}")),
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn status_label(&self, status: UnitStatus) -> String {
        let plain = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return plain;
        }
        let color = match status {
            UnitStatus::Pass => "32",
            UnitStatus::Fail | UnitStatus::Error => "31",
            UnitStatus::Ignored | UnitStatus::Config => "33",
        };
        format!("\x1b[{color}m{plain}\x1b[0m")
    }

    pub fn format_result(&self, result: &UnitResult) -> String {
        let mut line = format!(
            "{:9} {} [{}ms]",
            self.status_label(result.status),
            result.unit,
            result.duration_ms
        );
        if let Some(message) = &result.message {
            line.push_str(&format!("\n            {message}"));
        }
        line
    }

    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.format_summary_csv(summary),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mode = if summary.parallel { "parallel" } else { "sequential" };
        let mut output = String::new();

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " {} ({mode}, started {})\n",
            summary.class,
            summary.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        for result in &summary.results {
            output.push_str(&format!(" {}\n", self.format_result(result)));
        }

        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            " Total: {} | Pass: {} | Fail: {} | Error: {} | Ignored: {} | Config: {}\n",
            summary.total,
            summary.passed,
            summary.failed,
            summary.errors,
            summary.ignored,
            summary.config_failures
        ));
        output.push_str(&format!(
            " Pass Rate: {:.1}% | Duration: {}ms\n",
            summary.pass_rate(),
            summary.duration_ms
        ));
        let phases: Vec<String> = summary.phases.iter().map(ToString::to_string).collect();
        output.push_str(&format!(" Phases: {}\n", phases.join(" -> ")));

        output
    }

    fn format_summary_csv(&self, summary: &RunSummary) -> String {
        match write_csv(summary) {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to render {} as CSV: {}", summary.class, e);
                String::new()
            }
        }
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%) in {}ms",
            summary.class,
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.duration_ms
        )
    }
}

fn write_csv(summary: &RunSummary) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["class", "unit", "role", "status", "duration_ms", "message"])?;
    for result in &summary.results {
        writer.write_record([
            summary.class.clone(),
            result.unit.to_string(),
            result.unit.role.to_string(),
            result.status.to_string(),
            result.duration_ms.to_string(),
            result.message.clone().unwrap_or_default(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write summaries to a file, one formatted block per class.
pub fn write_results_to_file(
    path: &str,
    summaries: &[RunSummary],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let mut file = std::fs::File::create(path)?;
    for summary in summaries {
        writeln!(file, "{}", formatter.format_summary(summary))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SchedulerState;
    use crate::models::{MethodId, Role, UnitDescription};
    use chrono::Utc;

    fn summary() -> RunSummary {
        let unit = |name: &str| UnitDescription::plain(MethodId::new("Suite", name), Role::Normal);
        RunSummary::new(
            "Suite",
            false,
            Utc::now(),
            12,
            vec![
                SchedulerState::Idle,
                SchedulerState::RunningNormal,
                SchedulerState::Completed,
            ],
            vec![
                UnitResult::pass(unit("a"), 4),
                UnitResult::fail(unit("b"), 8, "expected \"x\", got y"),
            ],
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TABLE".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("unknown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_table_format() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_summary(&summary());
        assert!(output.contains("✓ PASS"));
        assert!(output.contains("Suite#b"));
        assert!(output.contains("idle -> running-normal -> completed"));
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let output = ResultFormatter::new(OutputFormat::Csv).format_summary(&summary());
        let mut reader = csv::Reader::from_reader(output.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][5], "expected \"x\", got y");
    }

    #[test]
    fn test_write_csv_has_header_and_one_row_per_result() {
        let output = write_csv(&summary()).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("class,unit,role,status,duration_ms,message")
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let output = ResultFormatter::new(OutputFormat::Json).format_summary(&summary());
        let parsed: RunSummary = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.failed, 1);
        assert_eq!(parsed.phases.len(), 3);
    }

    #[test]
    fn test_write_results_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_results_to_file(path.to_str().unwrap(), &[summary()], OutputFormat::Summary)
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Suite: 1/2 passed"));
    }
}
