//! Core formatting traits and implementations
//!
//! This module defines the report formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    models::{Anomaly, AnomalyKind, CaseOutcome, CaseResult, RunReport},
    stats::RunSummary,
};
use std::fmt::Write as _;

/// Main trait for report formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format the run parameters (device, stream, step)
    fn format_run_info(&self, report: &RunReport) -> Result<String>;

    /// Format per-case results as a table
    fn format_case_table(&self, cases: &[CaseResult]) -> Result<String>;

    /// Format the anomalies recorded for one case
    fn format_anomalies(&self, case: &CaseResult) -> Result<String>;

    /// Format the run summary counters
    fn format_summary(&self, summary: &RunSummary) -> Result<String>;

    /// Format the final one-line verdict
    fn format_verdict(&self, report: &RunReport) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show anomaly details and step statistics
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
    /// Anomalies listed per case before eliding the rest
    pub max_anomalies_shown: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            max_anomalies_shown: 10,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    fn new(header: &str, alignment: Alignment, min_width: usize, max_width: usize) -> Self {
        Self { header: header.to_string(), alignment, min_width, max_width }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// The per-case table layout shared by both formatters
pub(crate) fn case_table_format(show_borders: bool) -> TableFormat {
    TableFormat {
        columns: vec![
            Column::new("Read Size", Alignment::Right, 9, 12),
            Column::new("Iterations", Alignment::Right, 10, 12),
            Column::new("Reads", Alignment::Right, 6, 12),
            Column::new("Mismatches", Alignment::Right, 10, 12),
            Column::new("Status", Alignment::Right, 6, 12),
            Column::new("Step Min/Max", Alignment::Right, 12, 27),
            Column::new("Duration", Alignment::Right, 8, 10),
            Column::new("Result", Alignment::Center, 6, 6),
        ],
        show_borders,
        show_header: true,
    }
}

/// One table row per case
pub(crate) fn case_row(result: &CaseResult) -> RowData {
    let steps = match (result.step_stats.min, result.step_stats.max) {
        (Some(min), Some(max)) => format!("{}/{}", min, max),
        _ => "N/A".to_string(),
    };
    vec![
        result.case.gap.to_string(),
        result.case.iterations.to_string(),
        result.reads_completed.to_string(),
        result.mismatch_count.to_string(),
        result.status_count.to_string(),
        steps,
        format_duration(result.duration_ms),
        result.outcome.label().to_string(),
    ]
}

/// Describe one anomaly on a single line
pub(crate) fn describe_anomaly(anomaly: &Anomaly) -> String {
    match anomaly.kind {
        AnomalyKind::TimestampMismatch { expected, actual } => {
            let offset = actual.wrapping_sub(expected) as i64;
            format!(
                "@ {}: expected 0x{:016x}, got 0x{:016x} ({:+} ticks)",
                anomaly.iteration, expected, actual, offset
            )
        }
        AnomalyKind::Status { status } => {
            let names = crate::device::describe_status(status);
            format!("@ {}: status 0x{:08x} ({})", anomaly.iteration, status, names.join(", "))
        }
    }
}

/// Format duration in human-readable format
pub(crate) fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.0}us", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format percentage with appropriate precision
pub(crate) fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Format a sample rate with an SI prefix
pub(crate) fn format_rate(samples_per_second: f64) -> String {
    if samples_per_second >= 1e6 {
        format!("{:.2} Msps", samples_per_second / 1e6)
    } else if samples_per_second >= 1e3 {
        format!("{:.2} ksps", samples_per_second / 1e3)
    } else {
        format!("{:.0} sps", samples_per_second)
    }
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let widths = self.calculate_column_widths(format, rows);
        let mut lines = Vec::new();

        if format.show_header {
            if format.show_borders {
                lines.push(self.create_horizontal_border(&widths));
            }
            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            lines.push(self.create_row(&headers, &widths, format));
            if format.show_borders {
                lines.push(self.create_horizontal_border(&widths));
            }
        }

        for row in rows {
            lines.push(self.create_row(row, &widths, format));
        }

        if format.show_borders {
            lines.push(self.create_horizontal_border(&widths));
        }

        lines.join("\n")
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let content = rows.iter().filter_map(|r| r.get(idx)).map(|c| c.len()).max().unwrap_or(0);
                col.min_width.max(col.header.len()).max(content).min(col.max_width)
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();
        if format.show_borders {
            row.push('|');
        }

        for ((cell, &width), column) in data.iter().zip(widths).zip(&format.columns) {
            let padded = self.align_text(cell, width, &column.alignment);
            if format.show_borders {
                row.push(' ');
                row.push_str(&padded);
                row.push_str(" |");
            } else {
                row.push_str(&padded);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        if text.len() >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - text.len();
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(padding - left_pad))
            }
        }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "=".repeat(title.len() + 4);
        Ok(format!("{}\n  {}  \n{}", border, title, border))
    }

    fn format_run_info(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();
        let stream = &report.stream;

        writeln!(output, "Run ID:           {}", report.run_id).map_err(fmt_err)?;
        writeln!(output, "Device:           {} ({})", report.device, report.backend).map_err(fmt_err)?;
        writeln!(
            output,
            "Stream:           {} buffers x {} samples, {} transfers, {} ms timeout",
            stream.num_buffers, stream.buffer_size, stream.num_transfers, stream.timeout_ms
        )
        .map_err(fmt_err)?;
        write!(output, "Timestamp step:   {} ticks/sample", report.timestamp_step).map_err(fmt_err)?;
        if report.keep_going {
            write!(output, "\nMode:             keep going after anomalies").map_err(fmt_err)?;
        }

        Ok(output)
    }

    fn format_case_table(&self, cases: &[CaseResult]) -> Result<String> {
        if cases.is_empty() {
            return Ok("No test cases were run.".to_string());
        }

        let rows: Vec<RowData> = cases.iter().map(case_row).collect();
        Ok(self.create_table(&case_table_format(self.options.table_borders), &rows))
    }

    fn format_anomalies(&self, case: &CaseResult) -> Result<String> {
        let mut output = String::new();

        write!(output, "Case {}:", case.case).map_err(fmt_err)?;
        if let CaseOutcome::Aborted { error } = &case.outcome {
            write!(output, "\n  aborted: {}", error).map_err(fmt_err)?;
        }
        for anomaly in case.anomalies.iter().take(self.options.max_anomalies_shown) {
            write!(output, "\n  {}", describe_anomaly(anomaly)).map_err(fmt_err)?;
        }
        let hidden = case.anomaly_count().saturating_sub(case.anomalies.len().min(self.options.max_anomalies_shown) as u64);
        if hidden > 0 {
            write!(output, "\n  ... {} more", hidden).map_err(fmt_err)?;
        }
        if self.options.verbose_mode {
            if let (Some(mean), Some(sd)) = (case.step_stats.mean(), case.step_stats.std_dev()) {
                write!(output, "\n  step mean {:.2} ticks, std dev {:.2}", mean, sd).map_err(fmt_err)?;
            }
        }

        Ok(output)
    }

    fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Summary:").map_err(fmt_err)?;
        writeln!(output, "--------").map_err(fmt_err)?;
        writeln!(output, "Cases:            {}", summary.total_cases).map_err(fmt_err)?;
        writeln!(
            output,
            "Passed:           {} ({})",
            summary.passed,
            format_percentage(summary.pass_rate())
        )
        .map_err(fmt_err)?;
        writeln!(output, "Failed:           {}", summary.failed).map_err(fmt_err)?;
        writeln!(output, "Aborted:          {}", summary.aborted).map_err(fmt_err)?;
        if summary.interrupted > 0 {
            writeln!(output, "Interrupted:      {}", summary.interrupted).map_err(fmt_err)?;
        }
        writeln!(output, "Reads:            {}", summary.total_reads).map_err(fmt_err)?;
        writeln!(output, "Samples:          {}", summary.total_samples).map_err(fmt_err)?;
        writeln!(
            output,
            "Anomalies:        {} mismatches, {} status warnings",
            summary.total_mismatches, summary.total_status_warnings
        )
        .map_err(fmt_err)?;
        write!(output, "Duration:         {}", format_duration(summary.total_duration_ms)).map_err(fmt_err)?;
        if let Some(rate) = summary.throughput_sps() {
            write!(output, " ({})", format_rate(rate)).map_err(fmt_err)?;
        }

        Ok(output)
    }

    fn format_verdict(&self, report: &RunReport) -> Result<String> {
        if let Some(error) = &report.fatal_error {
            return self.format_error(&format!("Run stopped: {}", error));
        }
        if report.interrupted() {
            return self.format_warning("Run interrupted");
        }
        if report.passed() {
            self.format_success(&format!("All {} test case(s) passed", report.summary.total_cases))
        } else {
            self.format_error(&format!(
                "{} of {} test case(s) did not pass",
                report.summary.total_cases - report.summary.passed,
                report.summary.total_cases
            ))
        }
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;

    fn formatter() -> PlainFormatter {
        PlainFormatter::new(FormattingOptions { enable_color: false, ..Default::default() })
    }

    fn passed_case(gap: u64) -> CaseResult {
        let mut result = CaseResult::new(TestCase::new(gap, 3));
        result.initial_timestamp = Some(0);
        result.reads_completed = 3;
        for _ in 0..3 {
            result.step_stats.add_delta(gap as i64 * 2);
        }
        result.duration_ms = 12.5;
        result
    }

    #[test]
    fn test_case_table() {
        let table = formatter().format_case_table(&[passed_case(1024)]).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("+-"));
        assert!(lines[1].contains("Read Size"));
        assert!(lines[3].contains("1024"));
        assert!(lines[3].contains("2048/2048"));
        assert!(lines[3].contains("12.5ms"));
        assert!(lines[3].contains("PASS"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(formatter().format_case_table(&[]).unwrap(), "No test cases were run.");
    }

    #[test]
    fn test_anomalies_elided() {
        let options = FormattingOptions { enable_color: false, max_anomalies_shown: 2, ..Default::default() };
        let formatter = PlainFormatter::new(options);

        let mut result = CaseResult::new(TestCase::new(8, 10));
        result.outcome = CaseOutcome::Failed;
        result.mismatch_count = 4;
        for i in 0..4 {
            result.anomalies.push(Anomaly::mismatch(i, 16, 18));
        }

        let text = formatter.format_anomalies(&result).unwrap();
        assert!(text.starts_with("Case 8:10:"));
        assert!(text.contains("@ 0: expected 0x0000000000000010, got 0x0000000000000012 (+2 ticks)"));
        assert!(text.contains("... 2 more"));
    }

    #[test]
    fn test_status_anomaly_names_bits() {
        let text = describe_anomaly(&Anomaly::status(5, 1));
        assert_eq!(text, "@ 5: status 0x00000001 (overrun)");
    }

    #[test]
    fn test_summary_and_helpers() {
        let summary = RunSummary::from_cases(&[passed_case(1000)]);
        let text = formatter().format_summary(&summary).unwrap();
        assert!(text.contains("Passed:           1 (100.0%)"));
        assert!(text.contains("Samples:          4000"));
        assert!(text.contains("Msps") || text.contains("ksps"));

        assert_eq!(format_duration(0.5), "500us");
        assert_eq!(format_duration(61_000.0), "1m1.0s");
        assert_eq!(format_percentage(33.333), "33.3%");
        assert_eq!(format_rate(2_500_000.0), "2.50 Msps");
    }
}
