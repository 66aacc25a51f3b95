//! Colored formatter implementation with terminal color support

use super::formatter::{
    case_row, case_table_format, describe_anomaly, format_duration, format_percentage, format_rate,
    FormattingOptions, OutputFormatter, PlainFormatter,
};
use crate::{
    error::Result,
    models::{CaseOutcome, CaseResult, RunReport},
    stats::RunSummary,
};
use colored::*;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

impl ColorScheme {
    /// Color used for a case outcome
    pub fn outcome(&self, outcome: &CaseOutcome) -> Color {
        match outcome {
            CaseOutcome::Passed => self.success,
            CaseOutcome::Failed => self.error,
            CaseOutcome::Aborted { .. } => self.warning,
            CaseOutcome::Interrupted => self.muted,
        }
    }
}

/// Colored formatter implementation
///
/// Tables are laid out by the plain formatter and colored line by line,
/// so escape codes never disturb column widths.
pub struct ColoredFormatter {
    plain: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or untouched when colors are off
    fn emphasize(&self, text: &str, color: Color) -> String {
        if self.options.enable_color {
            text.bold().color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn section_header(&self, title: &str) -> String {
        self.emphasize(title, self.color_scheme.header)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            self.colorize(&border, self.color_scheme.border),
            self.emphasize(title, self.color_scheme.header),
            self.colorize(&border, self.color_scheme.border)
        ))
    }

    fn format_run_info(&self, report: &RunReport) -> Result<String> {
        let stream = &report.stream;
        let mut lines = vec![
            format!("Run ID:           {}", self.colorize(&report.run_id, self.color_scheme.muted)),
            format!(
                "Device:           {} ({})",
                self.colorize(&report.device, self.color_scheme.info),
                report.backend
            ),
            format!(
                "Stream:           {} buffers x {} samples, {} transfers, {} ms timeout",
                stream.num_buffers, stream.buffer_size, stream.num_transfers, stream.timeout_ms
            ),
            format!("Timestamp step:   {} ticks/sample", report.timestamp_step),
        ];
        if report.keep_going {
            lines.push(format!(
                "Mode:             {}",
                self.colorize("keep going after anomalies", self.color_scheme.warning)
            ));
        }
        Ok(lines.join("\n"))
    }

    fn format_case_table(&self, cases: &[CaseResult]) -> Result<String> {
        if cases.is_empty() {
            return Ok(self.colorize("No test cases were run.", self.color_scheme.muted).to_string());
        }

        let rows: Vec<_> = cases.iter().map(case_row).collect();
        let format = case_table_format(self.options.table_borders);
        let table = self.plain.create_table(&format, &rows);

        // header block is border/header/border with borders, header alone without
        let header_lines = if format.show_borders { 3 } else { 1 };
        let lines: Vec<String> = table
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                if idx < header_lines || idx >= header_lines + cases.len() {
                    if line.starts_with('+') {
                        self.colorize(line, self.color_scheme.border).to_string()
                    } else {
                        self.bold(line).to_string()
                    }
                } else {
                    let outcome = &cases[idx - header_lines].outcome;
                    self.colorize(line, self.color_scheme.outcome(outcome)).to_string()
                }
            })
            .collect();

        Ok(lines.join("\n"))
    }

    fn format_anomalies(&self, case: &CaseResult) -> Result<String> {
        let color = self.color_scheme.outcome(&case.outcome);
        let mut lines = vec![self.emphasize(&format!("Case {}:", case.case), color)];

        if let CaseOutcome::Aborted { error } = &case.outcome {
            lines.push(format!("  {} {}", self.colorize("aborted:", self.color_scheme.warning), error));
        }
        for anomaly in case.anomalies.iter().take(self.options.max_anomalies_shown) {
            lines.push(format!("  {}", self.colorize(&describe_anomaly(anomaly), self.color_scheme.error)));
        }
        let shown = case.anomalies.len().min(self.options.max_anomalies_shown) as u64;
        let hidden = case.anomaly_count().saturating_sub(shown);
        if hidden > 0 {
            lines.push(self.colorize(&format!("  ... {} more", hidden), self.color_scheme.muted).to_string());
        }
        if self.options.verbose_mode {
            if let (Some(mean), Some(sd)) = (case.step_stats.mean(), case.step_stats.std_dev()) {
                lines.push(format!("  step mean {:.2} ticks, std dev {:.2}", mean, sd));
            }
        }

        Ok(lines.join("\n"))
    }

    fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        let pass_color = if summary.passed == summary.total_cases && summary.total_cases > 0 {
            self.color_scheme.success
        } else {
            self.color_scheme.error
        };
        let count = |n: u64, color: Color| {
            if n == 0 {
                n.to_string()
            } else {
                self.colorize(&n.to_string(), color).to_string()
            }
        };

        let mut lines = vec![
            self.section_header("Summary:"),
            format!("Cases:            {}", summary.total_cases),
            format!(
                "Passed:           {} ({})",
                summary.passed,
                self.colorize(&format_percentage(summary.pass_rate()), pass_color)
            ),
            format!("Failed:           {}", count(u64::from(summary.failed), self.color_scheme.error)),
            format!("Aborted:          {}", count(u64::from(summary.aborted), self.color_scheme.warning)),
        ];
        if summary.interrupted > 0 {
            lines.push(format!("Interrupted:      {}", summary.interrupted));
        }
        lines.push(format!("Reads:            {}", summary.total_reads));
        lines.push(format!("Samples:          {}", summary.total_samples));
        lines.push(format!(
            "Anomalies:        {} mismatches, {} status warnings",
            count(summary.total_mismatches, self.color_scheme.error),
            count(summary.total_status_warnings, self.color_scheme.warning)
        ));

        let mut duration = format!("Duration:         {}", format_duration(summary.total_duration_ms));
        if let Some(rate) = summary.throughput_sps() {
            duration.push_str(&format!(" ({})", self.colorize(&format_rate(rate), self.color_scheme.info)));
        }
        lines.push(duration);

        Ok(lines.join("\n"))
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
        Ok(format!("{} {}", self.emphasize("✗", self.color_scheme.error), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("!", self.color_scheme.warning), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✓", self.color_scheme.success), self.colorize(message, self.color_scheme.success)))
    }
}
