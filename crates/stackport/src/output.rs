//! Output formatting: table, JSON, YAML.
//!
//! Reports render as a `tabled` table followed by a colored summary line, or
//! as the whole report serialized through serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a report in the chosen format.
///
/// `table_fn` produces the human view; structured formats serialize `data`.
pub fn render_report<T>(
    format: OutputFormat,
    data: &T,
    table_fn: impl FnOnce(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(table_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => {
            serde_yaml::to_string(data).map_err(|e| CliError::Internal(e.to_string()))
        }
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Summary pieces ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Muted,
}

/// `count label`, colored by tone when `color` is set and the count is non-zero.
pub fn tally(count: usize, label: &str, tone: Tone, color: bool) -> String {
    let text = format!("{count} {label}");
    if !color || count == 0 {
        return text;
    }
    match tone {
        Tone::Good => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Bad => text.red().bold().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}

/// Join non-empty sections with blank lines.
pub fn sections(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Placeholder for absent cells.
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, Tabled)]
    struct Row {
        name: String,
    }

    #[test]
    fn tally_without_color_is_plain() {
        assert_eq!(tally(3, "applied", Tone::Good, false), "3 applied");
        assert_eq!(tally(0, "failed", Tone::Bad, true), "0 failed");
    }

    #[test]
    fn structured_formats_serialize_data() {
        let rows = vec![Row { name: "Gi1/0/1".into() }];
        let json = render_report(OutputFormat::Json, &rows, |_| unreachable!()).unwrap();
        assert!(json.contains("\"name\": \"Gi1/0/1\""));
        let yaml = render_report(OutputFormat::Yaml, &rows, |_| unreachable!()).unwrap();
        assert!(yaml.contains("name: Gi1/0/1"));
        let table = render_report(OutputFormat::Table, &rows, |r| render_table(r)).unwrap();
        assert!(table.contains("Gi1/0/1"));
    }

    #[test]
    fn empty_sections_are_dropped() {
        assert_eq!(sections(&[String::new(), "a".into(), "b".into()]), "a\n\nb");
    }
}
