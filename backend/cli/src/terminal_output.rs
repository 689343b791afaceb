//! What `scanchat` prints: status notes, the engine table and the OCR
//! progress bar.

use std::io::{IsTerminal, Write};

use scanchat_agent::EngineListing;

const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

/// Colour only when stdout is a terminal and `NO_COLOR` is unset.
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Wrap `text` in `style` when colour is enabled.
pub fn paint(style: &str, text: &str) -> String {
    if color_enabled() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
enum Note {
    Info,
    Warn,
    Error,
    Success,
}

impl Note {
    fn prefix(self) -> String {
        let (style, symbol, plain) = match self {
            Note::Info => (CYAN, "ℹ", "INFO:"),
            Note::Warn => (YELLOW, "⚠", "WARN:"),
            Note::Error => (RED, "✗", "ERROR:"),
            Note::Success => (GREEN, "✓", "OK:"),
        };
        if color_enabled() {
            format!("{style}{BOLD}{symbol}{RESET}")
        } else {
            plain.to_string()
        }
    }

    fn print(self, msg: &str) {
        let line = format!("{} {msg}", self.prefix());
        match self {
            Note::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
}

pub fn note_info(msg: &str) {
    Note::Info.print(msg);
}

pub fn note_warn(msg: &str) {
    Note::Warn.print(msg);
}

/// Goes to stderr so failures never mix with extracted text on stdout.
pub fn note_error(msg: &str) {
    Note::Error.print(msg);
}

pub fn note_success(msg: &str) {
    Note::Success.print(msg);
}

const DESCRIPTION_WIDTH: usize = 60;

/// One table line per engine: selection marker and id, label, readiness
/// and a description clipped to [`DESCRIPTION_WIDTH`] characters.
pub fn render_engine_table(engines: &[EngineListing]) -> String {
    let rows: Vec<[String; 4]> = engines
        .iter()
        .map(|engine| {
            let marker = if engine.selected { '*' } else { ' ' };
            let status = if engine.ready { "ready" } else { "key missing" };
            [
                format!("{marker} {}", engine.descriptor.id),
                engine.label(),
                status.to_string(),
                clip(engine.descriptor.description, DESCRIPTION_WIDTH),
            ]
        })
        .collect();

    let headers = ["Id", "Engine", "Status", "Description"];
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = line(&headers.map(String::from), &widths);
    out.push_str(&paint(BOLD, &header));
    out.push('\n');
    out.push_str(&line(&widths.map(|w| "-".repeat(w)), &widths));
    out.push('\n');
    for (engine, row) in engines.iter().zip(&rows) {
        let mut cells = row.clone();
        // Pad before painting so escape codes never count toward the width.
        cells[2] = format!("{:<width$}", cells[2], width = widths[2]);
        cells[2] = paint(if engine.ready { GREEN } else { YELLOW }, &cells[2]);
        cells[3] = paint(DIM, &cells[3]);
        out.push_str(&line(&cells, &widths));
        out.push('\n');
    }
    out
}

fn line(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    format!("  {}", padded.join("  ").trim_end())
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

const PROGRESS_WIDTH: usize = 30;

/// `[#########.....]  42%`
pub fn render_progress(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = PROGRESS_WIDTH * percent as usize / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        ".".repeat(PROGRESS_WIDTH - filled)
    )
}

/// Write a chunk and flush so partial lines show up immediately.
pub fn stream_write(writer: &mut impl Write, chunk: &str) -> std::io::Result<()> {
    writer.write_all(chunk.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanchat_core::EngineId;

    fn listing(id: EngineId, ready: bool, selected: bool) -> EngineListing {
        EngineListing { descriptor: *id.descriptor(), ready, selected }
    }

    #[test]
    fn engine_table_marks_selection_and_missing_keys() {
        let table = render_engine_table(&[
            listing(EngineId::Local, true, true),
            listing(EngineId::GeminiVision, false, false),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Description"));
        assert!(lines[2].starts_with("  * local"));
        assert!(lines[2].contains("ready"));
        assert!(lines[3].contains("Gemini Vision (API key missing)"));
        assert!(lines[3].contains("key missing"));
    }

    #[test]
    fn columns_line_up_by_characters() {
        let table = render_engine_table(&[
            listing(EngineId::Local, true, false),
            listing(EngineId::OpenAiVision, true, false),
        ]);
        if color_enabled() {
            return;
        }
        let starts: Vec<usize> = table
            .lines()
            .filter(|l| !l.trim_start().starts_with('-'))
            .map(|l| l.find("ready").or_else(|| l.find("Status")).unwrap())
            .collect();
        assert!(starts.windows(2).all(|w| w[0] == w[1]), "{table}");
    }

    #[test]
    fn long_descriptions_are_clipped() {
        assert_eq!(clip("short", 10), "short");
        let clipped = clip(&"x".repeat(80), DESCRIPTION_WIDTH);
        assert_eq!(clipped.chars().count(), DESCRIPTION_WIDTH);
        assert!(clipped.ends_with('…'));
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(render_progress(0), format!("[{}]   0%", ".".repeat(30)));
        assert_eq!(render_progress(50), format!("[{}{}]  50%", "#".repeat(15), ".".repeat(15)));
        assert_eq!(render_progress(250), format!("[{}] 100%", "#".repeat(30)));
    }
}
