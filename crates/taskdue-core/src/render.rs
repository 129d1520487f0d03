use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::compose::ComposedDue;
use crate::config::Config;
use crate::countdown::Countdown;
use crate::locale::Locale;
use crate::model::{ListId, TaskList};
use crate::view::TaskRow;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: Locale,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self {
            color,
            locale: cfg.locale,
        }
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_task_rows(&mut self, rows: &[TaskRow<'_>]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let table = self.task_table(rows);
        write_table(&mut out, table.0, table.1)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, lists))]
    pub fn print_lists(&mut self, lists: &[TaskList], selected: Option<&ListId>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![" ".to_string(), "ID".to_string(), "Title".to_string()];
        let rows = lists
            .iter()
            .map(|list| {
                let marker = if Some(&list.id) == selected {
                    self.paint("*", "33")
                } else {
                    String::new()
                };
                vec![marker, list.id.to_string(), list.title.clone()]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_composed(&mut self, composed: &ComposedDue) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "wire      {}", composed.wire.as_deref().unwrap_or("null"))?;
        writeln!(out, "display   {}", composed.display)?;
        Ok(())
    }

    pub fn print_countdown(&mut self, countdown: &Countdown) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let text = self.countdown_cell(countdown);
        writeln!(out, "{text}")?;
        Ok(())
    }

    pub fn print_error(&mut self, message: &str) {
        eprintln!("{}", self.paint(message, "31"));
    }

    fn task_table(&self, rows: &[TaskRow<'_>]) -> (Vec<String>, Vec<Vec<String>>) {
        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Status".to_string(),
            "Due".to_string(),
            "Remaining".to_string(),
        ];

        let body = rows
            .iter()
            .map(|row| {
                vec![
                    self.paint(&row.task.id.to_string(), "33"),
                    row.task.title.clone(),
                    self.locale.done_label(row.task.done).to_string(),
                    row.due_display.clone(),
                    self.countdown_cell(&row.countdown),
                ]
            })
            .collect();

        (headers, body)
    }

    fn countdown_cell(&self, countdown: &Countdown) -> String {
        let text = self.locale.format_countdown(countdown);
        if countdown.is_overdue() {
            self.paint(&text, "31")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
