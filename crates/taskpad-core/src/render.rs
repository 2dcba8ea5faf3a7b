use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::task::{Priority, Task};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_list(&self, tasks: &[&Task], show_completed: bool) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_task_list(out, tasks, show_completed)
    }

    pub fn write_task_list<W: Write>(
        &self,
        mut out: W,
        tasks: &[&Task],
        show_completed: bool,
    ) -> anyhow::Result<()> {
        let heading = if show_completed {
            "Task List: Completed"
        } else {
            "Task List: Pending"
        };
        writeln!(out, "{heading}")?;

        if tasks.is_empty() {
            writeln!(out, "No tasks found!")?;
            return Ok(());
        }

        let headers = ["ID", "Name", "Priority", "Points", "Assignee", "Due", "Done"]
            .iter()
            .map(|h| h.to_string())
            .collect();

        let rows = tasks
            .iter()
            .map(|task| {
                vec![
                    self.paint(&task.short_id(), "33"),
                    task.task_name.clone(),
                    self.paint(task.priority.as_str(), priority_color(task.priority)),
                    task.story_points.to_string(),
                    task.assignee.clone(),
                    task.due_date.format("%Y-%m-%d").to_string(),
                    if task.completed { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&self, task: &Task) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_task_info(out, task)
    }

    pub fn write_task_info<W: Write>(&self, mut out: W, task: &Task) -> anyhow::Result<()> {
        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "name      {}", task.task_name)?;
        writeln!(
            out,
            "priority  {}",
            self.paint(task.priority.as_str(), priority_color(task.priority))
        )?;
        writeln!(out, "points    {}", task.story_points)?;
        writeln!(out, "assignee  {}", task.assignee)?;
        writeln!(out, "due       {}", task.due_date.format("%Y-%m-%d"))?;
        writeln!(
            out,
            "status    {}",
            if task.completed { "completed" } else { "pending" }
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "31",
        Priority::High => "33",
        Priority::Normal => "34",
        Priority::Low => "32",
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
