// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::stack::{ChangeRow, DeployOutcome, StackSnapshot};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

const CHANGE_HEADERS: [&str; 6] = [
    "Action",
    "Logical ID",
    "Resource Type",
    "Replacement",
    "Physical ID",
    "Target",
];

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    fn emit<T: Serialize>(&self, event: &T) {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{json}");
        }
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Announce a bootstrap step.
    pub fn step(&self, name: &str) {
        match self.mode {
            OutputMode::Normal => println!("\n==> {name}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit(&StepEvent { event: "step", step: name }),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => self.emit(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => self.emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Show the resource changes of a staged change set.
    pub fn change_table(&self, stack: &str, rows: &[ChangeRow]) {
        match self.mode {
            OutputMode::Normal => {
                println!("Changes for {stack}:");
                if rows.is_empty() {
                    println!("  (no resource changes)");
                } else {
                    print!("{}", render_table(rows));
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit(&ChangeSetEvent {
                event: "change_set",
                stack,
                changes: rows,
            }),
        }
    }

    /// Report how a stack deployment ended.
    pub fn outcome(&self, outcome: &DeployOutcome) {
        match self.mode {
            OutputMode::Json => self.emit(&OutcomeEvent {
                event: "outcome",
                outcome,
                duration_secs: self.duration(),
            }),
            _ if outcome.is_success() => self.success(&outcome.summary()),
            OutputMode::Normal | OutputMode::Quiet => eprintln!("{}", outcome.summary()),
        }
    }

    /// Report a stack's current status.
    pub fn stack_status(&self, stack: &str, region: &str, snapshot: &StackSnapshot) {
        match self.mode {
            OutputMode::Json => self.emit(&StatusEvent {
                event: "status",
                stack,
                region,
                snapshot,
            }),
            OutputMode::Normal | OutputMode::Quiet => {
                let reason = snapshot
                    .reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                println!("{stack} [{region}]: {}{reason}", snapshot.display_status());
            }
        }
    }
}

/// Render change rows as an aligned plain-text table.
pub fn render_table(rows: &[ChangeRow]) -> String {
    let cells: Vec<[&str; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.action.as_str(),
                r.logical_id.as_str(),
                r.resource_type.as_str(),
                r.replacement.as_str(),
                r.physical_id.as_str(),
                r.target.as_str(),
            ]
        })
        .collect();

    let mut widths = CHANGE_HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |row: &[&str; 6]| {
        let padded: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut table = line(&CHANGE_HEADERS);
    for row in &cells {
        table.push_str(&line(row));
    }
    table
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StepEvent<'a> {
    event: &'a str,
    step: &'a str,
}

#[derive(Serialize)]
struct ChangeSetEvent<'a> {
    event: &'a str,
    stack: &'a str,
    changes: &'a [ChangeRow],
}

#[derive(Serialize)]
struct OutcomeEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    outcome: &'a DeployOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StatusEvent<'a> {
    event: &'a str,
    stack: &'a str,
    region: &'a str,
    #[serde(flatten)]
    snapshot: &'a StackSnapshot,
}
