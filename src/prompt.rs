// ABOUTME: Confirmation gates between deployment steps.
// ABOUTME: Console, accept-defaults and scripted implementations of the Prompt trait.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Stdin, Write};

use parking_lot::Mutex;
use tokio::runtime::RuntimeFlavor;

/// Label for the choice selected by an empty line.
pub const ENTER: &str = "Enter";

/// Errors from asking the operator a question.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Input ended before a valid answer was given.
    #[error("input closed before an answer was given")]
    Closed,

    #[error("failed to read answer: {0}")]
    Io(#[from] std::io::Error),
}

/// Asks the operator to pick one of a fixed set of answers.
pub trait Prompt: Send + Sync {
    /// Show `message`, wait for one of `choices`, and return the chosen label
    /// as spelled in `choices`. An empty answer selects `default`.
    fn confirm(&self, message: &str, choices: &[&str], default: &str)
    -> Result<String, PromptError>;
}

/// Resolve one raw answer against the offered choices.
///
/// Returns `None` when the answer matches nothing and the question should be asked again.
pub fn resolve_answer(answer: &str, choices: &[&str], default: &str) -> Option<String> {
    let answer = answer.trim();
    let wanted = if answer.is_empty() { default } else { answer };

    if answer.is_empty() || wanted.eq_ignore_ascii_case(ENTER) {
        return choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(wanted))
            .map(|c| c.to_string())
            .or_else(|| answer.is_empty().then(|| default.to_string()));
    }

    choices
        .iter()
        .filter(|c| !c.eq_ignore_ascii_case(ENTER))
        .find(|c| c.eq_ignore_ascii_case(wanted))
        .map(|c| c.to_string())
}

/// Run a blocking read without stalling other tasks on a multi-threaded runtime.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

fn render_question(message: &str, choices: &[&str], default: &str) -> String {
    format!("{} [{}] (default: {}) ", message, choices.join("/"), default)
}

/// Reads answers line by line, writing questions to stderr.
pub struct ConsolePrompt<R> {
    input: Mutex<R>,
}

impl ConsolePrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send> ConsolePrompt<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl<R: BufRead + Send> Prompt for ConsolePrompt<R> {
    fn confirm(
        &self,
        message: &str,
        choices: &[&str],
        default: &str,
    ) -> Result<String, PromptError> {
        let mut input = self.input.lock();
        let question = render_question(message, choices, default);

        loop {
            let mut stderr = std::io::stderr();
            write!(stderr, "{}", question)?;
            stderr.flush()?;

            let mut line = String::new();
            if blocking(|| input.read_line(&mut line))? == 0 {
                return Err(PromptError::Closed);
            }

            match resolve_answer(&line, choices, default) {
                Some(choice) => return Ok(choice),
                None => {
                    writeln!(stderr, "Please answer one of: {}", choices.join(", "))?;
                }
            }
        }
    }
}

/// Always picks the default. Used with `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptDefaults;

impl Prompt for AcceptDefaults {
    fn confirm(
        &self,
        message: &str,
        _choices: &[&str],
        default: &str,
    ) -> Result<String, PromptError> {
        tracing::debug!("Auto-answering '{}' with {}", message, default);
        Ok(default.to_string())
    }
}

/// Replays queued answers and records every question asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(
        &self,
        message: &str,
        choices: &[&str],
        default: &str,
    ) -> Result<String, PromptError> {
        self.asked.lock().push(message.to_string());

        let mut answers = self.answers.lock();
        loop {
            let answer = answers.pop_front().ok_or(PromptError::Closed)?;
            if let Some(choice) = resolve_answer(&answer, choices, default) {
                return Ok(choice);
            }
        }
    }
}
