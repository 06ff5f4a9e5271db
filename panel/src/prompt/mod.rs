//! Human-input boundary.
//!
//! Three things may be asked during a run: the API key, the KPI type and
//! which conversion events count. [`Prompter`] abstracts the channel;
//! [`TerminalPrompt`] talks to a person, [`ScriptedPrompt`] replays answers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use adpanel::prompt::{PromptedSelector, ScriptedPrompt};
//! use adpanel::EventSelector;
//!
//! let mut prompt = ScriptedPrompt::new(["purchase, refund", "purchase"]);
//! let mut selector = PromptedSelector::new(&mut prompt);
//! let chosen = selector.select(&["purchase".to_string()])?;
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::config::split_list;
use crate::error::PromptError;
use crate::models::KpiKind;
use crate::transform::kpi::{invalid_names, EventSelector};

/// A channel for asking questions and showing short notices.
pub trait Prompter {
    /// Ask a question and return the raw answer line.
    fn ask(&mut self, question: &str) -> Result<String, PromptError>;

    /// Show a message that needs no answer.
    fn notify(&mut self, message: &str);
}

// =============================================================================
// Terminal
// =============================================================================

/// Questions on stderr, answers from stdin.
///
/// Stdout is left alone so command output can be piped.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompt {
    fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        let mut stderr = io::stderr();
        write!(stderr, "{} ", question)?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            // EOF: re-asking would spin forever.
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed").into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

// =============================================================================
// Scripted
// =============================================================================

/// Replays a fixed queue of answers and records what was asked and shown.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    /// Questions asked, in order.
    pub questions: Vec<String>,
    /// Notices shown, in order.
    pub notices: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Exhausted(question.to_string()))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

// =============================================================================
// Questions
// =============================================================================

/// Ask for conversion events until every name given is known.
///
/// Invalid names are echoed back and the question repeats; an empty answer
/// repeats too. Only prompter failures end the loop with an error.
pub struct PromptedSelector<'a> {
    prompter: &'a mut dyn Prompter,
}

impl<'a> PromptedSelector<'a> {
    pub fn new(prompter: &'a mut dyn Prompter) -> Self {
        Self { prompter }
    }
}

impl EventSelector for PromptedSelector<'_> {
    fn select(&mut self, available: &[String]) -> Result<Vec<String>, PromptError> {
        self.prompter.notify("Conversion events found:");
        for (i, name) in available.iter().enumerate() {
            self.prompter.notify(&format!("  [{}] {}", i + 1, name));
        }

        loop {
            let answer = self
                .prompter
                .ask("Conversion events to use (comma-separated):")?;

            let mut selected: Vec<String> = Vec::new();
            for name in split_list(&answer) {
                if !selected.contains(&name) {
                    selected.push(name);
                }
            }

            if selected.is_empty() {
                self.prompter.notify("Select at least one event.");
                continue;
            }

            let invalid = invalid_names(&selected, available);
            if !invalid.is_empty() {
                self.prompter
                    .notify(&format!("Invalid event names: {}. Try again.", invalid.join(", ")));
                continue;
            }

            return Ok(selected);
        }
    }
}

/// Ask which KPI to model until the answer parses.
pub fn ask_kpi(prompter: &mut dyn Prompter) -> Result<KpiKind, PromptError> {
    loop {
        let answer = prompter.ask("KPI to model (revenue/conversions):")?;
        match answer.parse::<KpiKind>() {
            Ok(kind) => return Ok(kind),
            Err(message) => prompter.notify(&message),
        }
    }
}

/// Ask for the export API key until a non-empty one is given.
pub fn ask_api_key(prompter: &mut dyn Prompter) -> Result<String, PromptError> {
    loop {
        let answer = prompter.ask("Windsor API key:")?;
        let key = answer.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
        prompter.notify("The API key cannot be empty.");
    }
}
