//! Human-in-the-loop input: credentials and captcha answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Source of interactive answers.
///
/// Calls block; the client runs them on a blocking worker.
pub trait Prompter: Send + Sync {
    /// Shows `message` and returns one line of input without its newline.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when input cannot be read.
    fn prompt(&self, message: &str) -> io::Result<String>;
}

/// Reads answers from standard input, printing questions to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&self, message: &str) -> io::Result<String> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{message}")?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "standard input closed",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Answers prompts from a fixed queue, for unattended runs.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Creates a prompter that replies with `answers` in order.
    #[must_use]
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

    /// Questions asked so far.
    #[must_use]
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&self, message: &str) -> io::Result<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(message.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
    }
}
