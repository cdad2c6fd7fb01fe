use anyhow::Context;
use inquire::{Confirm, InquireError, Text};
use std::io::{BufRead, Write};

use crate::abort::Abort;

/// Source of the operator's answers.
///
/// Cancelling a prompt (Esc, Ctrl-C, closed input) is reported as
/// [`Abort::Declined`].
pub trait Prompter {
    fn text(&mut self, message: &str, help: Option<&str>) -> anyhow::Result<String>;

    /// `true` only for an explicit `y` or `Y`.
    fn confirm(&mut self, message: &str) -> anyhow::Result<bool>;
}

/// Only `y` and `Y` count as yes, surrounding whitespace ignored
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

/// Terminal prompts through [`inquire`]
#[derive(Debug, Default)]
pub struct InquirePrompter;

fn cancelled(e: InquireError) -> anyhow::Error {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            Abort::Declined.into()
        }
        e => anyhow::Error::new(e).context("Failed to read answer"),
    }
}

impl Prompter for InquirePrompter {
    fn text(&mut self, message: &str, help: Option<&str>) -> anyhow::Result<String> {
        let mut prompt = Text::new(message);
        if let Some(help) = help {
            prompt = prompt.with_help_message(help);
        }

        prompt.prompt().map_err(cancelled)
    }

    fn confirm(&mut self, message: &str) -> anyhow::Result<bool> {
        let parser = |answer: &str| -> Result<bool, ()> { Ok(is_yes(answer)) };

        Confirm::new(message)
            .with_default(false)
            .with_parser(&parser)
            .prompt()
            .or_else(|e| match e {
                InquireError::OperationCanceled | InquireError::OperationInterrupted => Ok(false),
                e => Err(anyhow::Error::new(e).context("Failed to read answer")),
            })
    }
}

/// Line based prompts for when input is not a terminal.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LinePrompter { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Next line without its line ending, `None` at end of input
    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();

        if self.input.read_line(&mut line).context("Failed to read input")? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);

        Ok(Some(line))
    }
}

impl LinePrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        LinePrompter::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn text(&mut self, message: &str, help: Option<&str>) -> anyhow::Result<String> {
        match help {
            Some(help) => write!(self.output, "{message} ({help}) "),
            None => write!(self.output, "{message} "),
        }?;
        self.output.flush()?;

        self.read_line()?.ok_or(Abort::Declined.into())
    }

    fn confirm(&mut self, message: &str) -> anyhow::Result<bool> {
        write!(self.output, "{message} [y/N] ")?;
        self.output.flush()?;

        Ok(self.read_line()?.is_some_and(|answer| is_yes(&answer)))
    }
}
