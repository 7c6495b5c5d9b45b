use crate::config::{AppConfig, MAX_LIMIT};
use crate::controller::SearchController;
use crate::error::{AppError, SearchError};
use crate::images::checked_for_display;
use crate::output::render;
use crate::state::ViewState;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Type a keyword and press Enter to search.
  :retry      run the last search again
  :limit N    products per search (1-50)
  :help       show this help
  :quit       leave
";

#[derive(Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Search(String),
    Retry,
    Limit(u32),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return ShellCommand::Search(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("retry" | "r"), None) => ShellCommand::Retry,
        (Some("help" | "h"), None) => ShellCommand::Help,
        (Some("quit" | "q" | "exit"), None) => ShellCommand::Quit,
        (Some("limit"), Some(n)) => match n.parse::<u32>() {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) && parts.next().is_none() => {
                ShellCommand::Limit(n)
            }
            _ => ShellCommand::Invalid(format!("Limit must be a number from 1 to {}", MAX_LIMIT)),
        },
        _ => ShellCommand::Invalid(format!("Unknown command: {}", line)),
    }
}

/// Line-driven front end for a [`SearchController`].
pub struct Shell<'a, W: Write> {
    controller: &'a SearchController,
    config: &'a AppConfig,
    out: W,
    limit: u32,
    keyword_field: String,
}

impl<'a, W: Write> Shell<'a, W> {
    pub fn new(controller: &'a SearchController, config: &'a AppConfig, limit: u32, out: W) -> Self {
        Self {
            controller,
            config,
            out,
            limit,
            keyword_field: String::new(),
        }
    }

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<(), AppError> {
        let mut lines = input.lines();
        self.prompt()?;
        while let Some(line) = lines.next_line().await? {
            match parse_command(&line) {
                ShellCommand::Quit => break,
                ShellCommand::Help => write!(self.out, "{}", HELP)?,
                ShellCommand::Limit(n) => {
                    self.limit = n;
                    writeln!(self.out, "Limit set to {}", n)?;
                }
                ShellCommand::Invalid(msg) => writeln!(self.out, "{}", msg)?,
                ShellCommand::Search(keyword) => {
                    self.keyword_field = keyword;
                    let keyword = self.keyword_field.clone();
                    let limit = self.limit;
                    let controller = self.controller;
                    let outcome = self.track(controller.submit_search(&keyword, limit)).await?;
                    self.show(outcome.map(Some)).await?;
                }
                ShellCommand::Retry => {
                    let field = self.keyword_field.clone();
                    let controller = self.controller;
                    let outcome = self.track(controller.retry(&field)).await?;
                    self.show(outcome).await?;
                }
            }
            self.prompt()?;
        }
        Ok(())
    }

    /// Await a submission, echoing the Loading state as soon as the
    /// controller publishes it.
    async fn track<F, T>(&mut self, submission: F) -> Result<T, AppError>
    where
        F: std::future::Future<Output = T>,
    {
        let controller = self.controller;
        let json = self.config.json;
        let out = &mut self.out;
        controller
            .with_loading_notice(submission, || -> Result<(), AppError> {
                if !json {
                    write!(out, "{}", render(&ViewState::Loading, false)?)?;
                    out.flush()?;
                }
                Ok(())
            })
            .await
    }

    /// `Ok(None)` is an ignored retry and prints nothing.
    async fn show(&mut self, outcome: Result<Option<ViewState>, SearchError>) -> Result<(), AppError> {
        match outcome {
            // Inline message; the state stays as it was.
            Err(e) => writeln!(self.out, "{}", e)?,
            Ok(None) | Ok(Some(ViewState::Idle)) => {}
            Ok(Some(state)) => {
                let state = if self.config.check_images {
                    checked_for_display(self.controller.http(), state).await
                } else {
                    state
                };
                write!(self.out, "{}", render(&state, self.config.json)?)?;
            }
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<(), AppError> {
        write!(self.out, "search> ")?;
        self.out.flush()?;
        Ok(())
    }
}
