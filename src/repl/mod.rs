//! Interactive chat loop
//!
//! Each query runs start to finish (retrieve, show results, stream answer)
//! before the next one is read. Per-query failures are printed and the loop
//! keeps going.

pub mod display;
pub mod input;
pub mod progress;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::rag::BidAssistant;
pub use crate::repl::display::{format_thousands, DisplayManager};
pub use crate::repl::input::{is_exit_command, InputHandler};
pub use crate::repl::progress::{with_loading, LoadingIndicator};

/// What to do with one line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction<'a> {
    /// Blank line, prompt again
    Skip,
    Exit,
    Query(&'a str),
}

pub fn interpret(input: &str) -> InputAction<'_> {
    let input = input.trim();
    if input.is_empty() {
        InputAction::Skip
    } else if is_exit_command(input) {
        InputAction::Exit
    } else {
        InputAction::Query(input)
    }
}

/// Chat session coordinator
pub struct ChatSession<'a> {
    input_handler: InputHandler,
    display_manager: DisplayManager,
    assistant: BidAssistant<'a>,
}

impl<'a> ChatSession<'a> {
    pub fn new(assistant: BidAssistant<'a>, history_path: Option<PathBuf>) -> Result<Self> {
        let input_handler = match history_path {
            Some(path) => InputHandler::with_history(path)?,
            None => InputHandler::new()?,
        };

        Ok(ChatSession {
            input_handler,
            display_manager: DisplayManager::new(),
            assistant,
        })
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display_manager
    }

    /// Read and answer queries until exit, Ctrl-C or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let line = match self.input_handler.read_line()? {
                Some(line) => line,
                None => break,
            };

            match interpret(&line) {
                InputAction::Skip => continue,
                InputAction::Exit => break,
                InputAction::Query(query) => {
                    if let Err(e) = self.handle_query(query).await {
                        debug!(error = %e, "query failed");
                        self.display_manager.show_error(&e);
                        if e.is_session_fatal() {
                            self.save();
                            return Err(e.into());
                        }
                    }
                }
            }
        }

        self.save();
        self.display_manager.show_goodbye();
        Ok(())
    }

    /// Retrieve, print results and stream the answer for one query
    pub async fn handle_query(&self, query: &str) -> crate::errors::Result<()> {
        answer_query(&self.assistant, &self.display_manager, query).await
    }

    fn save(&mut self) {
        if let Err(e) = self.input_handler.save_history() {
            debug!("failed to save history: {}", e);
        }
    }
}

/// One query start to finish
///
/// A decode error mid-stream stops the answer and is returned after the
/// partial output has been closed off.
pub async fn answer_query(
    assistant: &BidAssistant<'_>,
    display: &DisplayManager,
    query: &str,
) -> crate::errors::Result<()> {
    let prepared = assistant.prepare(query).await?;
    display.show_results(query, &prepared.results);

    let mut response = assistant.respond(&prepared).await?;
    display.start_answer(prepared.mode);
    let mut outcome = Ok(());
    while let Some(fragment) = response.next_fragment().await {
        match fragment {
            Ok(text) => display.stream_fragment(&text),
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }
    display.end_answer();
    outcome
}
