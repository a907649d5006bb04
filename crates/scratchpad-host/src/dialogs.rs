//! Dialogs on the controlling terminal.
//!
//! stdin/stdout carry the panel protocol, so prompts go through `/dev/tty`.
//! Without a terminal every close is declined and every rename cancelled.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};

use async_trait::async_trait;
use tracing::{debug, warn};

use scratchpad_engine::HostDialogs;

const TTY: &str = "/dev/tty";

#[derive(Debug, Default)]
pub struct TerminalDialogs;

impl TerminalDialogs {
    pub fn new() -> Self {
        Self
    }
}

fn open_tty() -> io::Result<(BufReader<File>, File)> {
    let tty = OpenOptions::new().read(true).write(true).open(TTY)?;
    let writer = tty.try_clone()?;
    Ok((BufReader::new(tty), writer))
}

/// Yes/no question. Anything but `y`/`yes` declines.
fn ask_confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, title: &str) -> io::Result<bool> {
    write!(output, "Close tab \"{title}\"? [y/N] ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Title prompt. An empty answer or EOF cancels.
fn ask_title<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    current: &str,
) -> io::Result<Option<String>> {
    write!(output, "New title for \"{current}\" (empty to cancel): ")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let title = line.trim_end_matches(['\r', '\n']);
    Ok((!title.trim().is_empty()).then(|| title.to_string()))
}

#[async_trait]
impl HostDialogs for TerminalDialogs {
    async fn confirm_close(&self, title: &str) -> bool {
        let title = title.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let (mut input, mut output) = open_tty()?;
            ask_confirm(&mut input, &mut output, &title)
        })
        .await;
        match answer {
            Ok(Ok(approved)) => {
                debug!(approved, "close confirmation answered");
                approved
            }
            Ok(Err(e)) => {
                warn!(error = %e, "no terminal for close confirmation, declining");
                false
            }
            Err(e) => {
                warn!(error = %e, "close confirmation task failed");
                false
            }
        }
    }

    async fn prompt_title(&self, current: &str) -> Option<String> {
        let current = current.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let (mut input, mut output) = open_tty()?;
            ask_title(&mut input, &mut output, &current)
        })
        .await;
        match answer {
            Ok(Ok(title)) => title,
            Ok(Err(e)) => {
                warn!(error = %e, "no terminal for title prompt, cancelling");
                None
            }
            Err(e) => {
                warn!(error = %e, "title prompt task failed");
                None
            }
        }
    }

    fn warn(&self, message: &str) {
        warn!(%message, "scratchpad");
        if let Ok((_, mut output)) = open_tty() {
            let _ = writeln!(output, "scratchpad: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_confirm_answers() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false), ("", false)] {
            let mut out = Vec::new();
            let approved = ask_confirm(&mut Cursor::new(answer), &mut out, "notes").unwrap();
            assert_eq!(approved, expected, "answer {answer:?}");
            assert_eq!(String::from_utf8(out).unwrap(), "Close tab \"notes\"? [y/N] ");
        }
    }

    #[test]
    fn test_title_prompt() {
        let mut out = Vec::new();
        let title = ask_title(&mut Cursor::new("Groceries\n"), &mut out, "New Tab").unwrap();
        assert_eq!(title.as_deref(), Some("Groceries"));
    }

    #[test]
    fn test_title_prompt_cancel() {
        let mut out = Vec::new();
        assert_eq!(ask_title(&mut Cursor::new("  \n"), &mut out, "a").unwrap(), None);
        assert_eq!(ask_title(&mut Cursor::new(""), &mut out, "a").unwrap(), None);
    }
}
