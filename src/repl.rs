//! Read-eval-print loop
//!
//! Input lines arrive over a channel so the loop can wait on a line and on
//! Ctrl-C at the same time. A command that is still running when Ctrl-C
//! arrives is abandoned.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::app::Session;
use crate::commands::{self, Command, Flow, Output};

pub const PROMPT: &str = "Pokedex > ";

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The `exit` command
    Exit,
    /// End of input
    Eof,
    /// Ctrl-C
    Interrupted,
}

/// Reads stdin lines on a background thread
///
/// The channel closes at end of input. Blocking stdin reads run on a plain
/// thread because a pending read would otherwise hold up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to read input");
                    break;
                }
            }
        }
        debug!("input closed");
    });
    rx
}

/// Runs commands from `input` until exit, end of input or `interrupt`
pub async fn run<W, F>(
    session: &mut Session,
    mut input: mpsc::Receiver<String>,
    mut out: W,
    interrupt: F,
) -> io::Result<ExitReason>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = tokio::select! {
            _ = &mut interrupt => {
                writeln!(out)?;
                return Ok(ExitReason::Interrupted);
            }
            line = input.recv() => match line {
                Some(line) => line,
                None => {
                    writeln!(out)?;
                    return Ok(ExitReason::Eof);
                }
            },
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "Error: {err}")?;
                continue;
            }
        };
        debug!(?command, "running command");

        let mut output = Output::new();
        let result = tokio::select! {
            _ = &mut interrupt => {
                writeln!(out)?;
                return Ok(ExitReason::Interrupted);
            }
            result = commands::execute(session, &command, &mut output) => result,
        };

        if !output.lines().is_empty() {
            writeln!(out, "{}", output.render())?;
        }
        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => return Ok(ExitReason::Exit),
            Err(err) => {
                error!(?command, %err, "command failed");
                writeln!(out, "Error: {err}")?;
            }
        }
    }
}
