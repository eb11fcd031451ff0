//! # Playback
//!
//! Replays a script of commands as if someone were typing them.
//!
//! ```text
//! for each entry:
//!   Type(c) … Type(c)          one per character, typing_delay apart
//!   Canned{..} | Execute{done} canned echo, or a real run (awaited)
//!   ClearInput
//!   sleep(command_delay)
//! Finished
//! ```
//!
//! The controller never touches terminal state itself. It emits steps over a
//! channel and the widget applies them on its own loop, so a script and live
//! input share one ordered transcript. `Execute` carries a oneshot that the
//! widget fires once the command's round trip is over, which keeps at most
//! one scripted command in flight.

use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

/// One scripted command. `result: None` runs the command for real.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScriptEntry {
    pub command: String,
    #[serde(default)]
    pub result: Option<String>,
}

impl ScriptEntry {
    pub fn canned(command: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            result: Some(result.into()),
        }
    }

    pub fn execute(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            result: None,
        }
    }
}

/// Zips parallel command/result sequences. Commands past the end of
/// `returns` run for real; surplus returns are ignored.
pub fn script_from_parallel(commands: &[String], returns: &[Option<String>]) -> Vec<ScriptEntry> {
    if commands.len() != returns.len() {
        debug!(
            "script has {} command(s) but {} return(s)",
            commands.len(),
            returns.len()
        );
    }
    commands
        .iter()
        .enumerate()
        .map(|(i, command)| ScriptEntry {
            command: command.clone(),
            result: returns.get(i).cloned().flatten(),
        })
        .collect()
}

#[derive(Debug)]
pub enum PlaybackStep {
    Type(char),
    Canned { command: String, result: String },
    Execute {
        command: String,
        done: oneshot::Sender<()>,
    },
    ClearInput,
    Finished,
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    script: Vec<ScriptEntry>,
    typing_delay: Duration,
    command_delay: Duration,
}

impl PlaybackController {
    pub fn new(script: Vec<ScriptEntry>, typing_delay: Duration, command_delay: Duration) -> Self {
        Self {
            script,
            typing_delay,
            command_delay,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Plays the whole script once. Stops early if the receiver goes away.
    pub async fn run(self, steps: mpsc::UnboundedSender<PlaybackStep>) {
        info!("playback: {} scripted command(s)", self.script.len());

        for (index, entry) in self.script.into_iter().enumerate() {
            for c in entry.command.chars() {
                if steps.send(PlaybackStep::Type(c)).is_err() {
                    return;
                }
                tokio::time::sleep(self.typing_delay).await;
            }

            match entry.result {
                Some(result) => {
                    debug!("playback #{index}: canned {:?}", entry.command);
                    let step = PlaybackStep::Canned {
                        command: entry.command,
                        result,
                    };
                    if steps.send(step).is_err() {
                        return;
                    }
                }
                None => {
                    debug!("playback #{index}: execute {:?}", entry.command);
                    let (done, finished) = oneshot::channel();
                    let step = PlaybackStep::Execute {
                        command: entry.command,
                        done,
                    };
                    if steps.send(step).is_err() {
                        return;
                    }
                    // An error only means the widget dropped the sender; carry on.
                    let _ = finished.await;
                }
            }

            if steps.send(PlaybackStep::ClearInput).is_err() {
                return;
            }
            tokio::time::sleep(self.command_delay).await;
        }

        let _ = steps.send(PlaybackStep::Finished);
        info!("playback finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parallel_script_aligned() {
        let script = script_from_parallel(
            &strings(&["ls", "pwd"]),
            &[Some("a b".to_string()), None],
        );
        assert_eq!(
            script,
            vec![ScriptEntry::canned("ls", "a b"), ScriptEntry::execute("pwd")]
        );
    }

    #[test]
    fn test_short_returns_execute_the_rest() {
        let script = script_from_parallel(&strings(&["one", "two", "three"]), &[Some("1".to_string())]);
        assert_eq!(script[0].result.as_deref(), Some("1"));
        assert_eq!(script[1].result, None);
        assert_eq!(script[2].result, None);
    }

    #[test]
    fn test_surplus_returns_ignored() {
        let script = script_from_parallel(
            &strings(&["one"]),
            &[Some("1".to_string()), Some("2".to_string())],
        );
        assert_eq!(script.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_emits_steps_in_order() {
        let controller = PlaybackController::new(
            vec![ScriptEntry::canned("hi", "hello")],
            Duration::from_millis(100),
            Duration::from_millis(500),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        controller.run(tx).await;

        let mut kinds = Vec::new();
        while let Ok(step) = rx.try_recv() {
            kinds.push(match step {
                PlaybackStep::Type(c) => format!("type {c}"),
                PlaybackStep::Canned { command, result } => format!("canned {command}={result}"),
                PlaybackStep::Execute { command, .. } => format!("execute {command}"),
                PlaybackStep::ClearInput => "clear".to_string(),
                PlaybackStep::Finished => "finished".to_string(),
            });
        }
        assert_eq!(
            kinds,
            vec!["type h", "type i", "canned hi=hello", "clear", "finished"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_delay_per_character() {
        let controller = PlaybackController::new(
            vec![ScriptEntry::canned("abc", "")],
            Duration::from_millis(100),
            Duration::from_millis(500),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now();
        controller.run(tx).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3 * 100 + 500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_waits_for_completion() {
        let controller = PlaybackController::new(
            vec![ScriptEntry::execute("x"), ScriptEntry::execute("y")],
            Duration::ZERO,
            Duration::ZERO,
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(controller.run(tx));

        let mut executed = Vec::new();
        while let Some(step) = rx.recv().await {
            match step {
                PlaybackStep::Execute { command, done } => {
                    // Nothing else may arrive while this one is outstanding.
                    tokio::task::yield_now().await;
                    assert!(rx.try_recv().is_err());
                    executed.push(command);
                    done.send(()).unwrap();
                }
                PlaybackStep::Finished => break,
                _ => {}
            }
        }
        task.await.unwrap();
        assert_eq!(executed, vec!["x", "y"]);
    }
}
