//! The interactive console loop.
//!
//! Commands are read line by line. Transcript and playback events are
//! rendered by a separate task as they happen, so messages appear while the
//! operator keeps typing.

use std::io::Write;
use std::sync::{Arc, Mutex};

use linesim_playback::{PlaybackEvent, TranscriptEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::commands::{Command, HELP};
use crate::error::{CliError, CliResult};
use crate::render::{self, FALLBACK_SENDER};
use crate::simulator::Simulator;
use crate::theme::Theme;

/// Output shared between the command loop and the renderer task.
pub type SharedOutput = Arc<Mutex<dyn Write + Send>>;

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Leave the console.
    Quit,
}

/// Interactive console bound to one simulator session.
#[derive(Clone)]
pub struct Console {
    sim: Simulator,
    out: SharedOutput,
}

impl Console {
    /// Create a console writing to `out`.
    pub fn new(sim: Simulator, out: SharedOutput) -> Self {
        Self { sim, out }
    }

    /// Create a console writing to stdout.
    pub fn stdout(sim: Simulator) -> Self {
        Self::new(sim, Arc::new(Mutex::new(std::io::stdout())))
    }

    /// The session this console drives.
    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    fn print(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
    }

    fn prompt(&self) {
        let prompt = render::prompt(self.sim.playback_state());
        if let Ok(mut out) = self.out.lock() {
            let _ = write!(out, "{prompt}");
            let _ = out.flush();
        }
    }

    async fn sender(&self) -> String {
        self.sim
            .parameter("shop_name")
            .await
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_SENDER.to_string())
    }

    /// Run one command.
    pub async fn execute(&self, command: Command) -> CliResult<Flow> {
        match command {
            Command::Empty => {},
            Command::Help => self.print(HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::Params => self.print(&render::parameters(&self.sim.parameters().await)),
            Command::Set { name, value } => {
                self.sim.set_parameter(name.clone(), value.clone()).await?;
                self.print(&Theme::success(&format!("{name} = {value}")));
            },
            Command::List => self.print(&render::catalog(&self.sim.grouped_scenarios().await)),
            Command::Play(id) => match self.sim.play_scenario(&id).await? {
                Some(_) => debug!(scenario = %id, "playback requested"),
                None => self.print(&render::outcome(linesim_playback::PlayOutcome::Declined)),
            },
            Command::Stop => {
                if self.sim.stop() {
                    self.print(&Theme::info("stopping playback"));
                } else {
                    self.print(&Theme::dimmed("nothing is playing"));
                }
            },
            Command::Clear => {
                let removed = self.sim.clear_transcript().await;
                self.print(&Theme::success(&format!("cleared {removed} messages")));
            },
            Command::Refresh => match self.sim.refresh_catalog().await {
                Some(report) => self.print(&render::refresh_report(&report)),
                None => self.print(&Theme::warning("a refresh is already running")),
            },
            Command::Show => {
                let sender = self.sender().await;
                self.print(&Theme::separator());
                self.print(&render::transcript(&self.sim.transcript().await, &sender));
                self.print(&Theme::separator());
            },
            Command::Status => self.print(&render::status(
                self.sim.playback_state(),
                self.sim.transcript().await.len(),
                self.sim.scenario_count().await,
                self.sim.is_loading(),
                &self.sim.source_description(),
            )),
            Command::Check(id) => {
                let missing = self.sim.unresolved_placeholders(&id).await?;
                self.print(&render::check(id.as_str(), &missing));
            },
        }
        Ok(Flow::Continue)
    }

    /// Spawn the task that renders transcript and playback events.
    ///
    /// Playback events are polled first so the typing indicator precedes the
    /// run's first bubble. On `Finished` the transcript backlog is flushed
    /// before the outcome line, so every bubble of a run prints between the
    /// two.
    pub fn spawn_renderer(&self) -> JoinHandle<()> {
        let console = self.clone();
        let mut transcript_rx = self.sim.subscribe_transcript();
        let mut playback_rx = self.sim.subscribe_playback();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    event = playback_rx.recv() => match event {
                        Ok(PlaybackEvent::Started { .. }) => {
                            let sender = console.sender().await;
                            console.print(&render::typing(&sender));
                        },
                        Ok(PlaybackEvent::Finished { outcome, .. }) => {
                            console.drain_transcript(&mut transcript_rx).await;
                            console.print(&render::outcome(outcome));
                        },
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "renderer fell behind playback events");
                        },
                        Err(RecvError::Closed) => break,
                    },
                    event = transcript_rx.recv() => match event {
                        Ok(event) => console.render_transcript_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "renderer fell behind the transcript");
                        },
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    async fn render_transcript_event(&self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::Appended(entry) => {
                let sender = self.sender().await;
                self.print(&render::entry(&entry, &sender));
            },
            TranscriptEvent::Cleared { .. } => self.print(&Theme::dimmed("(chat cleared)")),
        }
    }

    /// Render every transcript event already queued.
    async fn drain_transcript(&self, rx: &mut Receiver<TranscriptEvent>) {
        loop {
            match rx.try_recv() {
                Ok(event) => self.render_transcript_event(event).await,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind the transcript");
                },
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Read and execute commands until `quit` or end of input.
    ///
    /// Command errors are printed and the loop continues; only I/O errors
    /// end it early. Any playback still in flight is stopped on exit.
    pub async fn run<R>(&self, input: R) -> CliResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let renderer = self.spawn_renderer();
        let mut lines = input.lines();

        let result = loop {
            self.prompt();
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break Ok(()),
                Err(e) => break Err(CliError::Io(e)),
            };

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    self.print(&Theme::error(&e.to_string()));
                    continue;
                },
            };

            match self.execute(command).await {
                Ok(Flow::Continue) => {},
                Ok(Flow::Quit) => break Ok(()),
                Err(CliError::Io(e)) => break Err(CliError::Io(e)),
                Err(e) => self.print(&Theme::error(&e.to_string())),
            }
        };

        self.sim.stop();
        renderer.abort();
        result
    }
}
