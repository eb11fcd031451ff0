//! # Terminal Widget
//!
//! One interactive terminal instance. It owns the state, the single
//! transport session, the event channels and the observers, and it is the
//! only place where `update()` effects are carried out.
//!
//! ```text
//!  keys ──────────────┐
//!  PlaybackController ─┼─▶ update(state, action) ─▶ Effect::Dispatch ─▶ tokio task
//!  transport events ──┘                                                     │
//!        ▲                                                                  ▼
//!        └──────────────────────────── TransportEvent channel ◀── CommandDispatcher
//! ```
//!
//! Inbound events are applied in the order they are received. Live
//! submissions are not serialized against round trips still in flight, so
//! two quick Enters can interleave their output.

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::CommandDispatcher;
use crate::core::output::OutputRecord;
use crate::core::playback::{PlaybackController, PlaybackStep};
use crate::core::state::{Mode, TerminalState};
use crate::transport::{self, CommandHandler, EventSender, Transport, TransportEvent};

type Observer = Box<dyn FnMut() + Send>;

pub struct TerminalWidget {
    state: TerminalState,
    dispatcher: CommandDispatcher,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    playback_tx: mpsc::UnboundedSender<PlaybackStep>,
    playback_rx: mpsc::UnboundedReceiver<PlaybackStep>,
    playback_tasks: Vec<JoinHandle<()>>,
    playback_running: usize,
    on_connect: Vec<Observer>,
    on_close: Vec<Observer>,
}

impl TerminalWidget {
    /// A widget with no transport attached yet.
    pub fn new(mode: Mode, initial_content: &str) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (playback_tx, playback_rx) = mpsc::unbounded_channel();
        Self {
            state: TerminalState::new(mode, initial_content),
            dispatcher: CommandDispatcher::default(),
            events_tx,
            events_rx,
            playback_tx,
            playback_rx,
            playback_tasks: Vec::new(),
            playback_running: 0,
            on_connect: Vec::new(),
            on_close: Vec::new(),
        }
    }

    /// Builds the widget and opens the transport the config asks for.
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &ResolvedConfig, handler: Option<CommandHandler>) -> Self {
        let mut widget = Self::new(config.mode, &config.initial_content);
        let transport = transport::connect(config, widget.event_sender(), handler);
        if transport.is_none() && config.mode == Mode::Controlled {
            info!("controlled mode without a handler: commands will be dropped");
        }
        widget.dispatcher = CommandDispatcher::new(transport);
        widget
    }

    /// Sender for the current session's events. `attach` and `set_mode`
    /// hand a fresh one to the transport they build.
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Replaces the transport. The previous session is closed first and
    /// anything it reports afterwards is discarded.
    pub fn attach(&mut self, build: impl FnOnce(EventSender) -> Arc<dyn Transport>) {
        self.retire_session();
        let transport = build(self.event_sender());
        info!("attached {} transport", transport.name());
        self.dispatcher = CommandDispatcher::new(Some(transport));
    }

    /// Switches mode. The old session is closed with no handoff; `build`
    /// gets the sender the new transport (if any) must report into.
    pub fn set_mode(
        &mut self,
        mode: Mode,
        build: impl FnOnce(EventSender) -> Option<Arc<dyn Transport>>,
    ) {
        self.retire_session();
        info!("mode {:?} → {:?}", self.state.mode, mode);
        self.state.mode = mode;
        self.dispatcher = CommandDispatcher::new(build(self.event_sender()));
    }

    /// Closes the current session and cuts it off from the widget.
    ///
    /// Whatever the transport already queued is applied. If its `Closed`
    /// has not arrived yet (a socket closes asynchronously), the close is
    /// recorded now and the late event goes to a channel nobody reads.
    fn retire_session(&mut self) {
        if let Some(transport) = self.dispatcher.transport().cloned() {
            transport.close();
            self.drain();
            if !self.state.is_closed() {
                debug!("{} close still in flight, recording it now", transport.name());
                self.apply_transport_event(TransportEvent::Closed { reason: None });
            }
        }
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.events_tx = events_tx;
        self.events_rx = events_rx;
        self.dispatcher = CommandDispatcher::default();
        self.state.framer.reset();
        self.state.session = Default::default();
    }

    pub fn on_connect(&mut self, observer: impl FnMut() + Send + 'static) {
        self.on_connect.push(Box::new(observer));
    }

    pub fn on_close(&mut self, observer: impl FnMut() + Send + 'static) {
        self.on_close.push(Box::new(observer));
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn records(&self) -> &[OutputRecord] {
        self.state.log.records()
    }

    pub fn prompt(&self) -> String {
        self.state.prompt()
    }

    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.dispatcher.transport()
    }

    /// True while a started script has not reached its last entry.
    pub fn is_playing(&self) -> bool {
        self.playback_running > 0
    }

    /// Applies a user action and carries out its effect.
    pub fn handle(&mut self, action: Action) {
        let effect = update(&mut self.state, action);
        self.run_effect(effect, None);
    }

    /// Starts a script. Its steps are applied as `next_event`/`drain` pick them up.
    pub fn start_playback(&mut self, controller: PlaybackController) {
        if controller.is_empty() {
            return;
        }
        self.playback_running += 1;
        let steps = self.playback_tx.clone();
        self.playback_tasks.push(tokio::spawn(controller.run(steps)));
    }

    /// Closes the session. The transport reports the close through the
    /// event channel, so the closed record shows up on the next drain.
    pub fn close(&mut self) {
        if let Some(transport) = self.dispatcher.transport() {
            debug!("closing {} session", transport.name());
            transport.close();
        }
    }

    /// Waits for the next transport event or playback step and applies it.
    /// Returns `false` once nothing can arrive any more.
    pub async fn next_event(&mut self) -> bool {
        tokio::select! {
            Some(event) = self.events_rx.recv() => {
                self.apply_transport_event(event);
                true
            }
            Some(step) = self.playback_rx.recv() => {
                self.apply_playback_step(step);
                true
            }
            else => false,
        }
    }

    /// Applies everything already queued without waiting. Returns how many
    /// events were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        loop {
            if let Ok(event) = self.events_rx.try_recv() {
                self.apply_transport_event(event);
            } else if let Ok(step) = self.playback_rx.try_recv() {
                self.apply_playback_step(step);
            } else {
                return applied;
            }
            applied += 1;
        }
    }

    fn apply_transport_event(&mut self, event: TransportEvent) {
        let effect = update(&mut self.state, Action::Transport(event));
        self.run_effect(effect, None);
    }

    fn apply_playback_step(&mut self, step: PlaybackStep) {
        let (action, done) = match step {
            PlaybackStep::Type(c) => (Action::TypeChar(c), None),
            PlaybackStep::Canned { command, result } => {
                (Action::EchoCanned { command, result }, None)
            }
            PlaybackStep::Execute { command, done } => (Action::Execute(command), Some(done)),
            PlaybackStep::ClearInput => (Action::ClearInput, None),
            PlaybackStep::Finished => {
                self.playback_running = self.playback_running.saturating_sub(1);
                return;
            }
        };
        let effect = update(&mut self.state, action);
        self.run_effect(effect, done);
    }

    /// `done` fires when a dispatched command's round trip is over; for any
    /// other effect it is dropped, which the playback treats the same way.
    fn run_effect(&mut self, effect: Effect, done: Option<oneshot::Sender<()>>) {
        match effect {
            Effect::None => {}
            Effect::Dispatch(command) => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    let outcome = dispatcher.dispatch(command).await;
                    debug!("dispatch outcome: {:?}", outcome);
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                });
            }
            Effect::Connected => {
                for observer in &mut self.on_connect {
                    observer();
                }
            }
            Effect::Disconnected => {
                for observer in &mut self.on_close {
                    observer();
                }
            }
        }
    }
}

impl Drop for TerminalWidget {
    fn drop(&mut self) {
        for task in &self.playback_tasks {
            task.abort();
        }
        self.close();
    }
}
