//! Threaded engine host.
//!
//! [`EditorSession`] owns an [`Engine`] on a dedicated formatting thread and exposes it
//! through channels: commands go in, [`EngineEvent`]s come out in the order the engine
//! produced them. [`EditorSession::parse`] is the one request/response call, since the host
//! needs the render ranges back before it can draw.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::attributes::{Attribute, DisplayType};
use crate::engine::{Engine, EngineConfig, EngineEvent};
use crate::providers::DerivedSpan;
use crate::render::RenderRange;
use crate::selection::Selection;

/// Session failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine thread is gone (panicked or shut down).
    #[error("engine thread disconnected")]
    Disconnected,
    /// The engine thread could not be spawned.
    #[error("failed to spawn engine thread")]
    Spawn(#[from] io::Error),
}

enum EngineCommand {
    SetText(String),
    SetSelection(Selection),
    SetAttributes(Vec<Attribute>),
    Reset,
    FormatSelection {
        ty: DisplayType,
        content: Option<String>,
    },
    Complete {
        ty: DisplayType,
        text: String,
        content: Option<String>,
    },
    ApplyDerivedSpans(Vec<DerivedSpan>),
    Parse {
        display_text: String,
        reply: Sender<Vec<RenderRange>>,
    },
    Shutdown,
}

/// Handle to an engine running on its own thread.
pub struct EditorSession {
    commands: Sender<EngineCommand>,
    events: Receiver<EngineEvent>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession").finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Spawn the formatting thread with the given engine configuration.
    pub fn spawn(config: EngineConfig) -> Result<Self, SessionError> {
        let (command_tx, command_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();

        let worker = thread::Builder::new()
            .name("richtext-format".into())
            .spawn(move || run(Engine::new(config), command_rx, event_tx))?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            worker: Some(worker),
        })
    }

    /// Push host-provided logical text.
    pub fn set_text(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(EngineCommand::SetText(text.into()))
    }

    /// Move the selection (logical offsets).
    pub fn set_selection(&self, selection: Selection) -> Result<(), SessionError> {
        self.send(EngineCommand::SetSelection(selection))
    }

    /// Push host-provided logical attributes.
    pub fn set_attributes(&self, attrs: Vec<Attribute>) -> Result<(), SessionError> {
        self.send(EngineCommand::SetAttributes(attrs))
    }

    /// Clear all engine state.
    pub fn reset(&self) -> Result<(), SessionError> {
        self.send(EngineCommand::Reset)
    }

    /// Toggle a manual format.
    pub fn format_selection(
        &self,
        ty: DisplayType,
        content: Option<String>,
    ) -> Result<(), SessionError> {
        self.send(EngineCommand::FormatSelection { ty, content })
    }

    /// Apply an autocomplete completion.
    pub fn complete(
        &self,
        ty: DisplayType,
        text: impl Into<String>,
        content: Option<String>,
    ) -> Result<(), SessionError> {
        self.send(EngineCommand::Complete {
            ty,
            text: text.into(),
            content,
        })
    }

    /// Merge provider-derived spans.
    pub fn apply_derived_spans(&self, spans: Vec<DerivedSpan>) -> Result<(), SessionError> {
        self.send(EngineCommand::ApplyDerivedSpans(spans))
    }

    /// Reconcile the host's display text and get the drawable ranges back.
    ///
    /// Blocks until the engine has processed every previously queued command plus this one,
    /// so the returned ranges reflect all state pushed so far.
    pub fn parse(&self, display_text: impl Into<String>) -> Result<Vec<RenderRange>, SessionError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(EngineCommand::Parse {
            display_text: display_text.into(),
            reply: reply_tx,
        })?;
        reply_rx.recv().map_err(|_| SessionError::Disconnected)
    }

    /// Drain every event currently queued, without blocking.
    pub fn poll_events(&self) -> Vec<EngineEvent> {
        self.events.try_iter().collect()
    }

    /// Block until the next event (or the engine thread goes away).
    pub fn next_event(&self) -> Result<EngineEvent, SessionError> {
        self.events.recv().map_err(|_| SessionError::Disconnected)
    }

    fn send(&self, command: EngineCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Disconnected)
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        let _ = self.commands.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(mut engine: Engine, commands: Receiver<EngineCommand>, events: Sender<EngineEvent>) {
    tracing::debug!("formatting thread started");
    while let Ok(command) = commands.recv() {
        match command {
            EngineCommand::SetText(text) => engine.set_text(&text),
            EngineCommand::SetSelection(selection) => engine.set_selection(selection),
            EngineCommand::SetAttributes(attrs) => engine.set_attributes(attrs),
            EngineCommand::Reset => engine.reset(),
            EngineCommand::FormatSelection { ty, content } => engine.format_selection(ty, content),
            EngineCommand::Complete { ty, text, content } => engine.complete(ty, &text, content),
            EngineCommand::ApplyDerivedSpans(spans) => engine.apply_derived_spans(spans),
            EngineCommand::Parse { display_text, reply } => {
                let ranges = engine.parse(&display_text);
                let _ = reply.send(ranges);
            }
            EngineCommand::Shutdown => break,
        }
        for event in engine.drain_events() {
            if events.send(event).is_err() {
                tracing::debug!("event receiver dropped, stopping formatting thread");
                return;
            }
        }
    }
}
