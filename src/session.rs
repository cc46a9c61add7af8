//! One user session (one page lifetime): drives the view machine with a dwell
//! timer and the generation call, and publishes a rendered view after every
//! change.
//!
//! The dwell timer and the network await are two separately spawned tasks.
//! Both report back on the session's event channel tagged with their ticket,
//! so whatever finishes after a reset or a newer generation is ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, warn};

use crate::credentials::CredentialHost;
use crate::domain::{Difficulty, GrammarCategory};
use crate::error::GenerationError;
use crate::generator::QuestionGenerator;
use crate::machine::{Outcome, Ticket, ViewMachine};
use crate::protocol::ServerWsMessage;
use crate::render::render;

/// User actions a session understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  SelectCategory(GrammarCategory),
  SelectDifficulty(Difficulty),
  Generate,
  Reset,
  Choose(usize),
  ToggleAnalysis,
  /// Open the host's key selection UI.
  SelectKey,
  /// The host reports that a key was stored.
  KeyProvided,
}

#[derive(Debug)]
pub enum SessionEvent {
  DwellElapsed { ticket: u64 },
  Resolved { ticket: u64, outcome: Outcome },
}

pub struct Session {
  machine: ViewMachine,
  generator: Arc<dyn QuestionGenerator>,
  host: Arc<dyn CredentialHost>,
  dwell: Duration,
  has_key: bool,
  events_tx: UnboundedSender<SessionEvent>,
  events_rx: UnboundedReceiver<SessionEvent>,
  outbound: UnboundedSender<ServerWsMessage>,
}

impl Session {
  /// Create an idle session, ask the host for key presence, and publish the first view.
  pub async fn start(
    generator: Arc<dyn QuestionGenerator>,
    host: Arc<dyn CredentialHost>,
    dwell: Duration,
    outbound: UnboundedSender<ServerWsMessage>,
  ) -> Self {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let has_key = host.has_selected_key().await;
    let session = Self {
      machine: ViewMachine::default(),
      generator,
      host,
      dwell,
      has_key,
      events_tx,
      events_rx,
      outbound,
    };
    session.publish();
    session
  }

  pub fn machine(&self) -> &ViewMachine {
    &self.machine
  }

  pub fn has_key(&self) -> bool {
    self.has_key
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn handle(&mut self, cmd: Command) {
    let changed = match cmd {
      Command::SelectCategory(c) => self.machine.select_category(c),
      Command::SelectDifficulty(d) => self.machine.select_difficulty(d),
      Command::Generate => match self.machine.generate() {
        Some(ticket) => {
          self.launch(ticket);
          true
        }
        None => false,
      },
      Command::Reset => {
        self.machine.reset();
        true
      }
      Command::Choose(i) => match self.machine.choose(i) {
        Some(r) => {
          info!(target: "question", index = r.index, correct = r.correct, "Choice made");
          true
        }
        None => false,
      },
      Command::ToggleAnalysis => self.machine.toggle_analysis(),
      Command::SelectKey => {
        self.host.open_select_key().await;
        // Selection is assumed to succeed; a cancelled dialog shows up as
        // CredentialMissing on the next generation.
        self.has_key = true;
        true
      }
      Command::KeyProvided => {
        self.has_key = self.host.has_selected_key().await;
        true
      }
    };
    if changed {
      self.publish();
    } else {
      debug!(target: "acegrammar", "Command had no effect");
    }
  }

  /// Start the dwell timer and the generation call for `ticket`.
  fn launch(&self, ticket: Ticket) {
    let Ticket { id, selection } = ticket;
    info!(target: "question", ticket = id, category = %selection.category, difficulty = %selection.difficulty, "Generation started");

    let tx = self.events_tx.clone();
    let dwell = self.dwell;
    tokio::spawn(async move {
      tokio::time::sleep(dwell).await;
      let _ = tx.send(SessionEvent::DwellElapsed { ticket: id });
    });

    let tx = self.events_tx.clone();
    let generator = self.generator.clone();
    tokio::spawn(async move {
      let outcome = generator.generate(selection.category, selection.difficulty).await;
      let _ = tx.send(SessionEvent::Resolved { ticket: id, outcome });
    });
  }

  /// Next timer/generation event. Never yields `None` while the session lives.
  pub async fn next_event(&mut self) -> Option<SessionEvent> {
    self.events_rx.recv().await
  }

  pub fn on_event(&mut self, ev: SessionEvent) {
    match ev {
      SessionEvent::DwellElapsed { ticket } => {
        if self.machine.dwell_elapsed(ticket) {
          self.publish();
          if self.machine.apply_pending() {
            self.publish();
          }
        }
      }
      SessionEvent::Resolved { ticket, outcome } => {
        if let Err(e) = &outcome {
          if e.needs_key_selection() && self.machine.is_live(ticket) {
            warn!(target: "acegrammar", error = %e, "Key missing or rejected; asking for a new selection");
            self.has_key = false;
            if matches!(e, GenerationError::CredentialInvalid(_)) {
              self.host.forget_key();
            }
          }
        }
        if self.machine.resolve(ticket, outcome) {
          self.publish();
        }
      }
    }
  }

  /// Run until no generation is in flight. Handy for one-shot drivers and tests.
  pub async fn settle(&mut self) {
    while self.machine.is_busy() {
      match self.next_event().await {
        Some(ev) => self.on_event(ev),
        None => break,
      }
    }
  }

  fn publish(&self) {
    let view = render(&self.machine, self.has_key);
    if self.outbound.send(ServerWsMessage::View { view }).is_err() {
      debug!(target: "acegrammar", "View dropped: connection closed");
    }
  }
}
