//! Session state machine.
//!
//! ```text
//! IDLE --start--> LOADING --resolve--> READY --request_next--> LOADING ...
//!   ^                |                   |
//!   +------exit------+-------------------+
//! ```
//!
//! Every start and exit bumps the session epoch. A [`PendingQuestion`] issued
//! under an older epoch is ignored when it resolves, so a response that
//! arrives after the user went back never lands in the cleared history.

use serde::Serialize;
use std::sync::Arc;

use crate::participant::Participant;
use crate::provider::QuestionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub started: bool,
    pub current_question: String,
    pub current_participant: Participant,
    pub is_loading: bool,
    pub history: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            started: false,
            current_question: String::new(),
            current_participant: Participant::Mathou,
            is_loading: false,
            history: Vec::new(),
        }
    }
}

/// Ticket for one in-flight question request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingQuestion {
    epoch: u64,
    pub participant: Participant,
}

/// Owns the session and is the only caller of the [`QuestionProvider`].
pub struct SessionController {
    session: Session,
    epoch: u64,
    dark_mode: bool,
    provider: Arc<dyn QuestionProvider>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn QuestionProvider>, dark_mode: bool) -> Self {
        Self {
            session: Session::default(),
            epoch: 0,
            dark_mode,
            provider,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn provider(&self) -> Arc<dyn QuestionProvider> {
        Arc::clone(&self.provider)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn state(&self) -> SessionState {
        if !self.session.started {
            SessionState::Idle
        } else if self.session.is_loading || self.session.history.is_empty() {
            SessionState::Loading
        } else {
            SessionState::Ready
        }
    }

    pub fn toggle_appearance(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    /// Open a session and issue its first request. `None` if a session is
    /// already running.
    pub fn begin_session(&mut self) -> Option<PendingQuestion> {
        if self.session.started {
            return None;
        }
        self.epoch += 1;
        self.session.started = true;
        self.session.history.clear();
        self.begin_request()
    }

    /// Re-roll the participant and mark the session as loading. `None` when
    /// there is no session or a request is already in flight.
    pub fn begin_request(&mut self) -> Option<PendingQuestion> {
        if !self.session.started || self.session.is_loading {
            return None;
        }
        let participant = Participant::random();
        self.session.is_loading = true;
        self.session.current_participant = participant;
        Some(PendingQuestion {
            epoch: self.epoch,
            participant,
        })
    }

    /// Apply a resolved question. Returns false, leaving the session
    /// untouched, when the ticket belongs to a session that has since ended.
    pub fn resolve(&mut self, pending: PendingQuestion, question: String) -> bool {
        if pending.epoch != self.epoch || !self.session.started {
            return false;
        }
        self.session.current_question = question.clone();
        self.session.history.push(question);
        self.session.is_loading = false;
        true
    }

    /// Start a session and wait for its first question.
    pub async fn start(&mut self) -> bool {
        match self.begin_session() {
            Some(pending) => self.fetch(pending).await,
            None => false,
        }
    }

    /// Ask for the next question and wait for it.
    pub async fn request_next(&mut self) -> bool {
        match self.begin_request() {
            Some(pending) => self.fetch(pending).await,
            None => false,
        }
    }

    async fn fetch(&mut self, pending: PendingQuestion) -> bool {
        let question = self.provider.question_for(pending.participant).await;
        self.resolve(pending, question)
    }

    pub fn exit(&mut self) {
        self.epoch += 1;
        self.session = Session {
            current_participant: self.session.current_participant,
            ..Session::default()
        };
    }
}
