use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::session::{SessionController, SessionState};

/// Snapshot of the controller sent to the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub started: bool,
    pub is_loading: bool,
    pub question_number: usize,
    pub participant: String,
    pub participant_label: String,
    pub is_nono: bool,
    pub question: String,
    pub history: Vec<String>,
    pub dark_mode: bool,
}

impl From<&SessionController> for SessionView {
    fn from(ctl: &SessionController) -> Self {
        let session = ctl.session();
        Self {
            state: ctl.state(),
            started: session.started,
            is_loading: session.is_loading,
            question_number: session.history.len(),
            participant: session.current_participant.display_name().to_string(),
            participant_label: session.current_participant.label().to_string(),
            is_nono: session.current_participant == crate::participant::Participant::Nono,
            question: session.current_question.clone(),
            history: session.history.clone(),
            dark_mode: ctl.dark_mode(),
        }
    }
}

pub struct DashboardState {
    pub controller: Mutex<SessionController>,
    pub event_tx: broadcast::Sender<SessionView>,
}

impl DashboardState {
    pub fn new(controller: SessionController) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            controller: Mutex::new(controller),
            event_tx,
        }
    }

    pub async fn view(&self) -> SessionView {
        SessionView::from(&*self.controller.lock().await)
    }

    /// Push a snapshot to every connected page. No subscribers is fine.
    pub fn broadcast(&self, view: SessionView) {
        let _ = self.event_tx.send(view);
    }
}
