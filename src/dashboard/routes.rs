use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
};
use std::sync::Arc;

use super::state::{DashboardState, SessionView};
use super::templates;
use crate::session::PendingQuestion;

// ── GET / — full page ────────────────────────────────────────────────

pub async fn index(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let view = state.view().await;
    templates::render_index(&view)
}

// ── GET /api/screen — current screen as an HTML partial ──────────────

pub async fn get_screen(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let view = state.view().await;
    Html(templates::render_screen(&view))
}

// ── GET /api/session — snapshot as JSON ──────────────────────────────

pub async fn get_session(State(state): State<Arc<DashboardState>>) -> Json<SessionView> {
    Json(state.view().await)
}

// ── POST /api/start ──────────────────────────────────────────────────

pub async fn start(State(state): State<Arc<DashboardState>>) -> Json<SessionView> {
    let view = {
        let mut ctl = state.controller.lock().await;
        if let Some(pending) = ctl.begin_session() {
            spawn_fetch(&state, &ctl, pending);
        }
        SessionView::from(&*ctl)
    };
    state.broadcast(view.clone());
    Json(view)
}

// ── POST /api/next ───────────────────────────────────────────────────

pub async fn next(State(state): State<Arc<DashboardState>>) -> Json<SessionView> {
    let view = {
        let mut ctl = state.controller.lock().await;
        if let Some(pending) = ctl.begin_request() {
            spawn_fetch(&state, &ctl, pending);
        }
        SessionView::from(&*ctl)
    };
    state.broadcast(view.clone());
    Json(view)
}

// ── POST /api/exit ───────────────────────────────────────────────────

pub async fn exit(State(state): State<Arc<DashboardState>>) -> Json<SessionView> {
    let view = {
        let mut ctl = state.controller.lock().await;
        ctl.exit();
        SessionView::from(&*ctl)
    };
    state.broadcast(view.clone());
    Json(view)
}

// ── POST /api/appearance ─────────────────────────────────────────────

pub async fn toggle_appearance(State(state): State<Arc<DashboardState>>) -> Json<SessionView> {
    let view = {
        let mut ctl = state.controller.lock().await;
        ctl.toggle_appearance();
        SessionView::from(&*ctl)
    };
    state.broadcast(view.clone());
    Json(view)
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Run the provider call off the lock. The answer is applied only if the
/// session it was asked for is still the current one.
fn spawn_fetch(
    state: &Arc<DashboardState>,
    ctl: &crate::session::SessionController,
    pending: PendingQuestion,
) {
    let provider = ctl.provider();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        let question = provider.question_for(pending.participant).await;
        let view = {
            let mut ctl = state.controller.lock().await;
            if !ctl.resolve(pending, question) {
                return;
            }
            SessionView::from(&*ctl)
        };
        state.broadcast(view);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use crate::provider::QuestionProvider;
    use crate::session::{SessionController, SessionState};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Answers "Q" once `gate` is notified.
    struct GatedProvider {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl QuestionProvider for GatedProvider {
        async fn question_for(&self, participant: Participant) -> String {
            self.gate.notified().await;
            format!("Question pour {}", participant)
        }
    }

    fn dashboard() -> (Arc<DashboardState>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(GatedProvider { gate: gate.clone() });
        let ctl = SessionController::new(provider, false);
        (Arc::new(DashboardState::new(ctl)), gate)
    }

    async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<SessionView>) -> SessionView {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no event")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_start_then_resolve() {
        let (state, gate) = dashboard();
        let mut rx = state.event_tx.subscribe();

        let Json(view) = start(State(state.clone())).await;
        assert_eq!(view.state, SessionState::Loading);
        assert!(view.is_loading);
        assert_eq!(next_event(&mut rx).await, view);

        gate.notify_one();
        let resolved = next_event(&mut rx).await;
        assert_eq!(resolved.state, SessionState::Ready);
        assert_eq!(resolved.question_number, 1);
        assert!(resolved.question.starts_with("Question pour"));
        assert!(!resolved.is_loading);
    }

    #[tokio::test]
    async fn test_next_while_loading_does_not_issue_second_request() {
        let (state, gate) = dashboard();
        let mut rx = state.event_tx.subscribe();

        start(State(state.clone())).await;
        let Json(view) = next(State(state.clone())).await;
        assert!(view.is_loading);

        gate.notify_one();
        next_event(&mut rx).await; // start
        next_event(&mut rx).await; // refused next
        let resolved = next_event(&mut rx).await;
        assert_eq!(resolved.history.len(), 1);
    }

    #[tokio::test]
    async fn test_exit_discards_in_flight_answer() {
        let (state, gate) = dashboard();
        start(State(state.clone())).await;

        let Json(view) = exit(State(state.clone())).await;
        assert_eq!(view.state, SessionState::Idle);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let view = state.view().await;
        assert!(!view.started);
        assert!(view.history.is_empty());
        assert!(view.question.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_appearance() {
        let (state, _) = dashboard();
        let Json(view) = toggle_appearance(State(state.clone())).await;
        assert!(view.dark_mode);
        let Json(view) = get_session(State(state.clone())).await;
        assert!(view.dark_mode);
        assert_eq!(view.state, SessionState::Idle);
    }
}
