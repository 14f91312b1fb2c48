use askama::Template;

use super::state::SessionView;

// ── Askama Templates ─────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub view: &'a SessionView,
    pub screen: &'a str,
}

#[derive(Template)]
#[template(path = "partials/screen.html")]
pub struct ScreenTemplate<'a> {
    pub view: &'a SessionView,
}

// ── Render helpers (called from routes.rs) ───────────────────────────

pub fn render_index(view: &SessionView) -> axum::response::Html<String> {
    let screen = render_screen(view);
    let template = IndexTemplate {
        view,
        screen: &screen,
    };
    axum::response::Html(template.render().unwrap_or_else(|e| {
        let msg = e
            .to_string()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        format!("<h1>Template error: {}</h1>", msg)
    }))
}

pub fn render_screen(view: &SessionView) -> String {
    let template = ScreenTemplate { view };
    template.render().unwrap_or_default()
}
