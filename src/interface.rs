use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{CompletionType, Config, Context, Editor, Helper, Highlighter, Validator};

use crate::config::AppConfig;
use crate::dashboard::{self, DashboardState};
use crate::logger::{Logger, SessionMetrics};
use crate::participant::Participant;
use crate::provider::{is_fallback, GeminiQuestionProvider, QuestionProvider};
use crate::session::{PendingQuestion, Session, SessionController};
use crate::utils::wrap_text;

/// Available slash commands for tab-completion.
const COMMANDS: &[&str] = &[
    "/help", "/quit", "/exit", "/start", "/next", "/back", "/theme", "/history", "/stats",
];

const CARD_WIDTH: usize = 52;

/// Rustyline helper providing slash-command tab-completion and inline hints.
#[derive(Helper, Validator, Highlighter)]
struct CommandCompleter;

impl Hinter for CommandCompleter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos != line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }

        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        if !prefix.starts_with('/') || prefix.contains(' ') {
            return Ok((0, vec![]));
        }

        let matches: Vec<Pair> = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

/// What a line of input asks for, given whether a session is running.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Help,
    Start,
    Next,
    Back,
    Theme,
    History,
    Stats,
    Unknown(String),
}

fn parse_command(input: &str, started: bool) -> Command {
    match input {
        "" if started => Command::Next,
        "" => Command::Start,
        "/quit" | "/exit" => Command::Quit,
        "/help" => Command::Help,
        "/start" => Command::Start,
        "/next" => Command::Next,
        "/back" => Command::Back,
        "/theme" => Command::Theme,
        "/history" => Command::History,
        "/stats" => Command::Stats,
        other => Command::Unknown(other.to_string()),
    }
}

/// Color choices for one appearance.
struct Palette {
    dark: bool,
}

impl Palette {
    fn frame(&self, s: &str) -> ColoredString {
        if self.dark {
            s.bright_black()
        } else {
            s.blue()
        }
    }

    fn title(&self, s: &str) -> ColoredString {
        if self.dark {
            s.bright_white().bold()
        } else {
            s.black().bold()
        }
    }

    fn muted(&self, s: &str) -> ColoredString {
        if self.dark {
            s.white().dimmed()
        } else {
            s.bright_black()
        }
    }

    fn badge(&self, participant: Participant) -> ColoredString {
        let label = format!(" {} ", participant.label().to_uppercase());
        match (participant, self.dark) {
            (Participant::Nono, true) => label.bright_blue().bold(),
            (Participant::Nono, false) => label.blue().bold(),
            (Participant::Mathou, true) => label.bright_magenta().bold(),
            (Participant::Mathou, false) => label.magenta().bold(),
        }
    }
}

fn centered(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    format!("{}{}", " ".repeat(left), text)
}

pub fn render_welcome(dark: bool) -> String {
    let p = Palette { dark };
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", centered("♥", CARD_WIDTH).red().bold()));
    out.push_str(&format!("{}\n", p.title(&centered("Nono & Mathou", CARD_WIDTH))));
    out.push_str(&format!(
        "{}\n\n",
        p.muted(&centered(
            "Prenez le temps de discuter de ce qui compte vraiment.",
            CARD_WIDTH
        ))
    ));
    out.push_str(&format!(
        "{}\n",
        centered("[Entrée] Commencer", CARD_WIDTH).bright_cyan().bold()
    ));
    out.push_str(&format!(
        "{}\n",
        p.muted(&centered("PROPULSÉ PAR GEMINI AI", CARD_WIDTH))
    ));
    out
}

/// Active-session screen: counter, participant badge and question, or the
/// loading line while a request is in flight.
pub fn render_card(session: &Session, dark: bool) -> String {
    let p = Palette { dark };
    let inner = CARD_WIDTH - 4;
    let border = "─".repeat(CARD_WIDTH - 2);
    let mut out = String::new();

    let counter = format!("QUESTION {}", session.history.len());
    out.push_str(&format!(
        "\n{}{}\n",
        "← /back".dimmed(),
        p.muted(&centered(&counter, CARD_WIDTH - 7))
    ));
    out.push_str(&format!("{}\n", p.frame(&format!("╭{}╮", border))));

    let mut body: Vec<(String, ColoredString)> = Vec::new();
    if session.is_loading {
        let text = centered("✦ Réflexion en cours...", inner);
        body.push((text.clone(), p.muted(&text)));
    } else {
        let label = format!(" {} ", session.current_participant.label().to_uppercase());
        let badge = centered(&label, inner);
        let pad = badge.chars().count() - label.chars().count();
        body.push((
            badge,
            format!("{}{}", " ".repeat(pad), p.badge(session.current_participant)).normal(),
        ));
        body.push((String::new(), "".normal()));
        for line in wrap_text(&session.current_question, inner) {
            let text = centered(&line, inner);
            body.push((text.clone(), p.title(&text)));
        }
    }

    for (plain, styled) in body {
        let fill = inner.saturating_sub(plain.chars().count());
        out.push_str(&format!(
            "{} {}{} {}\n",
            p.frame("│"),
            styled,
            " ".repeat(fill),
            p.frame("│")
        ));
    }

    out.push_str(&format!("{}\n", p.frame(&format!("╰{}╯", border))));
    let action = if session.is_loading {
        "..."
    } else {
        "[Entrée] Question Suivante"
    };
    out.push_str(&format!("{}\n", centered(action, CARD_WIDTH).bright_cyan().bold()));
    out
}

pub fn print_banner(dark: bool) {
    println!("{}", render_welcome(dark));
    println!("{}\n", " Tapez /help pour les commandes ou /quit pour quitter".dimmed());
}

fn print_help() {
    println!("\n{}", "Commandes :".bright_cyan().bold());
    println!("  {}  - Quitter", "/quit, /exit".green());
    println!("  {}         - Afficher cette aide", "/help".green());
    println!("  {}        - Commencer une partie (ou Entrée)", "/start".green());
    println!("  {}         - Question suivante (ou Entrée)", "/next".green());
    println!("  {}         - Revenir à l'accueil", "/back".green());
    println!("  {}        - Basculer mode sombre / clair", "/theme".green());
    println!("  {}      - Questions de la partie en cours", "/history".green());
    println!("  {}        - Statistiques de la session", "/stats".green());
    println!();
}

/// Start a spinner animation in a background thread.
/// Returns an `Arc<AtomicBool>`; set it to `false` to stop the spinner.
fn start_spinner(message: &str) -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    let msg = message.to_string();

    std::thread::spawn(move || {
        let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let mut i = 0;
        while running_clone.load(Ordering::Relaxed) {
            print!("\r{} {} ", frames[i % frames.len()].to_string().cyan(), msg.dimmed());
            let _ = io::stdout().flush();
            std::thread::sleep(std::time::Duration::from_millis(80));
            i += 1;
        }
        print!("\r{}\r", " ".repeat(msg.chars().count() + 4));
        let _ = io::stdout().flush();
    });

    running
}

fn stop_spinner(handle: &Arc<AtomicBool>) {
    handle.store(false, Ordering::Relaxed);
    // Give the spinner thread time to clear the line
    std::thread::sleep(std::time::Duration::from_millis(100));
}

/// Wait for `pending` while listening for Ctrl-C. Ctrl-C leaves the session;
/// the request keeps running on the wire but its answer is dropped.
async fn await_question(
    ctl: &mut SessionController,
    pending: PendingQuestion,
    metrics: &mut SessionMetrics,
) {
    let provider: Arc<dyn QuestionProvider> = ctl.provider();
    let spinner = start_spinner("Réflexion en cours...  (Ctrl-C pour revenir)");

    tokio::select! {
        question = provider.question_for(pending.participant) => {
            stop_spinner(&spinner);
            let fallback = is_fallback(&question);
            if ctl.resolve(pending, question) {
                metrics.record(pending.participant, fallback);
                print!("{}", render_card(ctl.session(), ctl.dark_mode()));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            stop_spinner(&spinner);
            ctl.exit();
            println!("{}", "Retour à l'accueil.".yellow());
            print!("{}", render_welcome(ctl.dark_mode()));
        }
    }
}

fn build_controller(config: &AppConfig) -> (SessionController, Option<Arc<Logger>>) {
    let logger = match Logger::new(&config.log_dir) {
        Ok(l) => Some(Arc::new(l)),
        Err(e) => {
            println!("{} {:#}", "⚠️  Logging disabled:".yellow(), e);
            None
        }
    };

    let mut provider = GeminiQuestionProvider::new(config);
    if let Some(l) = &logger {
        provider = provider.with_logger(Arc::clone(l));
    }
    if provider.has_credentials() {
        println!("{} {}", "✓ Modèle :".green(), config.model.bright_white());
    } else {
        println!(
            "{}",
            "⚠️  API_KEY manquante : ajoute-la dans ton fichier .env".yellow()
        );
    }

    let ctl = SessionController::new(Arc::new(provider), config.initial_dark_mode());
    (ctl, logger)
}

/// Interactive REPL entry point.
pub async fn start_repl(config: &AppConfig) -> Result<()> {
    let (ctl, logger) = build_controller(config);
    start_repl_loop(ctl, logger).await
}

/// REPL plus the web dashboard, each with its own session.
pub async fn start_repl_with_dashboard(config: &AppConfig) -> Result<()> {
    let (ctl, logger) = build_controller(config);

    let mut web_provider = GeminiQuestionProvider::new(config);
    if let Some(l) = &logger {
        web_provider = web_provider.with_logger(Arc::clone(l));
    }
    let web_ctl = SessionController::new(Arc::new(web_provider), config.initial_dark_mode());
    let state = Arc::new(DashboardState::new(web_ctl));
    let port = config.dashboard_port;

    tokio::spawn(async move {
        if let Err(e) = dashboard::start_dashboard(state, port).await {
            eprintln!("{} {:#}", "✗ Dashboard error:".red(), e);
        }
    });
    println!(
        "{} {}",
        "✓ Interface web :".green(),
        format!("http://127.0.0.1:{}", port).bright_white()
    );

    start_repl_loop(ctl, logger).await
}

async fn start_repl_loop(mut ctl: SessionController, logger: Option<Arc<Logger>>) -> Result<()> {
    let rl_config = Config::builder()
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .build();
    let mut rl: Editor<CommandCompleter, _> =
        Editor::with_config(rl_config).context("Failed to create line editor")?;
    rl.set_helper(Some(CommandCompleter));

    let mut metrics = SessionMetrics::new();
    print_banner(ctl.dark_mode());

    loop {
        let prompt = if ctl.session().started { "› " } else { "> " };
        let line = match rl.readline(&prompt.bright_cyan().bold().to_string()) {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                println!("{} {}", "✗ Input error:".red(), e);
                continue;
            }
        };

        match parse_command(&line, ctl.session().started) {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Start => match ctl.begin_session() {
                Some(pending) => await_question(&mut ctl, pending, &mut metrics).await,
                None => println!("{}", "Une partie est déjà en cours.".dimmed()),
            },
            Command::Next => match ctl.begin_request() {
                Some(pending) => await_question(&mut ctl, pending, &mut metrics).await,
                None => println!("{}", "Tapez /start pour commencer.".dimmed()),
            },
            Command::Back => {
                ctl.exit();
                print!("{}", render_welcome(ctl.dark_mode()));
            }
            Command::Theme => {
                let dark = ctl.toggle_appearance();
                let mode = if dark { "sombre" } else { "clair" };
                println!("{} {}", "Mode".dimmed(), mode.bright_white());
                if ctl.session().started {
                    print!("{}", render_card(ctl.session(), dark));
                } else {
                    print!("{}", render_welcome(dark));
                }
            }
            Command::History => {
                let history = &ctl.session().history;
                if history.is_empty() {
                    println!("{}", "Aucune question pour l'instant.".dimmed());
                }
                for (i, q) in history.iter().enumerate() {
                    println!("  {} {}", format!("{:>2}.", i + 1).dimmed(), q);
                }
            }
            Command::Stats => metrics.display(),
            Command::Unknown(cmd) => {
                println!("{} {}", "Commande inconnue :".yellow(), cmd);
                println!("{}", "Tapez /help pour la liste.".dimmed());
            }
        }
    }

    println!("\n{}", "À bientôt !".bright_cyan());
    metrics.display();
    if let Some(l) = logger {
        println!("{} {}", "Journal :".dimmed(), l.path().display());
    }
    Ok(())
}
