use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::participant::Participant;
use crate::utils::{ensure_dir, preview};

pub struct Logger {
    log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct SessionMetrics {
    pub questions_asked: usize,
    pub for_nono: usize,
    pub for_mathou: usize,
    pub fallbacks: usize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, participant: Participant, is_fallback: bool) {
        self.questions_asked += 1;
        match participant {
            Participant::Nono => self.for_nono += 1,
            Participant::Mathou => self.for_mathou += 1,
        }
        if is_fallback {
            self.fallbacks += 1;
        }
    }

    pub fn fallback_rate(&self) -> f64 {
        if self.questions_asked == 0 {
            return 0.0;
        }
        (self.fallbacks as f64 / self.questions_asked as f64) * 100.0
    }

    pub fn display(&self) {
        use colored::Colorize;
        println!("\n{}", "━━━━━━━━━ Statistiques ━━━━━━━━━".bright_cyan().bold());
        println!("Questions posées : {}", self.questions_asked);
        println!("Pour Nono : {}", self.for_nono.to_string().blue());
        println!("Pour Mathou : {}", self.for_mathou.to_string().magenta());
        println!("Réponses de secours : {}", self.fallbacks.to_string().yellow());
        println!("Taux de secours : {:.1}%", self.fallback_rate());
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan());
    }
}

impl Logger {
    pub fn new(log_dir: &str) -> Result<Self> {
        ensure_dir(Path::new(log_dir))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = PathBuf::from(log_dir).join(format!("session_{}.log", timestamp));

        Ok(Self { log_file })
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn log_api_request(&self, participant: Participant) -> Result<()> {
        self.log(&format!("API REQUEST: question for {}", participant))
    }

    pub fn log_api_response(&self, response: &str) -> Result<()> {
        self.log(&format!("API RESPONSE: {}", preview(response, 200)))
    }

    pub fn log_fallback(&self, reason: &str) -> Result<()> {
        self.log(&format!("FALLBACK: {}", reason))
    }

    pub fn log_error(&self, error: &str) -> Result<()> {
        self.log(&format!("ERROR: {}", error))
    }
}
