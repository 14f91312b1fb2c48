//! Turns a [`Participant`] into a debate question.
//!
//! The provider never fails: every error is replaced by one of the fixed
//! French messages below, which then shows up in the card like any other
//! question.

use async_trait::async_trait;
use std::sync::Arc;

use crate::api::GeminiClient;
use crate::config::AppConfig;
use crate::logger::Logger;
use crate::participant::Participant;

pub const MISSING_KEY_MESSAGE: &str =
    "Oups ! La clé API n'est pas configurée. Vérifie les réglages.";
pub const SILENT_ERROR_MESSAGE: &str = "Une erreur silencieuse est survenue...";
pub const CONNECTION_ERROR_MESSAGE: &str =
    "L'inspiration me manque (erreur de connexion). Réessaie !";

/// True when `question` is one of the fixed substitutes rather than a
/// generated question.
pub fn is_fallback(question: &str) -> bool {
    matches!(
        question,
        MISSING_KEY_MESSAGE | SILENT_ERROR_MESSAGE | CONNECTION_ERROR_MESSAGE
    )
}

#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Always resolves to a non-empty string.
    async fn question_for(&self, participant: Participant) -> String;
}

/// Prompt sent to the model, addressed to `participant`.
pub fn build_prompt(participant: Participant) -> String {
    format!(
        "Tu es un médiateur bienveillant pour un couple (Nono et Mathou).\n\
Ta mission : Lancer un débat philosophique, une question de valeurs ou une réflexion profonde sur la vie.\n\
\n\
Cible de la question : {name}.\n\
\n\
Directives :\n\
1. Sujets : Philosophie de vie, psychologie, futur, choix moraux, vision du bonheur, gestion des émotions.\n\
2. INTERDIT : Pas de sujets sexuels (NSFW), pas de vulgarité, pas de questions superficielles (\"ton plat préféré\").\n\
3. Ton : Profond, intelligent, bienveillant mais qui pousse à la réflexion et à l'argumentation.\n\
4. Langue : Français naturel.\n\
5. Format : Une seule phrase impactante ou une mise en situation courte. Pas de guillemets.\n\
\n\
Exemple de style attendu :\n\
\"Est-ce que tu penses qu'on doit tout se dire dans un couple, ou le jardin secret est-il nécessaire ?\"\n\
\"Préférerais-tu une vie courte et intense ou une vie longue et paisible ?\"\n\
\"Est-ce que nos défauts nous définissent plus que nos qualités ?\"",
        name = participant.display_name()
    )
}

/// Gemini-backed provider.
pub struct GeminiQuestionProvider {
    /// `None` when no API key is configured, or it could not be used.
    client: Option<GeminiClient>,
    logger: Option<Arc<Logger>>,
}

impl GeminiQuestionProvider {
    pub fn new(config: &AppConfig) -> Self {
        let client = config.api_key.as_deref().and_then(|key| {
            GeminiClient::new(key, config)
                .map_err(|e| eprintln!("Warning: unusable API key: {:#}", e))
                .ok()
        });
        Self {
            client,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.client.is_some()
    }

    fn log(&self, f: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            let _ = f(logger);
        }
    }
}

#[async_trait]
impl QuestionProvider for GeminiQuestionProvider {
    async fn question_for(&self, participant: Participant) -> String {
        let Some(client) = &self.client else {
            self.log(|l| l.log_error("API key missing: set API_KEY in .env"));
            return MISSING_KEY_MESSAGE.to_string();
        };

        self.log(|l| l.log_api_request(participant));

        match client.generate(&build_prompt(participant)).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                self.log(|l| l.log_api_response(&text));
                text.trim().to_string()
            }
            Ok(_) => {
                self.log(|l| l.log_fallback("empty response"));
                SILENT_ERROR_MESSAGE.to_string()
            }
            Err(e) => {
                self.log(|l| l.log_error(&format!("Error generating question: {:#}", e)));
                CONNECTION_ERROR_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_targets_participant() {
        for participant in Participant::ALL {
            let prompt = build_prompt(participant);
            assert!(prompt.contains(&format!("Cible de la question : {}.", participant)));
            assert!(prompt.contains("Pas de sujets sexuels"));
            assert!(prompt.contains("Pas de guillemets"));
            assert!(prompt.contains("Français naturel"));
        }
        assert_ne!(build_prompt(Participant::Nono), build_prompt(Participant::Mathou));
    }

    #[test]
    fn test_fallback_messages() {
        assert!(is_fallback(MISSING_KEY_MESSAGE));
        assert!(is_fallback(SILENT_ERROR_MESSAGE));
        assert!(is_fallback(CONNECTION_ERROR_MESSAGE));
        assert!(!is_fallback("Est-ce que le bonheur se mérite ?"));
        for msg in [MISSING_KEY_MESSAGE, SILENT_ERROR_MESSAGE, CONNECTION_ERROR_MESSAGE] {
            assert!(!msg.trim().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_key_returns_config_message() {
        let provider = GeminiQuestionProvider::new(&AppConfig::default());
        assert!(!provider.has_credentials());
        for participant in Participant::ALL {
            assert_eq!(provider.question_for(participant).await, MISSING_KEY_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_returns_connection_message() {
        let config = AppConfig {
            api_key: Some("test-key".to_string()),
            // Port 9 (discard) on localhost is closed in test environments.
            api_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 5,
            ..AppConfig::default()
        };
        let provider = GeminiQuestionProvider::new(&config);
        assert!(provider.has_credentials());
        assert_eq!(
            provider.question_for(Participant::Nono).await,
            CONNECTION_ERROR_MESSAGE
        );
    }
}
