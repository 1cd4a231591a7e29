use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SCRUBBER: LazyLock<SecretScrubber> = LazyLock::new(SecretScrubber::new);

/// Redact credentials from a message using the shared scrubber
pub fn scrub_secrets(message: &str) -> String {
    SCRUBBER.scrub_message(message)
}

/// Redacts bearer tokens, API keys and JWTs from text that may echo a
/// remote error body or request
#[derive(Clone)]
pub struct SecretScrubber {
    api_key_pattern: Regex,
    jwt_pattern: Regex,
    field_pattern: Regex,
    bearer_pattern: Regex,
}

impl SecretScrubber {
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            // OpenAI-style keys: sk-..., sk-proj-...
            api_key_pattern: Regex::new(r"sk-[A-Za-z0-9_-]{20,}").expect("api key pattern"),
            // Bare JWTs (Graph access tokens)
            jwt_pattern: Regex::new(r"eyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]*")
                .expect("jwt pattern"),
            field_pattern: Regex::new(
                r#"(?i)(["']?(?:api[_-]?key|access_token|token|secret|password)["']?\s*[:=]\s*)["']?[^"'\s,}]{6,}["']?"#,
            )
            .expect("field pattern"),
            bearer_pattern: Regex::new(r"Bearer\s+[A-Za-z0-9\-_.~+/]+=*").expect("bearer pattern"),
        }
    }

    /// Scrub a message of sensitive data
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .bearer_pattern
            .replace_all(message, "Bearer [TOKEN_REDACTED]");
        let scrubbed = self.jwt_pattern.replace_all(&scrubbed, "[TOKEN_REDACTED]");
        let scrubbed = self
            .api_key_pattern
            .replace_all(&scrubbed, "[API_KEY_REDACTED]");
        self.field_pattern
            .replace_all(&scrubbed, "${1}[REDACTED]")
            .into_owned()
    }
}

impl Default for SecretScrubber {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}
