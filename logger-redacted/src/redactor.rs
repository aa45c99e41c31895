use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

// A pattern that fails to compile disables its redaction step.
lazy_static! {
    static ref DATA_URL_REGEX: Option<Regex> =
        Regex::new(r"data:[A-Za-z0-9.+/-]*;base64,[A-Za-z0-9+/=]+").ok();
    static ref BEARER_REGEX: Option<Regex> = Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]+=*").ok();
    static ref JWT_REGEX: Option<Regex> =
        Regex::new(r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").ok();
    static ref PASSWORD_REGEX: Option<Regex> =
        Regex::new(r#"(?i)("?password(?:hash)?"?\s*[:=]\s*)"[^"]*""#).ok();
    static ref EMAIL_REGEX: Option<Regex> =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").ok();
}

/// `text` with every match of `pattern` rewritten by `replacer`; unchanged
/// when the pattern is unavailable
fn replace_all<R: regex::Replacer>(pattern: &Option<Regex>, text: &str, replacer: R) -> String {
    match pattern {
        Some(re) => re.replace_all(text, replacer).into_owned(),
        None => text.to_string(),
    }
}

/// Redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_data_urls: bool,
    pub redact_tokens: bool,
    pub redact_passwords: bool,
    pub redact_emails: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_data_urls: true,
            redact_tokens: true,
            redact_passwords: true,
            redact_emails: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// Scrubs credentials and inline document payloads from log messages
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Attachments first: a base64 body can contain anything
        if self.config.redact_data_urls {
            result = Self::redact_data_urls(&result);
        }

        if self.config.redact_tokens {
            result = self.redact_tokens(&result);
        }

        if self.config.redact_passwords {
            result = replace_all(&PASSWORD_REGEX, &result, r#"${1}"***""#);
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn redact_data_urls(text: &str) -> String {
        replace_all(&DATA_URL_REGEX, text, |caps: &regex::Captures| {
            format!("DATA_URL[{} chars]", caps[0].len())
        })
    }

    fn redact_tokens(&self, text: &str) -> String {
        let result = replace_all(&BEARER_REGEX, text, |caps: &regex::Captures| {
            if self.config.hash_for_correlation {
                format!("Bearer TOKEN[{}]", self.hash_value(&caps[0]))
            } else {
                "Bearer ***".to_string()
            }
        });
        replace_all(&JWT_REGEX, &result, |caps: &regex::Captures| {
            if self.config.hash_for_correlation {
                format!("TOKEN[{}]", self.hash_value(&caps[0]))
            } else {
                "***".to_string()
            }
        })
    }

    fn redact_emails(&self, text: &str) -> String {
        replace_all(&EMAIL_REGEX, text, |caps: &regex::Captures| {
            let email = &caps[0];
            if self.config.hash_for_correlation {
                format!("EMAIL[{}]", self.hash_value(email))
            } else {
                match email.split_once('@') {
                    Some((local, domain)) => format!(
                        "{}***@{}***",
                        local.chars().next().unwrap_or('*'),
                        domain.chars().next().unwrap_or('*')
                    ),
                    None => "***@***".to_string(),
                }
            }
        })
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(result.get(..8).unwrap_or(&result)) // first 8 bytes are enough to correlate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_builtin_patterns_compile() {
        for pattern in [&*DATA_URL_REGEX, &*BEARER_REGEX, &*JWT_REGEX, &*PASSWORD_REGEX, &*EMAIL_REGEX] {
            assert!(pattern.is_some());
        }
        assert_eq!(replace_all(&None, "Bearer abc", "x"), "Bearer abc");
    }

    #[test]
    fn test_data_url_redaction() {
        let text = r#"{"document":{"name":"scan.pdf","data":"data:application/pdf;base64,JVBERi0xLjQK"}}"#;
        let redacted = plain().redact(text);
        assert!(!redacted.contains("JVBERi0xLjQK"));
        assert!(redacted.contains("DATA_URL["));
        assert!(redacted.contains("scan.pdf"));
    }

    #[test]
    fn test_bearer_token_redaction() {
        let redacted = plain().redact("Authorization: Bearer abc.def.ghi");
        assert_eq!(redacted, "Authorization: Bearer ***");
    }

    #[test]
    fn test_password_redaction() {
        let redacted = plain().redact(r#"{"username":"admin","password":"hunter2"}"#);
        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains(r#""password":"***""#));
    }

    #[test]
    fn test_email_redaction() {
        let redacted = plain().redact("User john.doe@example.com logged in");
        assert!(redacted.contains("j***@e***"));
    }

    #[test]
    fn test_hashed_tokens_are_stable() {
        let redactor = PiiRedactor::new(RedactionConfig::default());
        let a = redactor.redact("Bearer secret-token");
        let b = redactor.redact("Bearer secret-token");
        assert_eq!(a, b);
        assert!(!a.contains("secret-token"));
    }
}
