use std::fmt;

/// Environment variable holding the forge API credential.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Bearer credential for the forge API.
///
/// CR and LF are stripped on construction so the value can never terminate
/// the `Authorization` header early.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Builds a token from a raw value, returning `None` if nothing is left
    /// after sanitization.
    pub fn new(raw: &str) -> Option<Self> {
        let sanitized: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        if sanitized.is_empty() {
            None
        } else {
            Some(Self(sanitized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the credential itself.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}
