//! Bearer token held for the lifetime of a session.

use std::fmt;

use zeroize::Zeroizing;

/// Bearer token sent with every cart service request.
///
/// The token bytes are wiped from memory when the value is dropped.
#[derive(Clone)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wraps a raw token; blank tokens are treated as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = Zeroizing::new(raw.into());

        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Token value for the `Authorization` header
    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(**redacted**)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_absent() {
        assert!(BearerToken::new("  ").is_none());
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = BearerToken::new("secret-token");

        assert_eq!(
            format!("{token:?}"),
            "Some(BearerToken(**redacted**))"
        );
        assert_eq!(token.as_ref().map(BearerToken::expose), Some("secret-token"));
    }
}
