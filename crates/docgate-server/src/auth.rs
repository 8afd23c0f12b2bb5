//! Bearer-token authentication gate.
//!
//! Every `/api` request passes through [`authorize`] before its body is
//! read. Verification is behind [`TokenVerifier`], so a remote check can
//! replace the static token set without touching callers.

use async_trait::async_trait;

/// Decides whether a bearer token is acceptable.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> bool;
}

/// Verifier backed by a fixed set of tokens loaded at start-up.
///
/// Every configured token is compared on each check, each in constant
/// time. An empty set accepts nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: Vec<String>,
}

impl StaticTokenVerifier {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.is_empty())
            .collect();
        tokens.sort();
        tokens.dedup();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> bool {
        self.tokens.iter().fold(false, |matched, candidate| {
            constant_time_eq(candidate.as_bytes(), token.as_bytes()) | matched
        })
    }
}

/// Constant-time equality comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized,
    Unauthorized(&'static str),
}

/// Pull the token out of an `Authorization` header value.
///
/// Accepts `Bearer <token>` (scheme case-insensitive) and `Token <token>`.
pub fn extract_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    let scheme_ok = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
    (scheme_ok && !token.is_empty()).then_some(token)
}

/// Check the raw `Authorization` header against `verifier`.
pub async fn authorize(verifier: &dyn TokenVerifier, header: Option<&str>) -> AuthDecision {
    let Some(header) = header else {
        return AuthDecision::Unauthorized("Missing authorization header");
    };
    let Some(token) = extract_token(header) else {
        return AuthDecision::Unauthorized("Invalid authorization header");
    };

    if verifier.verify(token).await {
        AuthDecision::Authorized
    } else {
        AuthDecision::Unauthorized("Invalid or expired token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(extract_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_token("Token abc123"), Some("abc123"));
        assert_eq!(extract_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("abc123"), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
        assert!(!constant_time_eq(b"s3cret", b"s3cre"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_verify_checks_every_token() {
        let verifier = StaticTokenVerifier::new(["alpha", "beta", "gamma"]);
        for token in ["alpha", "beta", "gamma"] {
            assert!(verifier.verify(token).await, "{token}");
        }
        assert!(!verifier.verify("delta").await);
        assert!(!verifier.verify("alph").await);
        assert!(!verifier.verify("").await);
    }

    #[test]
    fn test_static_verifier_drops_empty_tokens() {
        let verifier = StaticTokenVerifier::new(["one", "", "two", "one"]);
        assert_eq!(verifier.len(), 2);
        assert!(StaticTokenVerifier::new(Vec::<String>::new()).is_empty());
    }

    #[tokio::test]
    async fn test_authorize_decisions() {
        let verifier = StaticTokenVerifier::new(["s3cret"]);

        assert_eq!(
            authorize(&verifier, Some("Bearer s3cret")).await,
            AuthDecision::Authorized
        );
        assert_eq!(
            authorize(&verifier, None).await,
            AuthDecision::Unauthorized("Missing authorization header")
        );
        assert_eq!(
            authorize(&verifier, Some("s3cret")).await,
            AuthDecision::Unauthorized("Invalid authorization header")
        );
        assert_eq!(
            authorize(&verifier, Some("Bearer wrong")).await,
            AuthDecision::Unauthorized("Invalid or expired token")
        );
    }

    #[test]
    fn test_empty_verifier_rejects_everything() {
        let verifier = StaticTokenVerifier::default();
        assert_eq!(
            tokio_test::block_on(authorize(&verifier, Some("Bearer anything"))),
            AuthDecision::Unauthorized("Invalid or expired token")
        );
    }
}
