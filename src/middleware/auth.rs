use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;

use crate::{error::AppError, routes::AppState};

/// Identity of an authenticated caller; raw credentials never reach handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
}

/// Validates opaque bearer tokens
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Option<CallerIdentity>;
}

/// Fixed token set loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    subjects_by_token: HashMap<String, String>,
}

impl StaticTokens {
    /// Builds the set from `(subject, token)` pairs
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            subjects_by_token: entries
                .into_iter()
                .map(|(subject, token)| (token, subject))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.subjects_by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects_by_token.is_empty()
    }
}

impl TokenValidator for StaticTokens {
    fn validate(&self, token: &str) -> Option<CallerIdentity> {
        self.subjects_by_token
            .get(token)
            .map(|subject| CallerIdentity {
                subject: subject.clone(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Bearer token from the `Authorization` header, else the `token` query parameter
fn extract_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.token)
            .filter(|token| !token.is_empty())
    })
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(parts) else {
            tracing::warn!(uri = %parts.uri.path(), "No authentication token provided");
            return Err(AppError::Unauthorized("Authentication required".to_string()));
        };

        match state.tokens.validate(&token) {
            Some(identity) => {
                tracing::debug!(subject = %identity.subject, "Authenticated caller");
                Ok(identity)
            }
            None => {
                tracing::warn!(uri = %parts.uri.path(), "Rejected invalid authentication token");
                Err(AppError::Unauthorized("Invalid authentication token".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_static_tokens_map_to_subject() {
        let tokens = StaticTokens::new(vec![("alice".to_string(), "tok-a".to_string())]);

        assert_eq!(
            tokens.validate("tok-a"),
            Some(CallerIdentity {
                subject: "alice".to_string()
            })
        );
        assert_eq!(tokens.validate("tok-b"), None);
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_token_from_bearer_header() {
        let request = Request::builder()
            .uri("/api/v1/search?query=hat")
            .header(AUTHORIZATION, "Bearer tok-a")
            .body(())
            .unwrap();

        assert_eq!(extract_token(&parts(request)), Some("tok-a".to_string()));
    }

    #[test]
    fn test_token_from_query_parameter() {
        let request = Request::builder()
            .uri("/api/v1/search?query=hat&token=tok-q")
            .body(())
            .unwrap();

        assert_eq!(extract_token(&parts(request)), Some("tok-q".to_string()));
    }

    #[test]
    fn test_header_takes_precedence_over_query() {
        let request = Request::builder()
            .uri("/api/v1/search?token=tok-q")
            .header(AUTHORIZATION, "Bearer tok-h")
            .body(())
            .unwrap();

        assert_eq!(extract_token(&parts(request)), Some("tok-h".to_string()));
    }

    #[test]
    fn test_missing_or_non_bearer_token() {
        let request = Request::builder()
            .uri("/api/v1/search?query=hat")
            .header(AUTHORIZATION, "Basic dXNlcjpwdw==")
            .body(())
            .unwrap();

        assert_eq!(extract_token(&parts(request)), None);
    }
}
