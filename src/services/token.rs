//! Token issuance and validation
//!
//! Signature and expiry checks are purely local; only the revocation check
//! touches the store, since a revoked-but-unexpired token is the one kind of
//! invalidity a cryptographic check cannot see. This keeps validation cheap
//! for the common case while still supporting instant logout.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{TokenClaims, User},
    repository::Repository,
};

/// Token lifetime class. Access and refresh tokens share claim shape and
/// validation path; the kind only selects the TTL at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct TokenService {
    repository: Repository,
    config: AuthConfig,
}

impl TokenService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.config.access_token_minutes),
            TokenKind::Refresh => Duration::days(self.config.refresh_token_days),
        }
    }

    /// Issue a signed token for the subject. No side effects beyond signing.
    pub fn issue(&self, subject: &str, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Decide token validity for a user. Fails closed: bad signature,
    /// expiry, subject mismatch and revocation all come back as `false`,
    /// never as an error. Only store failures propagate.
    pub async fn validate(&self, token: &str, user: &User) -> AppResult<bool> {
        let claims = match TokenClaims::from_token(token, &self.config.jwt_secret) {
            Ok(claims) => claims,
            Err(_) => return Ok(false),
        };

        if claims.sub != user.email {
            return Ok(false);
        }

        let revoked = self.is_revoked(user.id, token).await?;
        Ok(!revoked)
    }

    /// Pure lookup against the subject's revocation list
    pub async fn is_revoked(&self, user_id: i64, token: &str) -> AppResult<bool> {
        self.repository.users.is_token_revoked(user_id, token).await
    }

    /// Recover the subject from a structurally valid token.
    ///
    /// Signature is verified, expiry is not: expiry and revocation are
    /// `validate`'s concern. A token that cannot be parsed or fails the
    /// signature check is malformed, which is distinct from merely invalid.
    pub fn extract_subject(&self, token: &str) -> AppResult<String> {
        TokenClaims::from_token_ignore_expiry(token, &self.config.jwt_secret)
            .map(|claims| claims.sub)
            .map_err(|_| AppError::MalformedToken)
    }

    /// Expiry instant of a structurally valid token, for revocation-list pruning
    pub fn extract_expiry(&self, token: &str) -> AppResult<DateTime<Utc>> {
        let claims = TokenClaims::from_token_ignore_expiry(token, &self.config.jwt_secret)
            .map_err(|_| AppError::MalformedToken)?;

        Utc.timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AppError::MalformedToken)
    }

    /// Strip the bearer scheme from an Authorization header.
    ///
    /// Absent or wrong-shape headers yield `None`, not an error; the
    /// boundary turns that into an authorization failure.
    pub fn extract_from_bearer_header(header: Option<&str>) -> Option<&str> {
        let header = header?;
        let token = header.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &str = "test-secret";

    fn claims(sub: &str, exp_offset_secs: i64) -> TokenClaims {
        let now = Utc::now();
        TokenClaims {
            sub: sub.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + exp_offset_secs,
        }
    }

    #[test]
    fn bearer_header_extraction() {
        assert_eq!(
            TokenService::extract_from_bearer_header(Some("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(TokenService::extract_from_bearer_header(None), None);
        assert_eq!(TokenService::extract_from_bearer_header(Some("abc.def.ghi")), None);
        assert_eq!(TokenService::extract_from_bearer_header(Some("Basic abc")), None);
        assert_eq!(TokenService::extract_from_bearer_header(Some("Bearer ")), None);
        assert_eq!(TokenService::extract_from_bearer_header(Some("Bearer   ")), None);
    }

    #[test]
    fn claims_round_trip() {
        let token = claims("a@x.com", 3600).create_token(SECRET).unwrap();
        let decoded = TokenClaims::from_token(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, "a@x.com");
    }

    #[test]
    fn expired_token_rejected_by_strict_parse() {
        let token = claims("a@x.com", -3600).create_token(SECRET).unwrap();
        assert!(TokenClaims::from_token(&token, SECRET).is_err());
        // Subject stays recoverable when expiry is ignored
        let decoded = TokenClaims::from_token_ignore_expiry(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, "a@x.com");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = claims("a@x.com", 3600).create_token(SECRET).unwrap();
        assert!(TokenClaims::from_token(&token, "other-secret").is_err());
        assert!(TokenClaims::from_token_ignore_expiry(&token, "other-secret").is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(TokenClaims::from_token_ignore_expiry("not-a-jwt", SECRET).is_err());
        assert!(TokenClaims::from_token_ignore_expiry("", SECRET).is_err());
    }
}
