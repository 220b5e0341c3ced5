//! Signed, time-limited session tokens and the cookie that carries them.
//!
//! A token is an HS256 JWT whose subject is the user id. Nothing is kept on
//! the server: clearing the cookie ends the session for that browser, but a
//! copy of the token stays valid until it expires.

use crate::auth::COOKIE_NAME;
use crate::models::Id;
use crate::settings::Auth;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Why a [`SessionManager`] could not be built or could not sign.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The secret is shorter than [`MIN_SECRET_LEN`].
    #[error("session secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    /// Zero or negative session lifetime.
    #[error("session lifetime must be positive")]
    Lifetime,
    /// The JWT library refused to sign.
    #[error("could not sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session tokens with a secret fixed at startup.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    secure_cookie: bool,
}

impl SessionManager {
    /// Builds a manager from an explicit secret.
    pub fn new(
        secret: &[u8],
        lifetime: Duration,
        secure_cookie: bool,
    ) -> Result<SessionManager, SessionError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::WeakSecret);
        }
        if !lifetime.is_positive() {
            return Err(SessionError::Lifetime);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(SessionManager {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
            secure_cookie,
        })
    }

    /// Builds a manager from the `auth` settings section.
    pub fn from_settings(auth: &Auth) -> Result<SessionManager, SessionError> {
        SessionManager::new(
            auth.secret.as_bytes(),
            Duration::hours(auth.session_hours),
            auth.secure_cookie,
        )
    }

    /// How long an issued token stays valid.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `user_id` valid from now.
    pub fn issue(&self, user_id: Id) -> Result<String, SessionError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Issues a token for `user_id` as if the current time were `now`.
    pub fn issue_at(&self, user_id: Id, now: OffsetDateTime) -> Result<String, SessionError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + self.lifetime).unix_timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Returns the user id of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<Id> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Like [`verify`](Self::verify) with an explicit current time.
    ///
    /// Bad signature, expiry and malformed content all give `None`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Option<Id> {
        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("rejected session token: {e}");
                return None;
            }
        };
        if now.unix_timestamp() >= claims.exp {
            tracing::debug!("session token expired");
            return None;
        }
        claims.sub.parse().ok()
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn cookie(&self, token: &str) -> String {
        let mut header_value = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            COOKIE_NAME,
            token,
            self.lifetime.whole_seconds()
        );
        if self.secure_cookie {
            header_value.push_str("; Secure");
        }
        header_value
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        let mut header_value =
            format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", COOKIE_NAME);
        if self.secure_cookie {
            header_value.push_str("; Secure");
        }
        header_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"an-explicit-test-secret-of-enough-length";

    fn manager() -> SessionManager {
        SessionManager::new(SECRET, Duration::hours(24), false).unwrap()
    }

    #[test]
    fn should_round_trip_user_id() {
        let sessions = manager();
        let token = sessions.issue(42).unwrap();
        assert_eq!(sessions.verify(&token), Some(42));
    }

    #[test]
    fn should_expire_after_lifetime() {
        let sessions = manager();
        let issued = OffsetDateTime::now_utc();
        let token = sessions.issue_at(7, issued).unwrap();

        let just_before = issued + Duration::hours(24) - Duration::seconds(1);
        assert_eq!(sessions.verify_at(&token, just_before), Some(7));
        assert_eq!(sessions.verify_at(&token, issued + Duration::hours(24)), None);
        assert_eq!(sessions.verify_at(&token, issued + Duration::days(3)), None);
    }

    #[test]
    fn should_reject_token_from_other_secret() {
        let other =
            SessionManager::new(b"a-completely-different-secret-value!!", Duration::hours(24), false)
                .unwrap();
        let token = other.issue(1).unwrap();
        assert_eq!(manager().verify(&token), None);
    }

    #[test]
    fn should_reject_tampered_payload() {
        let sessions = manager();
        let now = OffsetDateTime::now_utc();
        let mine = sessions.issue_at(1, now).unwrap();
        let theirs = sessions.issue_at(2, now).unwrap();

        let mine: Vec<&str> = mine.split('.').collect();
        let theirs: Vec<&str> = theirs.split('.').collect();
        let forged = format!("{}.{}.{}", mine[0], theirs[1], mine[2]);
        assert_eq!(sessions.verify(&forged), None);
    }

    #[test]
    fn should_reject_garbage() {
        let sessions = manager();
        assert_eq!(sessions.verify(""), None);
        assert_eq!(sessions.verify("a.b.c"), None);
        assert_eq!(sessions.verify("not a token"), None);
    }

    #[test]
    fn should_refuse_short_secret() {
        assert!(matches!(
            SessionManager::new(b"short", Duration::hours(24), false),
            Err(SessionError::WeakSecret)
        ));
        assert!(matches!(
            SessionManager::new(SECRET, Duration::ZERO, false),
            Err(SessionError::Lifetime)
        ));
    }

    #[test]
    fn should_build_cookie_attributes() {
        let sessions = manager();
        let cookie = sessions.cookie("abc");
        assert_eq!(
            cookie,
            "session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=86400"
        );
        assert!(sessions.clear_cookie().contains("Max-Age=0"));

        let secure = SessionManager::new(SECRET, Duration::hours(24), true).unwrap();
        assert!(secure.cookie("abc").ends_with("; Secure"));
        assert!(secure.clear_cookie().ends_with("; Secure"));
    }
}
