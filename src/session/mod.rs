//! Session codec.
//!
//! Decodes the compact bearer token issued by `/api/auth/login` into a
//! [`Session`]. Only the payload segment is read: the signature is never
//! verified here, the server that issued the token is the trust boundary.
//!
//! A token is accepted when:
//! - it has at least two `.`-separated segments,
//! - the middle segment is base64 (url-safe or standard, padding optional),
//! - the decoded bytes are JSON of the shape `{ "user": {..}, "exp": <secs> }`,
//! - `exp * 1000` is strictly greater than the current time in milliseconds.

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Role carried in the token. Decides which mutations the UI offers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Writer,
}

impl Default for Role {
    fn default() -> Self {
        Self::Writer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Writer => write!(f, "writer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "writer" => Ok(Self::Writer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Identity embedded in the token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Raw payload claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: SessionUser,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

/// An authenticated identity with its expiry. Never mutated once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    /// `true` once `now` has reached the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.timestamp_millis() <= now.timestamp_millis()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("token is not a compact token")]
    Malformed,
    #[error("token payload could not be decoded: {0}")]
    Payload(String),
    #[error("token expired")]
    Expired,
}

/// Decode a token against the current wall clock.
pub fn decode_token(token: &str) -> Result<Session, SessionError> {
    decode_token_at(token, Utc::now())
}

/// Decode a token, treating `now` as the current instant.
pub fn decode_token_at(token: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
    let claims = decode_claims(token)?;

    let exp_millis = claims.exp.checked_mul(1000).ok_or(SessionError::Expired)?;
    if exp_millis <= now.timestamp_millis() {
        return Err(SessionError::Expired);
    }

    let expires_at = Utc
        .timestamp_millis_opt(exp_millis)
        .single()
        .ok_or_else(|| SessionError::Payload(format!("exp out of range: {}", claims.exp)))?;

    Ok(Session {
        user: claims.user,
        expires_at,
    })
}

/// Extract the payload claims without looking at expiry.
pub fn decode_claims(token: &str) -> Result<Claims, SessionError> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next()) {
        (Some(_), Some(payload)) => payload,
        _ => return Err(SessionError::Malformed),
    };

    let bytes = decode_segment(payload)?;
    serde_json::from_slice(&bytes).map_err(|e| SessionError::Payload(e.to_string()))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, SessionError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| SessionError::Payload(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    /// Mint a signed token the way the server would. The secret is irrelevant
    /// to the codec.
    pub fn mint_token(id: &str, username: &str, role: Role, exp: DateTime<Utc>) -> String {
        let claims = Claims {
            user: SessionUser {
                id: id.to_string(),
                username: username.to_string(),
                role,
            },
            exp: exp.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    pub fn admin_token() -> String {
        mint_token("u-1", "alice", Role::Admin, Utc::now() + chrono::Duration::hours(1))
    }

    pub fn writer_token() -> String {
        mint_token("u-2", "bob", Role::Writer, Utc::now() + chrono::Duration::hours(1))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::mint_token;
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use chrono::Duration;

    #[test]
    fn test_valid_token_yields_identity() {
        let exp = Utc::now() + Duration::hours(2);
        let token = mint_token("42", "alice", Role::Admin, exp);

        let session = decode_token(&token).unwrap();
        assert_eq!(session.user.id, "42");
        assert_eq!(session.user.username, "alice");
        assert_eq!(session.user.role, Role::Admin);
        assert_eq!(session.expires_at.timestamp(), exp.timestamp());
        assert!(session.is_admin());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = mint_token("42", "alice", Role::Writer, Utc::now() - Duration::seconds(5));
        assert_eq!(decode_token(&token), Err(SessionError::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = mint_token("1", "a", Role::Writer, now);
        assert_eq!(decode_token_at(&token, now), Err(SessionError::Expired));

        let just_before = now - Duration::milliseconds(1);
        assert!(decode_token_at(&token, just_before).is_ok());
    }

    #[test]
    fn test_single_segment_is_malformed() {
        assert_eq!(decode_token("abcdef"), Err(SessionError::Malformed));
        assert_eq!(decode_token(""), Err(SessionError::Malformed));
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let err = decode_token("header.!!!not-base64!!!.sig").unwrap_err();
        assert!(matches!(err, SessionError::Payload(_)));

        let not_json = URL_SAFE_NO_PAD.encode(b"hello world");
        let err = decode_token(&format!("h.{}.s", not_json)).unwrap_err();
        assert!(matches!(err, SessionError::Payload(_)));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let payload = format!(
            r#"{{"user":{{"id":"1","username":"x","role":"editor"}},"exp":{}}}"#,
            exp
        );
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload));
        assert!(matches!(decode_token(&token), Err(SessionError::Payload(_))));
    }

    #[test]
    fn test_two_segments_and_padded_standard_alphabet_accepted() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let payload = format!(
            r#"{{"user":{{"id":"7","username":"padded?>","role":"writer"}},"exp":{}}}"#,
            exp
        );
        let token = format!("h.{}", STANDARD.encode(payload));
        let session = decode_token(&token).unwrap();
        assert_eq!(session.user.username, "padded?>");
    }

    #[test]
    fn test_is_expired_at() {
        let now = Utc::now();
        let session = Session {
            user: SessionUser {
                id: "1".into(),
                username: "a".into(),
                role: Role::Writer,
            },
            expires_at: now + Duration::minutes(1),
        };
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::minutes(1)));
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("writer".parse::<Role>().unwrap(), Role::Writer);
        assert!("editor".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
