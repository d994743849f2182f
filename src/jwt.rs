//! JWT token generation and validation.
//!
//! Tokens are HS256-signed, not encrypted: anyone holding a token can read its
//! claims, but cannot alter them without the signing secret.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::Role;

/// Token class for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Short-lived token authorizing ordinary requests
    Access,
    /// Long-lived token usable only to mint new access tokens
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

/// The identity a token asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    pub id: i64,
    pub role: Role,
}

/// Decoded, verified token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAssertion {
    /// Identity ID
    pub id: i64,
    /// Identity role
    pub role: Role,
    /// Token class
    #[serde(rename = "typ")]
    pub class: TokenClass,
    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: u64,
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

impl SessionAssertion {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            id: self.id,
            role: self.role,
        }
    }
}

/// Default access token lifetime: 15 minutes
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;

/// Default refresh token lifetime: 30 days
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Lifetime of each token class, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access_secs: u64,
    pub refresh_secs: u64,
}

impl TokenLifetimes {
    pub fn ttl(&self, class: TokenClass) -> u64 {
        match class {
            TokenClass::Access => self.access_secs,
            TokenClass::Refresh => self.refresh_secs,
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetimes: TokenLifetimes,
}

/// Result of minting a token.
#[derive(Debug, Clone)]
pub struct MintedToken {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Current Unix time in seconds.
pub fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and default lifetimes.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_lifetimes(secret, TokenLifetimes::default())
    }

    pub fn with_lifetimes(secret: &[u8], lifetimes: TokenLifetimes) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetimes,
        }
    }

    /// Mint a token of the given class, issued now.
    pub fn mint(&self, identity: SessionIdentity, class: TokenClass) -> Result<MintedToken, JwtError> {
        self.mint_at(identity, class, now_secs()?)
    }

    /// Mint a token of the given class, issued at `now` (Unix seconds).
    pub fn mint_at(
        &self,
        identity: SessionIdentity,
        class: TokenClass,
        now: u64,
    ) -> Result<MintedToken, JwtError> {
        let expires_at = now
            .checked_add(self.lifetimes.ttl(class))
            .ok_or(JwtError::TimeError)?;
        let claims = SessionAssertion {
            id: identity.id,
            role: identity.role,
            class,
            issued_at: now,
            expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(MintedToken {
            token,
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        })
    }

    /// Verify the signature and expiry of a token and decode its payload.
    pub fn verify_and_decode(&self, token: &str) -> Result<SessionAssertion, TokenError> {
        // A broken clock cannot make a token valid; treat it as expired.
        let now = now_secs().map_err(|_| TokenError::Expired)?;
        self.verify_and_decode_at(token, now)
    }

    /// Same as [`verify_and_decode`](Self::verify_and_decode) against an explicit clock.
    pub fn verify_and_decode_at(&self, token: &str, now: u64) -> Result<SessionAssertion, TokenError> {
        // Structure is checked first so a damaged signature segment can be
        // told apart from a token that is not a session token at all.
        check_structure(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;

        let token_data = jsonwebtoken::decode::<SessionAssertion>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
                    TokenError::Invalid
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if now > token_data.claims.expires_at {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}

/// Check that a token has a decodable header and a session claim payload.
fn check_structure(token: &str) -> Result<(), TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, signature] = segments.as_slice() else {
        return Err(TokenError::Malformed);
    };
    if signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    jsonwebtoken::decode_header(token).map_err(|_| TokenError::Malformed)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice::<SessionAssertion>(&payload).map_err(|_| TokenError::Malformed)?;

    Ok(())
}

/// Errors that can occur while minting a token.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not parseable as a session token
    Malformed,
    /// Signature does not match
    Invalid,
    /// Signature matches but the token is past its expiry
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::Invalid => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing";

    fn alice() -> SessionIdentity {
        SessionIdentity {
            id: 1,
            role: Role::Student,
        }
    }

    #[test]
    fn test_mint_and_verify_access_token() {
        let config = JwtConfig::new(SECRET);

        let minted = config.mint(alice(), TokenClass::Access).unwrap();
        assert_eq!(minted.expires_at - minted.issued_at, DEFAULT_ACCESS_TTL_SECS);

        let claims = config.verify_and_decode(&minted.token).unwrap();
        assert_eq!(claims.id, 1);
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.class, TokenClass::Access);
        assert_eq!(claims.identity(), alice());
    }

    #[test]
    fn test_mint_and_verify_refresh_token() {
        let config = JwtConfig::new(SECRET);
        let lecturer = SessionIdentity {
            id: 7,
            role: Role::Lecturer,
        };

        let minted = config.mint(lecturer, TokenClass::Refresh).unwrap();
        assert_eq!(minted.expires_at - minted.issued_at, DEFAULT_REFRESH_TTL_SECS);

        let claims = config.verify_and_decode(&minted.token).unwrap();
        assert_eq!(claims.identity(), lecturer);
        assert_eq!(claims.class, TokenClass::Refresh);
    }

    #[test]
    fn test_access_token_expiry_boundary() {
        let config = JwtConfig::new(SECRET);
        let t0 = 1_700_000_000;

        let minted = config.mint_at(alice(), TokenClass::Access, t0).unwrap();

        // 14m59s
        assert!(config.verify_and_decode_at(&minted.token, t0 + 899).is_ok());
        // 15m01s
        assert_eq!(
            config.verify_and_decode_at(&minted.token, t0 + 901),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let config = JwtConfig::new(SECRET);
        let t0 = 1_700_000_000;

        let refresh = config.mint_at(alice(), TokenClass::Refresh, t0).unwrap();
        let one_day = 24 * 60 * 60;

        assert!(config.verify_and_decode_at(&refresh.token, t0 + one_day).is_ok());
        assert_eq!(
            config.verify_and_decode_at(&refresh.token, t0 + 31 * one_day),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_expiry_past_end_of_time_fails_to_mint() {
        let config = JwtConfig::with_lifetimes(
            SECRET,
            TokenLifetimes {
                access_secs: u64::MAX,
                refresh_secs: u64::MAX,
            },
        );

        assert!(matches!(
            config.mint_at(alice(), TokenClass::Access, 1_700_000_000),
            Err(JwtError::TimeError)
        ));
    }

    #[test]
    fn test_custom_lifetimes() {
        let config = JwtConfig::with_lifetimes(
            SECRET,
            TokenLifetimes {
                access_secs: 60,
                refresh_secs: 120,
            },
        );
        let t0 = 1_700_000_000;

        let access = config.mint_at(alice(), TokenClass::Access, t0).unwrap();
        assert_eq!(access.expires_at, t0 + 60);
        assert_eq!(
            config.verify_and_decode_at(&access.token, t0 + 61),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_altered_signature_is_invalid() {
        let config = JwtConfig::new(SECRET);
        let minted = config.mint(alice(), TokenClass::Access).unwrap();

        let sig_start = minted.token.rfind('.').unwrap() + 1;
        for pos in sig_start..minted.token.len() {
            let mut bytes = minted.token.clone().into_bytes();
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                config.verify_and_decode(&tampered),
                Err(TokenError::Invalid),
                "altering signature byte {} should invalidate the token",
                pos
            );
        }
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_invalid() {
        let config = JwtConfig::new(SECRET);
        let other = JwtConfig::new(b"another-secret");
        let minted = other.mint_at(alice(), TokenClass::Access, 1_000).unwrap();

        assert_eq!(
            config.verify_and_decode_at(&minted.token, 1_000_000),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig::new(b"secret-1");
        let config2 = JwtConfig::new(b"secret-2");

        let minted = config1.mint(alice(), TokenClass::Access).unwrap();

        assert_eq!(
            config2.verify_and_decode(&minted.token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let config = JwtConfig::new(SECRET);

        for token in ["", "invalid-token", "a.b", "a.b.c", "a.b.c.d", "..."] {
            assert_eq!(
                config.verify_and_decode(token),
                Err(TokenError::Malformed),
                "{:?} should be malformed",
                token
            );
        }
    }

    #[test]
    fn test_foreign_claims_are_malformed() {
        #[derive(Serialize)]
        struct OtherClaims {
            sub: String,
            exp: u64,
        }

        let token = jsonwebtoken::encode(
            &Header::default(),
            &OtherClaims {
                sub: "someone".to_string(),
                exp: now_secs().unwrap() + 60,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let config = JwtConfig::new(SECRET);
        assert_eq!(config.verify_and_decode(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_payload_carries_plain_fields() {
        let config = JwtConfig::new(SECRET);
        let minted = config.mint_at(alice(), TokenClass::Access, 100).unwrap();

        let payload = minted.token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["role"], "student");
        assert_eq!(json["typ"], "access");
        assert_eq!(json["iat"], 100);
        assert_eq!(json["exp"], 100 + DEFAULT_ACCESS_TTL_SECS);
    }
}
