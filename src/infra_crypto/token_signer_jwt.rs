use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::TokenSigner;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims {
    #[serde(flatten)]
    claims: AccessClaims,
    iat: i64,
    exp: i64,
    iss: String,
}

/// HS256 access tokens.
pub struct JwtTokenSigner {
    issuer: String,
}

impl JwtTokenSigner {
    pub fn new(issuer: impl Into<String>) -> Self {
        JwtTokenSigner {
            issuer: issuer.into(),
        }
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.set_issuer(&[self.issuer.as_str()]);
        v.set_required_spec_claims(&["exp", "iss"]);
        v
    }
}

#[async_trait::async_trait]
impl TokenSigner for JwtTokenSigner {
    async fn sign(
        &self,
        claims: &AccessClaims,
        secret: &SigningSecret,
        ttl: Duration,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let iat_dt = Utc::now();
        let exp_dt = expiry_after(iat_dt, ttl).ok_or_else(|| {
            AuthError::InternalError("access token TTL is out of range".to_string())
        })?;
        let signed = SignedClaims {
            claims: claims.clone(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
            iss: self.issuer.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &signed,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify(
        &self,
        token: &str,
        secret: &SigningSecret,
    ) -> Result<AccessClaims, AuthError> {
        let data = decode::<SignedClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::AccessTokenExpired,
            _ => AuthError::InvalidAccessToken,
        })?;

        let claims = data.claims.claims;
        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::InvalidAccessToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> AccessClaims {
        AccessClaims {
            sub: UserId::new_v4().to_string(),
            email: "a@b.com".to_string(),
            roles: vec!["user".to_string()],
            permissions: vec!["meals:write".to_string()],
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        }
    }

    fn secret(value: &str) -> SigningSecret {
        SigningSecret::new(value).unwrap()
    }

    fn encode_raw(signed: &SignedClaims, secret: &SigningSecret) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            signed,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn expiry_is_issue_time_plus_ttl() {
        let signer = JwtTokenSigner::new("nutrilog");
        let ttl = Duration::from_secs(15 * 60);

        let before = Utc::now();
        let (token, expires_at) = signer.sign(&claims(), &secret("k1"), ttl).await.unwrap();
        let after = Utc::now();

        assert_eq!(token.0.split('.').count(), 3);
        assert!(expires_at >= before + ttl);
        assert!(expires_at <= after + ttl);
    }

    #[tokio::test]
    async fn out_of_range_ttl_is_an_error() {
        let err = JwtTokenSigner::new("nutrilog")
            .sign(&claims(), &secret("k1"), Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    #[tokio::test]
    async fn payload_carries_the_wire_claim_shape() {
        let signer = JwtTokenSigner::new("nutrilog");
        let key = secret("k1");
        let original = claims();
        let (token, _) = signer
            .sign(&original, &key, Duration::from_secs(60))
            .await
            .unwrap();

        let verified = signer.verify(&token.0, &key).await.unwrap();
        assert_eq!(verified, original);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let signer = JwtTokenSigner::new("nutrilog");
        let (token, _) = signer
            .sign(&claims(), &secret("k1"), Duration::from_secs(60))
            .await
            .unwrap();

        let err = signer.verify(&token.0, &secret("k2")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidAccessToken));
    }

    #[tokio::test]
    async fn foreign_issuer_is_rejected() {
        let key = secret("k1");
        let (token, _) = JwtTokenSigner::new("someone-else")
            .sign(&claims(), &key, Duration::from_secs(60))
            .await
            .unwrap();

        let err = JwtTokenSigner::new("nutrilog")
            .verify(&token.0, &key)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidAccessToken));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let key = secret("k1");
        let now = Utc::now().timestamp();
        let token = encode_raw(
            &SignedClaims {
                claims: claims(),
                iat: now - 3600,
                exp: now - 1800,
                iss: "nutrilog".to_string(),
            },
            &key,
        );

        let err = JwtTokenSigner::new("nutrilog")
            .verify(&token, &key)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccessTokenExpired));
    }

    #[tokio::test]
    async fn non_access_token_type_is_rejected() {
        let key = secret("k1");
        let now = Utc::now().timestamp();
        let mut refresh_like = claims();
        refresh_like.token_type = "refresh".to_string();
        let token = encode_raw(
            &SignedClaims {
                claims: refresh_like,
                iat: now,
                exp: now + 600,
                iss: "nutrilog".to_string(),
            },
            &key,
        );

        let err = JwtTokenSigner::new("nutrilog")
            .verify(&token, &key)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidAccessToken));
    }
}
