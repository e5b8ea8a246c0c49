use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Audience the auth provider stamps on tokens of signed-in users.
pub const AUDIENCE: &str = "authenticated";

/// Claims of a provider-issued access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Provider user id
    #[serde(default)]
    pub email: Option<String>,
    pub exp: u64, // Expiration timestamp
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.exp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Verify and decode an access token signed with the provider's HS256 secret.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUDIENCE]);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
