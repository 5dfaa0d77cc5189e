// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Magic passwordless login: DID token validation and admin API client.
//!
//! A DID token is standard base64 of the JSON array `[proof, claim]`. The
//! claim is itself a JSON string and the proof is an Ethereum personal-sign
//! signature over it, made by the address named in the `iss` claim.

use std::time::Duration;

use alloy::primitives::{hex, Address, Signature};
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::MagicSettings;

const SECRET_KEY_HEADER: &str = "X-Magic-Secret-Key";
const USER_METADATA_PATH: &str = "/v1/admin/auth/user/get";
const USER_LOGOUT_PATH: &str = "/v2/admin/auth/user/logout";
const ISSUER_PREFIX: &str = "did:ethr:";

/// Allowed drift for the `nbf` claim, in seconds.
const NBF_LEEWAY_SECS: i64 = 300;

/// Verified user data returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicUserMetadata {
    pub email: Option<String>,
    pub issuer: Option<String>,
    pub public_address: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("DID token is malformed: {0}")]
    MalformedToken(String),

    #[error("Magic request failed: {0}")]
    Request(String),

    #[error("Magic response was invalid: {0}")]
    InvalidResponse(String),
}

/// Verifies DID tokens and revokes provider sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DidTokenVerifier: Send + Sync {
    /// `Ok(None)` when the token is rejected.
    async fn get_metadata(&self, did_token: &str)
        -> Result<Option<MagicUserMetadata>, VerifierError>;

    /// Log the token's issuer out of every session.
    async fn logout(&self, did_token: &str) -> Result<(), VerifierError>;
}

/// Parsed claim section of a DID token.
#[derive(Debug, Clone, Deserialize)]
pub struct DidClaim {
    pub iat: i64,
    pub ext: i64,
    pub iss: String,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub aud: String,
    pub nbf: i64,
    #[serde(default)]
    pub tid: String,
    #[serde(default)]
    pub add: Option<String>,
}

/// A decoded, not yet validated, DID token.
#[derive(Debug, Clone)]
pub struct DecodedDidToken {
    pub proof: String,
    /// Raw claim string, the signed message.
    pub raw_claim: String,
    pub claim: DidClaim,
}

impl DecodedDidToken {
    /// Decode without checking expiry or signature.
    pub fn decode(did_token: &str) -> Result<Self, VerifierError> {
        let bytes = Base64::decode_vec(did_token.trim())
            .map_err(|e| VerifierError::MalformedToken(format!("invalid base64: {e}")))?;

        let (proof, raw_claim): (String, String) = serde_json::from_slice(&bytes)
            .map_err(|e| VerifierError::MalformedToken(format!("expected [proof, claim]: {e}")))?;

        let claim: DidClaim = serde_json::from_str(&raw_claim)
            .map_err(|e| VerifierError::MalformedToken(format!("invalid claim: {e}")))?;

        Ok(Self {
            proof,
            raw_claim,
            claim,
        })
    }

    /// Check expiry, `nbf` and the signature against `now` (unix seconds).
    pub fn validate(&self, now: i64) -> Result<(), String> {
        if self.claim.ext <= now {
            return Err("token has expired".to_string());
        }
        if self.claim.nbf > now.saturating_add(NBF_LEEWAY_SECS) {
            return Err("token cannot be used yet".to_string());
        }

        let expected = issuer_address(&self.claim.iss)?;
        let proof_bytes =
            hex::decode(&self.proof).map_err(|e| format!("proof is not hex: {e}"))?;
        let signature =
            Signature::from_raw(&proof_bytes).map_err(|e| format!("invalid proof: {e}"))?;
        let recovered = signature
            .recover_address_from_msg(self.raw_claim.as_bytes())
            .map_err(|e| format!("signature recovery failed: {e}"))?;

        if recovered != expected {
            return Err("signature does not match issuer".to_string());
        }
        Ok(())
    }
}

fn issuer_address(iss: &str) -> Result<Address, String> {
    iss.strip_prefix(ISSUER_PREFIX)
        .ok_or_else(|| format!("unsupported issuer format: {iss}"))?
        .parse::<Address>()
        .map_err(|e| format!("invalid issuer address: {e}"))
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(default)]
    data: Option<MagicUserMetadata>,
}

/// HTTP client for the Magic admin API.
#[derive(Debug, Clone)]
pub struct MagicClient {
    api_base_url: String,
    secret_key: String,
    http: Client,
}

impl MagicClient {
    pub fn new(api_base_url: &str, secret_key: &str) -> Result<Self, VerifierError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| VerifierError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            http,
        })
    }

    pub fn from_settings(settings: &MagicSettings) -> Result<Self, VerifierError> {
        Self::new(settings.api_base_url.as_str(), &settings.secret_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

#[async_trait]
impl DidTokenVerifier for MagicClient {
    async fn get_metadata(
        &self,
        did_token: &str,
    ) -> Result<Option<MagicUserMetadata>, VerifierError> {
        let decoded = match DecodedDidToken::decode(did_token) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "DID token rejected locally");
                return Ok(None);
            }
        };
        if let Err(reason) = decoded.validate(Utc::now().timestamp()) {
            debug!(reason = %reason, "DID token rejected locally");
            return Ok(None);
        }

        let response = self
            .http
            .get(self.url(USER_METADATA_PATH))
            .query(&[("issuer", decoded.claim.iss.as_str())])
            .header(SECRET_KEY_HEADER, &self.secret_key)
            .send()
            .await
            .map_err(|e| VerifierError::Request(format!("GET {USER_METADATA_PATH} failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            info!(status = %status, "Magic rejected DID token issuer");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::Request(format!(
                "GET {USER_METADATA_PATH} returned {status}: {body}"
            )));
        }

        let body: MetadataResponse = response.json().await.map_err(|e| {
            VerifierError::InvalidResponse(format!("GET {USER_METADATA_PATH} invalid JSON: {e}"))
        })?;
        Ok(body.data)
    }

    async fn logout(&self, did_token: &str) -> Result<(), VerifierError> {
        let decoded = DecodedDidToken::decode(did_token)?;

        let response = self
            .http
            .post(self.url(USER_LOGOUT_PATH))
            .header(SECRET_KEY_HEADER, &self.secret_key)
            .json(&json!({ "issuer": decoded.claim.iss }))
            .send()
            .await
            .map_err(|e| VerifierError::Request(format!("POST {USER_LOGOUT_PATH} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::Request(format!(
                "POST {USER_LOGOUT_PATH} returned {status}: {body}"
            )));
        }

        info!(issuer = %decoded.claim.iss, "Magic sessions revoked");
        Ok(())
    }
}
