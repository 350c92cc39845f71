//! RS256 bearer verification backed by `jsonwebtoken`.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::{Map, Value};

use claimgate_auth::{TokenVerificationError, TokenVerifier, VerifiedToken};

use crate::config::JwtConfig;
use crate::secrets::{RsaPublicKeyPem, SecretError, read_rsa_public_key};

pub struct JwtTokenVerifier {
    key: DecodingKey,
    kid: Option<String>,
    validation: Validation,
}

impl core::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtTokenVerifier")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

impl JwtTokenVerifier {
    /// Build from the configured key file, audience, issuer and key id.
    pub fn from_config(jwt: &JwtConfig) -> Result<Self, SecretError> {
        let public_key = read_rsa_public_key(&jwt.public_key_filepath)?;
        Self::new(&public_key, jwt.kid.clone(), &jwt.audience, &jwt.issuer).map_err(|_| {
            SecretError::NotRsaPublicKey {
                path: jwt.public_key_filepath.clone(),
            }
        })
    }

    pub fn new(
        public_key: &RsaPublicKeyPem,
        kid: Option<String>,
        audience: &str,
        issuer: &str,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_rsa_pem(public_key.pem().as_bytes())?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&[issuer]);

        Ok(Self {
            key,
            kid,
            validation,
        })
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, bearer: &str) -> Result<VerifiedToken, TokenVerificationError> {
        if bearer.is_empty() {
            return Err(TokenVerificationError::Missing);
        }

        if let Some(expected) = &self.kid {
            let header =
                decode_header(bearer).map_err(|e| TokenVerificationError::Rejected(e.to_string()))?;
            if header.kid.as_deref() != Some(expected.as_str()) {
                return Err(TokenVerificationError::Rejected(format!(
                    "unexpected key id {:?}",
                    header.kid
                )));
            }
        }

        let data = decode::<Map<String, Value>>(bearer, &self.key, &self.validation)
            .map_err(|e| TokenVerificationError::Rejected(e.to_string()))?;

        Ok(VerifiedToken::new(data.claims))
    }
}
