//! `CognitoUser` (spec §4.6: "AuthStateMachine") — the heart of the
//! system. Generalizes the shape of the teacher's `Srp6User` (a struct
//! holding handshake-local fields, mutated by successive method calls)
//! into an object whose methods drive a multi-round-trip protocol against
//! an injected [`RpcFacade`] instead of an in-process `Srp6` host.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::challenge::{
    strip_required_attribute_prefix, AuthOutcome, CustomChallenge, DeviceConfirmation,
    MfaRequired, NewPasswordRequired,
};
use crate::error::{AuthError, Result};
use crate::pool::Pool;
use crate::proof::{format_timestamp, password_claim_signature};
use crate::rpc::{
    AuthenticationResultData, ChallengeResponse, ConfirmDeviceRequest, DeviceDescription,
    DeviceSecretVerifierConfig, GetUserResponse, InitiateAuthRequest, ListDevicesResponse,
    RespondToAuthChallengeRequest, RpcFacade, UserAttribute,
};
use crate::session::{Session, Token};
use crate::srp::SrpEngine;
use crate::token_store::{TokenKeys, TokenStore};

const AUTH_FLOW_USER_SRP: &str = "USER_SRP_AUTH";
const AUTH_FLOW_CUSTOM: &str = "CUSTOM_AUTH";
const AUTH_FLOW_REFRESH: &str = "REFRESH_TOKEN_AUTH";

const CHALLENGE_PASSWORD_VERIFIER: &str = "PASSWORD_VERIFIER";
const CHALLENGE_NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";
const CHALLENGE_SMS_MFA: &str = "SMS_MFA";
const CHALLENGE_CUSTOM: &str = "CUSTOM_CHALLENGE";
const CHALLENGE_DEVICE_SRP_AUTH: &str = "DEVICE_SRP_AUTH";
const CHALLENGE_DEVICE_PASSWORD_VERIFIER: &str = "DEVICE_PASSWORD_VERIFIER";

const DEFAULT_DEVICE_NAME: &str = "rust-client";

/// Which top-level flow `authenticate_user` negotiates (spec §4.6:
/// "initiate(USER_SRP_AUTH or CUSTOM_AUTH)"). Both exchange an SRP_A
/// value; `Custom` additionally sets `CHALLENGE_NAME: "SRP_A"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    UserSrp,
    Custom,
}

/// Device material, durable once confirmed (spec §3: "outlives any single
/// session and is consumed on subsequent logins").
#[derive(Debug, Clone)]
pub struct DeviceMaterial {
    pub device_key: String,
    pub device_group_key: String,
    pub random_password: Vec<u8>,
}

/// The combined User + AuthStateMachine entity (spec §3 "User" + §4.6
/// "AuthStateMachine"). Not re-entrant (spec §5): auth operations take a
/// single-slot guard and fail `Busy` on contention; read-only getters do
/// not.
pub struct CognitoUser {
    username: RwLock<String>,
    pool: Arc<Pool>,
    session: Mutex<Option<Session>>,
    server_session: Mutex<Option<String>>,
    device: Mutex<Option<DeviceMaterial>>,
    rpc: Arc<dyn RpcFacade>,
    token_store: Arc<dyn TokenStore>,
    guard: Mutex<()>,
    now: fn() -> DateTime<Utc>,
}

impl CognitoUser {
    pub fn new(
        username: impl Into<String>,
        pool: Arc<Pool>,
        rpc: Arc<dyn RpcFacade>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        Self::with_clock(username, pool, rpc, token_store, Utc::now)
    }

    /// Test seam: inject a fixed clock so proof timestamps and token
    /// freshness checks are deterministic (SPEC_FULL §8).
    pub fn with_clock(
        username: impl Into<String>,
        pool: Arc<Pool>,
        rpc: Arc<dyn RpcFacade>,
        token_store: Arc<dyn TokenStore>,
        now: fn() -> DateTime<Utc>,
    ) -> Self {
        Self {
            username: RwLock::new(username.into()),
            pool,
            session: Mutex::new(None),
            server_session: Mutex::new(None),
            device: Mutex::new(None),
            rpc,
            token_store,
            guard: Mutex::new(()),
            now,
        }
    }

    /// Read-only getter, permitted concurrently with an in-flight auth
    /// operation (spec §5).
    pub async fn username(&self) -> String {
        self.username.read().await.clone()
    }

    async fn set_username(&self, new_username: String) {
        *self.username.write().await = new_username;
    }

    fn acquire(&self) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        self.guard.try_lock().map_err(|_| AuthError::Busy)
    }

    // ---- top-level entry point -------------------------------------------------

    /// Runs the full SRP handshake (spec §4.6: `initiate_auth` +
    /// `PASSWORD_VERIFIER` response), loading any persisted device
    /// material first so a device-bound login can complete without
    /// re-prompting for a password.
    pub async fn authenticate_user(&self, password: &str, flow: AuthFlow) -> Result<AuthOutcome> {
        let _guard = self.acquire()?;
        self.load_persisted_device().await?;

        let username = self.username().await;
        let realm_id = self.pool.realm_id().to_string();
        let srp = SrpEngine::new(realm_id, self.pool.paranoia());
        let a_public = srp.large_a_value()?;

        let mut auth_parameters = HashMap::new();
        auth_parameters.insert("USERNAME".to_string(), username.clone());
        auth_parameters.insert("SRP_A".to_string(), String::from(&a_public));
        if let Some(device) = self.device.lock().await.as_ref() {
            auth_parameters.insert("DEVICE_KEY".to_string(), device.device_key.clone());
        }
        let auth_flow = match flow {
            AuthFlow::UserSrp => AUTH_FLOW_USER_SRP,
            AuthFlow::Custom => {
                auth_parameters.insert("CHALLENGE_NAME".to_string(), "SRP_A".to_string());
                AUTH_FLOW_CUSTOM
            }
        };

        let initiate_response = self
            .rpc
            .initiate_auth(InitiateAuthRequest {
                auth_flow: auth_flow.to_string(),
                client_id: self.pool.client_id().to_string(),
                auth_parameters,
            })
            .await?;

        match initiate_response.challenge_name.as_deref() {
            Some(CHALLENGE_PASSWORD_VERIFIER) => {
                self.respond_to_password_verifier(initiate_response, &srp, password).await
            }
            Some(other) => Err(AuthError::service_error(
                "UnexpectedChallenge",
                format!("expected PASSWORD_VERIFIER after initiate_auth, got {other}"),
            )),
            None => self.dispatch_challenge_response(initiate_response).await,
        }
    }

    async fn respond_to_password_verifier(
        &self,
        challenge: ChallengeResponse,
        srp: &SrpEngine,
        password: &str,
    ) -> Result<AuthOutcome> {
        let params = &challenge.challenge_parameters;
        let srp_user_id = match params.get("USER_ID_FOR_SRP") {
            Some(id) if !id.is_empty() => id.clone(),
            _ => self.username().await,
        };
        self.set_username(srp_user_id.clone()).await;

        let salt = crate::big_number::BigNumber::from_hex_str_be(
            params.get("SALT").ok_or_else(|| missing_param("SALT"))?,
        )
        .map_err(|_| AuthError::corruption("SALT was not valid hex"))?;
        let server_b = crate::big_number::BigNumber::from_hex_str_be(
            params.get("SRP_B").ok_or_else(|| missing_param("SRP_B"))?,
        )
        .map_err(|_| AuthError::corruption("SRP_B was not valid hex"))?;
        let secret_block_b64 = params.get("SECRET_BLOCK").ok_or_else(|| missing_param("SECRET_BLOCK"))?;
        let secret_block = STANDARD
            .decode(secret_block_b64)
            .map_err(|_| AuthError::corruption("SECRET_BLOCK was not valid base64"))?;

        let hkdf_key = srp.password_authentication_key(&srp_user_id, password.as_bytes(), &server_b, &salt)?;
        let timestamp = format_timestamp((self.now)());
        let signature =
            password_claim_signature(&hkdf_key, self.pool.realm_id(), &srp_user_id, &secret_block, &timestamp)?;

        let mut responses = HashMap::new();
        responses.insert("USERNAME".to_string(), srp_user_id.clone());
        responses.insert("PASSWORD_CLAIM_SECRET_BLOCK".to_string(), secret_block_b64.clone());
        responses.insert("TIMESTAMP".to_string(), timestamp);
        responses.insert("PASSWORD_CLAIM_SIGNATURE".to_string(), signature);
        if let Some(device) = self.device.lock().await.as_ref() {
            responses.insert("DEVICE_KEY".to_string(), device.device_key.clone());
        }

        let response = self
            .rpc
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                client_id: self.pool.client_id().to_string(),
                challenge_name: CHALLENGE_PASSWORD_VERIFIER.to_string(),
                session: challenge.session,
                challenge_responses: responses,
            })
            .await?;

        self.dispatch_challenge_response(response).await
    }

    /// spec §4.6: "challenge dispatch".
    async fn dispatch_challenge_response(&self, response: ChallengeResponse) -> Result<AuthOutcome> {
        match response.challenge_name.as_deref() {
            Some(CHALLENGE_NEW_PASSWORD_REQUIRED) => {
                *self.server_session.lock().await = response.session;
                let required_attributes = response
                    .challenge_parameters
                    .get("requiredAttributes")
                    .map(|raw| parse_string_list(raw))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| strip_required_attribute_prefix(&a))
                    .collect();
                let user_attributes = response
                    .challenge_parameters
                    .get("userAttributes")
                    .map(|raw| parse_attribute_map(raw))
                    .unwrap_or_default();
                Ok(AuthOutcome::NewPasswordRequired(NewPasswordRequired {
                    user_attributes,
                    required_attributes,
                }))
            }
            Some(CHALLENGE_SMS_MFA) => {
                *self.server_session.lock().await = response.session;
                Ok(AuthOutcome::MfaRequired(MfaRequired {
                    challenge_parameters: response.challenge_parameters,
                }))
            }
            Some(CHALLENGE_CUSTOM) => {
                *self.server_session.lock().await = response.session;
                Ok(AuthOutcome::CustomChallenge(CustomChallenge {
                    challenge_parameters: response.challenge_parameters,
                }))
            }
            Some(CHALLENGE_DEVICE_SRP_AUTH) => self.device_srp_sub_handshake(response).await,
            Some(other) => {
                self.clear_transient_state().await;
                Err(AuthError::service_error("UnexpectedChallenge", other.to_string()))
            }
            None => {
                let result = response
                    .authentication_result
                    .ok_or_else(|| AuthError::corruption("response carried neither ChallengeName nor AuthenticationResult"))?;
                self.finish_authentication(result).await
            }
        }
    }

    /// spec §4.6.1: "Device-SRP sub-handshake".
    async fn device_srp_sub_handshake(&self, top_challenge: ChallengeResponse) -> Result<AuthOutcome> {
        let device = self
            .device
            .lock()
            .await
            .clone()
            .ok_or_else(|| AuthError::corruption("server requested DEVICE_SRP_AUTH but no device material is cached"))?;

        let srp = SrpEngine::new(device.device_group_key.clone(), self.pool.paranoia());
        let a_public = srp.large_a_value()?;

        let username = self.username().await;
        let mut responses = HashMap::new();
        responses.insert("USERNAME".to_string(), username);
        responses.insert("DEVICE_KEY".to_string(), device.device_key.clone());
        responses.insert("SRP_A".to_string(), String::from(&a_public));

        let response = self
            .rpc
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                client_id: self.pool.client_id().to_string(),
                challenge_name: CHALLENGE_DEVICE_SRP_AUTH.to_string(),
                session: top_challenge.session,
                challenge_responses: responses,
            })
            .await?;

        if response.challenge_name.as_deref() != Some(CHALLENGE_DEVICE_PASSWORD_VERIFIER) {
            return Err(AuthError::service_error(
                "UnexpectedChallenge",
                "expected DEVICE_PASSWORD_VERIFIER after DEVICE_SRP_AUTH",
            ));
        }

        let params = &response.challenge_parameters;
        let salt = crate::big_number::BigNumber::from_hex_str_be(
            params.get("SALT").ok_or_else(|| missing_param("SALT"))?,
        )
        .map_err(|_| AuthError::corruption("SALT was not valid hex"))?;
        let server_b = crate::big_number::BigNumber::from_hex_str_be(
            params.get("SRP_B").ok_or_else(|| missing_param("SRP_B"))?,
        )
        .map_err(|_| AuthError::corruption("SRP_B was not valid hex"))?;
        let secret_block_b64 = params.get("SECRET_BLOCK").ok_or_else(|| missing_param("SECRET_BLOCK"))?;
        let secret_block = STANDARD
            .decode(secret_block_b64)
            .map_err(|_| AuthError::corruption("SECRET_BLOCK was not valid base64"))?;

        let hkdf_key =
            srp.password_authentication_key(&device.device_key, &device.random_password, &server_b, &salt)?;
        let timestamp = format_timestamp((self.now)());
        let signature = password_claim_signature(
            &hkdf_key,
            &device.device_group_key,
            &device.device_key,
            &secret_block,
            &timestamp,
        )?;

        let username = self.username().await;
        let mut final_responses = HashMap::new();
        final_responses.insert("USERNAME".to_string(), username);
        final_responses.insert("DEVICE_KEY".to_string(), device.device_key.clone());
        final_responses.insert("PASSWORD_CLAIM_SECRET_BLOCK".to_string(), secret_block_b64.clone());
        final_responses.insert("TIMESTAMP".to_string(), timestamp);
        final_responses.insert("PASSWORD_CLAIM_SIGNATURE".to_string(), signature);

        let final_response = self
            .rpc
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                client_id: self.pool.client_id().to_string(),
                challenge_name: CHALLENGE_DEVICE_PASSWORD_VERIFIER.to_string(),
                session: response.session,
                challenge_responses: final_responses,
            })
            .await?;

        self.dispatch_challenge_response(final_response).await
    }

    /// spec §4.6: "complete_new_password_challenge".
    pub async fn complete_new_password_challenge(
        &self,
        new_password: &str,
        required_attributes: HashMap<String, String>,
    ) -> Result<AuthOutcome> {
        let _guard = self.acquire()?;
        if new_password.is_empty() {
            return Err(AuthError::invalid_argument("new_password must not be empty"));
        }
        let server_session = self.server_session.lock().await.clone();
        let username = self.username().await;

        let mut responses = HashMap::new();
        responses.insert("NEW_PASSWORD".to_string(), new_password.to_string());
        responses.insert("USERNAME".to_string(), username);
        for (name, value) in required_attributes {
            responses.insert(format!("userAttributes.{name}"), value);
        }

        let response = self
            .rpc
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                client_id: self.pool.client_id().to_string(),
                challenge_name: CHALLENGE_NEW_PASSWORD_REQUIRED.to_string(),
                session: server_session,
                challenge_responses: responses,
            })
            .await?;

        self.dispatch_challenge_response(response).await
    }

    /// spec §4.6: "send_mfa_code".
    pub async fn send_mfa_code(&self, code: &str) -> Result<AuthOutcome> {
        let _guard = self.acquire()?;
        let server_session = self.server_session.lock().await.clone();
        let username = self.username().await;

        let mut responses = HashMap::new();
        responses.insert("SMS_MFA_CODE".to_string(), code.to_string());
        responses.insert("USERNAME".to_string(), username);
        if let Some(device) = self.device.lock().await.as_ref() {
            responses.insert("DEVICE_KEY".to_string(), device.device_key.clone());
        }

        let response = self
            .rpc
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                client_id: self.pool.client_id().to_string(),
                challenge_name: CHALLENGE_SMS_MFA.to_string(),
                session: server_session,
                challenge_responses: responses,
            })
            .await?;

        self.dispatch_challenge_response(response).await
    }

    /// spec §4.6: "send_custom_challenge_answer". The teacher-adjacent
    /// buggy source reads `dataAuthenticate.ChallengeParameters` from a
    /// scope where only `data` is bound; this reimplementation simply
    /// reads the response's own `challenge_parameters` (spec §9).
    pub async fn send_custom_challenge_answer(&self, answer: &str) -> Result<AuthOutcome> {
        let _guard = self.acquire()?;
        let server_session = self.server_session.lock().await.clone();
        let username = self.username().await;

        let mut responses = HashMap::new();
        responses.insert("ANSWER".to_string(), answer.to_string());
        responses.insert("USERNAME".to_string(), username);

        let response = self
            .rpc
            .respond_to_auth_challenge(RespondToAuthChallengeRequest {
                client_id: self.pool.client_id().to_string(),
                challenge_name: CHALLENGE_CUSTOM.to_string(),
                session: server_session,
                challenge_responses: responses,
            })
            .await?;

        self.dispatch_challenge_response(response).await
    }

    async fn finish_authentication(&self, result: AuthenticationResultData) -> Result<AuthOutcome> {
        let username = self.username().await;
        let refresh_token = match result.refresh_token {
            Some(rt) => rt,
            None => self
                .session
                .lock()
                .await
                .as_ref()
                .map(|s| s.refresh_token.as_str().to_string())
                .ok_or_else(|| AuthError::corruption("server omitted RefreshToken and no prior session exists"))?,
        };
        let session = Session::new(Token::new(result.id_token), Token::new(result.access_token), Token::new(refresh_token));

        self.cache_tokens(&username, &session).await?;
        *self.session.lock().await = Some(session.clone());
        self.clear_transient_state().await;

        let device_confirmation = match result.new_device_metadata {
            Some(metadata) => Some(self.confirm_device(&session, metadata).await?),
            None => None,
        };

        Ok(AuthOutcome::Authenticated { session, device: device_confirmation })
    }

    /// spec §4.6.2: "Device confirmation".
    async fn confirm_device(
        &self,
        session: &Session,
        metadata: crate::rpc::NewDeviceMetadata,
    ) -> Result<DeviceConfirmation> {
        let srp = SrpEngine::new(metadata.device_group_key.clone(), self.pool.paranoia());
        let secrets = srp.generate_hash_device(&metadata.device_group_key, &metadata.device_key);

        let config = DeviceSecretVerifierConfig {
            password_verifier: STANDARD.encode(secrets.verifier_devices.to_bytes_be()),
            salt: STANDARD.encode(secrets.salt_devices.to_bytes_be_padded(crate::constants::DEVICE_SALT_LEN)),
        };

        let response = self
            .rpc
            .confirm_device(ConfirmDeviceRequest {
                access_token: session.access_token.as_str().to_string(),
                device_key: metadata.device_key.clone(),
                device_secret_verifier_config: config,
                device_name: DEFAULT_DEVICE_NAME.to_string(),
            })
            .await?;

        let username = self.username().await;
        let material = DeviceMaterial {
            device_key: metadata.device_key.clone(),
            device_group_key: metadata.device_group_key.clone(),
            random_password: secrets.random_password,
        };
        self.cache_device_key_and_password(&username, &material).await?;
        *self.device.lock().await = Some(material);

        Ok(DeviceConfirmation {
            device_key: metadata.device_key,
            user_confirmation_necessary: response.user_confirmation_necessary,
        })
    }

    /// spec §4.6.3: "refresh_session". Precondition (spec §9, resolving
    /// the source's commented-out username-restore line): the caller must
    /// already have `username` set on this `CognitoUser` — enforced
    /// structurally, since this takes `&self` on an already-constructed
    /// instance rather than reconstructing identity from the refresh
    /// token.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let _guard = self.acquire()?;
        self.refresh_session_unguarded(refresh_token).await
    }

    /// The actual `REFRESH_TOKEN_AUTH` exchange, without taking the
    /// reentrancy guard. [`Self::refresh_session`] wraps this for callers
    /// entering fresh; [`Self::get_session`] calls it directly so that a
    /// caller already holding the guard (e.g. [`Self::forget_device`]) can
    /// resolve an expired session without tripping `Busy` on itself.
    async fn refresh_session_unguarded(&self, refresh_token: &str) -> Result<Session> {
        self.load_persisted_device().await?;

        let username = self.username().await;
        let mut auth_parameters = HashMap::new();
        auth_parameters.insert("REFRESH_TOKEN".to_string(), refresh_token.to_string());
        if let Some(device) = self.device.lock().await.as_ref() {
            auth_parameters.insert("DEVICE_KEY".to_string(), device.device_key.clone());
        }

        let response = self
            .rpc
            .initiate_auth(InitiateAuthRequest {
                auth_flow: AUTH_FLOW_REFRESH.to_string(),
                client_id: self.pool.client_id().to_string(),
                auth_parameters,
            })
            .await?;

        let result = response
            .authentication_result
            .ok_or_else(|| AuthError::corruption("REFRESH_TOKEN_AUTH did not return an AuthenticationResult"))?;

        let refresh_token = result.refresh_token.clone().unwrap_or_else(|| refresh_token.to_string());
        let session = Session::new(
            Token::new(result.id_token),
            Token::new(result.access_token),
            Token::new(refresh_token),
        );
        self.cache_tokens(&username, &session).await?;
        *self.session.lock().await = Some(session.clone());
        Ok(session)
    }

    /// Read-only getter, permitted concurrently with an in-flight auth
    /// operation (spec §5). Returns whatever session is currently cached
    /// in memory without touching the `TokenStore` or the RPC layer —
    /// unlike [`Self::get_session`], it never refreshes.
    pub async fn get_sign_in_user_session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// spec §4.6.4: "get_session". Does not itself take the reentrancy
    /// guard — its fallback to `refresh_session_unguarded` lets callers
    /// that already hold the guard (e.g. [`Self::forget_device`]) resolve
    /// an expired session without deadlocking/failing `Busy` on their own
    /// lock.
    pub async fn get_session(&self) -> Result<Session> {
        let now = (self.now)();
        if let Some(session) = self.session.lock().await.as_ref() {
            if session.is_valid(now) {
                return Ok(session.clone());
            }
        }

        let username = self.username().await;
        let client_id = self.pool.client_id();
        let cached = self.load_cached_session(client_id, &username).await?;
        if let Some(session) = &cached {
            if session.is_valid(now) {
                *self.session.lock().await = Some(session.clone());
                return Ok(session.clone());
            }
        }

        match cached {
            Some(session) => self.refresh_session_unguarded(session.refresh_token.as_str()).await,
            None => Err(AuthError::NotAuthenticated),
        }
    }

    /// Infallible beyond best-effort cache clear (spec §7). Resolves the
    /// buggy source's `self.clearCachedTokens()` (where `self` is
    /// undefined inside `signOut`) as a plain method call on the receiver.
    pub async fn sign_out(&self) {
        *self.session.lock().await = None;
        *self.server_session.lock().await = None;
        let username = self.username().await;
        let client_id = self.pool.client_id();
        let _ = self.token_store.remove(&TokenKeys::id_token(client_id, &username)).await;
        let _ = self.token_store.remove(&TokenKeys::access_token(client_id, &username)).await;
        let _ = self.token_store.remove(&TokenKeys::refresh_token(client_id, &username)).await;
    }

    pub async fn forget_device(&self) -> Result<()> {
        let _guard = self.acquire()?;
        let session = self.get_session().await?;
        let device = self.device.lock().await.clone();
        if let Some(device) = device {
            self.rpc.forget_device(session.access_token.as_str(), &device.device_key).await?;
        }
        let username = self.username().await;
        let client_id = self.pool.client_id();
        let _ = self.token_store.remove(&TokenKeys::device_key(client_id, &username)).await;
        let _ = self.token_store.remove(&TokenKeys::device_group_key(client_id, &username)).await;
        let _ = self.token_store.remove(&TokenKeys::random_password_key(client_id, &username)).await;
        *self.device.lock().await = None;
        Ok(())
    }

    // ---- session-gated self-service pass-throughs (SPEC_FULL §4.6) ------------

    pub async fn change_password(&self, previous_password: &str, proposed_password: &str) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc
            .change_password(session.access_token.as_str(), previous_password, proposed_password)
            .await
    }

    pub async fn set_user_settings(&self, mfa_options: HashMap<String, String>) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.set_user_settings(session.access_token.as_str(), mfa_options).await
    }

    pub async fn delete_user(&self) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.delete_user(session.access_token.as_str()).await
    }

    pub async fn update_user_attributes(&self, attributes: Vec<UserAttribute>) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.update_user_attributes(session.access_token.as_str(), attributes).await
    }

    pub async fn get_user_attributes(&self) -> Result<GetUserResponse> {
        let session = self.get_session().await?;
        self.rpc.get_user(session.access_token.as_str()).await
    }

    /// `getUserData` in the original; same wire operation as
    /// `get_user_attributes` (SPEC_FULL §4.6).
    pub async fn get_user_data(&self) -> Result<GetUserResponse> {
        self.get_user_attributes().await
    }

    pub async fn delete_attributes(&self, attribute_names: Vec<String>) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.delete_user_attributes(session.access_token.as_str(), attribute_names).await
    }

    pub async fn get_user_attribute_verification_code(&self, attribute_name: &str) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.get_user_attribute_verification_code(session.access_token.as_str(), attribute_name).await
    }

    pub async fn verify_attribute(&self, attribute_name: &str, code: &str) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.verify_user_attribute(session.access_token.as_str(), attribute_name, code).await
    }

    /// Resolves the buggy source's `getDevice`, which resolves (rather
    /// than rejects) with an `Error` when unauthenticated; this
    /// reimplementation rejects like every sibling method (spec §9).
    pub async fn get_device(&self, device_key: &str) -> Result<DeviceDescription> {
        let session = self.get_session().await?;
        self.rpc.get_device(session.access_token.as_str(), device_key).await
    }

    pub async fn update_device_status(&self, device_key: &str, device_remembered_status: &str) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc
            .update_device_status(session.access_token.as_str(), device_key, device_remembered_status)
            .await
    }

    pub async fn list_devices(&self) -> Result<ListDevicesResponse> {
        let session = self.get_session().await?;
        self.rpc.list_devices(session.access_token.as_str()).await
    }

    pub async fn global_sign_out(&self) -> Result<()> {
        let session = self.get_session().await?;
        self.rpc.global_sign_out(session.access_token.as_str()).await?;
        self.sign_out().await;
        Ok(())
    }

    // ---- persistence helpers ----------------------------------------------------

    async fn cache_tokens(&self, username: &str, session: &Session) -> Result<()> {
        let client_id = self.pool.client_id();
        self.token_store.set(&TokenKeys::id_token(client_id, username), session.id_token.as_str()).await?;
        self.token_store
            .set(&TokenKeys::access_token(client_id, username), session.access_token.as_str())
            .await?;
        self.token_store
            .set(&TokenKeys::refresh_token(client_id, username), session.refresh_token.as_str())
            .await?;
        self.token_store.set(&TokenKeys::last_auth_user(client_id), username).await
    }

    async fn cache_device_key_and_password(&self, username: &str, material: &DeviceMaterial) -> Result<()> {
        let client_id = self.pool.client_id();
        self.token_store
            .set(&TokenKeys::device_key(client_id, username), &material.device_key)
            .await?;
        self.token_store
            .set(&TokenKeys::device_group_key(client_id, username), &material.device_group_key)
            .await?;
        self.token_store
            .set(
                &TokenKeys::random_password_key(client_id, username),
                &STANDARD.encode(&material.random_password),
            )
            .await
    }

    async fn load_cached_session(&self, client_id: &str, username: &str) -> Result<Option<Session>> {
        let id_token = self.token_store.get(&TokenKeys::id_token(client_id, username)).await?;
        let access_token = self.token_store.get(&TokenKeys::access_token(client_id, username)).await?;
        let refresh_token = self.token_store.get(&TokenKeys::refresh_token(client_id, username)).await?;
        match (id_token, access_token, refresh_token) {
            (Some(id), Some(access), Some(refresh)) => {
                Ok(Some(Session::new(Token::new(id), Token::new(access), Token::new(refresh))))
            }
            _ => Ok(None),
        }
    }

    async fn load_persisted_device(&self) -> Result<()> {
        if self.device.lock().await.is_some() {
            return Ok(());
        }
        let client_id = self.pool.client_id();
        let username = self.username().await;
        let device_key = self.token_store.get(&TokenKeys::device_key(client_id, &username)).await?;
        let device_group_key = self.token_store.get(&TokenKeys::device_group_key(client_id, &username)).await?;
        let random_password_b64 = self.token_store.get(&TokenKeys::random_password_key(client_id, &username)).await?;

        if let (Some(device_key), Some(device_group_key), Some(random_password_b64)) =
            (device_key, device_group_key, random_password_b64)
        {
            let random_password = STANDARD
                .decode(random_password_b64)
                .map_err(|_| AuthError::corruption("randomPasswordKey was not valid base64"))?;
            *self.device.lock().await = Some(DeviceMaterial { device_key, device_group_key, random_password });
        }
        Ok(())
    }

    async fn clear_transient_state(&self) {
        *self.server_session.lock().await = None;
    }
}

/// Pre-authentication operations (spec §6: `confirmSignUp`,
/// `resendConfirmationCode`, `forgotPassword`, `confirmForgotPassword`).
/// These authenticate a not-yet-signed-in or password-resetting user, so
/// they have no session to gate on and no `CognitoUser` state to mutate;
/// exposed as free functions over `(Arc<dyn RpcFacade>, &Pool)` rather than
/// methods on an authenticated `CognitoUser` (SPEC_FULL §4.6).
pub async fn confirm_sign_up(rpc: &dyn RpcFacade, pool: &Pool, username: &str, confirmation_code: &str) -> Result<()> {
    rpc.confirm_sign_up(pool.client_id(), username, confirmation_code).await
}

pub async fn resend_confirmation_code(rpc: &dyn RpcFacade, pool: &Pool, username: &str) -> Result<()> {
    rpc.resend_confirmation_code(pool.client_id(), username).await
}

pub async fn forgot_password(rpc: &dyn RpcFacade, pool: &Pool, username: &str) -> Result<()> {
    rpc.forgot_password(pool.client_id(), username).await
}

pub async fn confirm_forgot_password(
    rpc: &dyn RpcFacade,
    pool: &Pool,
    username: &str,
    confirmation_code: &str,
    new_password: &str,
) -> Result<()> {
    if new_password.is_empty() {
        return Err(AuthError::invalid_argument("new_password must not be empty"));
    }
    rpc.confirm_forgot_password(pool.client_id(), username, confirmation_code, new_password)
        .await
}

fn missing_param(name: &str) -> AuthError {
    AuthError::corruption(format!("server response was missing required parameter {name}"))
}

/// The real wire format for `requiredAttributes`/`userAttributes` is a
/// JSON array/object string nested inside the `ChallengeParameters` map
/// (itself string-valued per the service's JSON contract); parsed here
/// rather than at the `ChallengeResponse` DTO layer since only this one
/// challenge type nests JSON this way.
fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn parse_attribute_map(raw: &str) -> HashMap<String, String> {
    serde_json::from_str(raw).unwrap_or_default()
}
