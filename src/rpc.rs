//! The remote-service RPC contract (spec §4.7/§6: "RpcFacade"). New module
//! — the teacher is a pure protocol library with no transport layer at
//! all. `RpcFacade` is the sole collaborator contract the rest of this
//! crate depends on; no HTTP client is implemented (Non-goal: "the core
//! does not implement a transport"). DTOs carry the exact wire field
//! names spec §6 documents, since those are wire-visible.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDeviceMetadata {
    #[serde(rename = "DeviceGroupKey")]
    pub device_group_key: String,
    #[serde(rename = "DeviceKey")]
    pub device_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationResultData {
    #[serde(rename = "IdToken")]
    pub id_token: String,
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: Option<String>,
    #[serde(rename = "NewDeviceMetadata")]
    pub new_device_metadata: Option<NewDeviceMetadata>,
}

/// Shared response shape of `initiateAuth` and `respondToAuthChallenge`:
/// either a `ChallengeName` demanding another round trip, or a terminal
/// `AuthenticationResult` (spec §4.6: "challenge dispatch").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeResponse {
    #[serde(rename = "ChallengeName")]
    pub challenge_name: Option<String>,
    #[serde(rename = "Session")]
    pub session: Option<String>,
    #[serde(rename = "ChallengeParameters")]
    pub challenge_parameters: HashMap<String, String>,
    #[serde(rename = "AuthenticationResult")]
    pub authentication_result: Option<AuthenticationResultData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiateAuthRequest {
    #[serde(rename = "AuthFlow")]
    pub auth_flow: String,
    #[serde(rename = "ClientId")]
    pub client_id: String,
    #[serde(rename = "AuthParameters")]
    pub auth_parameters: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespondToAuthChallengeRequest {
    #[serde(rename = "ClientId")]
    pub client_id: String,
    #[serde(rename = "ChallengeName")]
    pub challenge_name: String,
    #[serde(rename = "Session")]
    pub session: Option<String>,
    #[serde(rename = "ChallengeResponses")]
    pub challenge_responses: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceSecretVerifierConfig {
    #[serde(rename = "PasswordVerifier")]
    pub password_verifier: String,
    #[serde(rename = "Salt")]
    pub salt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmDeviceRequest {
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "DeviceKey")]
    pub device_key: String,
    #[serde(rename = "DeviceSecretVerifierConfig")]
    pub device_secret_verifier_config: DeviceSecretVerifierConfig,
    #[serde(rename = "DeviceName")]
    pub device_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmDeviceResponse {
    #[serde(rename = "UserConfirmationNecessary")]
    pub user_confirmation_necessary: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAttribute {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetUserResponse {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "UserAttributes")]
    pub user_attributes: Vec<UserAttribute>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDescription {
    #[serde(rename = "DeviceKey")]
    pub device_key: String,
    #[serde(rename = "DeviceAttributes")]
    pub device_attributes: Vec<UserAttribute>,
    #[serde(rename = "DeviceCreateDate")]
    pub device_create_date: Option<String>,
    #[serde(rename = "DeviceLastAuthenticatedDate")]
    pub device_last_authenticated_date: Option<String>,
    #[serde(rename = "DeviceLastModifiedDate")]
    pub device_last_modified_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDevicesResponse {
    #[serde(rename = "Devices")]
    pub devices: Vec<DeviceDescription>,
}

/// The eleven names the handshake itself touches are a subset of this
/// trait's nineteen methods (spec §1/§4.7 vs SPEC_FULL §4.6): the
/// remainder are session-gated self-service and device-management
/// pass-throughs the same `CognitoUser` object exposes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcFacade: Send + Sync {
    async fn initiate_auth(&self, req: InitiateAuthRequest) -> Result<ChallengeResponse>;

    async fn respond_to_auth_challenge(
        &self,
        req: RespondToAuthChallengeRequest,
    ) -> Result<ChallengeResponse>;

    async fn confirm_device(&self, req: ConfirmDeviceRequest) -> Result<ConfirmDeviceResponse>;

    async fn confirm_sign_up(&self, client_id: &str, username: &str, confirmation_code: &str) -> Result<()>;

    async fn resend_confirmation_code(&self, client_id: &str, username: &str) -> Result<()>;

    async fn change_password(
        &self,
        access_token: &str,
        previous_password: &str,
        proposed_password: &str,
    ) -> Result<()>;

    async fn set_user_settings(&self, access_token: &str, mfa_options: HashMap<String, String>) -> Result<()>;

    async fn delete_user(&self, access_token: &str) -> Result<()>;

    async fn update_user_attributes(&self, access_token: &str, attributes: Vec<UserAttribute>) -> Result<()>;

    async fn get_user(&self, access_token: &str) -> Result<GetUserResponse>;

    async fn delete_user_attributes(&self, access_token: &str, attribute_names: Vec<String>) -> Result<()>;

    async fn forgot_password(&self, client_id: &str, username: &str) -> Result<()>;

    async fn confirm_forgot_password(
        &self,
        client_id: &str,
        username: &str,
        confirmation_code: &str,
        new_password: &str,
    ) -> Result<()>;

    async fn get_user_attribute_verification_code(&self, access_token: &str, attribute_name: &str) -> Result<()>;

    async fn verify_user_attribute(&self, access_token: &str, attribute_name: &str, code: &str) -> Result<()>;

    async fn get_device(&self, access_token: &str, device_key: &str) -> Result<DeviceDescription>;

    async fn forget_device(&self, access_token: &str, device_key: &str) -> Result<()>;

    async fn update_device_status(
        &self,
        access_token: &str,
        device_key: &str,
        device_remembered_status: &str,
    ) -> Result<()>;

    async fn list_devices(&self, access_token: &str) -> Result<ListDevicesResponse>;

    async fn global_sign_out(&self, access_token: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::pool::Pool;
    use crate::token_store::{InMemoryTokenStore, TokenKeys, TokenStore};
    use crate::user::CognitoUser;
    use std::sync::Arc;

    fn make_user(rpc: MockRpcFacade) -> CognitoUser {
        let pool = Arc::new(Pool::new("us-east-1_AbCdEfGhI", "client123").unwrap());
        let store = Arc::new(InMemoryTokenStore::new());
        CognitoUser::new("alice", pool, Arc::new(rpc), store)
    }

    async fn make_user_with_cached_session(rpc: MockRpcFacade) -> CognitoUser {
        let pool = Arc::new(Pool::new("us-east-1_AbCdEfGhI", "client123").unwrap());
        let store = InMemoryTokenStore::new();
        store.set(&TokenKeys::id_token("client123", "alice"), "id.jwt").await.unwrap();
        store.set(&TokenKeys::access_token("client123", "alice"), "ac.jwt").await.unwrap();
        store.set(&TokenKeys::refresh_token("client123", "alice"), "rf.jwt").await.unwrap();
        CognitoUser::new("alice", pool, Arc::new(rpc), Arc::new(store))
    }

    /// Scenario 6 (spec §8): calling an authenticated operation with no
    /// cached session fails `NotAuthenticated` and issues no RPC.
    #[tokio::test]
    async fn change_password_without_session_issues_no_rpc() {
        let mut mock = MockRpcFacade::new();
        mock.expect_change_password().times(0);
        let user = make_user(mock);

        let err = user.change_password("old", "new").await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn change_password_with_cached_valid_session_calls_through() {
        let mut mock = MockRpcFacade::new();
        mock.expect_change_password()
            .withf(|access, prev, next| access == "ac.jwt" && prev == "old" && next == "new")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let user = make_user_with_cached_session(mock).await;

        user.change_password("old", "new").await.unwrap();
    }
}
