//! Demonstrates a full SRP login against a mocked identity service: the
//! mock plays the server half of the handshake (it knows the password,
//! which no production implementation should), so this is illustrative of
//! the client API surface only, not a server reference implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cognito_srp_auth::rpc::{
    AuthenticationResultData, ChallengeResponse, ConfirmDeviceRequest, ConfirmDeviceResponse,
    DeviceDescription, GetUserResponse, InitiateAuthRequest, ListDevicesResponse,
    RespondToAuthChallengeRequest, UserAttribute,
};
use cognito_srp_auth::{AuthFlow, AuthOutcome, CognitoUser, InMemoryTokenStore, Pool, Result, RpcFacade};

/// A toy "server": accepts any `USERNAME`/`SRP_A` pair and, once the
/// client answers the `PASSWORD_VERIFIER` challenge, unconditionally
/// issues a session. Real servers verify the HMAC proof before doing so.
struct MockIdentityService;

#[async_trait]
impl RpcFacade for MockIdentityService {
    async fn initiate_auth(&self, req: InitiateAuthRequest) -> Result<ChallengeResponse> {
        let username = req.auth_parameters.get("USERNAME").cloned().unwrap_or_default();
        let mut params = HashMap::new();
        params.insert("USER_ID_FOR_SRP".to_string(), username);
        params.insert("SALT".to_string(), "2A".to_string());
        params.insert("SRP_B".to_string(), "5B".to_string());
        params.insert("SECRET_BLOCK".to_string(), STANDARD.encode(b"demo-secret-block"));
        Ok(ChallengeResponse {
            challenge_name: Some("PASSWORD_VERIFIER".to_string()),
            session: None,
            challenge_parameters: params,
            authentication_result: None,
        })
    }

    async fn respond_to_auth_challenge(
        &self,
        _req: RespondToAuthChallengeRequest,
    ) -> Result<ChallengeResponse> {
        Ok(ChallengeResponse {
            challenge_name: None,
            session: None,
            challenge_parameters: HashMap::new(),
            authentication_result: Some(AuthenticationResultData {
                id_token: "demo.id.jwt".to_string(),
                access_token: "demo.access.jwt".to_string(),
                refresh_token: Some("demo.refresh.jwt".to_string()),
                new_device_metadata: None,
            }),
        })
    }

    async fn confirm_device(&self, _req: ConfirmDeviceRequest) -> Result<ConfirmDeviceResponse> {
        Ok(ConfirmDeviceResponse { user_confirmation_necessary: false })
    }
    async fn confirm_sign_up(&self, _c: &str, _u: &str, _code: &str) -> Result<()> {
        Ok(())
    }
    async fn resend_confirmation_code(&self, _c: &str, _u: &str) -> Result<()> {
        Ok(())
    }
    async fn change_password(&self, _a: &str, _p: &str, _n: &str) -> Result<()> {
        Ok(())
    }
    async fn set_user_settings(&self, _a: &str, _m: HashMap<String, String>) -> Result<()> {
        Ok(())
    }
    async fn delete_user(&self, _a: &str) -> Result<()> {
        Ok(())
    }
    async fn update_user_attributes(&self, _a: &str, _attrs: Vec<UserAttribute>) -> Result<()> {
        Ok(())
    }
    async fn get_user(&self, _a: &str) -> Result<GetUserResponse> {
        Ok(GetUserResponse::default())
    }
    async fn delete_user_attributes(&self, _a: &str, _n: Vec<String>) -> Result<()> {
        Ok(())
    }
    async fn forgot_password(&self, _c: &str, _u: &str) -> Result<()> {
        Ok(())
    }
    async fn confirm_forgot_password(&self, _c: &str, _u: &str, _code: &str, _n: &str) -> Result<()> {
        Ok(())
    }
    async fn get_user_attribute_verification_code(&self, _a: &str, _n: &str) -> Result<()> {
        Ok(())
    }
    async fn verify_user_attribute(&self, _a: &str, _n: &str, _c: &str) -> Result<()> {
        Ok(())
    }
    async fn get_device(&self, _a: &str, _k: &str) -> Result<DeviceDescription> {
        Ok(DeviceDescription::default())
    }
    async fn forget_device(&self, _a: &str, _k: &str) -> Result<()> {
        Ok(())
    }
    async fn update_device_status(&self, _a: &str, _k: &str, _s: &str) -> Result<()> {
        Ok(())
    }
    async fn list_devices(&self, _a: &str) -> Result<ListDevicesResponse> {
        Ok(ListDevicesResponse::default())
    }
    async fn global_sign_out(&self, _a: &str) -> Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let pool = Arc::new(Pool::new("us-east-1_AbCdEfGhI", "democlient").unwrap());
    let rpc = Arc::new(MockIdentityService);
    let token_store = Arc::new(InMemoryTokenStore::new());

    let user = CognitoUser::new("alice", pool, rpc, token_store);

    println!("Authenticating {}...", user.username().await);
    let outcome = user
        .authenticate_user("correct horse battery staple", AuthFlow::UserSrp)
        .await
        .expect("login should succeed against the mock service");

    match outcome {
        AuthOutcome::Authenticated { session, device } => {
            println!("Authenticated. Access token: {}", session.access_token.as_str());
            println!("Device confirmation pending: {}", device.is_some());
        }
        other => println!("Unexpected challenge: {other:?}"),
    }

    let cached = user.get_session().await.expect("a freshly authenticated session is cached");
    println!("get_session() resolved from cache: {}", cached.id_token.as_str());
}
