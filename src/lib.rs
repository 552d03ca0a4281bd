/*!
Client-side core of an SRP-6a authentication library for a hosted
user-identity service (an Amazon Cognito User Pools-shaped contract).

This crate implements the hard part: the SRP-6a handshake, the
device-SRP sub-handshake, the multi-step challenge loop (MFA / custom /
new-password-required), and the token lifecycle (cache, refresh,
invalidate). It does **not** implement a transport, TLS, or JWT
signature validation — those are the responsibility of an injected
[`RpcFacade`] and the caller's own token-parsing layer, respectively.

# Usage
See the [`demos`](./demos) directory for a worked login flow against a
mock [`RpcFacade`].

# Shape of the crate
- [`pool`] — immutable per-pool configuration (`user_pool_id`, `client_id`,
  the SRP paranoia parameter).
- [`srp`] — the SRP-6a client half: `A`, the HKDF session key, and the
  device-verifier generation ceremony.
- [`proof`] — the `PASSWORD_CLAIM_SIGNATURE` HMAC assembly and the
  wire-visible timestamp format it's built over.
- [`token_store`] — injectable key/value persistence for cached tokens and
  device secrets.
- [`session`] — the three-token bundle and its freshness check.
- [`user`] — [`user::CognitoUser`], the authentication state machine that
  ties everything above together against an injected [`RpcFacade`].
- [`rpc`] — the remote-service contract: nineteen request/response DTOs and
  the trait callers implement to supply a transport.
- [`challenge`] — the non-error "please respond to this challenge"
  continuations the state machine surfaces mid-handshake.
- [`error`] — the crate's error taxonomy.
*/

pub mod big_number;
pub mod challenge;
pub mod constants;
pub mod error;
pub mod hash;
pub mod pool;
pub mod proof;
pub mod rpc;
pub mod session;
pub mod srp;
pub mod token_store;
pub mod user;

pub use challenge::AuthOutcome;
pub use error::{AuthError, CryptoFailureKind, Result};
pub use pool::Pool;
pub use rpc::RpcFacade;
pub use session::{Session, Token};
pub use token_store::{FileTokenStore, InMemoryTokenStore, TokenStore};
pub use user::{AuthFlow, CognitoUser, DeviceMaterial};
