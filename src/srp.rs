//! SRP-6a client half (spec §4.2: "SrpEngine"): derives the client's public
//! ephemeral `A`, the shared HKDF session key, and (for device-bound
//! logins) a fresh device verifier. Generalizes the teacher's
//! `src/primitives.rs` math and `src/api/user.rs` stateful client struct —
//! SHA-1 and the SHA-interleaved `K` are replaced with SHA-256 and an
//! HKDF-derived key throughout, per this service's wire profile.

use std::sync::OnceLock;

use log::debug;

use crate::big_number::{BigNumber, Zero};
use crate::constants::{self, DEVICE_PASSWORD_LEN, DEVICE_SALT_LEN, HKDF_INFO, HKDF_KEY_LEN};
use crate::error::{AuthError, CryptoFailureKind, Result};
use crate::hash::{hash_u, sha256_concat};

pub type PrimeModulus = BigNumber;
pub type Generator = BigNumber;
pub type Salt = BigNumber;
pub type PublicKey = BigNumber;
pub type PrivateKey = BigNumber;
pub type PasswordVerifier = BigNumber;
pub type MultiplierParameter = BigNumber;

/// Secrets produced by the device-registration ceremony (spec §4.2:
/// "generate_hash_device"). `random_password` is the client-generated
/// device password `R` — raw bytes, not necessarily valid UTF-8.
#[derive(Debug, Clone)]
pub struct DeviceVerifierSecrets {
    pub salt_devices: Salt,
    pub verifier_devices: PasswordVerifier,
    pub random_password: Vec<u8>,
}

/// One SRP-6a handshake's worth of client state: the realm it's scoped to
/// (the pool-id suffix for user-SRP, the device-group-key for device-SRP)
/// and the RNG strength for its private exponent. Single-use per spec §3 —
/// construct a fresh `SrpEngine` per handshake.
pub struct SrpEngine {
    realm_id: String,
    paranoia: u8,
    n: PrimeModulus,
    g: Generator,
    k: MultiplierParameter,
    ephemeral: OnceLock<(PrivateKey, PublicKey)>,
}

impl SrpEngine {
    pub fn new(realm_id: impl Into<String>, paranoia: u8) -> Self {
        let n = constants::prime_modulus();
        let g = constants::generator();
        let k = Self::calculate_k(&n, &g);
        Self { realm_id: realm_id.into(), paranoia, n, g, k, ephemeral: OnceLock::new() }
    }

    fn pad_len(&self) -> usize {
        self.n.num_bytes()
    }

    /// `k = H(N | PAD(g))`.
    fn calculate_k(n: &PrimeModulus, g: &Generator) -> MultiplierParameter {
        let pad_len = n.num_bytes();
        let digest = sha256_concat(&[&n.to_bytes_be(), &g.to_bytes_be_padded(pad_len)]);
        BigNumber::from_bytes_be(&digest)
    }

    /// `A = g^a mod N`, idempotent and memoised: repeated calls within the
    /// same handshake return the same `A`. Regenerates `a` internally if a
    /// draw yields `A ≡ 0 (mod N)` (impossible with `g = 2` and `1 ≤ a <
    /// N`, but checked per spec §3's invariant).
    #[allow(non_snake_case)]
    pub fn large_a_value(&self) -> Result<PublicKey> {
        if let Some((_, A)) = self.ephemeral.get() {
            return Ok(A.clone());
        }

        for _ in 0..8 {
            let a = BigNumber::random_in_range(&self.n, self.paranoia);
            let A = self.g.modpow(&a, &self.n);
            if (&A % &self.n).is_zero() {
                continue;
            }
            debug!("A = {:?}", &A);
            // Another thread may have raced us; either outcome yields a
            // consistent (a, A) pair for this engine's lifetime.
            let _ = self.ephemeral.set((a, A));
            return Ok(self.ephemeral.get().expect("just set").1.clone());
        }

        Err(AuthError::crypto(CryptoFailureKind::RngFailure))
    }

    /// `x = H(salt || H(realm_id ":" identifier ":" password))`.
    fn private_key_x(&self, identifier: &str, password: &[u8], salt: &Salt) -> PrivateKey {
        let inner = sha256_concat(&[self.realm_id.as_bytes(), b":", identifier.as_bytes(), b":", password]);
        let digest = sha256_concat(&[&salt.to_bytes_be(), &inner]);
        BigNumber::from_bytes_be(&digest)
    }

    /// Derives the 16-byte HKDF session key from the server's challenge
    /// (`server_b`, `salt`) and the client's credential pair
    /// `(identifier, password)`. `password` is raw bytes so the
    /// device-bound login path (whose "password" is a random byte string,
    /// not user-entered UTF-8) can reuse this same routine.
    #[allow(non_snake_case)]
    pub fn password_authentication_key(
        &self,
        identifier: &str,
        password: &[u8],
        server_b: &PublicKey,
        salt: &Salt,
    ) -> Result<[u8; HKDF_KEY_LEN]> {
        let A = self.large_a_value()?;
        let pad_len = self.pad_len();

        let u = hash_u(&A, server_b, pad_len);
        if u.is_zero() {
            return Err(AuthError::crypto(CryptoFailureKind::ZeroScalar));
        }

        let (a, _) = self.ephemeral.get().expect("large_a_value populates this");
        let x = self.private_key_x(identifier, password, salt);

        let g_x = self.g.modpow(&x, &self.n);
        let k_gx = (&self.k * &g_x) % &self.n;
        let base = server_b.mod_sub(&k_gx, &self.n);
        let exponent = a + &(&u * &x);
        let s = base.modpow(&exponent, &self.n);

        debug!("S = {:?}", &s);

        let hkdf_key = crate::hash::hkdf_sha256::<HKDF_KEY_LEN>(
            &s.to_bytes_be_padded(pad_len),
            &u.to_bytes_be_padded(pad_len),
            HKDF_INFO,
        );
        Ok(hkdf_key)
    }

    /// Generates a fresh device verifier ceremony (spec §4.2 / §4.6.2): a
    /// random 40-byte device password `R`, a random 16-byte salt, and the
    /// verifier `v = g^x_dev mod N` derived from them.
    pub fn generate_hash_device(&self, device_group_key: &str, device_key: &str) -> DeviceVerifierSecrets {
        use rand::RngCore;

        let mut rng = rand::thread_rng();
        let mut random_password = vec![0_u8; DEVICE_PASSWORD_LEN];
        rng.fill_bytes(&mut random_password);

        let mut salt_bytes = [0_u8; DEVICE_SALT_LEN];
        rng.fill_bytes(&mut salt_bytes);
        let salt_devices = BigNumber::from_bytes_be(&salt_bytes);

        let inner = sha256_concat(&[
            device_group_key.as_bytes(),
            device_key.as_bytes(),
            b":",
            &random_password,
        ]);
        let x_dev_digest = sha256_concat(&[&salt_bytes, &inner]);
        let x_dev = BigNumber::from_bytes_be(&x_dev_digest);
        let verifier_devices = self.g.modpow(&x_dev, &self.n);

        DeviceVerifierSecrets { salt_devices, verifier_devices, random_password }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::prime_modulus;

    #[test]
    #[allow(non_snake_case)]
    fn large_a_value_is_in_range_and_nonzero_mod_n() {
        let engine = SrpEngine::new("AbCdEfGhI", 7);
        let A = engine.large_a_value().unwrap();
        let n = prime_modulus();
        assert!(A < n);
        assert!(!(&A % &n).is_zero());
    }

    #[test]
    #[allow(non_snake_case)]
    fn large_a_value_is_idempotent() {
        let engine = SrpEngine::new("AbCdEfGhI", 7);
        let A1 = engine.large_a_value().unwrap();
        let A2 = engine.large_a_value().unwrap();
        assert_eq!(A1, A2);
    }

    #[test]
    fn password_authentication_key_is_deterministic_for_fixed_a() {
        let engine = SrpEngine::new("AbCdEfGhI", 7);
        let _a = engine.large_a_value().unwrap();
        let n = prime_modulus();
        let server_b = engine.g.modpow(&BigNumber::from(12345_u32), &n);
        let salt = BigNumber::from(999_u32);

        let key1 = engine
            .password_authentication_key("alice", b"hunter2", &server_b, &salt)
            .unwrap();
        let key2 = engine
            .password_authentication_key("alice", b"hunter2", &server_b, &salt)
            .unwrap();
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), HKDF_KEY_LEN);
    }

    #[test]
    fn password_authentication_key_differs_by_password() {
        let engine = SrpEngine::new("AbCdEfGhI", 7);
        let n = prime_modulus();
        let server_b = engine.g.modpow(&BigNumber::from(54321_u32), &n);
        let salt = BigNumber::from(42_u32);

        let key1 = engine
            .password_authentication_key("alice", b"hunter2", &server_b, &salt)
            .unwrap();
        let key2 = engine
            .password_authentication_key("alice", b"different", &server_b, &salt)
            .unwrap();
        assert_ne!(key1, key2);
    }

    #[test]
    fn generate_hash_device_produces_matching_verifier() {
        let engine = SrpEngine::new("us-east-1_pool", 7);
        let secrets = engine.generate_hash_device("device-group-1", "device-key-1");
        assert_eq!(secrets.random_password.len(), DEVICE_PASSWORD_LEN);
        assert!(!secrets.verifier_devices.is_zero());
    }
}
