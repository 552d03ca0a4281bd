//! SHA-256 hashing and HKDF key derivation, the two primitives
//! [`crate::srp::SrpEngine`] builds on top of `BigModArith`.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};

use crate::big_number::BigNumber;

pub const HASH_LENGTH: usize = 32;
pub type Hash = [u8; HASH_LENGTH];

/// `H = SHA-256`.
pub fn sha256(bytes: &[u8]) -> Hash {
    let mut out = [0_u8; HASH_LENGTH];
    out.copy_from_slice(&Sha256::digest(bytes));
    out
}

pub fn sha256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    let mut out = [0_u8; HASH_LENGTH];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// `u = H(PAD(A) | PAD(B))`, both operands left-zero-padded to `pad_len`
/// bytes (the byte width of the group modulus `N`).
#[allow(non_snake_case)]
pub fn hash_u(A: &BigNumber, B: &BigNumber, pad_len: usize) -> BigNumber {
    let digest = sha256_concat(&[&A.to_bytes_be_padded(pad_len), &B.to_bytes_be_padded(pad_len)]);
    BigNumber::from_bytes_be(&digest)
}

/// `HKDF-SHA256(ikm, salt, info, L)` — this service derives a 16-byte
/// session key rather than the SHA-interleaved `K` a generic SRP6 library
/// computes.
pub fn hkdf_sha256<const L: usize>(ikm: &[u8], salt: &[u8], info: &[u8]) -> [u8; L] {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0_u8; L];
    hk.expand(info, &mut okm)
        .expect("requested HKDF output length must fit SHA-256's 8160-byte limit");
    okm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"hello"), sha256(b"hello"));
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn hkdf_output_is_deterministic_and_sized() {
        let a = hkdf_sha256::<16>(b"ikm", b"salt", b"Caldera Derived Key");
        let b = hkdf_sha256::<16>(b"ikm", b"salt", b"Caldera Derived Key");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn hkdf_output_changes_with_input() {
        let a = hkdf_sha256::<16>(b"ikm-1", b"salt", b"Caldera Derived Key");
        let b = hkdf_sha256::<16>(b"ikm-2", b"salt", b"Caldera Derived Key");
        assert_ne!(a, b);
    }

    #[test]
    #[allow(non_snake_case)]
    fn hash_u_is_nonzero_for_distinct_inputs() {
        use crate::big_number::Zero;
        let A = BigNumber::from(7_u32);
        let B = BigNumber::from(11_u32);
        let u = hash_u(&A, &B, 256);
        assert!(!u.is_zero());
    }
}
