//! The fixed SRP-6a group this service's client dialect negotiates against:
//! a single safe-prime MODP group with generator `g = 2`, burned in rather
//! than configurable (spec: "These constants are burned into the
//! implementation").
//!
//! The modulus below is the IETF 3072-bit MODP group (RFC 3526 group 15) —
//! the same constant the teacher repo's `constants.rs` documents as "the
//! larger 3072-bit group" but leaves unfilled; this is the one the remote
//! service's own SRP dialect mandates (spec §4.1/§6). The padding width used
//! throughout `crate::srp` is derived from the modulus itself
//! (`PrimeModulus::num_bytes()`) rather than hard-coded.

use hex_literal::hex;

use crate::big_number::BigNumber;

/// IETF 3072-bit MODP group (RFC 3526 group 15), 384 bytes.
const N_BYTES: [u8; 384] = hex!(
    "FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1
     29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD
     EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245
     E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED
     EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D
     C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F
     83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D
     670C354E 4ABC9804 F1746C08 CA18217C 32905E46 2E36CE3B
     E39E772C 180E8603 9B2783A2 EC07A28F B5C55DF0 6F4C52C9
     DE2BCBF6 95581718 3995497C EA956AE5 15D22618 98FA0510
     15728E5A 8AAAC42D AD33170D 04507A33 A85521AB DF1CBA64
     ECFB8504 58DBEF0A 8AEA7157 5D060C7D B3970F85 A6E1E4C7
     ABF5AE8C DB0933D7 1E8C94E0 4A25619D CEE3D226 1AD2EE6B
     F12FFA06 D98A0864 D8760273 3EC86A64 521F2B18 177B200C
     BBE11757 7A615D6C 770988C0 BAD946E2 08E24FA0 74E5AB31
     43DB5BFC E0FD108E 4B82D120 A93AD2CA FFFFFFFF FFFFFFFF"
);

pub fn prime_modulus() -> BigNumber {
    BigNumber::from_bytes_be(&N_BYTES)
}

pub fn generator() -> BigNumber {
    BigNumber::from(2_u32)
}

/// The HKDF info string this service's derived session key is bound to.
pub const HKDF_INFO: &[u8] = b"Caldera Derived Key";

/// Length in bytes of the derived HKDF session key.
pub const HKDF_KEY_LEN: usize = 16;

/// Length in bytes of the randomly generated device password `R`.
pub const DEVICE_PASSWORD_LEN: usize = 40;

/// Length in bytes of the device-SRP salt.
pub const DEVICE_SALT_LEN: usize = 16;
