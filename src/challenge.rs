//! Non-error continuations of the challenge loop (spec §4.6, §7:
//! "ChallengeRequired — not a failure... a continuation demand"). Modeled
//! as a sum-type per spec §7's "Implementations MAY represent these as
//! ordinary variants of a sum-type result rather than error-channel
//! values" and spec §9's guidance to prefer a tagged variant over an
//! exception in statically-typed languages.

use std::collections::HashMap;

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPasswordRequired {
    /// `userAttributes` from the challenge, verbatim.
    pub user_attributes: HashMap<String, String>,
    /// `requiredAttributes`, with the `userAttributes.` wire prefix
    /// already stripped (spec §4.6: "strip the prefix").
    pub required_attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaRequired {
    pub challenge_parameters: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomChallenge {
    pub challenge_parameters: HashMap<String, String>,
}

/// Surfaced alongside a terminal `Session` when the server's
/// `confirmDevice` reply sets `UserConfirmationNecessary` (spec §4.6.2):
/// "surface it alongside the session... do not block the session."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfirmation {
    pub device_key: String,
    pub user_confirmation_necessary: bool,
}

/// The result of a single authentication step: either a terminal session
/// or a demand for another round trip carrying the server's challenge
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated { session: Session, device: Option<DeviceConfirmation> },
    NewPasswordRequired(NewPasswordRequired),
    MfaRequired(MfaRequired),
    CustomChallenge(CustomChallenge),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Prefix stripped from `requiredAttributes` entries (spec §4.6).
pub const USER_ATTRIBUTES_PREFIX: &str = "userAttributes.";

pub fn strip_required_attribute_prefix(raw: &str) -> String {
    raw.strip_prefix(USER_ATTRIBUTES_PREFIX).unwrap_or(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_prefix() {
        assert_eq!(strip_required_attribute_prefix("userAttributes.email"), "email");
    }

    #[test]
    fn leaves_unprefixed_value_untouched() {
        assert_eq!(strip_required_attribute_prefix("email"), "email");
    }
}
