//! Delegation designator encoding and account classification.
//!
//! A designator is the 23-byte code blob `0xef0100 || implementation` placed
//! on an owner account to route its execution to a shared implementation.
//! Anything else found in the code slot is surfaced as-is, never coerced into
//! one of the protocol-defined states.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::constants::{DESIGNATOR_LEN, DESIGNATOR_MAGIC, DESIGNATOR_MAGIC_LEN};

/// Errors produced when parsing raw account code as a designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum DesignatorError {
    /// The code blob is not exactly 23 bytes long.
    #[error("designator is {len} bytes long, expected {DESIGNATOR_LEN}")]
    InvalidLength {
        /// Observed code length.
        len: usize,
    },
    /// The code blob does not start with the `0xef0100` magic prefix.
    #[error("designator does not start with the 0xef0100 magic prefix")]
    InvalidMagic,
}

/// The on-chain marker routing an owner account's execution to a shared
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationDesignator {
    /// Address of the shared implementation the account delegates to.
    pub implementation: Address,
}

impl DelegationDesignator {
    /// Creates a designator pointing at `implementation`.
    pub const fn new(implementation: Address) -> Self {
        Self { implementation }
    }

    /// Packs the designator into its 23-byte wire form.
    pub fn to_bytes(&self) -> [u8; DESIGNATOR_LEN] {
        let mut out = [0u8; DESIGNATOR_LEN];
        out[..DESIGNATOR_MAGIC_LEN].copy_from_slice(&DESIGNATOR_MAGIC);
        out[DESIGNATOR_MAGIC_LEN..].copy_from_slice(self.implementation.as_slice());
        out
    }

    /// Parses raw account code as a designator.
    pub fn parse(code: &[u8]) -> Result<Self, DesignatorError> {
        if code.len() != DESIGNATOR_LEN {
            return Err(DesignatorError::InvalidLength { len: code.len() });
        }
        if code[..DESIGNATOR_MAGIC_LEN] != DESIGNATOR_MAGIC {
            return Err(DesignatorError::InvalidMagic);
        }
        Ok(Self { implementation: Address::from_slice(&code[DESIGNATOR_MAGIC_LEN..]) })
    }
}

impl From<DelegationDesignator> for Bytes {
    fn from(designator: DelegationDesignator) -> Self {
        designator.to_bytes().into()
    }
}

/// Delegation classification of an account's code slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelegationStatus {
    /// Code length 0: a plain key-controlled account.
    Unattached,
    /// A valid 23-byte designator pointing at the contained implementation.
    Delegated(Address),
    /// Code that is neither empty nor a valid designator. Not a
    /// protocol-defined state; callers must surface it.
    Unexpected {
        /// Observed code length.
        code_len: usize,
    },
}

impl DelegationStatus {
    /// Classifies raw account code.
    pub fn classify(code: &[u8]) -> Self {
        if code.is_empty() {
            return Self::Unattached;
        }
        match DelegationDesignator::parse(code) {
            Ok(designator) => Self::Delegated(designator.implementation),
            Err(_) => Self::Unexpected { code_len: code.len() },
        }
    }

    /// Returns the implementation address when the account is delegated.
    pub const fn implementation(&self) -> Option<Address> {
        match self {
            Self::Delegated(implementation) => Some(*implementation),
            _ => None,
        }
    }
}
