//! Constants for the delegation designator and authorization digest layout.

use alloy_primitives::hex;

/// Magic prefix identifying account code as a delegation designator.
///
/// Accounts whose code starts with these three bytes route execution to the
/// implementation address packed behind the prefix.
pub const DESIGNATOR_MAGIC: [u8; 3] = hex!("ef0100");

/// Length of the magic prefix.
pub const DESIGNATOR_MAGIC_LEN: usize = 3;

/// Total designator length: 3 (magic) + 20 (implementation address) = 23 bytes.
pub const DESIGNATOR_LEN: usize = 23;

/// Width of the nonce when packed into the authorization digest preimage.
///
/// The nonce is carried as a full 256-bit big-endian word, matching
/// `abi.encodePacked(uint256)`.
pub const DIGEST_NONCE_LEN: usize = 32;

/// Length of the packed `r || s || v` signature encoding.
pub const SIGNATURE_LEN: usize = 65;
