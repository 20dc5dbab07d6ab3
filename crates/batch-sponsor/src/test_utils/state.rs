use alloy_primitives::{address, bytes, Address, B256, U256};
use alloy_signer_local::PrivateKeySigner;

use crate::{DelegationDesignator, MemoryState};

/// The shared implementation contract used by state fixtures.
pub const IMPLEMENTATION: Address = address!("00000000000000000000000000000000000b4001");

/// A signer with a deterministic key derived from `seed`.
pub fn signer(seed: u8) -> PrivateKeySigner {
    let mut key = B256::ZERO;
    key.0[31] = seed;
    key.0[0] = 0x01;
    PrivateKeySigner::from_bytes(&key).unwrap()
}

/// A state in which `owner` holds `balance` and is already delegated to
/// [`IMPLEMENTATION`], which carries non-empty code.
pub fn delegated_state(owner: &PrivateKeySigner, balance: U256) -> MemoryState {
    MemoryState::new()
        .account_code(IMPLEMENTATION, bytes!("60806040"))
        .account_code(owner.address(), DelegationDesignator::new(IMPLEMENTATION).into())
        .account_balance(owner.address(), balance)
}
