//! Building transfer calls for a batch.
//!
//! Whether a transfer moves native value or an ERC-20 balance is an explicit
//! tagged choice, not an optional token field with fallback-on-absence.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};

use crate::Call;

sol! {
    function transfer(address to, uint256 amount) external returns (bool);
}

/// What a transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Native value, forwarded with the call itself.
    Native,
    /// An ERC-20 balance held by the contained token contract.
    Token(Address),
}

impl TransferKind {
    /// Builds the batch call moving `amount` to `recipient`.
    ///
    /// Native transfers carry the value directly with empty calldata; token
    /// transfers call `transfer(recipient, amount)` on the token contract
    /// with zero value.
    pub fn into_call(self, recipient: Address, amount: U256) -> Call {
        match self {
            Self::Native => Call::transfer(recipient, amount),
            Self::Token(token) => Call::new(
                token,
                U256::ZERO,
                transferCall { to: recipient, amount }.abi_encode().into(),
            ),
        }
    }
}
