//! Execution outcomes and the executor error taxonomy.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::DelegationStatus;

/// The outcome of one call within a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    /// The called address.
    pub target: Address,
    /// Output returned by the call.
    pub output: Bytes,
}

/// The result of a fully committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The owner account the batch ran as.
    pub account: Address,
    /// The replay nonce this batch consumed.
    pub nonce: u64,
    /// Per-call outcomes, in execution order.
    pub outcomes: Vec<CallOutcome>,
}

/// Failures raised by batch execution.
///
/// Verification failures reject strictly before any state mutation; execution
/// failures roll the whole batch back. No variant is ever downgraded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ExecuteError {
    /// The account's code slot does not hold a valid designator.
    #[error("account {account} is not delegated: {status:?}")]
    InvalidDesignator {
        /// The account whose code slot was inspected.
        account: Address,
        /// What the code slot classified as instead.
        status: DelegationStatus,
    },
    /// Digest mismatch, unrecoverable signature, or a recovered signer that
    /// is not the delegated owner.
    #[error("authorization signature is invalid")]
    SignatureInvalid,
    /// The authorization's nonce snapshot no longer matches the current
    /// replay nonce. Covers both replay and staleness.
    #[error("nonce mismatch: authorization holds {provided}, account is at {current}")]
    NonceMismatch {
        /// The nonce the authorization was signed against.
        provided: u64,
        /// The account's current replay nonce.
        current: u64,
    },
    /// A call in the batch reverted; the whole batch was rolled back.
    #[error("call {index} reverted")]
    CallReverted {
        /// Zero-based index of the failing call.
        index: usize,
        /// Revert output from the failing call.
        output: Bytes,
    },
    /// The owner account cannot fund a call's value transfer.
    #[error("insufficient balance on {account}: need {required}, have {available}")]
    InsufficientBalance {
        /// The paying account.
        account: Address,
        /// Value the call required.
        required: U256,
        /// Balance actually available.
        available: U256,
    },
}
