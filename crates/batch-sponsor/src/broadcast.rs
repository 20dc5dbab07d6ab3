//! Transaction submission collaborator.
//!
//! Delivering a signed bundle to the network is not this protocol's job: the
//! broadcast layer is opaque, returns a transaction id or a delivery failure,
//! and is never retried on. [`LocalBroadcaster`] is the in-process stand-in
//! that journals submissions and derives deterministic ids.

use alloy_primitives::{keccak256, Address, Bytes, PrimitiveSignature, B256};
use auto_impl::auto_impl;
use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// A minimal submission envelope: who sends, at which transaction nonce,
/// carrying which payload. Delegation commits ride this as zero-value
/// self-transactions; sponsored batches ride it with the batch encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTx {
    /// The transaction sender.
    pub sender: Address,
    /// The sender's transaction nonce at signing time.
    pub nonce: u64,
    /// Opaque transaction payload.
    pub payload: Bytes,
}

impl SubmitTx {
    /// The hash the sender signs over.
    pub fn signing_hash(&self) -> B256 {
        let mut preimage = Vec::with_capacity(20 + 8 + self.payload.len());
        preimage.extend_from_slice(self.sender.as_slice());
        preimage.extend_from_slice(&self.nonce.to_be_bytes());
        preimage.extend_from_slice(&self.payload);
        keccak256(preimage)
    }
}

/// A submission together with the sender's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSubmission {
    /// The transaction body.
    pub tx: SubmitTx,
    /// Sender signature over [`SubmitTx::signing_hash`].
    pub signature: PrimitiveSignature,
}

/// Delivery failures reported by the broadcast layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastError {
    /// The bundle could not be delivered to the network.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivers fully-formed signed bundles to the network.
#[auto_impl(&mut, Box)]
pub trait Broadcaster: Debug {
    /// Submits `tx`, returning its transaction id.
    fn submit(&mut self, tx: SignedSubmission) -> Result<B256, BroadcastError>;
}

/// An in-process broadcaster that accepts every submission and journals it.
#[derive(Debug, Clone, Default)]
pub struct LocalBroadcaster {
    log: Vec<(B256, SignedSubmission)>,
}

impl LocalBroadcaster {
    /// Creates an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// The journal of accepted submissions, in delivery order.
    pub fn log(&self) -> &[(B256, SignedSubmission)] {
        &self.log
    }
}

impl Broadcaster for LocalBroadcaster {
    fn submit(&mut self, submission: SignedSubmission) -> Result<B256, BroadcastError> {
        let mut preimage = [0u8; 40];
        preimage[..32].copy_from_slice(submission.tx.signing_hash().as_slice());
        preimage[32..].copy_from_slice(&(self.log.len() as u64).to_be_bytes());
        let id = keccak256(preimage);
        self.log.push((id, submission));
        Ok(id)
    }
}
