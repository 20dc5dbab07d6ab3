//! Batch call types and their canonical digest encoding.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// One unit of work in a batch: a call made "as" the owner account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// The called address.
    pub target: Address,
    /// Native value forwarded with the call.
    pub value: U256,
    /// Opaque calldata. The protocol never interprets it.
    pub data: Bytes,
}

impl Call {
    /// Creates a call with the given target, value, and calldata.
    pub const fn new(target: Address, value: U256, data: Bytes) -> Self {
        Self { target, value, data }
    }

    /// Creates a plain value transfer with empty calldata.
    pub const fn transfer(target: Address, value: U256) -> Self {
        Self { target, value, data: Bytes::new() }
    }
}

/// An ordered sequence of calls executed atomically. Insertion order is
/// significant; an empty batch is a legal no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    calls: Vec<Call>,
}

impl Batch {
    /// Creates an empty batch.
    pub const fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Appends a call, preserving insertion order.
    pub fn push(&mut self, call: Call) {
        self.calls.push(call);
    }

    /// Builder-style [`Self::push`].
    #[must_use]
    pub fn with_call(mut self, call: Call) -> Self {
        self.push(call);
        self
    }

    /// The calls in execution order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Number of calls in the batch.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the batch contains no calls.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Encodes the batch into the canonical byte string consumed for hashing.
    ///
    /// Per call: `target (20 bytes) || value (32 bytes, big-endian) || data`.
    /// The calldata carries no length delimiter, so the concatenation of a
    /// multi-call batch is not decodable without outside knowledge of the
    /// call shapes. That matches the signed wire format exactly; this
    /// encoding exists only as a digest preimage and must not change.
    pub fn encode(&self) -> Bytes {
        let len: usize = self.calls.iter().map(|call| 52 + call.data.len()).sum();
        let mut out = Vec::with_capacity(len);
        for call in &self.calls {
            out.extend_from_slice(call.target.as_slice());
            out.extend_from_slice(&call.value.to_be_bytes::<32>());
            out.extend_from_slice(&call.data);
        }
        out.into()
    }
}

impl FromIterator<Call> for Batch {
    fn from_iter<I: IntoIterator<Item = Call>>(iter: I) -> Self {
        Self { calls: iter.into_iter().collect() }
    }
}

impl From<Vec<Call>> for Batch {
    fn from(calls: Vec<Call>) -> Self {
        Self { calls }
    }
}
