use alloy_primitives::{Address, Bytes};

use crate::{Call, CallRevert, CallRunner, StateAccess};

/// A runner that journals every call it sees and always succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    calls: Vec<(Address, Call)>,
}

impl RecordingRunner {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded `(sender, call)` pairs, in execution order.
    pub fn calls(&self) -> &[(Address, Call)] {
        &self.calls
    }
}

impl CallRunner for RecordingRunner {
    fn run(
        &mut self,
        _state: &mut dyn StateAccess,
        sender: Address,
        call: &Call,
    ) -> Result<Bytes, CallRevert> {
        self.calls.push((sender, call.clone()));
        Ok(call.data.clone())
    }
}

/// A runner that reverts the call at a configured index.
#[derive(Debug, Clone)]
pub struct RevertingRunner {
    revert_at: usize,
    output: Bytes,
    seen: usize,
}

impl RevertingRunner {
    /// Reverts the call at `revert_at` (counted per batch attempt) with
    /// `output`; every other call succeeds.
    pub fn new(revert_at: usize, output: Bytes) -> Self {
        Self { revert_at, output, seen: 0 }
    }
}

impl CallRunner for RevertingRunner {
    fn run(
        &mut self,
        _state: &mut dyn StateAccess,
        _sender: Address,
        _call: &Call,
    ) -> Result<Bytes, CallRevert> {
        let index = self.seen;
        self.seen += 1;
        if index == self.revert_at {
            return Err(CallRevert::with_output(self.output.clone()));
        }
        Ok(Bytes::new())
    }
}
