//! Sponsored batch execution.
//!
//! The executor is the only component allowed to advance the replay nonce,
//! and it does so exactly once per fully committed batch. Verification runs
//! strictly before any state mutation; execution failures restore the
//! pre-batch snapshot, so a batch either applies whole or not at all.

use alloy_primitives::{Address, Bytes};
use auto_impl::auto_impl;
use core::fmt::Debug;

use crate::{
    batch_digest, delegation_status, Batch, BatchAuthorization, Call, CallOutcome,
    DelegationStatus, ExecuteError, ExecutionResult, NonceStore, StateAccess,
};

/// Revert signal from a call runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRevert {
    /// Revert output carried back to the caller.
    pub output: Bytes,
}

impl CallRevert {
    /// A revert with the given output.
    pub const fn with_output(output: Bytes) -> Self {
        Self { output }
    }
}

/// Applies a call's payload semantics.
///
/// The protocol treats calldata as opaque: whatever the payload means is the
/// execution environment's business, so it is injected here. Value transfers
/// are applied by the executor before the runner sees the call; a runner that
/// reverts rolls the entire batch back.
#[auto_impl(&mut, Box)]
pub trait CallRunner: Debug {
    /// Runs `call` as `sender`, returning its output.
    fn run(
        &mut self,
        state: &mut dyn StateAccess,
        sender: Address,
        call: &Call,
    ) -> Result<Bytes, CallRevert>;
}

/// A runner that leaves payloads uninterpreted and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallRunner;

impl CallRunner for NoopCallRunner {
    fn run(
        &mut self,
        _state: &mut dyn StateAccess,
        _sender: Address,
        _call: &Call,
    ) -> Result<Bytes, CallRevert> {
        Ok(Bytes::new())
    }
}

/// Verifies authorizations and executes batches atomically "as" the owner
/// account.
#[derive(Debug, Clone, Default)]
pub struct SponsoredExecutor<R: CallRunner = NoopCallRunner> {
    nonces: NonceStore,
    runner: R,
}

impl<R: CallRunner> SponsoredExecutor<R> {
    /// Creates an executor delegating payload semantics to `runner`.
    pub fn new(runner: R) -> Self {
        Self { nonces: NonceStore::new(), runner }
    }

    /// The current replay nonce of `account`.
    pub fn nonce(&self, account: Address) -> u64 {
        self.nonces.current(account)
    }

    /// The replay counters, for inspection.
    pub const fn nonces(&self) -> &NonceStore {
        &self.nonces
    }

    /// Executes a sponsored batch under an owner authorization.
    ///
    /// Preconditions, each checked in order before any state is touched:
    /// digest integrity, signer recovery against the delegated owner, and an
    /// exact nonce match. Two sponsors racing the same authorization resolve
    /// deterministically: the first commit advances the nonce and the loser
    /// fails with [`ExecuteError::NonceMismatch`], side-effect free.
    pub fn execute_sponsored<S: StateAccess + Clone>(
        &mut self,
        state: &mut S,
        batch: &Batch,
        authorization: &BatchAuthorization,
    ) -> Result<ExecutionResult, ExecuteError> {
        let account = authorization.signer;

        if authorization.digest != batch_digest(authorization.nonce, batch) {
            return Err(ExecuteError::SignatureInvalid);
        }

        let status = delegation_status(state, account);
        if !matches!(status, DelegationStatus::Delegated(_)) {
            return Err(ExecuteError::InvalidDesignator { account, status });
        }
        let recovered = authorization.recover().map_err(|_| ExecuteError::SignatureInvalid)?;
        if recovered != account {
            return Err(ExecuteError::SignatureInvalid);
        }

        let current = self.nonces.current(account);
        if authorization.nonce != current {
            return Err(ExecuteError::NonceMismatch { provided: authorization.nonce, current });
        }

        self.run_batch(state, account, batch)
    }

    /// Executes a batch directly submitted by the owner.
    ///
    /// The self-authorized path: no authorization, no sponsor, but the nonce
    /// advances identically. That is what lets an owner cancel a pending
    /// sponsored authorization by committing any batch first, even an empty
    /// one.
    pub fn execute_direct<S: StateAccess + Clone>(
        &mut self,
        state: &mut S,
        owner: Address,
        batch: &Batch,
    ) -> Result<ExecutionResult, ExecuteError> {
        let status = delegation_status(state, owner);
        if !matches!(status, DelegationStatus::Delegated(_)) {
            return Err(ExecuteError::InvalidDesignator { account: owner, status });
        }

        self.run_batch(state, owner, batch)
    }

    /// Runs all calls against a snapshot boundary and commits the nonce on
    /// full success.
    fn run_batch<S: StateAccess + Clone>(
        &mut self,
        state: &mut S,
        account: Address,
        batch: &Batch,
    ) -> Result<ExecutionResult, ExecuteError> {
        let snapshot = state.clone();
        match self.run_calls(state, account, batch) {
            Ok(outcomes) => {
                let nonce = self.nonces.current(account);
                self.nonces.advance(account);
                Ok(ExecutionResult { account, nonce, outcomes })
            }
            Err(err) => {
                *state = snapshot;
                Err(err)
            }
        }
    }

    fn run_calls<S: StateAccess>(
        &mut self,
        state: &mut S,
        account: Address,
        batch: &Batch,
    ) -> Result<Vec<CallOutcome>, ExecuteError> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for (index, call) in batch.calls().iter().enumerate() {
            if !call.value.is_zero() {
                let available = state.balance(account);
                if available < call.value {
                    return Err(ExecuteError::InsufficientBalance {
                        account,
                        required: call.value,
                        available,
                    });
                }
                state.set_balance(account, available - call.value);
                let target_balance = state.balance(call.target);
                state.set_balance(call.target, target_balance + call.value);
            }

            let output = self
                .runner
                .run(&mut *state, account, call)
                .map_err(|revert| ExecuteError::CallReverted { index, output: revert.output })?;
            outcomes.push(CallOutcome { target: call.target, output });
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::DESIGNATOR_MAGIC, test_utils::delegated_state, DelegationDesignator,
        MemoryState,
    };
    use alloy_primitives::{address, U256};
    use alloy_signer_local::PrivateKeySigner;

    const RECIPIENT: Address = address!("0000000000000000000000000000000000001ec1");

    #[test]
    fn direct_execution_moves_value_and_advances_the_nonce() {
        let owner = PrivateKeySigner::random();
        let mut state = delegated_state(&owner, U256::from(1_000));
        let mut executor = SponsoredExecutor::<NoopCallRunner>::default();

        let batch = Batch::new().with_call(Call::transfer(RECIPIENT, U256::from(100)));
        let result = executor.execute_direct(&mut state, owner.address(), &batch).unwrap();

        assert_eq!(result.account, owner.address());
        assert_eq!(result.nonce, 0);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(state.balance(owner.address()), U256::from(900));
        assert_eq!(state.balance(RECIPIENT), U256::from(100));
        assert_eq!(executor.nonce(owner.address()), 1);
    }

    #[test]
    fn direct_execution_requires_a_designator() {
        let owner = PrivateKeySigner::random();
        let mut state = MemoryState::new().account_balance(owner.address(), U256::from(1_000));
        let mut executor = SponsoredExecutor::<NoopCallRunner>::default();

        let err = executor.execute_direct(&mut state, owner.address(), &Batch::new()).unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::InvalidDesignator { status: DelegationStatus::Unattached, .. }
        ));
        assert_eq!(executor.nonce(owner.address()), 0);
    }

    #[test]
    fn unexpected_code_is_surfaced_not_coerced() {
        let owner = PrivateKeySigner::random();
        let mut bad = DelegationDesignator::new(RECIPIENT).to_bytes();
        bad[0] = 0xfe;
        assert_ne!(&bad[..3], &DESIGNATOR_MAGIC);

        let mut state = MemoryState::new().account_code(owner.address(), bad.into());
        let mut executor = SponsoredExecutor::<NoopCallRunner>::default();

        let err = executor.execute_direct(&mut state, owner.address(), &Batch::new()).unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::InvalidDesignator {
                status: DelegationStatus::Unexpected { code_len: 23 },
                ..
            }
        ));
    }

    #[test]
    fn underfunded_transfer_rolls_back_whole_batch() {
        let owner = PrivateKeySigner::random();
        let mut state = delegated_state(&owner, U256::from(150));
        let mut executor = SponsoredExecutor::<NoopCallRunner>::default();

        // First call fits, second does not; neither may stick.
        let batch = Batch::new()
            .with_call(Call::transfer(RECIPIENT, U256::from(100)))
            .with_call(Call::transfer(RECIPIENT, U256::from(100)));

        let err = executor.execute_direct(&mut state, owner.address(), &batch).unwrap_err();
        assert!(matches!(err, ExecuteError::InsufficientBalance { required, available, .. }
            if required == U256::from(100) && available == U256::from(50)));

        assert_eq!(state.balance(owner.address()), U256::from(150));
        assert_eq!(state.balance(RECIPIENT), U256::ZERO);
        assert_eq!(executor.nonce(owner.address()), 0);
    }

    #[test]
    fn empty_batch_is_a_nonce_bumping_no_op() {
        let owner = PrivateKeySigner::random();
        let mut state = delegated_state(&owner, U256::from(10));
        let mut executor = SponsoredExecutor::<NoopCallRunner>::default();

        let result = executor.execute_direct(&mut state, owner.address(), &Batch::new()).unwrap();
        assert!(result.outcomes.is_empty());
        assert_eq!(executor.nonce(owner.address()), 1);
        assert_eq!(state.balance(owner.address()), U256::from(10));
    }

    #[test]
    fn self_transfer_is_balance_neutral() {
        let owner = PrivateKeySigner::random();
        let mut state = delegated_state(&owner, U256::from(500));
        let mut executor = SponsoredExecutor::<NoopCallRunner>::default();

        let batch = Batch::new().with_call(Call::transfer(owner.address(), U256::from(300)));
        executor.execute_direct(&mut state, owner.address(), &batch).unwrap();

        assert_eq!(state.balance(owner.address()), U256::from(500));
    }
}
