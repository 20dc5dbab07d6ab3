//! Explicit session context.
//!
//! The connected account, the in-flight flag, and the collaborators behind a
//! submission are threaded through one owned object instead of living in
//! module-level globals. Owner-side operations require the owner's account to
//! be connected; a second submission while one is in flight is rejected, not
//! queued.

use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::{
    Batch, BatchAuthorization, BroadcastError, Broadcaster, CallRunner, DelegationDesignator,
    DelegationError, DelegationManager, DelegationStatus, ExecuteError, ExecutionResult,
    LocalBroadcaster, MemoryState, NoopCallRunner, SignedSubmission, SponsoredExecutor, StateAccess,
    SubmitTx,
};

/// Errors raised by session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a connected account, and either none is connected
    /// or a different one is.
    #[error("no matching connected account")]
    NotConnected,
    /// A submission is already in flight; concurrent submissions are
    /// rejected, not queued.
    #[error("a submission is already in flight")]
    Busy,
    /// The batch was rejected or rolled back by the executor.
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    /// A delegation change failed.
    #[error(transparent)]
    Delegation(#[from] DelegationError),
    /// The submission transaction could not be delivered.
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
    /// A key refused to sign.
    #[error("signing failed: {0}")]
    Signer(#[from] alloy_signer::Error),
}

/// A session binding state, executor, and delegation manager to one
/// connected account.
#[derive(Debug, Clone)]
pub struct SponsorSession<R: CallRunner = NoopCallRunner, B: Broadcaster = LocalBroadcaster> {
    state: MemoryState,
    executor: SponsoredExecutor<R>,
    manager: DelegationManager<B>,
    connected: Option<Address>,
    in_flight: bool,
}

impl Default for SponsorSession {
    fn default() -> Self {
        Self::new(MemoryState::new())
    }
}

impl SponsorSession {
    /// Creates a session over `state` with the default runner and an
    /// in-process broadcaster.
    pub fn new(state: MemoryState) -> Self {
        Self::with_parts(state, NoopCallRunner, LocalBroadcaster::new())
    }
}

impl<R: CallRunner, B: Broadcaster> SponsorSession<R, B> {
    /// Creates a session from explicit collaborators.
    pub fn with_parts(state: MemoryState, runner: R, broadcaster: B) -> Self {
        Self {
            state,
            executor: SponsoredExecutor::new(runner),
            manager: DelegationManager::new(broadcaster),
            connected: None,
            in_flight: false,
        }
    }

    /// Connects `account`, replacing any previous connection.
    pub fn connect(&mut self, account: Address) {
        self.connected = Some(account);
    }

    /// Drops the current connection.
    pub fn disconnect(&mut self) {
        self.connected = None;
    }

    /// The currently connected account, if any.
    pub const fn connected(&self) -> Option<Address> {
        self.connected
    }

    /// Whether a submission is currently in flight.
    pub const fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// The session's state.
    pub const fn state(&self) -> &MemoryState {
        &self.state
    }

    /// Mutable access to the session's state.
    pub fn state_mut(&mut self) -> &mut MemoryState {
        &mut self.state
    }

    /// The current replay nonce of `account`.
    pub fn nonce(&self, account: Address) -> u64 {
        self.executor.nonce(account)
    }

    /// The broadcaster behind this session.
    pub const fn broadcaster(&self) -> &B {
        self.manager.broadcaster()
    }

    /// The delegation status of `account`.
    pub fn delegation_status(&mut self, account: Address) -> DelegationStatus {
        self.manager.status(&mut self.state, account)
    }

    /// Delegates the connected owner account to `implementation`.
    pub fn attach(
        &mut self,
        owner: &PrivateKeySigner,
        implementation: Address,
    ) -> Result<DelegationDesignator, SessionError> {
        self.require_connected(owner.address())?;
        Ok(self.manager.attach(&mut self.state, owner, implementation)?)
    }

    /// Clears the connected owner account's delegation.
    pub fn detach(&mut self, owner: &PrivateKeySigner) -> Result<(), SessionError> {
        self.require_connected(owner.address())?;
        Ok(self.manager.detach(&mut self.state, owner)?)
    }

    /// Signs `batch` at the owner's current replay nonce.
    ///
    /// Pure and local: no state is touched and nothing is submitted. The
    /// authorization stays valid only while the replay nonce reads the same.
    pub fn authorize(
        &mut self,
        owner: &PrivateKeySigner,
        batch: &Batch,
    ) -> Result<BatchAuthorization, SessionError> {
        self.require_connected(owner.address())?;
        let nonce = self.executor.nonce(owner.address());
        Ok(BatchAuthorization::sign(owner, nonce, batch)?)
    }

    /// Submits an owner-authorized batch on the sponsor's dime.
    ///
    /// The sponsor signs and broadcasts the carrying transaction, consuming
    /// one of its own transaction nonces, then the batch executes as the
    /// owner. Returns the transaction id together with the execution result.
    pub fn submit_sponsored(
        &mut self,
        sponsor: &PrivateKeySigner,
        batch: &Batch,
        authorization: &BatchAuthorization,
    ) -> Result<(B256, ExecutionResult), SessionError> {
        self.begin()?;
        let outcome = self.submit_sponsored_inner(sponsor, batch, authorization);
        self.in_flight = false;
        outcome
    }

    /// Submits a batch directly as the connected owner, no sponsor involved.
    ///
    /// Advances the replay nonce exactly like the sponsored path, so an
    /// owner can invalidate a pending sponsored authorization by submitting
    /// any batch first, even an empty one.
    pub fn submit_direct(
        &mut self,
        owner: &PrivateKeySigner,
        batch: &Batch,
    ) -> Result<(B256, ExecutionResult), SessionError> {
        self.require_connected(owner.address())?;
        self.begin()?;
        let outcome = self.submit_direct_inner(owner, batch);
        self.in_flight = false;
        outcome
    }

    fn submit_sponsored_inner(
        &mut self,
        sponsor: &PrivateKeySigner,
        batch: &Batch,
        authorization: &BatchAuthorization,
    ) -> Result<(B256, ExecutionResult), SessionError> {
        let id = self.broadcast(sponsor, batch)?;
        let result = self.executor.execute_sponsored(&mut self.state, batch, authorization)?;
        Ok((id, result))
    }

    fn submit_direct_inner(
        &mut self,
        owner: &PrivateKeySigner,
        batch: &Batch,
    ) -> Result<(B256, ExecutionResult), SessionError> {
        let id = self.broadcast(owner, batch)?;
        let result = self.executor.execute_direct(&mut self.state, owner.address(), batch)?;
        Ok((id, result))
    }

    /// Signs and delivers the transaction carrying `batch`, consuming one
    /// transaction nonce of `sender`.
    fn broadcast(
        &mut self,
        sender: &PrivateKeySigner,
        batch: &Batch,
    ) -> Result<B256, SessionError> {
        let address = sender.address();
        let mut info = self.state.account(address);

        let tx = SubmitTx { sender: address, nonce: info.nonce, payload: batch.encode() };
        let signature = sender.sign_hash_sync(&tx.signing_hash())?;
        let id = self.manager.broadcaster_mut().submit(SignedSubmission { tx, signature })?;

        info.nonce += 1;
        self.state.set_account(address, info);
        Ok(id)
    }

    fn require_connected(&self, expected: Address) -> Result<(), SessionError> {
        if self.connected != Some(expected) {
            return Err(SessionError::NotConnected);
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        self.in_flight = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::delegated_state, Call};
    use alloy_primitives::{address, U256};

    const RECIPIENT: Address = address!("0000000000000000000000000000000000007e57");

    fn connected_session(owner: &PrivateKeySigner, balance: U256) -> SponsorSession {
        let mut session = SponsorSession::new(delegated_state(owner, balance));
        session.connect(owner.address());
        session
    }

    #[test]
    fn authorize_requires_the_owner_to_be_connected() {
        let owner = PrivateKeySigner::random();
        let mut session = SponsorSession::new(delegated_state(&owner, U256::from(100)));

        let err = session.authorize(&owner, &Batch::new()).unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));

        session.connect(address!("00000000000000000000000000000000000000aa"));
        let err = session.authorize(&owner, &Batch::new()).unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }

    #[test]
    fn sponsored_submission_pays_from_the_sponsor_nonce() {
        let owner = PrivateKeySigner::random();
        let sponsor = PrivateKeySigner::random();
        let mut session = connected_session(&owner, U256::from(1_000));

        let batch = Batch::new().with_call(Call::transfer(RECIPIENT, U256::from(400)));
        let authorization = session.authorize(&owner, &batch).unwrap();

        let (id, result) = session.submit_sponsored(&sponsor, &batch, &authorization).unwrap();
        assert_ne!(id, B256::ZERO);
        assert_eq!(result.account, owner.address());
        assert_eq!(result.nonce, 0);

        // The owner pays value, the sponsor pays the transaction.
        assert_eq!(session.state_mut().balance(RECIPIENT), U256::from(400));
        assert_eq!(session.state_mut().account(sponsor.address()).nonce, 1);
        assert_eq!(session.nonce(owner.address()), 1);
        assert_eq!(session.broadcaster().log().len(), 1);
    }

    #[test]
    fn replaying_an_authorization_is_rejected() {
        let owner = PrivateKeySigner::random();
        let sponsor = PrivateKeySigner::random();
        let mut session = connected_session(&owner, U256::from(1_000));

        let batch = Batch::new().with_call(Call::transfer(RECIPIENT, U256::from(100)));
        let authorization = session.authorize(&owner, &batch).unwrap();

        session.submit_sponsored(&sponsor, &batch, &authorization).unwrap();
        let err = session.submit_sponsored(&sponsor, &batch, &authorization).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Execute(ExecuteError::NonceMismatch { provided: 0, current: 1 })
        ));

        // Only the first submission moved value.
        assert_eq!(session.state_mut().balance(RECIPIENT), U256::from(100));
        assert!(!session.in_flight());
    }

    #[test]
    fn direct_submission_invalidates_a_pending_authorization() {
        let owner = PrivateKeySigner::random();
        let sponsor = PrivateKeySigner::random();
        let mut session = connected_session(&owner, U256::from(1_000));

        let batch = Batch::new().with_call(Call::transfer(RECIPIENT, U256::from(100)));
        let pending = session.authorize(&owner, &batch).unwrap();

        // Empty batch, still consumes the replay nonce.
        session.submit_direct(&owner, &Batch::new()).unwrap();

        let err = session.submit_sponsored(&sponsor, &batch, &pending).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Execute(ExecuteError::NonceMismatch { provided: 0, current: 1 })
        ));
    }

    #[test]
    fn disconnecting_blocks_owner_side_operations() {
        let owner = PrivateKeySigner::random();
        let mut session = connected_session(&owner, U256::from(10));

        session.disconnect();
        assert_eq!(session.connected(), None);
        let err = session.submit_direct(&owner, &Batch::new()).unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }
}
