//! Attaching and detaching delegation designators.
//!
//! A staged designator only becomes binding once a zero-value
//! self-transaction commits it; until then the bytes are transient. The
//! commit is submitted through the injected [`Broadcaster`] and consumes one
//! transaction nonce of the owner account.

use alloy_primitives::{Address, Bytes};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::{
    Broadcaster, BroadcastError, SubmitTx, DelegationDesignator, DelegationStatus, SignedSubmission,
    StateAccess,
};

/// Errors raised while changing an account's delegation.
#[derive(Debug, thiserror::Error)]
pub enum DelegationError {
    /// The implementation is the zero address or has no executable code.
    #[error("implementation {0} is the zero address or has no code")]
    InvalidImplementation(Address),
    /// The commit transaction could not be delivered.
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
    /// The owner key refused to sign the commit transaction.
    #[error("commit signing failed: {0}")]
    Signer(#[from] alloy_signer::Error),
}

/// Classifies the delegation state of `account`. Pure query; never coerces
/// an unexpected code slot into a protocol-defined state.
pub fn delegation_status(state: &mut impl StateAccess, account: Address) -> DelegationStatus {
    DelegationStatus::classify(&state.code(account))
}

/// Sets and clears the designator routing an owner account's execution to
/// the shared implementation.
#[derive(Debug, Clone, Default)]
pub struct DelegationManager<B: Broadcaster> {
    broadcaster: B,
}

impl<B: Broadcaster> DelegationManager<B> {
    /// Creates a manager submitting commits through `broadcaster`.
    pub const fn new(broadcaster: B) -> Self {
        Self { broadcaster }
    }

    /// The underlying broadcaster.
    pub const fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    /// Mutable access to the underlying broadcaster.
    pub fn broadcaster_mut(&mut self) -> &mut B {
        &mut self.broadcaster
    }

    /// Delegates the owner account to `implementation`.
    ///
    /// Stages the 23-byte designator on the owner account and commits it via
    /// a zero-value self-transaction, making the delegation observable.
    pub fn attach(
        &mut self,
        state: &mut impl StateAccess,
        owner: &PrivateKeySigner,
        implementation: Address,
    ) -> Result<DelegationDesignator, DelegationError> {
        if implementation.is_zero() || state.code(implementation).is_empty() {
            return Err(DelegationError::InvalidImplementation(implementation));
        }

        let account = owner.address();
        let designator = DelegationDesignator::new(implementation);
        let previous = state.code(account);

        state.set_code(account, designator.into());
        if let Err(err) = self.commit(state, owner, designator.to_bytes().into()) {
            // The staged designator is not observable until the commit lands.
            state.set_code(account, previous);
            return Err(err);
        }
        Ok(designator)
    }

    /// Clears the owner account's delegation.
    ///
    /// Stages a zero-target designator; once the commit lands the account
    /// code reads back empty.
    pub fn detach(
        &mut self,
        state: &mut impl StateAccess,
        owner: &PrivateKeySigner,
    ) -> Result<(), DelegationError> {
        let account = owner.address();
        let staged = DelegationDesignator::new(Address::ZERO);
        let previous = state.code(account);

        state.set_code(account, staged.into());
        if let Err(err) = self.commit(state, owner, Bytes::new()) {
            state.set_code(account, previous);
            return Err(err);
        }
        state.set_code(account, Bytes::new());
        Ok(())
    }

    /// See [`delegation_status`].
    pub fn status(
        &self,
        state: &mut impl StateAccess,
        account: Address,
    ) -> DelegationStatus {
        delegation_status(state, account)
    }

    /// Signs and submits the zero-value self-transaction that makes a staged
    /// designator change observable.
    fn commit(
        &mut self,
        state: &mut impl StateAccess,
        owner: &PrivateKeySigner,
        payload: Bytes,
    ) -> Result<(), DelegationError> {
        let sender = owner.address();
        let mut info = state.account(sender);

        let tx = SubmitTx { sender, nonce: info.nonce, payload };
        let signature = owner.sign_hash_sync(&tx.signing_hash())?;
        self.broadcaster.submit(SignedSubmission { tx, signature })?;

        // The self-transaction consumes one transaction nonce.
        info.nonce += 1;
        state.set_account(sender, info);
        Ok(())
    }
}
