//! Account state access.
//!
//! The protocol never reaches for an ambient provider. Everything it needs
//! from the execution environment ("can read account code", "can read and
//! move balances") is expressed by the [`StateAccess`] capability, injected
//! by the caller. [`MemoryState`] is the in-process implementation backed by
//! revm's [`CacheDB`].

use alloy_primitives::{Address, Bytes, U256};
use auto_impl::auto_impl;
use core::fmt::Debug;
use revm::{
    database::{AccountState, CacheDB, EmptyDB},
    primitives::KECCAK_EMPTY,
    state::{AccountInfo, Bytecode},
    Database,
};

/// Read/write access to account state.
///
/// Delegation and execution run entirely through this capability; swapping in
/// a different backend (a journaled overlay, an RPC-backed view) requires no
/// protocol changes. Missing accounts read as defaults.
#[auto_impl(&mut, Box)]
pub trait StateAccess: Debug {
    /// Account info for `address`, default for a never-seen account.
    fn account(&mut self, address: Address) -> AccountInfo;

    /// Replaces the account info for `address`.
    fn set_account(&mut self, address: Address, info: AccountInfo);

    /// Raw account code for `address`, empty when no code is present.
    fn code(&mut self, address: Address) -> Bytes;

    /// Replaces the account code for `address`. Empty code clears the slot.
    fn set_code(&mut self, address: Address, code: Bytes);

    /// Storage value at `slot` of `address`.
    fn storage(&mut self, address: Address, slot: U256) -> U256;

    /// Writes `value` to `slot` of `address`.
    fn set_storage(&mut self, address: Address, slot: U256, value: U256);

    /// Native balance of `address`.
    fn balance(&mut self, address: Address) -> U256 {
        self.account(address).balance
    }

    /// Sets the native balance of `address`.
    fn set_balance(&mut self, address: Address, balance: U256) {
        let mut info = self.account(address);
        info.balance = balance;
        self.set_account(address, info);
    }
}

/// An in-memory account store backed by [`CacheDB`].
#[derive(Debug, Default, Clone, derive_more::Deref, derive_more::DerefMut)]
pub struct MemoryState {
    #[deref]
    #[deref_mut]
    db: CacheDB<EmptyDB>,
}

impl MemoryState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the code for an account.
    pub fn set_account_code(&mut self, address: Address, code: Bytes) {
        StateAccess::set_code(self, address, code);
    }

    /// Sets the code for an account.
    #[must_use]
    pub fn account_code(mut self, address: Address, code: Bytes) -> Self {
        self.set_account_code(address, code);
        self
    }

    /// Sets the balance for an account.
    pub fn set_account_balance(&mut self, address: Address, balance: U256) {
        StateAccess::set_balance(self, address, balance);
    }

    /// Sets the balance for an account.
    #[must_use]
    pub fn account_balance(mut self, address: Address, balance: U256) -> Self {
        self.set_account_balance(address, balance);
        self
    }
}

impl StateAccess for MemoryState {
    fn account(&mut self, address: Address) -> AccountInfo {
        match self.db.basic(address) {
            Ok(info) => info.unwrap_or_default(),
            Err(err) => match err {},
        }
    }

    fn set_account(&mut self, address: Address, info: AccountInfo) {
        let account = match self.db.load_account(address) {
            Ok(account) => account,
            Err(err) => match err {},
        };
        account.info = info;
        account.account_state = AccountState::None;
    }

    fn code(&mut self, address: Address) -> Bytes {
        self.account(address).code.map(|code| code.original_bytes()).unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        let account = match self.db.load_account(address) {
            Ok(account) => account,
            Err(err) => match err {},
        };
        if code.is_empty() {
            account.info.code = None;
            account.info.code_hash = KECCAK_EMPTY;
        } else {
            let bytecode = Bytecode::new_legacy(code);
            account.info.code_hash = bytecode.hash_slow();
            account.info.code = Some(bytecode);
        }
        account.account_state = AccountState::None;
    }

    fn storage(&mut self, address: Address, slot: U256) -> U256 {
        match Database::storage(&mut self.db, address, slot) {
            Ok(value) => value,
            Err(err) => match err {},
        }
    }

    fn set_storage(&mut self, address: Address, slot: U256, value: U256) {
        match self.db.insert_account_storage(address, slot, value) {
            Ok(()) => {}
            Err(err) => match err {},
        }
    }
}
