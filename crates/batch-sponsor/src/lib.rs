//! Delegated, sponsor-paid batch execution for EIP-7702 style smart accounts.
//!
//! An owner signs a batch of calls once, off-chain, bound to a per-account
//! replay nonce. A sponsor then submits the batch and pays for its execution,
//! while the protocol guarantees the authorization cannot be replayed,
//! reordered, or partially applied.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod authorization;
pub use authorization::*;

mod broadcast;
pub use broadcast::*;

mod codec;
pub use codec::*;

mod delegation;
pub use delegation::*;

mod designator;
pub use designator::*;

mod executor;
pub use executor::*;

mod nonce;
pub use nonce::*;

mod result;
pub use result::*;

mod session;
pub use session::*;

mod state;
pub use state::*;

mod transfer;
pub use transfer::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
