//! Owner-side batch authorization.
//!
//! Signing is a pure, local operation: it consumes the batch encoding and a
//! nonce snapshot, and touches no shared state. The resulting authorization
//! is valid only while the account's replay nonce still reads the snapshot,
//! and is consumed exactly once.

use alloy_primitives::{
    eip191_hash_message, keccak256, Address, PrimitiveSignature, SignatureError, B256, U256,
};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DIGEST_NONCE_LEN, SIGNATURE_LEN},
    Batch,
};

/// The digest an authorization commits to:
/// `keccak256(nonce (32 bytes, big-endian) || batch encoding)`.
pub fn batch_digest(nonce: u64, batch: &Batch) -> B256 {
    let encoded = batch.encode();
    let mut preimage = Vec::with_capacity(DIGEST_NONCE_LEN + encoded.len());
    preimage.extend_from_slice(&U256::from(nonce).to_be_bytes::<32>());
    preimage.extend_from_slice(&encoded);
    keccak256(preimage)
}

/// The hash actually signed: the batch digest wrapped in the EIP-191
/// personal-message convention.
pub fn signing_hash(digest: B256) -> B256 {
    eip191_hash_message(digest)
}

/// An owner's consent to execute a specific batch at a specific nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAuthorization {
    /// The owner address, derived from the signing key.
    pub signer: Address,
    /// The replay nonce this authorization is bound to.
    pub nonce: u64,
    /// The batch digest the signature commits to.
    pub digest: B256,
    /// Secp256k1 signature over the EIP-191 wrapped digest.
    pub signature: PrimitiveSignature,
}

impl BatchAuthorization {
    /// Signs `batch` at `nonce` with the owner key.
    pub fn sign(
        owner: &PrivateKeySigner,
        nonce: u64,
        batch: &Batch,
    ) -> Result<Self, alloy_signer::Error> {
        let digest = batch_digest(nonce, batch);
        let signature = owner.sign_hash_sync(&signing_hash(digest))?;
        Ok(Self { signer: owner.address(), nonce, digest, signature })
    }

    /// Recovers the signing address from the signature.
    pub fn recover(&self) -> Result<Address, SignatureError> {
        self.signature.recover_address_from_prehash(&signing_hash(self.digest))
    }

    /// Packs the signature as `r (32) || s (32) || v (1, 27 or 28)`.
    pub fn signature_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.signature.r().to_be_bytes::<32>());
        out[32..64].copy_from_slice(&self.signature.s().to_be_bytes::<32>());
        out[64] = 27 + u8::from(self.signature.v());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Call;
    use alloy_primitives::{address, b256, U256};

    #[test]
    fn digest_of_empty_batch_at_nonce_zero() {
        // keccak256 of 32 zero bytes.
        assert_eq!(
            batch_digest(0, &Batch::new()),
            b256!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
        );
    }

    #[test]
    fn digest_binds_the_nonce() {
        let batch = Batch::new()
            .with_call(Call::transfer(address!("1111111111111111111111111111111111111111"), U256::from(1)));
        assert_ne!(batch_digest(0, &batch), batch_digest(1, &batch));
    }

    #[test]
    fn sign_recovers_to_the_owner() {
        let owner = PrivateKeySigner::random();
        let batch = Batch::new()
            .with_call(Call::transfer(address!("2222222222222222222222222222222222222222"), U256::from(100)));

        let authorization = BatchAuthorization::sign(&owner, 0, &batch).unwrap();

        assert_eq!(authorization.signer, owner.address());
        assert_eq!(authorization.nonce, 0);
        assert_eq!(authorization.digest, batch_digest(0, &batch));
        assert_eq!(authorization.recover().unwrap(), owner.address());
    }

    #[test]
    fn signature_bytes_layout() {
        let owner = PrivateKeySigner::random();
        let authorization = BatchAuthorization::sign(&owner, 3, &Batch::new()).unwrap();

        let bytes = authorization.signature_bytes();
        assert_eq!(bytes.len(), SIGNATURE_LEN);
        assert_eq!(&bytes[..32], &authorization.signature.r().to_be_bytes::<32>());
        assert_eq!(&bytes[32..64], &authorization.signature.s().to_be_bytes::<32>());
        assert!(bytes[64] == 27 || bytes[64] == 28);
    }

    #[test]
    fn authorization_survives_json_round_trip() {
        let owner = PrivateKeySigner::random();
        let authorization = BatchAuthorization::sign(&owner, 7, &Batch::new()).unwrap();

        let json = serde_json::to_string(&authorization).unwrap();
        let decoded: BatchAuthorization = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, authorization);
        assert_eq!(decoded.recover().unwrap(), owner.address());
    }

    #[test]
    fn tampered_signature_recovers_elsewhere() {
        let owner = PrivateKeySigner::random();
        let mut authorization = BatchAuthorization::sign(&owner, 0, &Batch::new()).unwrap();

        authorization.signature = PrimitiveSignature::new(
            authorization.signature.r(),
            authorization.signature.s(),
            !authorization.signature.v(),
        );

        // Flipping the parity either fails recovery or yields a different address.
        if let Ok(address) = authorization.recover() {
            assert_ne!(address, owner.address());
        }
    }
}
