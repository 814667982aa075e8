use crate::error::{Result, SolcError};
use crate::types::HashKind;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// `0x`-prefixed lowercase hex, the format manifests use for digests.
fn prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn sha256_hex(data: &[u8]) -> String {
    prefixed_hex(&Sha256::digest(data))
}

/// Legacy (pre-NIST) Keccak-256, as used by Ethereum tooling.
pub fn keccak256_hex(data: &[u8]) -> String {
    prefixed_hex(&Keccak256::digest(data))
}

/// Check `data` against both declared digests. SHA-256 is checked first, so
/// it is the one reported when both disagree. Comparison is exact.
pub fn verify(sha256: &str, keccak256: &str, data: &[u8], platform: &str) -> Result<()> {
    if sha256_hex(data) != sha256 {
        return Err(SolcError::ChecksumMismatch {
            hash: HashKind::Sha256,
            platform: platform.to_string(),
        });
    }

    if keccak256_hex(data) != keccak256 {
        return Err(SolcError::ChecksumMismatch {
            hash: HashKind::Keccak256,
            platform: platform.to_string(),
        });
    }

    Ok(())
}
