// Admin secret check for destructive operations

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

/// Configured admin password.
///
/// Only the SHA-256 digest is kept; it is wiped on drop. Verification compares
/// digests without early exit, so it is exact string equality that does not
/// leak the matching prefix length.
pub struct AdminSecret {
    digest: [u8; 32],
}

impl AdminSecret {
    pub fn new(password: &str) -> Self {
        AdminSecret {
            digest: Self::digest(password),
        }
    }

    fn digest(value: &str) -> [u8; 32] {
        let input = Zeroizing::new(value.as_bytes().to_vec());
        Sha256::digest(&*input).into()
    }

    /// True iff `candidate` equals the configured password
    pub fn verify(&self, candidate: &str) -> bool {
        let mut other = Self::digest(candidate);
        let diff = self
            .digest
            .iter()
            .zip(other.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        other.zeroize();
        diff == 0
    }
}

impl Drop for AdminSecret {
    fn drop(&mut self) {
        self.digest.zeroize();
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_exact_match_only() {
        let secret = AdminSecret::new("hunter2");
        assert!(secret.verify("hunter2"));
        assert!(!secret.verify("hunter"));
        assert!(!secret.verify("Hunter2"));
        assert!(!secret.verify("hunter2 "));
        assert!(!secret.verify(""));
    }

    #[test]
    fn test_debug_hides_secret() {
        let secret = AdminSecret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "AdminSecret(..)");
    }
}
