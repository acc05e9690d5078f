//! Orchestrator configuration.

use std::fmt;
use std::sync::Arc;

use royalty_types::LedgerAddress;

use crate::capability::{Cipher, Verifier};
use crate::sealed::SealedCipher;

/// Everything an orchestrator needs besides the ledger handle itself.
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Address of the royalty contract every call targets.
    pub ledger_address: LedgerAddress,
    /// Backend producing ciphertexts and proofs.
    pub cipher: Arc<dyn Cipher>,
    /// Backend checking proofs before submission.
    pub verifier: Arc<dyn Verifier>,
}

impl OrchestratorConfig {
    pub fn new(
        ledger_address: LedgerAddress,
        cipher: Arc<dyn Cipher>,
        verifier: Arc<dyn Verifier>,
    ) -> Self {
        Self {
            ledger_address,
            cipher,
            verifier,
        }
    }

    /// Configuration backed by the sealed reference backend.
    pub fn sealed(ledger_address: LedgerAddress, cipher: SealedCipher) -> Self {
        let verifier = Arc::new(cipher.verifier());
        Self::new(ledger_address, Arc::new(cipher), verifier)
    }
}

impl fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("ledger_address", &self.ledger_address)
            .finish_non_exhaustive()
    }
}
