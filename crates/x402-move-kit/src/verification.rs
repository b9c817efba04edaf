//! Verification of presented proofs against a ledger.

use chrono::Utc;
use serde_json::Value;
use x402_move_core::{
    payment::ExpectedPayment,
    receipt::Receipt,
    verifier::{RejectReason, Verdict, verify},
};

use crate::{cache::VerdictCache, ledger::Ledger};

/// Why a proof could not be verified. Rejections are not errors; see [`Verdict`].
#[derive(Debug, thiserror::Error)]
pub enum VerificationError<E: std::error::Error + 'static> {
    /// The proof is empty or otherwise unusable. Nothing was looked up.
    #[error("Invalid payment proof: {0}")]
    InvalidProof(String),
    /// The ledger lookup failed. Safe to retry.
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(#[source] E),
}

impl<E: std::error::Error + 'static> VerificationError<E> {
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::LedgerUnavailable(_))
    }
}

/// The verdict for a proof, together with the record it was derived from.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub verdict: Verdict,
    /// The raw ledger record. `None` when the ledger does not know the proof.
    pub transaction: Option<Value>,
}

/// Verifies proofs for one expected payment against a ledger.
///
/// Finalized acceptances are cached by proof. Pending acceptances are looked up again on every
/// call so a caller polling a pending payment eventually observes it as final.
#[derive(Debug, Clone)]
pub struct ProofVerifier<L> {
    ledger: L,
    expected: ExpectedPayment,
    chain_id: String,
    cache: VerdictCache,
}

#[bon::bon]
impl<L: Ledger> ProofVerifier<L> {
    #[builder]
    pub fn new(
        ledger: L,
        expected: ExpectedPayment,
        #[builder(into)] chain_id: String,
        #[builder(default)] cache: VerdictCache,
    ) -> Self {
        ProofVerifier {
            ledger,
            expected,
            chain_id,
            cache,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn expected(&self) -> &ExpectedPayment {
        &self.expected
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// Verify a proof, serving finalized acceptances from the cache.
    pub async fn verify_proof(&self, proof: &str) -> Result<Verdict, VerificationError<L::Error>> {
        let proof = validate_proof(proof)?;

        if let Some(acceptance) = self.cache.get(proof) {
            #[cfg(feature = "tracing")]
            tracing::debug!(proof, "Serving cached payment acceptance");

            return Ok(Verdict::Accepted(acceptance));
        }

        Ok(self.inspect(proof).await?.verdict)
    }

    /// Look up and verify a proof, bypassing the cache, and return the record with the verdict.
    pub async fn inspect(&self, proof: &str) -> Result<Inspection, VerificationError<L::Error>> {
        let proof = validate_proof(proof)?;

        let transaction = self
            .ledger
            .transaction_by_hash(proof)
            .await
            .map_err(|err| {
                #[cfg(feature = "tracing")]
                tracing::warn!(proof, "Ledger lookup failed: {err}");

                VerificationError::LedgerUnavailable(err)
            })?;

        let verdict = verify(transaction.as_ref(), &self.expected);
        if let Verdict::Accepted(acceptance) = &verdict {
            self.cache.insert(proof, acceptance);
        }

        Ok(Inspection {
            verdict,
            transaction,
        })
    }

    /// Verify a proof and build its receipt.
    pub async fn receipt(
        &self,
        proof: &str,
    ) -> Result<Result<Receipt, RejectReason>, VerificationError<L::Error>> {
        let verdict = self.verify_proof(proof).await?;
        Ok(self.receipt_for(proof, verdict))
    }

    /// Build the receipt for an already computed verdict.
    pub fn receipt_for(&self, proof: &str, verdict: Verdict) -> Result<Receipt, RejectReason> {
        verdict
            .into_result()
            .map(|acceptance| Receipt::from_acceptance(&acceptance, proof, &self.chain_id, Utc::now()))
    }
}

fn validate_proof<E: std::error::Error>(proof: &str) -> Result<&str, VerificationError<E>> {
    let proof = proof.trim();
    if proof.is_empty() {
        return Err(VerificationError::InvalidProof(
            "Proof must not be empty".to_string(),
        ));
    }
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use x402_move_core::verifier::Settlement;

    use super::*;
    use crate::ledger::MemoryLedger;

    fn expected() -> ExpectedPayment {
        ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount("1000")
            .package_address("0xDEO")
            .token("deo::usdc::USDC")
            .build()
    }

    fn payment(kind: &str, hash: &str) -> Value {
        json!({
            "type": kind,
            "hash": hash,
            "sender": "0xAGENT",
            "success": true,
            "payload": {
                "type": "entry_function_payload",
                "function": "0xDEO::treasury::pay_merchant",
                "arguments": ["0xMERCHANT", "1000"]
            }
        })
    }

    fn verifier(ledger: MemoryLedger) -> ProofVerifier<MemoryLedger> {
        ProofVerifier::builder()
            .ledger(ledger)
            .expected(expected())
            .chain_id("movement_testnet")
            .build()
    }

    #[tokio::test]
    async fn test_empty_proof_is_invalid() {
        let verifier = verifier(MemoryLedger::default());
        for proof in ["", "   "] {
            let err = verifier.verify_proof(proof).await.unwrap_err();
            assert!(matches!(err, VerificationError::InvalidProof(_)));
            assert!(!err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_unknown_proof_is_bad_transaction() {
        let verifier = verifier(MemoryLedger::default());
        let verdict = verifier.verify_proof("0xmissing").await.unwrap();
        assert_eq!(verdict.reason(), Some(&RejectReason::BadTransaction));
    }

    #[tokio::test]
    async fn test_final_acceptance_is_cached() {
        let mut ledger = MemoryLedger::default();
        ledger.insert_transaction(payment("user_transaction", "0xfinal"));
        let verifier = verifier(ledger);

        let first = verifier.verify_proof("0xfinal").await.unwrap();
        assert_eq!(first.acceptance().unwrap().settlement, Settlement::Final);
        assert_eq!(verifier.cache().len(), 1);

        let second = verifier.verify_proof(" 0xfinal ").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(verifier.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_pending_acceptance_is_not_cached() {
        let mut ledger = MemoryLedger::default();
        ledger.insert_transaction(payment("pending_transaction", "0xpending"));
        let verifier = verifier(ledger);

        let verdict = verifier.verify_proof("0xpending").await.unwrap();
        assert_eq!(verdict.acceptance().unwrap().settlement, Settlement::Fast);
        assert!(verifier.cache().is_empty());
    }

    #[tokio::test]
    async fn test_receipt() {
        let mut ledger = MemoryLedger::default();
        ledger.insert_transaction(payment("user_transaction", "0xfinal"));
        let verifier = verifier(ledger);

        let receipt = verifier.receipt("0xfinal").await.unwrap().unwrap();
        assert_eq!(receipt.tx_hash, "0xfinal");
        assert_eq!(receipt.chain_id, "movement_testnet");
        assert_eq!(receipt.payer.as_deref(), Some("0xAGENT"));

        let rejected = verifier.receipt("0xother").await.unwrap();
        assert_eq!(rejected, Err(RejectReason::BadTransaction));
    }

    #[tokio::test]
    async fn test_inspect_returns_record() {
        let mut ledger = MemoryLedger::default();
        ledger.insert_transaction(payment("user_transaction", "0xfinal"));
        let verifier = verifier(ledger);

        let inspection = verifier.inspect("0xfinal").await.unwrap();
        assert!(inspection.verdict.is_accepted());
        assert_eq!(inspection.transaction.unwrap()["hash"], json!("0xfinal"));
    }
}
