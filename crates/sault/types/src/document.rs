//! Documents, signatures and the signing transition rules
//!
//! A document is created once with a fixed creator, content reference and
//! ordered signer set, then collects signatures until every required signer
//! has signed. Completion is always derived from `signers` and `signatures`
//! and is never stored.

use crate::{ContentRef, DocumentId, Identity, SigningError, SigningResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A signature on a document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Who signed
    pub signer: Identity,
    /// When the signature was made
    pub signed_at: DateTime<Utc>,
}

impl Signature {
    pub fn new(signer: Identity, signed_at: DateTime<Utc>) -> Self {
        Self { signer, signed_at }
    }
}

/// Derived signing state of a document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningState {
    /// At least one required signer has not signed yet (including 0 of n)
    PartiallySigned,
    /// Every required signer has signed; terminal
    Completed,
}

impl SigningState {
    pub fn label(&self) -> &'static str {
        match self {
            SigningState::PartiallySigned => "pending",
            SigningState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SigningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed-versus-required counts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SigningProgress {
    pub signed: usize,
    pub required: usize,
}

impl std::fmt::Display for SigningProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.signed, self.required)
    }
}

/// Check a proposed signer set: non-empty and free of repeats.
pub fn validate_signer_set(signers: &[Identity]) -> SigningResult<()> {
    if signers.is_empty() {
        return Err(SigningError::EmptySignerSet);
    }
    let mut seen = HashSet::with_capacity(signers.len());
    for signer in signers {
        if !seen.insert(signer) {
            return Err(SigningError::DuplicateSigner(signer.clone()));
        }
    }
    Ok(())
}

/// A document under multi-party signing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Ledger-assigned identifier
    pub id: DocumentId,
    /// Content-store reference of the document bytes
    #[serde(alias = "content_hash")]
    pub content_ref: ContentRef,
    /// Identity that created the document
    pub creator: Identity,
    /// Required signers, in the order given at creation
    pub signers: Vec<Identity>,
    /// Signatures in commit order; at most one per signer
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl Document {
    /// Build a freshly created document with no signatures.
    pub fn create(
        id: DocumentId,
        creator: Identity,
        content_ref: ContentRef,
        signers: Vec<Identity>,
    ) -> SigningResult<Self> {
        validate_signer_set(&signers)?;
        Ok(Self {
            id,
            content_ref,
            creator,
            signers,
            signatures: Vec::new(),
        })
    }

    pub fn is_signer(&self, identity: &Identity) -> bool {
        self.signers.contains(identity)
    }

    pub fn has_signed(&self, identity: &Identity) -> bool {
        self.signatures.iter().any(|s| &s.signer == identity)
    }

    /// Signature recorded for `identity`, if any.
    pub fn signature_of(&self, identity: &Identity) -> Option<&Signature> {
        self.signatures.iter().find(|s| &s.signer == identity)
    }

    /// True when every required signer has a signature.
    pub fn is_completed(&self) -> bool {
        self.signers.iter().all(|signer| self.has_signed(signer))
    }

    pub fn state(&self) -> SigningState {
        if self.is_completed() {
            SigningState::Completed
        } else {
            SigningState::PartiallySigned
        }
    }

    pub fn progress(&self) -> SigningProgress {
        SigningProgress {
            signed: self.signers.iter().filter(|s| self.has_signed(s)).count(),
            required: self.signers.len(),
        }
    }

    /// Required signers who have not signed yet, in signer order.
    pub fn outstanding_signers(&self) -> Vec<&Identity> {
        self.signers
            .iter()
            .filter(|signer| !self.has_signed(signer))
            .collect()
    }

    /// Whether `actor` still owes a signature on this document.
    pub fn is_pending_for(&self, actor: &Identity) -> bool {
        self.is_signer(actor) && !self.has_signed(actor) && !self.is_completed()
    }

    /// Check whether `actor` may sign now, without changing anything.
    ///
    /// A completed document rejects every attempt with
    /// `DocumentAlreadyCompleted`, whoever the actor is.
    pub fn check_sign(&self, actor: &Identity) -> SigningResult<()> {
        if self.is_completed() {
            return Err(SigningError::DocumentAlreadyCompleted(self.id));
        }
        if !self.is_signer(actor) {
            return Err(SigningError::NotASigner {
                document: self.id,
                actor: actor.clone(),
            });
        }
        if self.has_signed(actor) {
            return Err(SigningError::AlreadySigned {
                document: self.id,
                actor: actor.clone(),
            });
        }
        Ok(())
    }

    /// Record a signature. On any error the document is left untouched.
    pub fn apply_signature(
        &mut self,
        actor: &Identity,
        signed_at: DateTime<Utc>,
    ) -> SigningResult<SigningState> {
        self.check_sign(actor)?;
        self.signatures.push(Signature::new(actor.clone(), signed_at));
        Ok(self.state())
    }

    /// Check a record received from the ledger against the document invariants.
    pub fn validate(&self) -> SigningResult<()> {
        validate_signer_set(&self.signers).map_err(|e| SigningError::MalformedRecord {
            document: self.id,
            reason: e.to_string(),
        })?;

        let mut seen = HashSet::with_capacity(self.signatures.len());
        for signature in &self.signatures {
            if !self.is_signer(&signature.signer) {
                return Err(SigningError::MalformedRecord {
                    document: self.id,
                    reason: format!("signature from non-signer {}", signature.signer),
                });
            }
            if !seen.insert(&signature.signer) {
                return Err(SigningError::MalformedRecord {
                    document: self.id,
                    reason: format!("duplicate signature from {}", signature.signer),
                });
            }
        }
        Ok(())
    }
}
