// Network State - Certificate Pattern Matching
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Client certificate selection by pattern.
//!
//! Networks configured by policy may name their client certificate with a
//! [`CertificatePattern`] instead of a fixed reference. Before connecting,
//! the pattern is resolved against a [`CertificateStore`]. When nothing
//! matches and the pattern lists enrollment URIs, an [`EnrollmentHandler`]
//! is asked to obtain a certificate; the caller receives a
//! [`PendingEnrollment`] that resolves when the handler completes or drops
//! its [`EnrollmentTicket`].

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Distinguished name fields to match. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IssuerSubjectPattern {
    pub common_name: String,
    pub locality: String,
    pub organization: String,
    pub organizational_unit: String,
}

impl IssuerSubjectPattern {
    pub fn is_empty(&self) -> bool {
        self.common_name.is_empty()
            && self.locality.is_empty()
            && self.organization.is_empty()
            && self.organizational_unit.is_empty()
    }

    /// Whether every non-empty field equals the corresponding field of `name`.
    pub fn matches(&self, name: &IssuerSubjectPattern) -> bool {
        let field = |pattern: &str, actual: &str| pattern.is_empty() || pattern == actual;
        field(&self.common_name, &name.common_name)
            && field(&self.locality, &name.locality)
            && field(&self.organization, &name.organization)
            && field(&self.organizational_unit, &name.organizational_unit)
    }
}

/// Selection criteria for a client certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificatePattern {
    #[serde(rename = "Issuer")]
    pub issuer: IssuerSubjectPattern,
    #[serde(rename = "Subject")]
    pub subject: IssuerSubjectPattern,
    /// PEM references of acceptable issuing CAs.
    #[serde(rename = "IssuerCARef")]
    pub issuer_ca_refs: Vec<String>,
    /// Where to obtain a certificate when none matches.
    #[serde(rename = "EnrollmentURI")]
    pub enrollment_uri_list: Vec<String>,
}

impl CertificatePattern {
    pub fn is_empty(&self) -> bool {
        self.issuer.is_empty()
            && self.subject.is_empty()
            && self.issuer_ca_refs.is_empty()
            && self.enrollment_uri_list.is_empty()
    }
}

/// Opaque reference to a certificate inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CertificateHandle(pub u64);

/// Source of client certificates.
pub trait CertificateStore: Send + Sync {
    /// Best certificate satisfying `pattern`, if any.
    fn find_matching_certificate(&self, pattern: &CertificatePattern) -> Option<CertificateHandle>;

    /// PKCS#11 id of a certificate found by this store.
    fn pkcs11_id(&self, handle: &CertificateHandle) -> String;
}

/// A certificate held by [`InMemoryCertificateStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCertificate {
    pub pkcs11_id: String,
    pub issuer: IssuerSubjectPattern,
    pub subject: IssuerSubjectPattern,
    pub issuer_ca_ref: String,
    pub valid_start: DateTime<Utc>,
}

impl StoredCertificate {
    fn matches(&self, pattern: &CertificatePattern) -> bool {
        pattern.issuer.matches(&self.issuer)
            && pattern.subject.matches(&self.subject)
            && (pattern.issuer_ca_refs.is_empty()
                || pattern.issuer_ca_refs.contains(&self.issuer_ca_ref))
    }
}

/// Certificate store backed by a list in memory.
///
/// When several certificates match, the most recently issued one wins.
#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    certificates: RwLock<Vec<StoredCertificate>>,
}

impl InMemoryCertificateStore {
    pub fn new(certificates: Vec<StoredCertificate>) -> Self {
        Self {
            certificates: RwLock::new(certificates),
        }
    }

    pub fn add(&self, certificate: StoredCertificate) {
        self.certificates
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(certificate);
    }

    pub fn len(&self) -> usize {
        self.certificates.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn find_matching_certificate(&self, pattern: &CertificatePattern) -> Option<CertificateHandle> {
        let certificates = self.certificates.read().unwrap_or_else(|e| e.into_inner());
        certificates
            .iter()
            .enumerate()
            .filter(|(_, cert)| cert.matches(pattern))
            .max_by_key(|(_, cert)| cert.valid_start)
            .map(|(index, _)| CertificateHandle(index as u64))
    }

    fn pkcs11_id(&self, handle: &CertificateHandle) -> String {
        let certificates = self.certificates.read().unwrap_or_else(|e| e.into_inner());
        usize::try_from(handle.0)
            .ok()
            .and_then(|index| certificates.get(index))
            .map(|cert| cert.pkcs11_id.clone())
            .unwrap_or_default()
    }
}

// ========================================
// Enrollment
// ========================================

/// Handed to an [`EnrollmentHandler`]; completing it resumes the connection.
///
/// Dropping the ticket without completing it cancels the connection.
#[derive(Debug)]
pub struct EnrollmentTicket(oneshot::Sender<()>);

impl EnrollmentTicket {
    /// Report a successfully enrolled certificate.
    pub fn complete(self) {
        // The waiting side may already be gone; nothing to resume then.
        let _ = self.0.send(());
    }

    /// Whether the connection attempt waiting on this ticket was abandoned.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_closed()
    }
}

/// Obtains certificates from enrollment URIs.
pub trait EnrollmentHandler: Send + Sync {
    fn enroll(&self, uris: &[String], ticket: EnrollmentTicket);
}

/// Progress of a [`PendingEnrollment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Waiting side of an enrollment started for a connection attempt.
pub struct PendingEnrollment(oneshot::Receiver<()>);

impl fmt::Debug for PendingEnrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingEnrollment")
    }
}

impl PendingEnrollment {
    /// Create a linked ticket and pending pair.
    pub fn channel() -> (EnrollmentTicket, PendingEnrollment) {
        let (tx, rx) = oneshot::channel();
        (EnrollmentTicket(tx), PendingEnrollment(rx))
    }

    /// Check without blocking.
    pub fn poll(&mut self) -> EnrollmentStatus {
        match self.0.try_recv() {
            Ok(()) => EnrollmentStatus::Completed,
            Err(oneshot::error::TryRecvError::Empty) => EnrollmentStatus::Pending,
            Err(oneshot::error::TryRecvError::Closed) => EnrollmentStatus::Cancelled,
        }
    }

    /// Wait for the handler to finish.
    pub async fn wait(self) -> EnrollmentStatus {
        match self.0.await {
            Ok(()) => EnrollmentStatus::Completed,
            Err(_) => EnrollmentStatus::Cancelled,
        }
    }
}

/// Outcome of resolving a pattern.
#[derive(Debug)]
pub enum PatternMatch {
    /// The pattern has no criteria.
    Empty,
    /// PKCS#11 id of the matching certificate.
    Matched(String),
    /// No match; enrollment was started.
    Enrolling(PendingEnrollment),
    /// No match and no way to enroll.
    Unmatched,
}

/// Resolves certificate patterns against a store, enrolling when needed.
#[derive(Clone)]
pub struct CertificateResolver {
    store: Arc<dyn CertificateStore>,
    enrollment: Option<Arc<dyn EnrollmentHandler>>,
}

impl fmt::Debug for CertificateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateResolver")
            .field("enrollment", &self.enrollment.is_some())
            .finish_non_exhaustive()
    }
}

impl CertificateResolver {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self {
            store,
            enrollment: None,
        }
    }

    pub fn with_enrollment_handler(mut self, handler: Arc<dyn EnrollmentHandler>) -> Self {
        self.enrollment = Some(handler);
        self
    }

    pub fn without_enrollment(mut self) -> Self {
        self.enrollment = None;
        self
    }

    pub fn resolve(&self, pattern: &CertificatePattern) -> PatternMatch {
        if pattern.is_empty() {
            return PatternMatch::Empty;
        }
        if let Some(handle) = self.store.find_matching_certificate(pattern) {
            return PatternMatch::Matched(self.store.pkcs11_id(&handle));
        }
        match &self.enrollment {
            Some(handler) if !pattern.enrollment_uri_list.is_empty() => {
                info!("No matching certificate, starting enrollment");
                let (ticket, pending) = PendingEnrollment::channel();
                handler.enroll(&pattern.enrollment_uri_list, ticket);
                PatternMatch::Enrolling(pending)
            }
            _ => {
                debug!("No matching certificate and no enrollment available");
                PatternMatch::Unmatched
            }
        }
    }
}
