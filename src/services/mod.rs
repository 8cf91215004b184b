// Network State - Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Services consulted while connecting:
//! - Certificate: Client certificate pattern matching and enrollment

pub mod certificate;

pub use certificate::{
    CertificatePattern, CertificateResolver, CertificateStore, EnrollmentHandler,
    EnrollmentStatus, EnrollmentTicket, InMemoryCertificateStore, PatternMatch, PendingEnrollment,
};
