//! Utility functions shared across the application:
//!
//! - [`codegen`] - Short code generation and alias validation
//! - [`fingerprint`] - Visitor fingerprinting
//! - [`identity`] - Owner and tier request headers
//! - [`ip`] - Client IP extraction and masking
//! - [`password`] - Password hashing and verification
//! - [`referrer`] - Referrer and campaign-tag parsing
//! - [`url_normalizer`] - Destination URL normalization
//! - [`user_agent`] - User agent parsing

pub mod codegen;
pub mod fingerprint;
pub mod identity;
pub mod ip;
pub mod password;
pub mod referrer;
pub mod url_normalizer;
pub mod user_agent;
