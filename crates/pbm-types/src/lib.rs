//! PBM Types - Canonical domain types for purpose-bound money
//!
//! This crate contains the foundational types shared by every PBM crate,
//! with zero dependencies on the other PBM crates:
//!
//! - Identity types (OwnerId, TokenId)
//! - Minor-unit amounts
//! - Fund types and merchant category codes
//! - Restriction sets and administrative overrides
//! - Tokens and their lifecycle status
//! - Validation results and rejection reasons
//!
//! # Invariants
//!
//! 1. A token's remaining balance is never negative (`Amount` is unsigned and
//!    every subtraction is checked)
//! 2. Blocked categories always win over allowed categories
//! 3. A token's restriction set is fixed at issuance

pub mod identity;
pub mod amount;
pub mod fund;
pub mod restriction;
pub mod token;
pub mod validation;
pub mod error;

pub use identity::*;
pub use amount::*;
pub use fund::*;
pub use restriction::*;
pub use token::*;
pub use validation::*;
pub use error::*;

/// Version of the PBM types schema
pub const TYPES_VERSION: &str = "0.1.0";
