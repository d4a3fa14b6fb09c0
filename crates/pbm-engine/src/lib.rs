//! PBM Engine - Purpose-bound money
//!
//! Issues tokens that carry machine-checkable spending restrictions, checks
//! proposed transactions against them, deducts balances and reclaims unspent
//! balance once a token expires.
//!
//! # Components
//!
//! ```text
//! TokenIssuer ──▶ TokenStore ◀── TransactionValidator (read)
//!                    ▲  ▲  ▲
//!   BalanceDeductor ─┘  │  └─ BalanceAggregator (read)
//!                ClawbackScheduler
//! ```
//!
//! [`PbmEngine`] wires them together around one store, one clock and one
//! audit emitter. Every component can also be built on its own against an
//! injected store, which is how the tests isolate state.
//!
//! # Concurrency
//!
//! Each owner's tokens sit behind their own `RwLock`. Reads (`validate`,
//! `balance_by_fund_type`, `tokens_for`) share it; mutations (`issue`,
//! `deduct`, `spend`, sweep removal) hold it exclusively. [`PbmEngine::spend`]
//! validates and deducts under a single write lock.

pub mod aggregator;
pub mod clawback;
pub mod clock;
pub mod config;
pub mod deductor;
pub mod engine;
pub mod issuer;
pub mod store;
pub mod validator;

pub use aggregator::BalanceAggregator;
pub use clawback::{ClawbackRecord, ClawbackScheduler, SweepHandle, SweepReport, SweepTotals};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, TokenSelection, MAX_EXPIRY_WARNING_DAYS};
pub use deductor::{BalanceDeductor, Deduction};
pub use engine::{PbmEngine, PbmEngineBuilder, SpendReceipt};
pub use issuer::{IssueIntent, TokenIssuer};
pub use store::TokenStore;
pub use validator::{TransactionValidator, ValidationRules};

pub use pbm_types::*;
