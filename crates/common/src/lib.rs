//! NAU Common Library
//!
//! Shared value model for the NAU vault editor.
//!
//! NAU is a Liquity-style borrowing protocol deployed on Load Network with
//! AR (an ERC20 token) as collateral and GiB as the debt token. The
//! contracts themselves are external; this crate only models the data the
//! client reads from them:
//!
//! - **Decimal / Difference**: 18-decimal fixed-point amounts and signed deltas
//! - **Trove**: a borrower position (collateral, debt, status)
//! - **Fees**: borrowing-rate schedule with base-rate decay
//! - **Constants**: network parameters (`mainnet` feature switches them)
//! - **Math**: collateral ratios, fee application, recovery-mode checks
//!
//! The staging/validation pipeline built on top of this lives in
//! `nau-vault-editor`.

pub mod constants;
pub mod decimal;
pub mod errors;
pub mod guards;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use decimal::{Decimal, Difference, Percent, Sign};
pub use errors::{AmountErrorReason, NauError, NauResult};
pub use types::{Fees, Trove, TroveStatus};
