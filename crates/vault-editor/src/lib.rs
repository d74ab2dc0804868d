//! NAU Vault Editor
//!
//! Client-side staging and validation of trove changes for the NAU
//! borrowing protocol (Liquity-style, AR collateral, GiB debt, on Load
//! Network).
//!
//! ## Pipeline
//!
//! ```text
//! snapshot ──► reconcile (StagedEdit) ──► edited trove
//!                                              │
//!            detect ◄──────────────────────────┘
//!              │
//!            validate (ordered rules) ──► Ready / Rejected / Unchanged
//!              │
//!            stabilize (ChangeStabilizer) ──► pinned while in flight
//!              │
//!            SubmissionRequest ──► wallet ──► TransactionState
//! ```
//!
//! ## Core Operations
//!
//! - **detect**: classify two troves as creation, closure, adjustment or
//!   invalid creation
//! - **validate**: run a change through the protocol's rules
//! - **reconcile**: carry unsaved edits over to a new on-chain trove
//! - **stabilize**: keep one submittable change stable across blocks
//!
//! Sessions ([`OpeningSession`], [`AdjustingSession`]) wire these together
//! for the two trove forms.

pub mod change;
pub mod config;
pub mod context;
pub mod debug;
pub mod events;
pub mod reconcile;
pub mod rejection;
pub mod scenario;
pub mod session;
pub mod stabilize;
pub mod validation;
pub mod view;


// Re-exports for convenience
pub use change::{detect, ChangeKind, InvalidCreationReason, TroveChange, TroveDelta};
pub use config::{DebugConfig, EditorConfig};
pub use context::{StoreSnapshot, ValidationContext};
pub use debug::DebugReport;
pub use events::{fingerprint, EditorEvent, EventLog, Fingerprint};
pub use reconcile::{reconcile, LocalEdits, StagedEdit};
pub use rejection::Rejection;
pub use scenario::{Scenario, ScenarioReport};
pub use session::{
    AdjustingEditor, AdjustingSession, EditorSession, OpeningEditor, OpeningSession, Proposal,
    Submission, SubmissionRequest, TroveEditor,
};
pub use stabilize::{stabilize, ChangeStabilizer, Stabilized, TransactionState};
pub use validation::{check_borrowing_rate_tolerance, validate, Rule, Validated, VALIDATION_RULES};
pub use view::{TroveView, TroveViewEvent, TroveViewFlow};

pub use nau_common::{Decimal, Difference, NauError, NauResult, Trove, TroveStatus};
