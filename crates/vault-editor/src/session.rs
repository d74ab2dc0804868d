//! Editor Sessions
//!
//! A session ties one trove form to the rest of the pipeline: every new
//! snapshot is applied (reconciling unsaved edits), every proposal is
//! validated and offered to the stabilizer, and a submission pins the
//! stable change until the wallet reports an outcome.
//!
//! ## Editors
//!
//! - [`OpeningEditor`]: a new trove from collateral and a borrow amount
//! - [`AdjustingEditor`]: staged edits over the account's open trove, or
//!   closing it outright
//!
//! ```rust,ignore
//! let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot)?;
//! session.editor_mut().set_collateral_text("12.5")?;
//! let proposal = session.propose()?;
//! if let Submission::Ready(request) = session.prepare_submission(None)? {
//!     // hand `request` to the wallet, then feed back its states
//! }
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};

use nau_common::{
    check,
    constants::limits,
    math, Decimal, Difference, NauError, NauResult, Percent, Trove,
};

use crate::change::TroveChange;
use crate::config::EditorConfig;
use crate::context::{StoreSnapshot, ValidationContext};
use crate::debug::{DebugReport, Introspector};
use crate::events::{fingerprint, EditorEvent};
use crate::reconcile::StagedEdit;
use crate::rejection::Rejection;
use crate::stabilize::{ChangeStabilizer, TransactionState};
use crate::validation::{check_borrowing_rate_tolerance, validate, Validated};
use crate::view::TroveViewEvent;

/// Tracker id of trove-opening transactions
pub const OPENING_TRANSACTION_ID: &str = "trove-creation";
/// Tracker id of trove-adjusting transactions
pub const ADJUSTING_TRANSACTION_ID: &str = "trove-adjustment";

// ============ Editor Trait ============

/// One trove form
pub trait TroveEditor {
    /// Tracker id of the transaction this form submits
    fn transaction_id(&self) -> &'static str;

    /// On-chain trove the edit starts from
    fn original(&self) -> Trove;

    /// Edited collateral
    fn collateral(&self) -> Decimal;

    /// Edited net debt, not counting the fee on new borrowing
    fn net_debt(&self) -> Decimal;

    /// Fee on new borrowing at `borrowing_rate`
    fn fee(&self, borrowing_rate: Decimal) -> NauResult<Decimal>;

    fn is_dirty(&self) -> bool;

    /// Most collateral the edited trove may hold
    fn max_collateral(&self, context: &ValidationContext) -> NauResult<Decimal>;

    /// Follow the chain's copy of the trove; true when local edits were rebased
    fn apply_trove(&mut self, trove: Trove) -> bool;

    fn reset(&mut self);

    /// View event once this form's transaction is confirmed
    fn confirmed_event(&self) -> TroveViewEvent;

    /// Refuse to propose when the form no longer applies
    fn ensure_editable(&self) -> NauResult<()> {
        Ok(())
    }

    /// Net debt plus liquidation reserve plus fee
    fn total_debt(&self, borrowing_rate: Decimal) -> NauResult<Decimal> {
        self.net_debt()
            .checked_add(limits::LIQUIDATION_RESERVE)?
            .checked_add(self.fee(borrowing_rate)?)
    }

    /// Trove the edit would produce; the original while nothing changed
    fn edited(&self, borrowing_rate: Decimal) -> NauResult<Trove> {
        if !self.is_dirty() {
            return Ok(self.original());
        }
        Ok(Trove::new(self.collateral(), self.total_debt(borrowing_rate)?))
    }
}

// ============ Opening ============

/// Form for opening a new trove
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningEditor {
    collateral: Decimal,
    borrow: Decimal,
}

impl OpeningEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Decimal {
        self.borrow
    }

    /// Set collateral; a zero borrow amount is filled with `MINIMUM_NET_DEBT`
    pub fn set_collateral(&mut self, collateral: Decimal) {
        self.collateral = collateral;
        if !collateral.is_zero() && self.borrow.is_zero() {
            self.borrow = limits::MINIMUM_NET_DEBT;
        }
    }

    pub fn set_borrow(&mut self, borrow: Decimal) {
        self.borrow = borrow;
    }

    pub fn set_collateral_text(&mut self, text: &str) -> NauResult<()> {
        self.set_collateral(text.parse()?);
        Ok(())
    }

    pub fn set_borrow_text(&mut self, text: &str) -> NauResult<()> {
        self.set_borrow(text.parse()?);
        Ok(())
    }
}

impl TroveEditor for OpeningEditor {
    fn transaction_id(&self) -> &'static str {
        OPENING_TRANSACTION_ID
    }

    fn original(&self) -> Trove {
        Trove::EMPTY
    }

    fn collateral(&self) -> Decimal {
        self.collateral
    }

    fn net_debt(&self) -> Decimal {
        self.borrow
    }

    fn fee(&self, borrowing_rate: Decimal) -> NauResult<Decimal> {
        math::borrowing_fee(self.borrow, borrowing_rate)
    }

    fn is_dirty(&self) -> bool {
        !self.collateral.is_zero() || !self.borrow.is_zero()
    }

    fn max_collateral(&self, context: &ValidationContext) -> NauResult<Decimal> {
        Ok(context.account_balance)
    }

    fn apply_trove(&mut self, _trove: Trove) -> bool {
        false
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn confirmed_event(&self) -> TroveViewEvent {
        TroveViewEvent::TroveOpened
    }
}

// ============ Adjusting ============

/// Form for adjusting the account's open trove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustingEditor {
    staged: StagedEdit,
    /// Whole trove is to be repaid and withdrawn
    closing: bool,
}

impl AdjustingEditor {
    pub fn new(trove: Trove) -> Self {
        Self {
            staged: StagedEdit::new(trove),
            closing: false,
        }
    }

    pub fn staged(&self) -> &StagedEdit {
        &self.staged
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Stage closing the trove; any further edit turns it back into an adjustment
    pub fn close(&mut self) {
        self.closing = true;
    }

    pub fn set_collateral(&mut self, collateral: Decimal) {
        self.closing = false;
        self.staged.set_collateral(collateral);
    }

    pub fn set_net_debt(&mut self, net_debt: Decimal) {
        self.closing = false;
        self.staged.set_net_debt(net_debt);
    }

    pub fn set_collateral_text(&mut self, text: &str) -> NauResult<()> {
        self.set_collateral(text.parse()?);
        Ok(())
    }

    pub fn set_net_debt_text(&mut self, text: &str) -> NauResult<()> {
        self.set_net_debt(text.parse()?);
        Ok(())
    }

    fn debt_increase(&self) -> Decimal {
        self.staged.net_debt().saturating_sub(self.staged.baseline().net_debt())
    }
}

impl TroveEditor for AdjustingEditor {
    fn transaction_id(&self) -> &'static str {
        ADJUSTING_TRANSACTION_ID
    }

    fn original(&self) -> Trove {
        *self.staged.baseline()
    }

    fn collateral(&self) -> Decimal {
        if self.closing {
            return Decimal::ZERO;
        }
        self.staged.collateral()
    }

    fn net_debt(&self) -> Decimal {
        if self.closing {
            return Decimal::ZERO;
        }
        self.staged.net_debt()
    }

    fn fee(&self, borrowing_rate: Decimal) -> NauResult<Decimal> {
        if self.closing {
            return Ok(Decimal::ZERO);
        }
        math::borrowing_fee(self.debt_increase(), borrowing_rate)
    }

    fn is_dirty(&self) -> bool {
        self.closing || self.staged.is_dirty()
    }

    fn total_debt(&self, borrowing_rate: Decimal) -> NauResult<Decimal> {
        if self.closing {
            return Ok(Decimal::ZERO);
        }
        self.net_debt()
            .checked_add(limits::LIQUIDATION_RESERVE)?
            .checked_add(self.fee(borrowing_rate)?)
    }

    fn max_collateral(&self, context: &ValidationContext) -> NauResult<Decimal> {
        self.staged.baseline().collateral.checked_add(context.account_balance)
    }

    fn apply_trove(&mut self, trove: Trove) -> bool {
        let dirty = self.staged.is_dirty();
        self.staged.apply_snapshot(trove) && dirty
    }

    fn reset(&mut self) {
        self.closing = false;
        self.staged.reset();
    }

    fn confirmed_event(&self) -> TroveViewEvent {
        TroveViewEvent::TroveAdjusted
    }

    fn ensure_editable(&self) -> NauResult<()> {
        let status = self.staged.baseline().status;
        check!(self.staged.baseline().is_open(), NauError::TroveNotOpen { status });
        Ok(())
    }
}

// ============ Session ============

/// Everything a form shows for the current edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub edited: Trove,
    pub fee: Decimal,
    /// Rate the fee was computed at
    pub borrowing_rate: Decimal,
    pub total_debt: Decimal,
    pub max_collateral: Decimal,
    pub collateral_maxed_out: bool,
    /// Only when both collateral and net debt are non-zero
    pub collateral_ratio: Option<Decimal>,
    /// Against the current trove's ratio
    pub collateral_ratio_change: Option<Difference>,
    /// Rate tolerance a submission would carry
    pub max_borrowing_rate: Decimal,
    pub is_dirty: bool,
    pub validated: Validated,
    /// Change a submission would send
    pub stable_change: Option<TroveChange>,
}

impl Proposal {
    pub fn fee_percent(&self) -> Percent {
        Percent(self.borrowing_rate)
    }
}

/// What the wallet needs to send the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub transaction_id: String,
    pub change: TroveChange,
    pub max_borrowing_rate: Decimal,
    pub fee_decay_tolerance_minutes: u64,
}

/// Outcome of preparing a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Submission {
    Ready(SubmissionRequest),
    Rejected(Rejection),
}

/// A trove form wired to validation, staging and debug introspection
#[derive(Debug, Clone)]
pub struct EditorSession<E> {
    editor: E,
    config: EditorConfig,
    context: ValidationContext,
    block: u64,
    stabilizer: ChangeStabilizer,
    introspector: Introspector,
}

pub type OpeningSession = EditorSession<OpeningEditor>;
pub type AdjustingSession = EditorSession<AdjustingEditor>;

impl EditorSession<OpeningEditor> {
    pub fn new(config: EditorConfig, snapshot: &StoreSnapshot) -> NauResult<Self> {
        Self::with_editor(OpeningEditor::new(), config, snapshot)
    }
}

impl EditorSession<AdjustingEditor> {
    /// # Errors
    /// `TroveNotOpen` unless the snapshot's trove is open.
    pub fn new(config: EditorConfig, snapshot: &StoreSnapshot) -> NauResult<Self> {
        let status = snapshot.trove.status;
        check!(snapshot.trove.is_open(), NauError::TroveNotOpen { status });
        Self::with_editor(AdjustingEditor::new(snapshot.trove), config, snapshot)
    }
}

impl<E: TroveEditor> EditorSession<E> {
    pub fn with_editor(editor: E, config: EditorConfig, snapshot: &StoreSnapshot) -> NauResult<Self> {
        config.validate()?;
        let context = ValidationContext::from_snapshot(snapshot)?;
        let introspector = Introspector::new(&config.debug);
        debug!("{}: session started at block {}", editor.transaction_id(), snapshot.block);

        Ok(Self {
            editor,
            config,
            context,
            block: snapshot.block,
            stabilizer: ChangeStabilizer::new(),
            introspector,
        })
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    pub fn stabilizer(&self) -> &ChangeStabilizer {
        &self.stabilizer
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    /// Apply a new block's snapshot, rebasing unsaved edits
    pub fn apply_snapshot(&mut self, snapshot: &StoreSnapshot) -> NauResult<()> {
        let context = ValidationContext::from_snapshot(snapshot)?;
        let recovery_mode = context.is_recovery_mode()?;
        let rebased = self.editor.apply_trove(snapshot.trove);

        self.context = context;
        self.block = snapshot.block;
        self.introspector.record(EditorEvent::SnapshotApplied {
            block: snapshot.block,
            recovery_mode,
        });
        if rebased {
            self.introspector.record(EditorEvent::EditsRebased {
                block: snapshot.block,
                collateral: self.editor.collateral(),
                net_debt: self.editor.net_debt(),
            });
        }
        Ok(())
    }

    /// Validate the current edit and refresh the stable change
    pub fn propose(&mut self) -> NauResult<Proposal> {
        self.editor.ensure_editable()?;

        let rate = self.context.borrowing_rate;
        let original = self.editor.original();
        let edited = self.editor.edited(rate)?;
        let fee = self.editor.fee(rate)?;
        let max_collateral = self.editor.max_collateral(&self.context)?;

        let validated = validate(&original, &edited, rate, &self.context, max_collateral)?;
        match &validated {
            Validated::Ready(change) => self.introspector.record(EditorEvent::ChangeValidated {
                kind: change.kind(),
                fingerprint: fingerprint(change)?,
            }),
            Validated::Rejected(rejection) => self.introspector.record(EditorEvent::ChangeRejected {
                code: rejection.code().to_string(),
            }),
            Validated::Unchanged => {}
        }

        let generation = self.stabilizer.generation();
        let stable_change = self.stabilizer.offer(validated.change()).copied();
        if self.stabilizer.generation() != generation {
            self.introspector.record(EditorEvent::StableChangeReplaced {
                generation: self.stabilizer.generation(),
            });
        }

        let collateral_ratio = if !self.editor.collateral().is_zero() && !self.editor.net_debt().is_zero() {
            Some(self.context.collateral_ratio(&edited)?)
        } else {
            None
        };
        let collateral_ratio_change = match collateral_ratio {
            Some(ratio) if original.is_open() => Some(Difference::between(
                ratio,
                self.context.collateral_ratio(&original)?,
            )),
            _ => None,
        };

        Ok(Proposal {
            edited,
            fee,
            borrowing_rate: rate,
            total_debt: self.editor.total_debt(rate)?,
            max_collateral,
            collateral_maxed_out: self.editor.collateral() == max_collateral,
            collateral_ratio,
            collateral_ratio_change,
            max_borrowing_rate: self.config.max_borrowing_rate(rate)?,
            is_dirty: self.editor.is_dirty(),
            validated,
            stable_change,
        })
    }

    /// Re-validate the current edit, check the fee tolerance and pin the
    /// resulting change
    ///
    /// `max_borrowing_rate` defaults to the quoted rate plus the configured
    /// slippage.
    ///
    /// # Errors
    /// `SubmissionInFlight` while another transaction is pending,
    /// `NothingToSubmit` when the edit leaves the trove unchanged.
    pub fn prepare_submission(&mut self, max_borrowing_rate: Option<Decimal>) -> NauResult<Submission> {
        if let Some(transaction_id) = self.stabilizer.transaction_id() {
            return Err(NauError::SubmissionInFlight {
                transaction_id: transaction_id.to_string(),
            });
        }

        match self.propose()?.validated {
            Validated::Ready(_) => {}
            Validated::Rejected(rejection) => return Ok(Submission::Rejected(rejection)),
            Validated::Unchanged => return Err(NauError::NothingToSubmit),
        }

        let quoted = self.context.borrowing_rate;
        let max_borrowing_rate = match max_borrowing_rate {
            Some(rate) => rate,
            None => self.config.max_borrowing_rate(quoted)?,
        };

        if let Err(rejection) = check_borrowing_rate_tolerance(quoted, max_borrowing_rate) {
            self.introspector.record(EditorEvent::ChangeRejected {
                code: rejection.code().to_string(),
            });
            return Ok(Submission::Rejected(rejection));
        }

        let transaction_id = self.editor.transaction_id();
        let change = self.stabilizer.pin_for_submission(transaction_id)?;
        self.introspector.record(EditorEvent::ChangePinned {
            transaction_id: transaction_id.to_string(),
            fingerprint: fingerprint(&change)?,
        });

        Ok(Submission::Ready(SubmissionRequest {
            transaction_id: transaction_id.to_string(),
            change,
            max_borrowing_rate,
            fee_decay_tolerance_minutes: self.config.fee_decay_tolerance_minutes,
        }))
    }

    /// Feed a wallet update; returns the view event once confirmed
    pub fn on_transaction_state(&mut self, state: TransactionState) -> Option<TroveViewEvent> {
        let confirmed = state == TransactionState::Confirmed;
        let transaction_id = self.stabilizer.transaction_id().map(str::to_string);
        let closing = self.stabilizer.is_pinned()
            && self.stabilizer.current().is_some_and(TroveChange::is_closure);

        if !self.stabilizer.on_transaction_state(state) {
            return None;
        }
        self.introspector.record(EditorEvent::PinReleased {
            transaction_id: transaction_id.unwrap_or_default(),
            confirmed,
        });

        if !confirmed {
            return None;
        }
        Some(if closing {
            TroveViewEvent::TroveClosed
        } else {
            self.editor.confirmed_event()
        })
    }

    /// Discard local edits
    pub fn reset(&mut self) {
        self.editor.reset();
        self.introspector.record(EditorEvent::SessionReset);
    }

    /// Leave the form
    ///
    /// # Errors
    /// `SubmissionInFlight` while a transaction is pending.
    pub fn cancel(&mut self) -> NauResult<TroveViewEvent> {
        if let Some(transaction_id) = self.stabilizer.transaction_id() {
            return Err(NauError::SubmissionInFlight {
                transaction_id: transaction_id.to_string(),
            });
        }
        self.reset();
        info!("{}: edit cancelled", self.editor.transaction_id());
        Ok(TroveViewEvent::CancelAdjustTrovePressed)
    }

    /// Internal state for debugging
    ///
    /// # Errors
    /// `IntrospectionDisabled` unless enabled in the configuration.
    pub fn debug_report(&self) -> NauResult<DebugReport> {
        let events = self.introspector.events()?;
        let stable_change = self.stabilizer.current().copied();

        Ok(DebugReport {
            transaction_id: self.editor.transaction_id().to_string(),
            baseline: self.editor.original(),
            edited: self.editor.edited(self.context.borrowing_rate)?,
            stable_fingerprint: stable_change.as_ref().map(fingerprint).transpose()?,
            stable_change,
            generation: self.stabilizer.generation(),
            transaction_state: self.stabilizer.transaction_state(),
            events: events.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{TroveView, TroveViewFlow};
    use nau_common::{Fees, TroveStatus};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn with_reserve(net_debt: &str) -> Decimal {
        d(net_debt).checked_add(limits::LIQUIDATION_RESERVE).unwrap()
    }

    fn snapshot(trove: Trove) -> StoreSnapshot {
        StoreSnapshot {
            block: 1,
            trove,
            fees: Fees::default(),
            price: d("1000"),
            total: Trove::new(d("1000"), d("100000")).add(&trove).unwrap(),
            number_of_troves: 10,
            account_balance: d("50"),
            debt_token_balance: d("5000"),
            stability_pool_balance: Decimal::ZERO,
            collateral_surplus_balance: Decimal::ZERO,
            recovery_mode: None,
        }
    }

    fn introspecting() -> EditorConfig {
        let mut config = EditorConfig::default();
        config.debug.introspection = true;
        config
    }

    #[test]
    fn test_opening_autofills_minimum() {
        let mut editor = OpeningEditor::new();
        editor.set_collateral(d("5"));
        assert_eq!(editor.borrow(), limits::MINIMUM_NET_DEBT);

        editor.set_borrow(d("3000"));
        editor.set_collateral(d("6"));
        assert_eq!(editor.borrow(), d("3000"));
    }

    #[test]
    fn test_opening_proposal() {
        let mut session = OpeningSession::new(EditorConfig::default(), &snapshot(Trove::EMPTY)).unwrap();
        session.editor_mut().set_collateral_text("10").unwrap();
        session.editor_mut().set_borrow_text("2000").unwrap();

        let proposal = session.propose().unwrap();
        assert_eq!(proposal.fee, d("10"));
        assert_eq!(proposal.total_debt, with_reserve("2010"));
        assert_eq!(proposal.edited, Trove::new(d("10"), with_reserve("2010")));
        assert_eq!(proposal.max_collateral, d("50"));
        assert_eq!(proposal.max_borrowing_rate, d("0.01"));
        assert_eq!(proposal.fee_percent().to_string(), "0.50%");
        assert!(proposal.collateral_ratio.is_some());
        assert!(proposal.collateral_ratio_change.is_none());

        let change = proposal.validated.change().unwrap();
        assert!(change.is_creation());
        assert_eq!(change.delta().borrow, d("2000"));
        assert_eq!(proposal.stable_change.as_ref(), Some(change));
    }

    #[test]
    fn test_opening_unchanged_until_edited() {
        let mut session = OpeningSession::new(EditorConfig::default(), &snapshot(Trove::EMPTY)).unwrap();
        let proposal = session.propose().unwrap();
        assert_eq!(proposal.validated, Validated::Unchanged);
        assert!(!proposal.is_dirty);
        assert!(proposal.collateral_ratio.is_none());
        assert_eq!(
            session.prepare_submission(None).unwrap_err(),
            NauError::NothingToSubmit
        );
    }

    #[test]
    fn test_adjusting_requires_open_trove() {
        let result = AdjustingSession::new(EditorConfig::default(), &snapshot(Trove::EMPTY));
        assert!(matches!(result, Err(NauError::TroveNotOpen { .. })));
    }

    #[test]
    fn test_adjusting_fee_only_on_increase() {
        let trove = Trove::new(d("10"), with_reserve("3000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();

        session.editor_mut().set_net_debt(d("2500"));
        let proposal = session.propose().unwrap();
        assert_eq!(proposal.fee, Decimal::ZERO);
        assert_eq!(proposal.validated.change().unwrap().delta().repay, d("500"));

        session.editor_mut().set_net_debt(d("4000"));
        let proposal = session.propose().unwrap();
        assert_eq!(proposal.fee, d("5"));
        assert_eq!(proposal.total_debt, with_reserve("4005"));
        assert_eq!(proposal.validated.change().unwrap().delta().borrow, d("1000"));
        assert!(proposal.collateral_ratio_change.unwrap().is_negative());
        assert_eq!(proposal.max_collateral, d("60"));
    }

    #[test]
    fn test_adjusting_rebases_on_snapshot() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(introspecting(), &snapshot(trove)).unwrap();
        session.editor_mut().set_collateral(d("15"));

        let mut next = snapshot(Trove::new(d("12"), with_reserve("2000")));
        next.block = 2;
        session.apply_snapshot(&next).unwrap();

        assert_eq!(session.editor().collateral(), d("17"));
        assert_eq!(session.block(), 2);
        let report = session.debug_report().unwrap();
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, EditorEvent::EditsRebased { block: 2, .. })));
    }

    #[test]
    fn test_submission_pins_change() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(introspecting(), &snapshot(trove)).unwrap();
        session.editor_mut().set_collateral(d("12"));
        let proposal = session.propose().unwrap();
        let change = *proposal.validated.change().unwrap();

        let request = match session.prepare_submission(None).unwrap() {
            Submission::Ready(request) => request,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(request.transaction_id, ADJUSTING_TRANSACTION_ID);
        assert_eq!(request.change, change);
        assert_eq!(request.max_borrowing_rate, d("0.01"));
        assert_eq!(request.fee_decay_tolerance_minutes, 60);

        // Further edits do not move the pinned change
        session.editor_mut().set_collateral(d("14"));
        assert_eq!(session.propose().unwrap().stable_change, Some(change));
        assert!(matches!(
            session.prepare_submission(None),
            Err(NauError::SubmissionInFlight { .. })
        ));
        assert!(session.cancel().is_err());

        assert_eq!(session.on_transaction_state(TransactionState::WaitingForConfirmation), None);
        assert_eq!(
            session.on_transaction_state(TransactionState::Confirmed),
            Some(TroveViewEvent::TroveAdjusted)
        );
        assert!(!session.stabilizer().is_pinned());
    }

    #[test]
    fn test_submission_follows_later_edits() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();
        session.editor_mut().set_collateral(d("12"));
        session.propose().unwrap();

        // More than the 60 AR the account can reach
        session.editor_mut().set_collateral(d("500"));
        assert_eq!(
            session.prepare_submission(None).unwrap(),
            Submission::Rejected(Rejection::InsufficientCollateralBalance {
                requested: d("500"),
                available: d("60"),
                shortfall: d("440"),
            })
        );
        assert!(!session.stabilizer().is_pinned());

        session.editor_mut().set_collateral(d("14"));
        match session.prepare_submission(None).unwrap() {
            Submission::Ready(request) => {
                assert_eq!(request.change.delta().deposit_collateral(), d("4"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_submission_revalidates_against_new_price() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();
        session.editor_mut().set_collateral(d("3"));
        assert!(session.propose().unwrap().validated.is_ready());

        // 3 AR at 700 no longer covers the debt at MCR
        let mut lower = snapshot(trove);
        lower.block = 2;
        lower.price = d("700");
        session.apply_snapshot(&lower).unwrap();

        match session.prepare_submission(None).unwrap() {
            Submission::Rejected(rejection) => assert_eq!(rejection.code(), "CollateralRatioTooLow"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!session.stabilizer().is_pinned());
    }

    #[test]
    fn test_idle_update_keeps_submission_in_flight() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();
        session.editor_mut().set_collateral(d("12"));
        assert!(matches!(session.prepare_submission(None).unwrap(), Submission::Ready(_)));

        assert_eq!(session.on_transaction_state(TransactionState::Idle), None);
        assert!(session.stabilizer().is_pinned());
        assert!(matches!(
            session.prepare_submission(None),
            Err(NauError::SubmissionInFlight { .. })
        ));
    }

    #[test]
    fn test_closing_trove() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut flow = TroveViewFlow::new(TroveStatus::Open, Decimal::ZERO);
        assert_eq!(flow.dispatch(TroveViewEvent::CloseTrovePressed).unwrap(), TroveView::Closing);

        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();
        session.editor_mut().close();
        let proposal = session.propose().unwrap();
        assert!(proposal.edited.is_empty());
        assert_eq!(proposal.fee, Decimal::ZERO);
        assert_eq!(proposal.total_debt, Decimal::ZERO);
        assert!(proposal.collateral_ratio.is_none());
        assert!(proposal.validated.change().unwrap().is_closure());

        assert!(matches!(session.prepare_submission(None).unwrap(), Submission::Ready(_)));
        assert_eq!(session.on_transaction_state(TransactionState::WaitingForConfirmation), None);
        let event = session.on_transaction_state(TransactionState::Confirmed).unwrap();
        assert_eq!(event, TroveViewEvent::TroveClosed);
        assert_eq!(flow.dispatch(event).unwrap(), TroveView::None);
    }

    #[test]
    fn test_edit_after_close_adjusts_again() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut editor = AdjustingEditor::new(trove);
        editor.close();
        assert!(editor.is_closing() && editor.is_dirty());

        editor.set_collateral(d("11"));
        assert!(!editor.is_closing());
        assert_eq!(editor.edited(d("0.005")).unwrap(), Trove::new(d("11"), with_reserve("2000")));
    }

    #[test]
    fn test_tolerance_rejected_at_submission() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();
        session.editor_mut().set_net_debt(d("2500"));
        session.propose().unwrap();

        match session.prepare_submission(Some(d("0.001"))).unwrap() {
            Submission::Rejected(Rejection::BorrowingRateExceedsTolerance { quoted, .. }) => {
                assert_eq!(quoted, d("0.005"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!session.stabilizer().is_pinned());
    }

    #[test]
    fn test_cancel_resets() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();
        session.editor_mut().set_collateral(d("12"));

        assert_eq!(session.cancel().unwrap(), TroveViewEvent::CancelAdjustTrovePressed);
        assert!(!session.editor().is_dirty());
        assert_eq!(session.debug_report().unwrap_err(), NauError::IntrospectionDisabled);
    }

    #[test]
    fn test_liquidated_trove_not_editable() {
        let trove = Trove::new(d("10"), with_reserve("2000"));
        let mut session = AdjustingSession::new(EditorConfig::default(), &snapshot(trove)).unwrap();

        let mut liquidated = snapshot(Trove::EMPTY.with_status(TroveStatus::ClosedByLiquidation));
        liquidated.block = 2;
        session.apply_snapshot(&liquidated).unwrap();
        assert!(matches!(session.propose(), Err(NauError::TroveNotOpen { .. })));
    }
}
