//! Trove View Flow
//!
//! Which trove screen the user sees: a small state machine driven by button
//! presses and by on-chain status changes.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use nau_common::{check, Decimal, NauError, NauResult, TroveStatus};

use crate::context::StoreSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TroveView {
    None,
    Opening,
    Adjusting,
    Closing,
    Active,
    Liquidated,
    Redeemed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TroveViewEvent {
    OpenTrovePressed,
    AdjustTrovePressed,
    CloseTrovePressed,
    CancelAdjustTrovePressed,
    TroveOpened,
    TroveAdjusted,
    TroveClosed,
    TroveLiquidated,
    TroveRedeemed,
    TroveSurplusCollateralClaimed,
}

impl TroveView {
    /// View for a trove first seen with `status`
    pub fn initial(status: TroveStatus) -> Self {
        match status {
            TroveStatus::NonExistent | TroveStatus::ClosedByOwner => Self::None,
            TroveStatus::Open => Self::Active,
            TroveStatus::ClosedByLiquidation => Self::Liquidated,
            TroveStatus::ClosedByRedemption => Self::Redeemed,
        }
    }

    /// Next view; events not listed for a view leave it unchanged
    pub fn transition(self, event: TroveViewEvent) -> Self {
        use TroveView as V;
        use TroveViewEvent as E;

        match (self, event) {
            (V::None, E::OpenTrovePressed) => V::Opening,
            (V::None, E::TroveOpened) => V::Active,

            (V::Liquidated | V::Redeemed, E::OpenTrovePressed) => V::Opening,
            (V::Liquidated | V::Redeemed, E::TroveSurplusCollateralClaimed) => V::None,
            (V::Liquidated | V::Redeemed, E::TroveOpened) => V::Active,

            (V::Opening, E::CancelAdjustTrovePressed) => V::None,
            (V::Opening, E::TroveOpened) => V::Active,

            (V::Adjusting | V::Closing, E::CancelAdjustTrovePressed) => V::Active,
            (V::Adjusting | V::Closing, E::TroveAdjusted) => V::Active,

            (V::Active, E::AdjustTrovePressed) => V::Adjusting,
            (V::Active, E::CloseTrovePressed) => V::Closing,

            (V::Adjusting | V::Closing | V::Active, E::TroveClosed) => V::None,
            (V::Adjusting | V::Closing | V::Active, E::TroveLiquidated) => V::Liquidated,
            (V::Adjusting | V::Closing | V::Active, E::TroveRedeemed) => V::Redeemed,

            (view, _) => view,
        }
    }
}

/// Event signalled by a trove entering `status`
pub fn status_event(status: TroveStatus) -> Option<TroveViewEvent> {
    match status {
        TroveStatus::Open => Some(TroveViewEvent::TroveOpened),
        TroveStatus::ClosedByOwner => Some(TroveViewEvent::TroveClosed),
        TroveStatus::ClosedByLiquidation => Some(TroveViewEvent::TroveLiquidated),
        TroveStatus::ClosedByRedemption => Some(TroveViewEvent::TroveRedeemed),
        TroveStatus::NonExistent => None,
    }
}

/// Current view plus what it needs to follow the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TroveViewFlow {
    view: TroveView,
    status: TroveStatus,
    collateral_surplus: Decimal,
}

impl TroveViewFlow {
    pub fn new(status: TroveStatus, collateral_surplus: Decimal) -> Self {
        Self {
            view: TroveView::initial(status),
            status,
            collateral_surplus,
        }
    }

    pub fn view(&self) -> TroveView {
        self.view
    }

    /// Apply a user or tracker event
    ///
    /// # Errors
    /// `SurplusCollateralUnclaimed` when opening a new trove before the
    /// previous one's surplus collateral is claimed.
    pub fn dispatch(&mut self, event: TroveViewEvent) -> NauResult<TroveView> {
        if event == TroveViewEvent::OpenTrovePressed
            && matches!(self.view, TroveView::Liquidated | TroveView::Redeemed)
        {
            check!(
                self.collateral_surplus.is_zero(),
                NauError::SurplusCollateralUnclaimed {
                    surplus: self.collateral_surplus
                }
            );
        }

        let next = self.view.transition(event);
        if next != self.view {
            debug!("trove view {:?} -> {:?} on {:?}", self.view, next, event);
        }
        self.view = next;
        Ok(next)
    }

    /// Follow a new snapshot; dispatches the event of a status change
    pub fn observe(&mut self, snapshot: &StoreSnapshot) -> Option<TroveViewEvent> {
        self.collateral_surplus = snapshot.collateral_surplus_balance;

        let status = snapshot.trove.status;
        if status == self.status {
            return None;
        }
        self.status = status;

        let event = status_event(status)?;
        info!("trove status changed to {status:?}");
        self.view = self.view.transition(event);
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nau_common::{Fees, Trove};

    fn snapshot(trove: Trove, surplus: Decimal) -> StoreSnapshot {
        StoreSnapshot {
            block: 1,
            trove,
            fees: Fees::default(),
            price: Decimal::from_int(1000),
            total: Trove::new(Decimal::from_int(100), Decimal::from_int(10000)),
            number_of_troves: 5,
            account_balance: Decimal::ZERO,
            debt_token_balance: Decimal::ZERO,
            stability_pool_balance: Decimal::ZERO,
            collateral_surplus_balance: surplus,
            recovery_mode: None,
        }
    }

    #[test]
    fn test_initial_views() {
        assert_eq!(TroveView::initial(TroveStatus::NonExistent), TroveView::None);
        assert_eq!(TroveView::initial(TroveStatus::Open), TroveView::Active);
        assert_eq!(TroveView::initial(TroveStatus::ClosedByOwner), TroveView::None);
        assert_eq!(TroveView::initial(TroveStatus::ClosedByLiquidation), TroveView::Liquidated);
        assert_eq!(TroveView::initial(TroveStatus::ClosedByRedemption), TroveView::Redeemed);
    }

    #[test]
    fn test_open_and_cancel() {
        let view = TroveView::None.transition(TroveViewEvent::OpenTrovePressed);
        assert_eq!(view, TroveView::Opening);
        assert_eq!(view.transition(TroveViewEvent::CancelAdjustTrovePressed), TroveView::None);
        assert_eq!(view.transition(TroveViewEvent::TroveOpened), TroveView::Active);
    }

    #[test]
    fn test_adjusting_outcomes() {
        let adjusting = TroveView::Active.transition(TroveViewEvent::AdjustTrovePressed);
        assert_eq!(adjusting, TroveView::Adjusting);
        assert_eq!(adjusting.transition(TroveViewEvent::TroveAdjusted), TroveView::Active);
        assert_eq!(adjusting.transition(TroveViewEvent::TroveLiquidated), TroveView::Liquidated);
        assert_eq!(
            TroveView::Active.transition(TroveViewEvent::CloseTrovePressed),
            TroveView::Closing
        );
    }

    #[test]
    fn test_unlisted_events_ignored() {
        assert_eq!(TroveView::None.transition(TroveViewEvent::TroveAdjusted), TroveView::None);
        assert_eq!(
            TroveView::Opening.transition(TroveViewEvent::AdjustTrovePressed),
            TroveView::Opening
        );
    }

    #[test]
    fn test_surplus_blocks_reopening() {
        let mut flow = TroveViewFlow::new(TroveStatus::ClosedByLiquidation, Decimal::ONE);
        assert_eq!(
            flow.dispatch(TroveViewEvent::OpenTrovePressed),
            Err(NauError::SurplusCollateralUnclaimed { surplus: Decimal::ONE })
        );
        assert_eq!(flow.view(), TroveView::Liquidated);

        let claimed = snapshot(Trove::EMPTY.with_status(TroveStatus::ClosedByLiquidation), Decimal::ZERO);
        assert_eq!(flow.observe(&claimed), None);
        assert_eq!(flow.dispatch(TroveViewEvent::OpenTrovePressed), Ok(TroveView::Opening));
    }

    #[test]
    fn test_status_change_drives_view() {
        let mut flow = TroveViewFlow::new(TroveStatus::Open, Decimal::ZERO);
        flow.dispatch(TroveViewEvent::AdjustTrovePressed).unwrap();

        let liquidated = snapshot(Trove::EMPTY.with_status(TroveStatus::ClosedByLiquidation), Decimal::ONE);
        assert_eq!(flow.observe(&liquidated), Some(TroveViewEvent::TroveLiquidated));
        assert_eq!(flow.view(), TroveView::Liquidated);
        assert_eq!(flow.observe(&liquidated), None);
    }
}
