//! Inspection Scenarios
//!
//! A scenario is a TOML file describing one editing session: configuration,
//! the snapshot the form opens on, the user's edits, later blocks to apply,
//! and whether to submit. `nau-vault-inspect` runs it and prints the report.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use nau_common::{NauError, NauResult};

use crate::config::EditorConfig;
use crate::context::StoreSnapshot;
use crate::debug::DebugReport;
use crate::session::{AdjustingSession, EditorSession, OpeningSession, Proposal, Submission, TroveEditor};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub config: EditorConfig,
    pub snapshot: StoreSnapshot,
    #[serde(default)]
    pub edits: ScenarioEdits,
    /// Snapshots applied after editing, oldest first
    #[serde(default)]
    pub blocks: Vec<StoreSnapshot>,
    #[serde(default)]
    pub submit: bool,
}

/// Text as typed into the form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioEdits {
    pub collateral: Option<String>,
    /// Borrow amount when opening, net debt when adjusting
    pub debt: Option<String>,
    /// Close the open trove instead of adjusting it
    #[serde(default)]
    pub close: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub transaction_id: String,
    pub proposal: Proposal,
    /// Rejection text shown to the user
    pub message: Option<String>,
    pub submission: Option<Submission>,
    pub debug: Option<DebugReport>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> NauResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NauError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> NauResult<Self> {
        let scenario: Self = toml::from_str(text).map_err(|e| NauError::Config {
            reason: e.to_string(),
        })?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Adjusts an open trove, opens one otherwise
    pub fn run(&self) -> NauResult<ScenarioReport> {
        if self.snapshot.trove.is_open() {
            let mut session = AdjustingSession::new(self.config.clone(), &self.snapshot)?;
            if let Some(text) = &self.edits.collateral {
                session.editor_mut().set_collateral_text(text)?;
            }
            if let Some(text) = &self.edits.debt {
                session.editor_mut().set_net_debt_text(text)?;
            }
            if self.edits.close {
                session.editor_mut().close();
            }
            self.finish(&mut session)
        } else {
            let mut session = OpeningSession::new(self.config.clone(), &self.snapshot)?;
            if let Some(text) = &self.edits.collateral {
                session.editor_mut().set_collateral_text(text)?;
            }
            if let Some(text) = &self.edits.debt {
                session.editor_mut().set_borrow_text(text)?;
            }
            self.finish(&mut session)
        }
    }

    fn finish<E: TroveEditor>(&self, session: &mut EditorSession<E>) -> NauResult<ScenarioReport> {
        for snapshot in &self.blocks {
            session.apply_snapshot(snapshot)?;
        }

        let proposal = session.propose()?;
        let message = proposal.validated.rejection().map(ToString::to_string);
        let submission = if self.submit {
            Some(session.prepare_submission(None)?)
        } else {
            None
        };
        let debug = if self.config.debug.introspection {
            Some(session.debug_report()?)
        } else {
            None
        };

        info!(
            "{}: {} block(s) applied, ready: {}",
            session.editor().transaction_id(),
            self.blocks.len(),
            proposal.validated.is_ready()
        );
        Ok(ScenarioReport {
            transaction_id: session.editor().transaction_id().to_string(),
            proposal,
            message,
            submission,
            debug,
        })
    }
}
