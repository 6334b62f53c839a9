//! Submission gate for a resolved selection

use kshetra_core::{RegionId, RegionType};
use thiserror::Error;

use crate::scope::AccessScope;
use crate::state::SelectionState;

/// Why a selection cannot be submitted yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionBlock {
    #[error("No region selected")]
    NoRegion,

    #[error("Choose a Nagar or Khand below Jila {0}")]
    BranchNotChosen(RegionId),

    #[error("Selection stops at {0}; a Basti or Gram is required")]
    TerminalRequired(RegionType),
}

/// The region to submit, or why there is none
pub fn check_submission(
    scope: &AccessScope,
    state: &SelectionState,
) -> Result<RegionId, SubmissionBlock> {
    let resolved = state.resolved().ok_or(SubmissionBlock::NoRegion)?;

    if scope.require_terminal && !resolved.is_terminal() {
        if resolved.kind == RegionType::Jila {
            return Err(SubmissionBlock::BranchNotChosen(resolved.id));
        }
        return Err(SubmissionBlock::TerminalRequired(resolved.kind));
    }

    Ok(resolved.id)
}
