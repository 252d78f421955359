//! Shared helpers for command handlers.

use std::io::IsTerminal;

use rasd_core::FacilityId;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Refuse destructive actions when nobody can answer the prompt.
pub fn ensure_confirmable(action: &str, yes_flag: bool) -> Result<(), CliError> {
    if yes_flag || std::io::stdin().is_terminal() {
        return Ok(());
    }
    Err(CliError::NonInteractiveRequiresYes {
        action: action.into(),
    })
}

/// Parse a facility id argument.
pub fn parse_facility_id(raw: &str) -> Result<FacilityId, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "id".into(),
        reason: format!("'{raw}' is not a facility id"),
    })
}

pub fn facility_not_found(id: FacilityId) -> CliError {
    CliError::NotFound {
        resource_type: "facility".into(),
        identifier: id.to_string(),
        list_command: "facilities list".into(),
    }
}
