//! Designer details captured once per canvas on its first explicit save.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of any designer info field.
pub const MAX_FIELD_LEN: usize = 120;

/// Who designed a canvas and for which workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub workspace_name: String,
}

impl DesignerInfo {
    /// Check required fields before anything is sent anywhere.
    pub fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("workspace name", &self.workspace_name)?;
        if let Some(email) = &self.email {
            let email = email.trim();
            let well_formed = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !well_formed {
                return Err(CoreError::Validation(format!(
                    "'{email}' is not a valid email address"
                )));
            }
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("Designer {field} is required")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(CoreError::Validation(format!(
            "Designer {field} exceeds {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}
