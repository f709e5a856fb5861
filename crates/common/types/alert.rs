use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Kind of state transition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Jailed,
    InactiveJailed,
    UnjailedActive,
    UnjailedInactive,
    Active,
    InactiveInsufficient,
    Commission,
    Uptime,
    NewValidator,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 9] = [
        AlertCategory::Jailed,
        AlertCategory::InactiveJailed,
        AlertCategory::UnjailedActive,
        AlertCategory::UnjailedInactive,
        AlertCategory::Active,
        AlertCategory::InactiveInsufficient,
        AlertCategory::Commission,
        AlertCategory::Uptime,
        AlertCategory::NewValidator,
    ];

    /// When several categories fire for the same validator in one cycle, only the one with
    /// the lowest priority number is reported.
    pub fn priority(&self) -> u8 {
        match self {
            AlertCategory::NewValidator => 1,
            AlertCategory::Commission => 2,
            AlertCategory::Uptime => 3,
            AlertCategory::Active => 4,
            AlertCategory::Jailed => 5,
            AlertCategory::InactiveInsufficient => 6,
            AlertCategory::InactiveJailed => 7,
            AlertCategory::UnjailedActive => 8,
            AlertCategory::UnjailedInactive => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Jailed => "jailed",
            AlertCategory::InactiveJailed => "inactive_jailed",
            AlertCategory::UnjailedActive => "unjailed_active",
            AlertCategory::UnjailedInactive => "unjailed_inactive",
            AlertCategory::Active => "active",
            AlertCategory::InactiveInsufficient => "inactive_insufficient",
            AlertCategory::Commission => "commission",
            AlertCategory::Uptime => "uptime",
            AlertCategory::NewValidator => "new_validator",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert handed to the delivery collaborator.
///
/// `text` is `body` followed by `<@id>` mentions. Channels with their own mention syntax
/// rebuild the message from `body` and `subscribers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub category: AlertCategory,
    pub operator_address: String,
    pub body: String,
    pub subscribers: BTreeSet<String>,
    pub text: String,
    pub is_critical: bool,
}
