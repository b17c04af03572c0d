//! Administrator-configurable enumerations: categories, priorities and
//! status labels, each with an active flag.

use super::Status;
use crate::error::{HelpdeskError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static COLOR_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityLevel {
    pub name: String,
    pub description: Option<String>,
    /// 1 = Low ... 4 = Critical; lists are ordered by level
    pub level: u8,
    pub color_code: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub status: Status,
    pub description: Option<String>,
    pub color_code: Option<String>,
    pub is_active: bool,
}

/// Which master data table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterDataKind {
    Category,
    Priority,
    Status,
}

impl fmt::Display for MasterDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Category => "category",
            Self::Priority => "priority",
            Self::Status => "status",
        })
    }
}

impl FromStr for MasterDataKind {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "category" | "categories" => Ok(Self::Category),
            "priority" | "priorities" => Ok(Self::Priority),
            "status" | "statuses" => Ok(Self::Status),
            _ => Err(HelpdeskError::validation(format!(
                "Invalid master data kind: {s}. Must be one of: category, priority, status"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MasterData {
    pub categories: Vec<Category>,
    pub priorities: Vec<PriorityLevel>,
    pub statuses: Vec<StatusLabel>,
}

impl MasterData {
    /// The rows seeded into a fresh installation
    #[must_use]
    pub fn defaults() -> Self {
        let category = |name: &str, description: &str| Category {
            name: name.to_string(),
            description: Some(description.to_string()),
            is_active: true,
        };
        let priority = |name: &str, level: u8, color: &str| PriorityLevel {
            name: name.to_string(),
            description: Some(format!("{name} priority issues")),
            level,
            color_code: Some(color.to_string()),
            is_active: true,
        };
        let status = |status: Status, description: &str, color: &str| StatusLabel {
            status,
            description: Some(description.to_string()),
            color_code: Some(color.to_string()),
            is_active: true,
        };

        Self {
            categories: vec![
                category("Hardware", "Hardware related issues"),
                category("Software", "Software related issues"),
                category("Network", "Network and connectivity issues"),
                category("Other", "Anything else"),
            ],
            priorities: vec![
                priority("Low", 1, "#28a745"),
                priority("Medium", 2, "#ffc107"),
                priority("High", 3, "#fd7e14"),
                priority("Critical", 4, "#dc3545"),
            ],
            statuses: vec![
                status(Status::Open, "Newly created tickets", "#007bff"),
                status(Status::InProgress, "Tickets being worked on", "#ffc107"),
                status(Status::Resolved, "Resolved tickets", "#28a745"),
                status(Status::Closed, "Closed tickets", "#6c757d"),
            ],
        }
    }

    /// Resolve an active category by name, case-insensitively
    #[must_use]
    pub fn active_category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.is_active && c.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Resolve an active priority by name, case-insensitively
    #[must_use]
    pub fn active_priority(&self, name: &str) -> Option<&PriorityLevel> {
        self.priorities
            .iter()
            .find(|p| p.is_active && p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Whether a status may currently be selected
    #[must_use]
    pub fn is_status_active(&self, status: Status) -> bool {
        self.statuses
            .iter()
            .any(|s| s.status == status && s.is_active)
    }

    /// Active priorities ordered by level
    #[must_use]
    pub fn active_priorities(&self) -> Vec<&PriorityLevel> {
        let mut active: Vec<_> = self.priorities.iter().filter(|p| p.is_active).collect();
        active.sort_by_key(|p| p.level);
        active
    }

    pub fn add_category(&mut self, name: &str, description: Option<String>) -> Result<()> {
        let name = validate_name(name, 50)?;
        if self.categories.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
            return Err(HelpdeskError::validation(format!("Category '{name}' already exists")));
        }
        self.categories.push(Category {
            name,
            description,
            is_active: true,
        });
        Ok(())
    }

    pub fn add_priority(
        &mut self,
        name: &str,
        level: u8,
        color_code: Option<String>,
        description: Option<String>,
    ) -> Result<()> {
        let name = validate_name(name, 20)?;
        if !(1..=10).contains(&level) {
            return Err(HelpdeskError::validation("Priority level must be between 1 and 10"));
        }
        validate_color(color_code.as_deref())?;
        if self.priorities.iter().any(|p| p.name.eq_ignore_ascii_case(&name)) {
            return Err(HelpdeskError::validation(format!("Priority '{name}' already exists")));
        }
        self.priorities.push(PriorityLevel {
            name,
            description,
            level,
            color_code,
            is_active: true,
        });
        Ok(())
    }

    /// Add or reactivate the label row for a lifecycle status
    pub fn add_status(
        &mut self,
        status: Status,
        color_code: Option<String>,
        description: Option<String>,
    ) -> Result<()> {
        validate_color(color_code.as_deref())?;
        if self.statuses.iter().any(|s| s.status == status) {
            return Err(HelpdeskError::validation(format!("Status '{status}' already exists")));
        }
        self.statuses.push(StatusLabel {
            status,
            description,
            color_code,
            is_active: true,
        });
        Ok(())
    }

    /// Toggle the active flag of a row
    pub fn set_active(&mut self, kind: MasterDataKind, name: &str, active: bool) -> Result<()> {
        let flag = match kind {
            MasterDataKind::Category => self
                .categories
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .map(|c| &mut c.is_active),
            MasterDataKind::Priority => self
                .priorities
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .map(|p| &mut p.is_active),
            MasterDataKind::Status => {
                let status: Status = name.parse()?;
                self.statuses
                    .iter_mut()
                    .find(|s| s.status == status)
                    .map(|s| &mut s.is_active)
            },
        };

        let flag = flag.ok_or_else(|| HelpdeskError::not_found("Master data row", format!("{kind} '{name}'")))?;
        *flag = active;
        Ok(())
    }
}

fn validate_name(name: &str, max: usize) -> Result<String> {
    let name = name.trim();
    let len = name.chars().count();
    if len < 2 || len > max {
        return Err(HelpdeskError::validation(format!(
            "Name must be between 2 and {max} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_color(color: Option<&str>) -> Result<()> {
    match color {
        Some(c) if !COLOR_CODE_RE.is_match(c) => Err(HelpdeskError::validation(format!(
            "Invalid color code: {c}. Use the #RRGGBB form"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_active() {
        let data = MasterData::defaults();
        assert!(data.active_category("hardware").is_some());
        assert_eq!(data.active_priority("MEDIUM").unwrap().level, 2);
        assert!(Status::ALL.iter().all(|s| data.is_status_active(*s)));
    }

    #[test]
    fn test_inactive_rows_do_not_resolve() {
        let mut data = MasterData::defaults();
        data.set_active(MasterDataKind::Category, "Network", false).unwrap();
        assert!(data.active_category("Network").is_none());

        data.set_active(MasterDataKind::Status, "closed", false).unwrap();
        assert!(!data.is_status_active(Status::Closed));
    }

    #[test]
    fn test_add_category_rejects_duplicates_and_short_names() {
        let mut data = MasterData::defaults();
        assert!(data.add_category("Printers", None).is_ok());
        assert!(data.add_category("printers", None).is_err());
        assert!(data.add_category("X", None).is_err());
    }

    #[test]
    fn test_add_priority_validates_color() {
        let mut data = MasterData::defaults();
        assert!(data.add_priority("Urgent", 5, Some("#ff0000".into()), None).is_ok());
        assert!(data.add_priority("Blocker", 6, Some("red".into()), None).is_err());
    }

    #[test]
    fn test_active_priorities_sorted_by_level() {
        let mut data = MasterData::default();
        data.add_priority("High", 3, None, None).unwrap();
        data.add_priority("Low", 1, None, None).unwrap();
        let names: Vec<_> = data.active_priorities().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Low", "High"]);
    }

    #[test]
    fn test_set_active_unknown_row() {
        let mut data = MasterData::defaults();
        let err = data.set_active(MasterDataKind::Priority, "Nope", true).unwrap_err();
        assert!(matches!(err, HelpdeskError::NotFound { .. }));
    }
}
