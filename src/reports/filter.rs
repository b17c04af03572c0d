use crate::core::{Status, Ticket, UserId};
use crate::error::{HelpdeskError, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Creation-date window for reports, inclusive of whole days at both ends
///
/// Dates are compared on the UTC calendar day of `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Range { from: NaiveDate, to: NaiveDate },
    Month { year: i32, month: u32 },
    Year(i32),
}

impl DateFilter {
    /// Build a range, rejecting reversed bounds
    pub fn range(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(HelpdeskError::validation(format!(
                "Start date {from} is after end date {to}"
            )));
        }
        Ok(Self::Range { from, to })
    }

    pub fn month(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(HelpdeskError::validation(format!("Invalid month: {month}")));
        }
        Ok(Self::Month { year, month })
    }

    /// Check if a timestamp falls within this window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        match *self {
            Self::Range { from, to } => date >= from && date <= to,
            Self::Month { year, month } => date.year() == year && date.month() == month,
            Self::Year(year) => date.year() == year,
        }
    }
}

impl FromStr for DateFilter {
    type Err = HelpdeskError;

    /// Accepts `2024-01-01..2024-01-31`, a single day `2024-01-15`,
    /// a month `2024-03` or a year `2024`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let day = |raw: &str| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| HelpdeskError::validation(format!("Invalid date: {raw}")))
        };

        if let Some((from, to)) = s.split_once("..") {
            return Self::range(day(from)?, day(to)?);
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Self::range(date, date);
        }
        if let Some((year, month)) = s.split_once('-') {
            if let (Ok(year), Ok(month)) = (year.parse(), month.parse()) {
                return Self::month(year, month);
            }
        }
        if let Ok(year) = s.parse() {
            return Ok(Self::Year(year));
        }

        Err(HelpdeskError::validation(format!(
            "Invalid date filter: '{s}'. Use formats like '2024', '2024-03', '2024-01-15' or '2024-01-01..2024-01-31'"
        )))
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { from, to } if from == to => write!(f, "{from}"),
            Self::Range { from, to } => write!(f, "{from}..{to}"),
            Self::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Year(year) => write!(f, "{year:04}"),
        }
    }
}

/// Criteria for ticket listings and reports
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<Status>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<UserId>,
    /// Case-insensitive match on number, title, description or creator name
    pub search: Option<String>,
    pub created: Option<DateFilter>,
    pub limit: Option<usize>,
}

impl TicketFilter {
    /// Filter, order newest first and truncate
    #[must_use]
    pub fn apply(&self, tickets: Vec<Ticket>) -> Vec<Ticket> {
        let mut matching: Vec<Ticket> = tickets.into_iter().filter(|t| self.matches(t)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.number.cmp(&a.number)));
        if let Some(limit) = self.limit {
            matching.truncate(limit);
        }
        matching
    }

    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if self.status.is_some_and(|s| ticket.status != s) {
            return false;
        }
        if let Some(category) = &self.category {
            if !ticket.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if !ticket.priority.eq_ignore_ascii_case(priority) {
                return false;
            }
        }
        if self.assigned_to.is_some() && ticket.assigned_to != self.assigned_to {
            return false;
        }
        if let Some(range) = &self.created {
            if !range.contains(ticket.created_at) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let query = query.to_lowercase();
                let number = ticket.number.to_string();
                [
                    number.as_str(),
                    ticket.title.as_str(),
                    ticket.description.as_str(),
                    ticket.user_name.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
            },
            None => true,
        }
    }
}
