//! # Payment Plan Parsing
//!
//! Stored payment plans carry a code: `"00"` for a single immediate tender,
//! or slash-separated day offsets (`"30/60"`) for term billing. The code is
//! parsed into [`PlanKind`] exactly once, at the sale-closing boundary;
//! everything downstream pattern-matches on the closed union. No string
//! comparison survives past this module.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::TERM_MAX_INSTALLMENTS;

/// Plan code of the single-tender form.
pub const SINGLE_PLAN_CODE: &str = "00";

/// The decoded payment plan of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// One tender covering the whole total, settled at close time.
    Single,
    /// One future-dated installment per day offset, in code order.
    Term(Vec<u32>),
}

impl PlanKind {
    /// Parses a stored plan code.
    ///
    /// ## Rules
    /// - `"00"` is the single-tender form
    /// - anything else must be slash-separated non-negative day offsets,
    ///   each a plain integer (`"30"`, `"30/60"`, `"0/30/60"`)
    /// - blank codes, blank segments, and non-numeric segments are rejected
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::plan::PlanKind;
    ///
    /// assert_eq!(PlanKind::parse("00").unwrap(), PlanKind::Single);
    /// assert_eq!(
    ///     PlanKind::parse("30/60").unwrap(),
    ///     PlanKind::Term(vec![30, 60])
    /// );
    /// assert!(PlanKind::parse("30/x").is_err());
    /// ```
    pub fn parse(code: &str) -> ValidationResult<PlanKind> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "payment plan code".to_string(),
            });
        }
        if code == SINGLE_PLAN_CODE {
            return Ok(PlanKind::Single);
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "payment plan code".to_string(),
            reason: reason.to_string(),
        };

        let mut offsets = Vec::new();
        for segment in code.split('/') {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(invalid("empty installment offset"));
            }
            let days: u32 = segment
                .parse()
                .map_err(|_| invalid("offsets must be whole day counts"))?;
            offsets.push(days);
        }

        if offsets.len() > TERM_MAX_INSTALLMENTS {
            return Err(invalid("too many installments"));
        }

        Ok(PlanKind::Term(offsets))
    }

    /// Due dates for a term plan, counted from `from`.
    ///
    /// The single form settles immediately and yields no due dates.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use vero_core::plan::PlanKind;
    ///
    /// let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let plan = PlanKind::parse("30/60").unwrap();
    /// assert_eq!(
    ///     plan.due_dates(from),
    ///     vec![
    ///         NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    ///         NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
    ///     ]
    /// );
    /// ```
    pub fn due_dates(&self, from: NaiveDate) -> Vec<NaiveDate> {
        match self {
            PlanKind::Single => Vec::new(),
            PlanKind::Term(offsets) => offsets
                .iter()
                .map(|days| from + Duration::days(*days as i64))
                .collect(),
        }
    }
}
