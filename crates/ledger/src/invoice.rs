//! Per-day-unique invoice numbers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::Error;

/// An invoice number: `"IV"` + `yyyyMMdd` + zero-padded 3-digit sequence.
///
/// The number links a source-outflow movement to its destination-inflow
/// counterpart and is unique per calendar day. Sequence gaps are acceptable
/// (a rejected or rolled-back approval leaves one); duplicates are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

const PREFIX: &str = "IV";

impl InvoiceNumber {
    /// Build the canonical number for a day + sequence.
    ///
    /// Sequences wider than three digits are kept unpadded rather than
    /// truncated; day 1000+ approvals stay unique.
    pub fn new(day: NaiveDate, sequence: u32) -> Result<Self, Error> {
        if sequence == 0 {
            return Err(Error::validation("invoice sequence starts at 1"));
        }
        Ok(Self(format!("{PREFIX}{}{sequence:03}", day.format("%Y%m%d"))))
    }

    /// Parse a canonical invoice number back into its parts.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let (day, seq) = Self::split(s)?;
        Self::new(day, seq)
    }

    pub fn day(&self) -> NaiveDate {
        // Canonical by construction; split cannot fail on our own value.
        Self::split(&self.0).map(|(day, _)| day).unwrap_or_default()
    }

    pub fn sequence(&self) -> u32 {
        Self::split(&self.0).map(|(_, seq)| seq).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(s: &str) -> Result<(NaiveDate, u32), Error> {
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| Error::validation(format!("invoice number must start with {PREFIX}: {s}")))?;
        if rest.len() < 11 {
            return Err(Error::validation(format!("invoice number too short: {s}")));
        }
        if !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(format!(
                "invoice number must be digits after {PREFIX}: {s}"
            )));
        }
        let (date_part, seq_part) = rest.split_at(8);
        let day = NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|e| Error::validation(format!("invoice date {date_part}: {e}")))?;
        let seq: u32 = seq_part
            .parse()
            .map_err(|e| Error::validation(format!("invoice sequence {seq_part}: {e}")))?;
        Ok((day, seq))
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
