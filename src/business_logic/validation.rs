use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::business_logic::{EventKind, RawRow, SkipReason, SkippedRow, VestingEvent};

impl FromStr for EventKind {
    type Err = SkipReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VEST" => Ok(Self::Vest),
            "CANCEL" => Ok(Self::Cancel),
            _ => Err(SkipReason::InvalidEventKind),
        }
    }
}

/// Validate one raw row. Rows are independent of each other; a failure
/// turns the row into a `SkippedRow` carrying its original fields.
pub(super) fn validate_row(row: RawRow) -> Result<VestingEvent, SkippedRow> {
    match parse_fields(&row.fields) {
        Ok(event) => Ok(event),
        Err(reason) => Err(SkippedRow {
            line: row.line,
            raw: row.fields,
            reason,
        }),
    }
}

fn parse_fields(fields: &[String]) -> Result<VestingEvent, SkipReason> {
    let (date, amount, kind) = match fields {
        [date, amount] => (date, amount, None),
        [date, amount, kind] => (date, amount, Some(kind)),
        _ => return Err(SkipReason::MalformedRow),
    };

    let event_date =
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| SkipReason::InvalidDate)?;

    let amount = Decimal::from_str(amount).map_err(|_| SkipReason::InvalidAmount)?;
    if amount < Decimal::ZERO {
        return Err(SkipReason::InvalidAmount);
    }

    let kind = match kind {
        Some(kind) => kind.parse()?,
        None => EventKind::Vest,
    };

    Ok(VestingEvent {
        event_date,
        kind,
        amount,
    })
}
