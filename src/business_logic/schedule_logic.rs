use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::business_logic::{
    validation, EventKind, RawRow, SchedulePoint, ScheduleReport, SkippedRow, VestingEvent,
    BATCH_SIZE,
};

impl VestingEvent {
    fn signed_amount(&self) -> Decimal {
        match self.kind {
            EventKind::Vest => self.amount,
            EventKind::Cancel => -self.amount,
        }
    }
}

pub(super) fn compute_schedule(
    rows: Vec<RawRow>,
    target_date: NaiveDate,
    precision: u32,
) -> ScheduleReport {
    compute_schedule_chunked(rows, target_date, precision, BATCH_SIZE)
}

/// Same computation with an explicit chunk size. Chunking only groups the
/// validation pass; the sort and the prefix sum always run over the merged
/// event list, so the result is identical for every chunk size.
fn compute_schedule_chunked(
    rows: Vec<RawRow>,
    target_date: NaiveDate,
    precision: u32,
    chunk_size: usize,
) -> ScheduleReport {
    let mut events = Vec::new();
    let mut skipped = Vec::new();

    let mut batch = Vec::with_capacity(chunk_size.min(rows.len()));
    for row in rows {
        batch.push(row);
        if batch.len() == chunk_size {
            validate_batch(std::mem::take(&mut batch), target_date, &mut events, &mut skipped);
        }
    }
    if !batch.is_empty() {
        validate_batch(batch, target_date, &mut events, &mut skipped);
    }

    ScheduleReport {
        schedule: accumulate(events, precision),
        skipped,
    }
}

fn validate_batch(
    batch: Vec<RawRow>,
    target_date: NaiveDate,
    events: &mut Vec<VestingEvent>,
    skipped: &mut Vec<SkippedRow>,
) {
    for row in batch {
        match validation::validate_row(row) {
            // Events after the target date are out of the requested window,
            // not invalid: excluded without a skip entry.
            Ok(event) if event.event_date <= target_date => events.push(event),
            Ok(_) => {}
            Err(skip) => skipped.push(skip),
        }
    }
}

/// Fold the events into one cumulative point per distinct date.
///
/// The running total is kept at full precision; rounding happens once per
/// emitted point, so it cannot compound across dates. Half-to-even keeps
/// repeated midpoint amounts from drifting in one direction.
fn accumulate(mut events: Vec<VestingEvent>, precision: u32) -> Vec<SchedulePoint> {
    // Stable sort: equal dates keep their input order.
    events.sort_by_key(|event| event.event_date);

    let mut schedule = Vec::new();
    let mut running_total = Decimal::ZERO;
    let mut remaining = events.iter().peekable();

    while let Some(event) = remaining.next() {
        running_total += event.signed_amount();

        let last_for_date = remaining
            .peek()
            .map_or(true, |next| next.event_date != event.event_date);
        if last_for_date {
            schedule.push(SchedulePoint {
                date: event.event_date,
                cumulative_amount: running_total
                    .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven),
            });
        }
    }

    schedule
}
