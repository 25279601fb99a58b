use std::{fs::File, io::Write, path::PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::shared::errors::Error;

mod schedule_logic;
mod validation;

/// Rows are validated in fixed-size groups. Purely an iteration pattern:
/// chunk boundaries never show up in the schedule or the skip log.
const BATCH_SIZE: usize = 100;

/// One raw CSV row paired with its 0-based position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRow {
    line: usize,
    fields: Vec<String>,
}

/// Optional third column of a row. A two-field row is a plain vest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Vest,
    Cancel,
}

/// One validated input row. Immutable once built; folded into the
/// running total and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VestingEvent {
    event_date: NaiveDate,
    kind: EventKind,
    /// Vested units, `>= 0`. Cancellations carry their sign via `kind`.
    amount: Decimal,
}

/// Why a row was rejected. Checks run in this order and the first
/// failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum SkipReason {
    #[error("wrong number of fields")]
    MalformedRow,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid or negative amount")]
    InvalidAmount,
    #[error("invalid event type")]
    InvalidEventKind,
}

/// A rejected row, kept verbatim for diagnostics. Never part of the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SkippedRow {
    pub(crate) line: usize,
    pub(crate) raw: Vec<String>,
    pub(crate) reason: SkipReason,
}

/// One output entry: the running total of all valid amounts with
/// `event_date <= date`, rounded half-to-even to the configured precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SchedulePoint {
    pub(crate) date: NaiveDate,
    pub(crate) cumulative_amount: Decimal,
}

/// Everything the aggregation produces: the schedule plus the skip log.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ScheduleReport {
    pub(crate) schedule: Vec<SchedulePoint>,
    pub(crate) skipped: Vec<SkippedRow>,
}

#[derive(Debug, Serialize)]
struct ScheduleRecord {
    date: NaiveDate,
    cumulative_amount: String,
}

/**
 * Having a CSV input file, rows are processed as follows:
 * | date [YYYY-MM-DD] | amount [decimal >= 0] | event type [VEST|CANCEL, optional] |
 *
 * Each row is validated independently; a row failing any check is skipped
 * with a reason and processing continues. Valid rows dated after the target
 * date are simply out of the requested window: excluded, but not skipped.
 *
 * The remaining events are sorted by date (stable, so equal dates keep
 * input order) and folded into a running total kept at full precision.
 * One point per distinct date is emitted, rounded half-to-even to
 * `precision` decimals only at emission, so rounding never compounds.
 *
 * OUTPUT lines (stdout, no header):
 * | date [YYYY-MM-DD] | cumulative amount [{.precision}] |
 *
 * The returned report carries the skip log; logging it is the caller's job.
 */
pub(crate) fn compute_vesting_schedule<W>(
    input_file: PathBuf,
    target_date: NaiveDate,
    precision: u32,
    writer: W,
) -> Result<ScheduleReport, Error>
where
    W: Write,
{
    if input_file
        .extension()
        .map_or(true, |ext| !ext.eq_ignore_ascii_case("csv"))
    {
        return Err(Error::NotCsvFile(input_file));
    }

    let file = File::open(&input_file).map_err(Error::Io)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(Error::Csv)?;
        rows.push(RawRow {
            line,
            fields: record.iter().map(str::to_owned).collect(),
        });
    }

    let report = schedule_logic::compute_schedule(rows, target_date, precision);
    write_schedule(&report.schedule, precision, writer)?;

    Ok(report)
}

fn write_schedule<W>(schedule: &[SchedulePoint], precision: u32, writer: W) -> Result<(), Error>
where
    W: Write,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    schedule
        .iter()
        .try_for_each(|point| -> Result<(), Error> {
            writer
                .serialize(ScheduleRecord {
                    date: point.date,
                    cumulative_amount: format!(
                        "{:.1$}",
                        point.cumulative_amount, precision as usize
                    ),
                })
                .map_err(Error::Csv)
        })?;

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use std::{fs::File, io::Read, path::PathBuf};

    use chrono::NaiveDate;

    use crate::business_logic::{compute_vesting_schedule, ScheduleReport, SkipReason};
    use crate::shared::errors::Error;

    fn target(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    fn check_result(
        input_file: PathBuf,
        target_date: &str,
        precision: u32,
        output_file: PathBuf,
    ) -> ScheduleReport {
        let mut buf = Vec::new();
        let report =
            compute_vesting_schedule(input_file, target(target_date), precision, &mut buf)
                .unwrap();
        let output = String::from_utf8(buf).unwrap();

        let mut expected_out = "".to_owned();
        File::open(output_file)
            .unwrap()
            .read_to_string(&mut expected_out)
            .unwrap();

        assert_eq!(output, expected_out);
        report
    }

    #[test]
    fn test_basic() {
        let report = check_result(
            PathBuf::from("./tests/inputs/input_01_basic.csv"),
            "2023-03-01",
            2,
            PathBuf::from("./tests/outputs/expected_output_01_basic.csv"),
        );

        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].reason, SkipReason::InvalidAmount);
        assert_eq!(report.skipped[1].reason, SkipReason::InvalidDate);
    }

    #[test]
    fn test_cancel_events() {
        let report = check_result(
            PathBuf::from("./tests/inputs/input_02_cancel.csv"),
            "2024-12-31",
            1,
            PathBuf::from("./tests/outputs/expected_output_02_cancel.csv"),
        );

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::InvalidEventKind);
    }

    #[test]
    fn test_all_out_of_window() {
        let report = check_result(
            PathBuf::from("./tests/inputs/input_03_out_of_window.csv"),
            "2020-01-01",
            2,
            PathBuf::from("./tests/outputs/expected_output_03_out_of_window.csv"),
        );

        // Future-dated rows are excluded, not skipped.
        assert!(report.schedule.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_rejects_non_csv_path() {
        let result = compute_vesting_schedule(
            PathBuf::from("./tests/inputs/input_01_basic.txt"),
            target("2023-03-01"),
            2,
            std::io::sink(),
        );

        assert!(matches!(result, Err(Error::NotCsvFile(_))));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = compute_vesting_schedule(
            PathBuf::from("./tests/inputs/does_not_exist.csv"),
            target("2023-03-01"),
            2,
            std::io::sink(),
        );

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
