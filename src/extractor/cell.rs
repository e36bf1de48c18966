use calamine::{Data, ExcelDateTime};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// A raw cell value as read from a source sheet.
///
/// Values are carried verbatim from reader to writer; dates keep their
/// spreadsheet serial number so that no precision is lost on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Serial date (days since 1899-12-30, fractional part is the time).
    DateTime(f64),
    /// Serial duration in days.
    Duration(f64),
    /// Error literal such as `#N/A`.
    Error(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn text<S: Into<String>>(value: S) -> Self {
        CellValue::Text(value.into())
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(v) => CellValue::Int(*v),
            Data::Float(v) => CellValue::Float(*v),
            Data::Bool(v) => CellValue::Bool(*v),
            Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
            Data::DateTime(dt) => CellValue::DateTime(serial_1900(dt)),
            Data::DateTimeIso(s) => iso_to_serial(s)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(v) => match serial_to_datetime(*v) {
                Some(dt) if dt.time().num_seconds_from_midnight() == 0 => {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                }
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{}", v),
            },
            CellValue::Duration(v) => {
                let total_secs = (v * 86_400.0).round() as i64;
                write!(
                    f,
                    "{}:{:02}:{:02}",
                    total_secs / 3600,
                    (total_secs % 3600) / 60,
                    total_secs % 60
                )
            }
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// One data row reduced to its first two columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPair {
    pub a: CellValue,
    pub b: CellValue,
}

impl RowPair {
    pub fn new(a: CellValue, b: CellValue) -> Self {
        Self { a, b }
    }

    pub fn is_blank(&self) -> bool {
        self.a.is_blank() && self.b.is_blank()
    }
}

/// Days between the 1900 and 1904 date systems.
const DATE_SYSTEM_OFFSET: f64 = 1462.0;

/// The serial of `dt` in the 1900 date system, which is what the writer emits.
fn serial_1900(dt: &ExcelDateTime) -> f64 {
    let raw = dt.as_f64();
    // 1904 workbooks are the only ones whose calendar date sits this far from the raw serial.
    match dt.as_datetime().map(datetime_to_serial) {
        Some(serial) if (serial - raw - DATE_SYSTEM_OFFSET).abs() < 1.0 => raw + DATE_SYSTEM_OFFSET,
        _ => raw,
    }
}

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn iso_to_serial(value: &str) -> Option<f64> {
    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some(datetime_to_serial(parsed))
}

fn datetime_to_serial(value: NaiveDateTime) -> f64 {
    let millis = (value - excel_epoch()).num_milliseconds();
    millis as f64 / 86_400_000.0
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(chrono::Duration::milliseconds(millis))
}
