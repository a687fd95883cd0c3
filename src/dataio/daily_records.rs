use chrono::NaiveDate;
use nalgebra::DVector;
use std::fmt;
use std::io;
use std::path::Path;

/// File name prefix of the national COVID-19 bulletins published by the
/// Italian civil protection department, one CSV file per day.
pub const ANDAMENTO_PREFIX: &str = "dpc-covid19-ita-andamento-nazionale-";
/// Column holding the currently positive cases.
pub const POSITIVE_COLUMN: &str = "totale_positivi";

/// Errors of the data acquisition and conditioning layer.
#[derive(Debug)]
pub enum DataError {
    /// A bulletin expected inside the date range does not exist.
    MissingFile(String),
    /// The requested column is absent from a bulletin header.
    MissingColumn { column: String, file: String },
    /// The requested field does not parse as a number.
    BadNumber {
        column: String,
        file: String,
        value: String,
    },
    /// A bulletin has a header but no records.
    EmptyFile(String),
    /// The assembled series has no entries.
    EmptySeries,
    /// All entries of the series are equal, no scale can be learned.
    ConstantSeries,
    Csv(csv::Error),
    Io(io::Error),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataError::MissingFile(path) => {
                write!(f, "Daily bulletin not found: {}", path)
            }
            DataError::MissingColumn { column, file } => {
                write!(f, "Column '{}' not found in {}", column, file)
            }
            DataError::BadNumber {
                column,
                file,
                value,
            } => {
                write!(
                    f,
                    "Column '{}' in {} holds a non-numeric value '{}'",
                    column, file, value
                )
            }
            DataError::EmptyFile(file) => write!(f, "No records in {}", file),
            DataError::EmptySeries => write!(f, "The observation series is empty"),
            DataError::ConstantSeries => {
                write!(f, "All observations are equal, no scale can be learned")
            }
            DataError::Csv(e) => write!(f, "CSV error: {}", e),
            DataError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Csv(e) => Some(e),
            DataError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::Csv(e)
    }
}

impl From<io::Error> for DataError {
    fn from(e: io::Error) -> Self {
        DataError::Io(e)
    }
}

/// Read one value per day from a run of daily CSV bulletins named
/// `<prefix>YYYYMMDD.csv` under `dir`, taking the named column of the first
/// record of each file. Every date of the inclusive range must have its
/// bulletin on disk; a gap is an error, not a silent skip. Returns the
/// dates together with the assembled series.
pub fn read_daily_series(
    dir: &Path,
    prefix: &str,
    start: NaiveDate,
    end: NaiveDate,
    column: &str,
) -> Result<(Vec<NaiveDate>, DVector<f64>), DataError> {
    let mut dates = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        let name = format!("{}{}.csv", prefix, date.format("%Y%m%d"));
        let file = dir.join(&name);
        if !file.exists() {
            return Err(DataError::MissingFile(file.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(&file)?;
        let position = reader
            .headers()?
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| DataError::MissingColumn {
                column: column.to_string(),
                file: name.clone(),
            })?;
        let record = match reader.records().next() {
            Some(record) => record?,
            None => return Err(DataError::EmptyFile(name.clone())),
        };
        let raw = record.get(position).unwrap_or("");
        let value: f64 = raw.trim().parse().map_err(|_| DataError::BadNumber {
            column: column.to_string(),
            file: name.clone(),
            value: raw.to_string(),
        })?;
        dates.push(date);
        values.push(value);
    }
    Ok((dates, DVector::from_vec(values)))
}
