//! Acquisition and conditioning of observation series.

/// daily CSV bulletins, one file per day, one numeric field per file
pub mod daily_records;
/// min-max rescaling of a series into [0, 1] and back
pub mod rescale;
