//! Workspace metadata: run logs, sample description and instrument reference
//!
//! Everything here is owned by value except the instrument, which is shared
//! read-only between a parent and the workspaces created from it.

use crate::error::WorkspaceError;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Value of a run log
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    /// Free text
    String(String),
    /// Single number
    Number(f64),
    /// Timestamped samples
    TimeSeries(Vec<(DateTime<Utc>, f64)>),
}

impl LogValue {
    /// Numeric view: the number itself, or the mean of a time series
    #[must_use]
    pub fn as_single_value(&self) -> Option<f64> {
        match self {
            Self::String(s) => s.trim().parse().ok(),
            Self::Number(n) => Some(*n),
            Self::TimeSeries(samples) if samples.is_empty() => None,
            #[allow(clippy::cast_precision_loss)]
            Self::TimeSeries(samples) => {
                Some(samples.iter().map(|(_, v)| v).sum::<f64>() / samples.len() as f64)
            }
        }
    }

    /// Type label used in summaries
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::TimeSeries(_) => "time series",
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::TimeSeries(samples) => write!(f, "<{} samples>", samples.len()),
        }
    }
}

/// Run logs in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    logs: IndexMap<String, LogValue>,
}

impl Run {
    /// Empty run
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log
    ///
    /// # Errors
    /// `WorkspaceError::LogExists` if `name` is present and `overwrite` is false
    pub fn add_log(
        &mut self,
        name: impl Into<String>,
        value: LogValue,
        overwrite: bool,
    ) -> Result<(), WorkspaceError> {
        let name = name.into();
        if !overwrite && self.logs.contains_key(&name) {
            return Err(WorkspaceError::LogExists(name));
        }
        self.logs.insert(name, value);
        Ok(())
    }

    /// Append one sample to a time-series log, creating it if needed
    ///
    /// # Errors
    /// `WorkspaceError::InvalidArgument` if `name` holds a non time-series log
    pub fn append_sample(
        &mut self,
        name: &str,
        time: DateTime<Utc>,
        value: f64,
    ) -> Result<(), WorkspaceError> {
        match self
            .logs
            .entry(name.to_string())
            .or_insert_with(|| LogValue::TimeSeries(Vec::new()))
        {
            LogValue::TimeSeries(samples) => {
                samples.push((time, value));
                Ok(())
            }
            other => Err(WorkspaceError::invalid(format!(
                "log '{name}' is a {} log, not a time series",
                other.type_name()
            ))),
        }
    }

    /// Look up a log
    ///
    /// # Errors
    /// `WorkspaceError::LogNotFound` if absent
    pub fn log(&self, name: &str) -> Result<&LogValue, WorkspaceError> {
        self.logs
            .get(name)
            .ok_or_else(|| WorkspaceError::LogNotFound(name.to_string()))
    }

    /// Whether a log exists
    #[inline]
    #[must_use]
    pub fn has_log(&self, name: &str) -> bool {
        self.logs.contains_key(name)
    }

    /// Remove a log, keeping the order of the others
    pub fn remove_log(&mut self, name: &str) -> Option<LogValue> {
        self.logs.shift_remove(name)
    }

    /// Logs in insertion order
    pub fn logs(&self) -> impl Iterator<Item = (&str, &LogValue)> {
        self.logs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of logs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// Whether there are no logs
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Sample description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Sample name
    pub name: String,
    /// Thickness in cm
    pub thickness: f64,
    /// Height in cm
    pub height: f64,
    /// Width in cm
    pub width: f64,
}

/// Read-only reference to an instrument definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentRef {
    name: String,
    parameters: BTreeMap<String, f64>,
}

impl InstrumentRef {
    /// Shared instrument reference
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: BTreeMap<String, f64>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parameters,
        })
    }

    /// Instrument name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Named instrument parameter
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }
}

/// Everything about a workspace except its data buffers
///
/// `Clone` is a deep copy of titles, logs and sample; the instrument `Arc` is
/// shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceMetadata {
    /// Title
    pub title: String,
    /// Comment
    pub comment: String,
    /// Label of the y axis
    pub y_unit: String,
    /// Whether y has been divided by bin width
    pub distribution: bool,
    /// Run logs
    pub run: Run,
    /// Sample description
    pub sample: Sample,
    /// Instrument
    pub instrument: Option<Arc<InstrumentRef>>,
}

impl WorkspaceMetadata {
    /// Metadata with a title
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn add_log_rejects_duplicate_without_overwrite() {
        let mut run = Run::new();
        run.add_log("run_number", LogValue::Number(1234.0), false).unwrap();
        assert_eq!(
            run.add_log("run_number", LogValue::Number(1.0), false),
            Err(WorkspaceError::LogExists("run_number".to_string()))
        );
        run.add_log("run_number", LogValue::Number(5.0), true).unwrap();
        assert_eq!(run.log("run_number").unwrap(), &LogValue::Number(5.0));
    }

    #[test]
    fn logs_keep_insertion_order() {
        let mut run = Run::new();
        run.add_log("b", LogValue::Number(1.0), false).unwrap();
        run.add_log("a", LogValue::Number(2.0), false).unwrap();
        run.add_log("c", LogValue::Number(3.0), false).unwrap();
        run.remove_log("a");
        let names: Vec<&str> = run.logs().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn time_series_mean() {
        let mut run = Run::new();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        run.append_sample("temperature", t0, 10.0).unwrap();
        run.append_sample("temperature", t0, 20.0).unwrap();
        let log = run.log("temperature").unwrap();
        assert_eq!(log.as_single_value(), Some(15.0));
        assert_eq!(log.to_string(), "<2 samples>");
    }

    #[test]
    fn append_sample_to_number_log_fails() {
        let mut run = Run::new();
        run.add_log("charge", LogValue::Number(1.0), false).unwrap();
        assert!(run.append_sample("charge", Utc::now(), 2.0).is_err());
    }

    #[test]
    fn string_log_single_value() {
        assert_eq!(LogValue::String(" 2.5 ".into()).as_single_value(), Some(2.5));
        assert_eq!(LogValue::String("abc".into()).as_single_value(), None);
    }

    #[test]
    fn metadata_clone_is_deep_except_instrument() {
        let mut parent = WorkspaceMetadata::titled("parent");
        parent.instrument = Some(InstrumentRef::new("MARI", BTreeMap::new()));
        let mut child = parent.clone();
        child.run.add_log("x", LogValue::Number(1.0), false).unwrap();
        child.sample.name = "vanadium".into();
        assert!(parent.run.is_empty());
        assert!(parent.sample.name.is_empty());
        assert!(Arc::ptr_eq(
            parent.instrument.as_ref().unwrap(),
            child.instrument.as_ref().unwrap()
        ));
    }
}
