//! Attach a run log to a workspace

use super::declare_in_out;
use crate::algorithm::Algorithm;
use crate::error::{AlgorithmError, ValidationIssue};
use crate::runner::ExecutionContext;
use alg_property::{
    Direction, ListValidator, MandatoryValidator, Property, PropertyError, PropertyManager,
};
use alg_workspace::LogValue;

const WORKSPACE: &str = "Workspace";

/// Add or overwrite one run log
#[derive(Debug, Default)]
pub struct AddSampleLog;

impl AddSampleLog {
    fn value(log_type: &str, text: &str) -> Result<LogValue, String> {
        match log_type {
            "Number" => text
                .trim()
                .parse()
                .map(LogValue::Number)
                .map_err(|_| format!("'{text}' is not a number")),
            _ => Ok(LogValue::String(text.to_string())),
        }
    }
}

impl Algorithm for AddSampleLog {
    fn name(&self) -> &'static str {
        "AddSampleLog"
    }

    fn category(&self) -> &'static str {
        "DataHandling\\Logs"
    }

    fn summary(&self) -> &'static str {
        "Add a string or numeric log to a workspace's run"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_in_out(properties, WORKSPACE, MandatoryValidator::new())?;
        properties.declare(
            Property::new("LogName", "", Direction::Input)
                .with_validator(MandatoryValidator::new())
                .with_documentation("Name of the log"),
        )?;
        properties.declare(
            Property::new("LogText", "", Direction::Input).with_documentation("Value of the log"),
        )?;
        properties.declare(
            Property::new("LogType", "String", Direction::Input)
                .with_validator(ListValidator::new(["String", "Number"]))
                .with_documentation("How LogText is stored"),
        )
    }

    fn validate_inputs(&self, properties: &PropertyManager) -> Vec<ValidationIssue> {
        let (Ok(log_type), Ok(text)) = (
            properties.get::<String>("LogType"),
            properties.get::<String>("LogText"),
        ) else {
            return Vec::new();
        };
        match Self::value(&log_type, &text) {
            Ok(_) => Vec::new(),
            Err(message) => vec![("LogText".to_string(), message)],
        }
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let name: String = ctx.get("LogName")?;
        let value = Self::value(&ctx.get::<String>("LogType")?, &ctx.get::<String>("LogText")?)
            .map_err(AlgorithmError::InvalidArgument)?;
        let handle = ctx.workspace(WORKSPACE)?;
        handle
            .write()
            .metadata_mut()
            .run
            .add_log(name.as_str(), value, true)?;
        tracing::debug!(log = %name, "added sample log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_logs_must_parse() {
        assert_eq!(AddSampleLog::value("Number", " 4.5 "), Ok(LogValue::Number(4.5)));
        assert!(AddSampleLog::value("Number", "four").is_err());
        assert_eq!(
            AddSampleLog::value("String", "four"),
            Ok(LogValue::String("four".to_string()))
        );
    }
}
