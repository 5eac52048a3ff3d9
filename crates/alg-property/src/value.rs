//! Property values
//!
//! [`PropertyValue`] is a closed tagged union over the kinds a property can
//! hold. Each kind has one canonical string form: arrays are comma-separated
//! and a workspace is written as its name.

use alg_workspace::WorkspaceHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag of a [`PropertyValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// `bool`
    Bool,
    /// `i64`
    Int,
    /// `f64`
    Float,
    /// `String`
    Str,
    /// `Vec<i64>`
    IntArray,
    /// `Vec<f64>`
    FloatArray,
    /// `Vec<String>`
    StrArray,
    /// Named workspace slot
    Workspace,
}

impl PropertyKind {
    /// Whether values of this kind are arrays
    #[inline]
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(self, Self::IntArray | Self::FloatArray | Self::StrArray)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::IntArray => "int array",
            Self::FloatArray => "float array",
            Self::StrArray => "string array",
            Self::Workspace => "workspace",
        };
        f.write_str(name)
    }
}

/// Workspace property payload: a data-service name plus the resolved handle
///
/// Input slots are usually set by name and resolved before execution;
/// output slots get their handle from the algorithm and their name from the
/// caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSlot {
    name: String,
    handle: Option<WorkspaceHandle>,
}

impl WorkspaceSlot {
    /// Slot referring to a stored workspace by name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
        }
    }

    /// Slot holding a workspace directly
    #[must_use]
    pub fn with_handle(handle: WorkspaceHandle) -> Self {
        Self {
            name: String::new(),
            handle: Some(handle),
        }
    }

    /// Data-service name, empty if unnamed
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the slot
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Attached workspace
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<&WorkspaceHandle> {
        self.handle.as_ref()
    }

    /// Attach a workspace
    pub fn set_handle(&mut self, handle: WorkspaceHandle) {
        self.handle = Some(handle);
    }

    /// Detach the workspace
    pub fn clear_handle(&mut self) -> Option<WorkspaceHandle> {
        self.handle.take()
    }

    /// Neither named nor holding a workspace
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.handle.is_none()
    }
}

/// Value held by a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Str(String),
    /// Integer list
    IntArray(Vec<i64>),
    /// Number list
    FloatArray(Vec<f64>),
    /// Text list
    StrArray(Vec<String>),
    /// Workspace slot
    Workspace(WorkspaceSlot),
}

impl PropertyValue {
    /// Tag of this value
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::Str(_) => PropertyKind::Str,
            Self::IntArray(_) => PropertyKind::IntArray,
            Self::FloatArray(_) => PropertyKind::FloatArray,
            Self::StrArray(_) => PropertyKind::StrArray,
            Self::Workspace(_) => PropertyKind::Workspace,
        }
    }

    /// Empty value of a kind: false, zero, empty text, empty list or slot
    #[must_use]
    pub fn empty(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Bool => Self::Bool(false),
            PropertyKind::Int => Self::Int(0),
            PropertyKind::Float => Self::Float(0.0),
            PropertyKind::Str => Self::Str(String::new()),
            PropertyKind::IntArray => Self::IntArray(Vec::new()),
            PropertyKind::FloatArray => Self::FloatArray(Vec::new()),
            PropertyKind::StrArray => Self::StrArray(Vec::new()),
            PropertyKind::Workspace => Self::Workspace(WorkspaceSlot::default()),
        }
    }

    /// Parse the string form of a value of `kind`
    ///
    /// Integer arrays also accept inclusive `start:end` ranges as elements.
    ///
    /// # Errors
    /// Parser message describing the first bad element
    pub fn parse(kind: PropertyKind, input: &str) -> Result<Self, String> {
        match kind {
            PropertyKind::Bool => parse_bool(input).map(Self::Bool),
            PropertyKind::Int => parse_int(input).map(Self::Int),
            PropertyKind::Float => parse_float(input).map(Self::Float),
            PropertyKind::Str => Ok(Self::Str(input.to_string())),
            PropertyKind::IntArray => parse_int_list(input).map(Self::IntArray),
            PropertyKind::FloatArray => split_list(input)
                .map(parse_float)
                .collect::<Result<_, _>>()
                .map(Self::FloatArray),
            PropertyKind::StrArray => Ok(Self::StrArray(
                split_list(input).map(str::to_string).collect(),
            )),
            PropertyKind::Workspace => Ok(Self::Workspace(WorkspaceSlot::named(input.trim()))),
        }
    }

    /// Convert a JSON value into a value of `kind`
    ///
    /// JSON strings go through [`parse`](Self::parse); native JSON numbers,
    /// booleans and arrays are taken as they are.
    ///
    /// # Errors
    /// Message describing the mismatch
    pub fn from_json(kind: PropertyKind, json: &serde_json::Value) -> Result<Self, String> {
        use serde_json::Value;

        if let Value::String(s) = json {
            return Self::parse(kind, s);
        }
        let mismatch = || format!("expected {kind}, got JSON {json}");
        match (kind, json) {
            (PropertyKind::Bool, Value::Bool(b)) => Ok(Self::Bool(*b)),
            (PropertyKind::Int, Value::Number(n)) => n.as_i64().map(Self::Int).ok_or_else(mismatch),
            (PropertyKind::Float, Value::Number(n)) => {
                n.as_f64().map(Self::Float).ok_or_else(mismatch)
            }
            (PropertyKind::IntArray, Value::Array(items)) => items
                .iter()
                .map(|v| v.as_i64().ok_or_else(mismatch))
                .collect::<Result<_, _>>()
                .map(Self::IntArray),
            (PropertyKind::FloatArray, Value::Array(items)) => items
                .iter()
                .map(|v| v.as_f64().ok_or_else(mismatch))
                .collect::<Result<_, _>>()
                .map(Self::FloatArray),
            (PropertyKind::StrArray, Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(mismatch))
                .collect::<Result<_, _>>()
                .map(Self::StrArray),
            _ => Err(mismatch()),
        }
    }

    /// JSON form; a workspace is written as its name
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::json!(i),
            Self::Float(f) => serde_json::json!(f),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::IntArray(v) => serde_json::json!(v),
            Self::FloatArray(v) => serde_json::json!(v),
            Self::StrArray(v) => serde_json::json!(v),
            Self::Workspace(slot) => serde_json::Value::String(slot.name.clone()),
        }
    }

    /// Numeric view of scalars
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Workspace slot, if this is a workspace value
    #[inline]
    #[must_use]
    pub fn as_workspace(&self) -> Option<&WorkspaceSlot> {
        match self {
            Self::Workspace(slot) => Some(slot),
            _ => None,
        }
    }

    /// Mutable workspace slot, if this is a workspace value
    #[inline]
    pub fn as_workspace_mut(&mut self) -> Option<&mut WorkspaceSlot> {
        match self {
            Self::Workspace(slot) => Some(slot),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::IntArray(v) => write_list(f, v),
            Self::FloatArray(v) => write_list(f, v),
            Self::StrArray(v) => write_list(f, v),
            Self::Workspace(slot) => f.write_str(&slot.name),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn split_list(input: &str) -> impl Iterator<Item = &str> {
    let trimmed = input.trim();
    trimmed
        .split(',')
        .map(str::trim)
        .filter(move |_| !trimmed.is_empty())
}

fn parse_bool(input: &str) -> Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("'{other}' is not a boolean")),
    }
}

fn parse_int(input: &str) -> Result<i64, String> {
    input
        .trim()
        .parse()
        .map_err(|e| format!("'{}' is not an integer: {e}", input.trim()))
}

fn parse_float(input: &str) -> Result<f64, String> {
    input
        .trim()
        .parse()
        .map_err(|e| format!("'{}' is not a number: {e}", input.trim()))
}

/// Most values an integer list may expand to from its string form
pub const MAX_INT_LIST_LEN: usize = 1 << 20;

fn parse_int_list(input: &str) -> Result<Vec<i64>, String> {
    let mut values = Vec::new();
    for item in split_list(input) {
        match item.split_once(':') {
            Some((start, end)) => {
                let (start, end) = (parse_int(start)?, parse_int(end)?);
                if end < start {
                    return Err(format!("range '{item}' is descending"));
                }
                let len = end
                    .checked_sub(start)
                    .and_then(|span| usize::try_from(span).ok())
                    .and_then(|span| span.checked_add(1))
                    .filter(|len| values.len().saturating_add(*len) <= MAX_INT_LIST_LEN)
                    .ok_or_else(|| {
                        format!("range '{item}' expands past {MAX_INT_LIST_LEN} values")
                    })?;
                values.reserve(len);
                values.extend(start..=end);
            }
            None => {
                if values.len() >= MAX_INT_LIST_LEN {
                    return Err(format!("list has more than {MAX_INT_LIST_LEN} values"));
                }
                values.push(parse_int(item)?);
            }
        }
    }
    Ok(values)
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntArray(v)
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatArray(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        Self::StrArray(v)
    }
}

impl From<WorkspaceSlot> for PropertyValue {
    fn from(v: WorkspaceSlot) -> Self {
        Self::Workspace(v)
    }
}

impl From<WorkspaceHandle> for PropertyValue {
    fn from(v: WorkspaceHandle) -> Self {
        Self::Workspace(WorkspaceSlot::with_handle(v))
    }
}

/// Rust types that can be read out of a [`PropertyValue`]
pub trait FromPropertyValue: Sized {
    /// Kind this type is stored as
    const KIND: PropertyKind;

    /// Extract, or `None` if the kind differs
    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! impl_from_property_value {
    ($ty:ty, $kind:ident) => {
        impl FromPropertyValue for $ty {
            const KIND: PropertyKind = PropertyKind::$kind;

            #[allow(clippy::clone_on_copy)]
            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$kind(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_property_value!(bool, Bool);
impl_from_property_value!(i64, Int);
impl_from_property_value!(f64, Float);
impl_from_property_value!(String, Str);
impl_from_property_value!(Vec<i64>, IntArray);
impl_from_property_value!(Vec<f64>, FloatArray);
impl_from_property_value!(Vec<String>, StrArray);
impl_from_property_value!(WorkspaceSlot, Workspace);
