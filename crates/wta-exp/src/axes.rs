//! Named, ordered candidate value lists and their Cartesian product.
//!
//! A plan registers only its varying axes here. Fixed lists never enter the
//! product and are handed whole to the command builder.

use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use wta_core::errors::{ErrorInfo, SweepError};

pub const TASK_PLACEMENT_POLICIES: &str = "task_placement_policies";
pub const DATACENTERS: &str = "datacenters";

/// Axes iterated by the sweep, outermost first.
pub const VARYING_AXES: [&str; 2] = [TASK_PLACEMENT_POLICIES, DATACENTERS];

fn axis_error(code: &str, message: impl Into<String>) -> SweepError {
    SweepError::Axis(ErrorInfo::new(code, message))
}

/// A single candidate value on an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AxisValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AxisValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AxisValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

/// Renders a float in shortest round-trip form (`1` for `1.0`).
pub(crate) fn render_float(value: f64) -> String {
    format!("{}", value)
}

/// Booleans render as `True`/`False`, the form existing result sets were
/// produced with.
pub(crate) fn render_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

impl Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Bool(value) => f.write_str(render_bool(*value)),
            AxisValue::Int(value) => write!(f, "{value}"),
            AxisValue::Float(value) => f.write_str(&render_float(*value)),
            AxisValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<u32> for AxisValue {
    fn from(value: u32) -> Self {
        AxisValue::Int(i64::from(value))
    }
}

impl From<f64> for AxisValue {
    fn from(value: f64) -> Self {
        AxisValue::Float(value)
    }
}

impl From<bool> for AxisValue {
    fn from(value: bool) -> Self {
        AxisValue::Bool(value)
    }
}

impl From<&str> for AxisValue {
    fn from(value: &str) -> Self {
        AxisValue::Text(value.to_string())
    }
}

impl From<String> for AxisValue {
    fn from(value: String) -> Self {
        AxisValue::Text(value)
    }
}

/// Named, ordered, non-empty list of candidate values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    name: String,
    values: Vec<AxisValue>,
}

impl Axis {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Result<Self, SweepError>
    where
        I: IntoIterator<Item = V>,
        V: Into<AxisValue>,
    {
        let name = name.into();
        let values: Vec<AxisValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SweepError::Axis(
                ErrorInfo::new("empty_axis", "axis must list at least one value")
                    .with_context("axis", name),
            ));
        }
        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[AxisValue] {
        &self.values
    }

    /// Returns the first value rendered twice, if any.
    pub fn first_duplicate(&self) -> Option<String> {
        let rendered: Vec<String> = self.values.iter().map(ToString::to_string).collect();
        rendered.iter().duplicates().next().cloned()
    }
}

/// One point of a product: a value per requested axis, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Combination {
    entries: Vec<(String, AxisValue)>,
}

impl Combination {
    pub fn get(&self, axis: &str) -> Option<&AxisValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> &[(String, AxisValue)] {
        &self.entries
    }
}

/// Ordered collection of uniquely named axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AxisSet {
    axes: Vec<Axis>,
}

impl AxisSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, axis: Axis) -> Result<(), SweepError> {
        if self.get(axis.name()).is_some() {
            return Err(SweepError::Axis(
                ErrorInfo::new("duplicate_axis", "axis defined twice")
                    .with_context("axis", axis.name()),
            ));
        }
        self.axes.push(axis);
        Ok(())
    }

    pub fn with(mut self, axis: Axis) -> Result<Self, SweepError> {
        self.insert(axis)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|axis| axis.name() == name)
    }

    pub fn require(&self, name: &str) -> Result<&Axis, SweepError> {
        self.get(name).ok_or_else(|| {
            SweepError::Axis(ErrorInfo::new("unknown_axis", "axis not defined").with_context("axis", name))
        })
    }

    /// Cartesian product over `names`. The first axis is the outermost loop
    /// and the last one varies fastest.
    pub fn product(&self, names: &[&str]) -> Result<Vec<Combination>, SweepError> {
        if names.is_empty() {
            return Ok(vec![Combination::default()]);
        }
        if let Some(name) = names.iter().duplicates().next() {
            return Err(axis_error(
                "duplicate_product_axis",
                format!("axis `{name}` requested twice in product"),
            ));
        }
        let selected = names
            .iter()
            .map(|name| self.require(name))
            .collect::<Result<Vec<_>, _>>()?;
        let combinations = selected
            .iter()
            .map(|axis| axis.values().iter().map(move |value| (axis.name(), value)))
            .multi_cartesian_product()
            .map(|point| Combination {
                entries: point
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
            })
            .collect();
        Ok(combinations)
    }
}
