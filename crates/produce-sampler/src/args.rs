//! Host-facing parameter types.
//!
//! [`Arguments`] is the ordered list a sampler advertises as its defaults;
//! [`SamplerContext`] is what the host hands back on every lifecycle call,
//! after substituting its own variables into those defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named parameter with its default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: String,
}

/// Ordered parameter list advertised by a sampler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    arguments: Vec<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. A repeated name replaces the earlier value in place.
    pub fn add_argument(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.arguments.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.arguments.push(Argument { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.arguments.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter()
    }
}

/// Parameter values for one lifecycle call.
#[derive(Debug, Clone, Default)]
pub struct SamplerContext {
    parameters: HashMap<String, String>,
}

impl SamplerContext {
    pub fn new(parameters: HashMap<String, String>) -> Self {
        Self { parameters }
    }

    /// Start from a sampler's advertised defaults.
    pub fn from_arguments(arguments: &Arguments) -> Self {
        arguments
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect()
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(name, value);
        self
    }
}

impl<K, V> FromIterator<(K, V)> for SamplerContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
