//! Codebook: variables and the codes permitted for each
//!
//! Codes form a tree (parent references) with active/inactive toggles.
//! The tree is flattened once at load time into a per-variable `code_map`
//! with `active_parent` precomputed, so per-token filtering never walks
//! parents.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A code as supplied by the codebook editor (tree form)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Code {
    pub value: String,
    /// Parent code value, if this code is nested
    #[serde(default)]
    pub parent: Option<String>,
    /// Explicit override color (always wins over the generated color)
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Code {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            parent: None,
            color: None,
            active: true,
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Flattened per-code information used at filter/render time
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CodeInfo {
    pub color: Option<String>,
    pub active: bool,
    /// True when every ancestor in the code tree is active
    pub active_parent: bool,
}

impl CodeInfo {
    /// A code is usable when it and all its ancestors are active
    pub fn is_usable(&self) -> bool {
        self.active && self.active_parent
    }
}

/// Codes for one variable, flattened
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct VariableCodes {
    pub code_map: BTreeMap<String, CodeInfo>,
}

/// The active codebook: variable -> flattened code map
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Codebook {
    pub variables: BTreeMap<String, VariableCodes>,
}

impl Codebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a codebook for a single variable from tree-form codes
    pub fn from_codes(variable: &str, codes: Vec<Code>) -> Self {
        let mut book = Codebook::new();
        book.set_variable(variable, codes);
        book
    }

    /// Replace the codes of one variable, flattening the code tree
    pub fn set_variable(&mut self, variable: &str, codes: Vec<Code>) {
        let by_value: BTreeMap<&str, &Code> =
            codes.iter().map(|c| (c.value.as_str(), c)).collect();

        let mut code_map = BTreeMap::new();
        for code in &codes {
            let active_parent = ancestors_active(code, &by_value);
            code_map.insert(
                code.value.clone(),
                CodeInfo {
                    color: code.color.clone(),
                    active: code.active,
                    active_parent,
                },
            );
        }

        self.variables
            .insert(variable.to_string(), VariableCodes { code_map });
    }

    /// Add a single code to a variable (free-text code creation)
    pub fn add_code(&mut self, variable: &str, value: &str) {
        let entry = self.variables.entry(variable.to_string()).or_default();
        entry.code_map.entry(value.to_string()).or_insert(CodeInfo {
            color: None,
            active: true,
            active_parent: true,
        });
    }

    /// Look up the flattened info for a (variable, value) pair
    pub fn code_info(&self, variable: &str, value: &str) -> Option<&CodeInfo> {
        self.variables.get(variable)?.code_map.get(value)
    }

    /// Whether a (variable, value) pair is known and fully active
    pub fn is_active(&self, variable: &str, value: &str) -> bool {
        self.code_info(variable, value)
            .map(|info| info.is_usable())
            .unwrap_or(false)
    }

    /// Explicit override color for a code, if any
    pub fn color_override(&self, variable: &str, value: &str) -> Option<&str> {
        self.code_info(variable, value)?.color.as_deref()
    }

    /// The active code values of a variable, for popup display
    pub fn active_values(&self, variable: &str) -> Vec<&str> {
        self.variables
            .get(variable)
            .map(|v| {
                v.code_map
                    .iter()
                    .filter(|(_, info)| info.is_usable())
                    .map(|(value, _)| value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Walk the parent chain and check that every ancestor is active.
///
/// Cycle-safe: a visited set stops the walk, and a cycle counts as an
/// inactive ancestry so malformed trees hide codes instead of looping.
fn ancestors_active(code: &Code, by_value: &BTreeMap<&str, &Code>) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(code.value.as_str());

    let mut current = code.parent.as_deref();
    while let Some(parent_value) = current {
        if !visited.insert(parent_value) {
            return false;
        }
        match by_value.get(parent_value) {
            Some(parent) => {
                if !parent.active {
                    return false;
                }
                current = parent.parent.as_deref();
            }
            // Unknown parent reference: treat the chain as ending here
            None => return true,
        }
    }
    true
}
