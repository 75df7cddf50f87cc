//! Capability model
//!
//! An [`Ability`] is an ordered list of rules. When several rules match a
//! descriptor the last one decides; `manage` stands for every action and
//! `all` for every subject. No matching rule means the request is denied.
//!
//! # Examples
//!
//! ```
//! use application::{Ability, AbilityDescriptor, CapabilityRule};
//!
//! let ability = Ability::new(vec![
//!     CapabilityRule::allow("manage", "User"),
//!     CapabilityRule::forbid("delete", "User"),
//! ]);
//!
//! assert!(ability.can(&AbilityDescriptor::new("update", "User")));
//! assert!(!ability.can(&AbilityDescriptor::new("delete", "User")));
//! assert!(!ability.can(&AbilityDescriptor::new("read", "Invoice")));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action wildcard
pub const MANAGE: &str = "manage";

/// Subject wildcard
pub const ALL: &str = "all";

/// What an operation wants to do, to what, under which conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDescriptor {
    pub action: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeMap<String, Value>>,
}

impl AbilityDescriptor {
    pub fn new(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
            conditions: None,
        }
    }

    /// Add a condition value the rules can match on
    #[must_use]
    pub fn with_condition(mut self, key: impl Into<String>, value: Value) -> Self {
        self.conditions
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }
}

/// One allow or forbid rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRule {
    pub action: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CapabilityRule {
    /// Grant `action` on `subject`
    pub fn allow(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
            conditions: None,
            inverted: false,
            reason: None,
        }
    }

    /// Deny `action` on `subject`
    pub fn forbid(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            inverted: true,
            ..Self::allow(action, subject)
        }
    }

    /// Only match descriptors carrying this condition value
    #[must_use]
    pub fn with_condition(mut self, key: impl Into<String>, value: Value) -> Self {
        self.conditions
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    /// Explain a denial
    #[must_use]
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether this rule applies to the descriptor
    pub fn matches(&self, descriptor: &AbilityDescriptor) -> bool {
        let action_matches = self.action == MANAGE || self.action == descriptor.action;
        let subject_matches = self.subject == ALL || self.subject == descriptor.subject;
        action_matches && subject_matches && self.conditions_match(descriptor)
    }

    fn conditions_match(&self, descriptor: &AbilityDescriptor) -> bool {
        let Some(required) = &self.conditions else {
            return true;
        };
        let Some(given) = &descriptor.conditions else {
            return required.is_empty();
        };
        required
            .iter()
            .all(|(key, value)| given.get(key) == Some(value))
    }
}

/// Resolved capability set of an actor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ability {
    rules: Vec<CapabilityRule>,
}

impl Ability {
    pub const fn new(rules: Vec<CapabilityRule>) -> Self {
        Self { rules }
    }

    /// An ability that permits nothing
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[CapabilityRule] {
        &self.rules
    }

    /// Append rules after the existing ones
    pub fn extend(&mut self, rules: impl IntoIterator<Item = CapabilityRule>) {
        self.rules.extend(rules);
    }

    /// The last rule matching the descriptor
    pub fn relevant_rule(&self, descriptor: &AbilityDescriptor) -> Option<&CapabilityRule> {
        self.rules.iter().rev().find(|rule| rule.matches(descriptor))
    }

    /// Whether the descriptor is permitted
    pub fn can(&self, descriptor: &AbilityDescriptor) -> bool {
        self.relevant_rule(descriptor)
            .is_some_and(|rule| !rule.inverted)
    }

    pub fn cannot(&self, descriptor: &AbilityDescriptor) -> bool {
        !self.can(descriptor)
    }
}
