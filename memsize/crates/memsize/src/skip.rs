//! Skip Rules - nodes the walker does not charge
//!
//! A node matched by any rule is marked visited and contributes nothing,
//! and nothing reachable only through it is walked. The referencing slot is
//! still charged its pointer: the rule excludes the target, not the edge.
//! A value stored by value inside its owner is checked too; when matched,
//! its inline fields contribute nothing.
//!
//! Built-in rules:
//!
//! | Rule               | Matches                                        |
//! |--------------------|------------------------------------------------|
//! | [`CanonicalValues`] | values that are their own canonical form     |
//! | [`OpaqueTypes`]     | an exact type name from a configured set      |
//! | [`OpaquePrefixes`]  | a type name starting with a configured prefix |
//! | [`Predicate`]       | any closure over the node                     |

use crate::config::EstimatorConfig;
use crate::reflect::{Identity, Reflect};
use indexmap::IndexSet;
use std::fmt;

/// A rule that excludes nodes from the estimate
///
/// Rules are consulted once per newly discovered node and once per embedded
/// value, and must not call back into the counter that is walking.
pub trait SkipRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Return true to exclude `node`
    fn should_skip(&self, node: &dyn Reflect, identity: Identity) -> bool;
}

/// Excludes interned values such as [`Atom`](memsize_util::Atom)
///
/// Only the canonical instance is excluded. An equal value that is not the
/// canonical copy is charged normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalValues;

impl SkipRule for CanonicalValues {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn should_skip(&self, node: &dyn Reflect, identity: Identity) -> bool {
        node.canonical_form() == Some(identity)
    }
}

/// Excludes types by exact name
#[derive(Debug, Clone, Default)]
pub struct OpaqueTypes {
    names: IndexSet<String>,
}

impl OpaqueTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule for a single type
    pub fn of<T: ?Sized>() -> Self {
        Self::new().with::<T>()
    }

    /// Add a type by its `std::any::type_name`
    pub fn with<T: ?Sized>(mut self) -> Self {
        self.names.insert(std::any::type_name::<T>().to_string());
        self
    }

    /// Add a type name
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OpaqueTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl SkipRule for OpaqueTypes {
    fn name(&self) -> &'static str {
        "opaque-type"
    }

    fn should_skip(&self, _node: &dyn Reflect, identity: Identity) -> bool {
        self.names.contains(identity.type_name())
    }
}

/// Excludes every type whose name starts with one of the prefixes
#[derive(Debug, Clone, Default)]
pub struct OpaquePrefixes {
    prefixes: Vec<String>,
}

impl OpaquePrefixes {
    pub fn new<S: Into<String>>(prefixes: impl IntoIterator<Item = S>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl SkipRule for OpaquePrefixes {
    fn name(&self) -> &'static str {
        "opaque-prefix"
    }

    fn should_skip(&self, _node: &dyn Reflect, identity: Identity) -> bool {
        let name = identity.type_name();
        self.prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

/// Named closure rule
pub struct Predicate<F> {
    name: &'static str,
    test: F,
}

impl<F> Predicate<F>
where
    F: Fn(&dyn Reflect) -> bool + Send + Sync,
{
    pub fn new(name: &'static str, test: F) -> Self {
        Self { name, test }
    }
}

impl<F> SkipRule for Predicate<F>
where
    F: Fn(&dyn Reflect) -> bool + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn should_skip(&self, node: &dyn Reflect, _identity: Identity) -> bool {
        (self.test)(node)
    }
}

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish()
    }
}

/// Ordered collection of rules; the first match wins
#[derive(Default)]
pub struct SkipRuleSet {
    rules: Vec<Box<dyn SkipRule>>,
}

impl SkipRuleSet {
    /// Empty set: nothing is skipped
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules described by a configuration
    pub fn from_config(config: &EstimatorConfig) -> Self {
        let mut rules = Self::new();

        if config.skip_canonical {
            rules.push(CanonicalValues);
        }

        if !config.opaque_types.is_empty() {
            rules.push(config.opaque_types.iter().cloned().collect::<OpaqueTypes>());
        }

        if !config.opaque_prefixes.is_empty() {
            rules.push(OpaquePrefixes::new(config.opaque_prefixes.iter().cloned()));
        }

        rules
    }

    pub fn push(&mut self, rule: impl SkipRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Builder form of [`push`](Self::push)
    pub fn with(mut self, rule: impl SkipRule + 'static) -> Self {
        self.push(rule);
        self
    }

    /// Name of the first rule that excludes `node`
    pub fn matching(&self, node: &dyn Reflect, identity: Identity) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.should_skip(node, identity))
            .map(|rule| rule.name())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for SkipRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
