//! Per-resource-type rule sets: named boolean predicates with aliases and a
//! `manage` catch-all fallback.
//!
//! Rules are pure function pointers over an [`ActorContext`] and a
//! [`Target`]; evaluation is referentially transparent so the gateway may
//! cache decisions and re-run checks once per row of a listing. Missing
//! rules deny (fail-closed). Aliases are plain table entries resolved at
//! evaluation time and validated for cycles and dangling targets when the
//! rule set is built.

use std::collections::HashMap;
use tracing::warn;

use super::roles::ActorContext;
use crate::domain::{Resource, ResourceType};
use crate::error::ConfigError;

/// Name of the per-type catch-all rule.
pub const MANAGE: &str = "manage";

// ═══════════════════════════════════════════════════════════════════════════════
// Target
// ═══════════════════════════════════════════════════════════════════════════════

/// What a rule is asked about: the resource class itself (collection-level
/// actions such as `index` / `create`, where per-record detail cannot be
/// consulted) or a concrete record.
#[derive(Debug)]
pub enum Target<'a, R> {
    Class,
    Record(&'a R),
}

impl<'a, R> Target<'a, R> {
    pub fn record(&self) -> Option<&'a R> {
        match self {
            Self::Class => None,
            Self::Record(record) => Some(record),
        }
    }
}

impl<R> Clone for Target<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Target<'_, R> {}

// ═══════════════════════════════════════════════════════════════════════════════
// Rule
// ═══════════════════════════════════════════════════════════════════════════════

/// A rule predicate. Must be pure: same (actor, target) in, same answer out.
pub type RulePredicate<R> = fn(&ActorContext<'_>, Target<'_, R>) -> bool;

/// A named rule: either a predicate or an alias to another rule name.
pub enum Rule<R> {
    Direct(RulePredicate<R>),
    Alias(&'static str),
}

// ═══════════════════════════════════════════════════════════════════════════════
// RuleSet
// ═══════════════════════════════════════════════════════════════════════════════

/// All rules for one resource type.
pub struct RuleSet<R> {
    resource: ResourceType,
    rules: HashMap<&'static str, Rule<R>>,
}

impl<R: Resource> RuleSet<R> {
    pub fn builder() -> RuleSetBuilder<R> {
        RuleSetBuilder {
            resource: R::TYPE,
            rules: HashMap::new(),
            error: None,
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    /// Resolve a rule name to the canonical (post-alias) name of a direct
    /// rule, applying the `manage` fallback for unknown names.
    ///
    /// Returns `None` when the name is unknown and no `manage` catch-all is
    /// registered; the action is then denied.
    pub fn canonical_rule(&self, name: &str) -> Option<&'static str> {
        let (&start, _) = self.rules.get_key_value(name)?;
        let mut current = start;

        // Alias chains are acyclic and complete once the set is built, so
        // this walk terminates.
        loop {
            match self.rules.get(current)? {
                Rule::Direct(_) => return Some(current),
                Rule::Alias(target) => current = *target,
            }
        }
    }

    /// Evaluate a rule by name, fail-closed.
    pub fn evaluate(&self, ctx: &ActorContext<'_>, target: Target<'_, R>, rule: &str) -> bool {
        let canonical = self
            .canonical_rule(rule)
            .or_else(|| self.canonical_rule(MANAGE));

        match canonical {
            Some(name) => self.evaluate_canonical(ctx, target, name),
            None => {
                warn!(
                    resource = %self.resource,
                    rule,
                    "no rule or manage fallback registered, denying"
                );
                false
            }
        }
    }

    /// Evaluate an already-canonicalized rule name.
    pub(crate) fn evaluate_canonical(
        &self,
        ctx: &ActorContext<'_>,
        target: Target<'_, R>,
        canonical: &str,
    ) -> bool {
        match self.rules.get(canonical) {
            Some(Rule::Direct(predicate)) => predicate(ctx, target),
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds and validates a [`RuleSet`].
///
/// Validation happens in [`RuleSetBuilder::build`]: duplicate names, alias
/// cycles, and dangling alias targets are configuration errors reported
/// before the registry is ever used.
pub struct RuleSetBuilder<R> {
    resource: ResourceType,
    rules: HashMap<&'static str, Rule<R>>,
    error: Option<ConfigError>,
}

impl<R: Resource> RuleSetBuilder<R> {
    pub fn rule(mut self, name: &'static str, predicate: RulePredicate<R>) -> Self {
        self.insert(name, Rule::Direct(predicate));
        self
    }

    pub fn alias(mut self, name: &'static str, target: &'static str) -> Self {
        self.insert(name, Rule::Alias(target));
        self
    }

    fn insert(&mut self, name: &'static str, rule: Rule<R>) {
        if self.rules.insert(name, rule).is_some() && self.error.is_none() {
            self.error = Some(ConfigError::DuplicateRule {
                resource: self.resource,
                rule: name,
            });
        }
    }

    pub fn build(self) -> Result<RuleSet<R>, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.rules.is_empty() {
            return Err(ConfigError::EmptyRuleSet(self.resource));
        }

        // Walk every alias chain: each must reach a direct rule without
        // revisiting a name.
        for (&name, rule) in &self.rules {
            let Rule::Alias(first_target) = rule else {
                continue;
            };

            let mut chain = vec![name];
            let mut current = *first_target;
            loop {
                if chain.contains(&current) {
                    chain.push(current);
                    return Err(ConfigError::AliasCycle {
                        resource: self.resource,
                        chain: chain.join(" -> "),
                    });
                }
                chain.push(current);

                match self.rules.get(current) {
                    Some(Rule::Direct(_)) => break,
                    Some(Rule::Alias(next)) => current = *next,
                    None => {
                        return Err(ConfigError::DanglingAlias {
                            resource: self.resource,
                            alias: name,
                            target: current,
                        })
                    }
                }
            }
        }

        Ok(RuleSet {
            resource: self.resource,
            rules: self.rules,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
