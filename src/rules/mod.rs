mod matcher;
mod predicate;

#[cfg(test)]
mod test_fixtures;

pub use matcher::*;
pub use predicate::{Attribute, Comparison, Predicate, PREDICATE_NAMES};

use crate::config::{Profile, RuleConfig, SKIP_PROFILE};
use std::collections::HashMap;
use std::path::Path;
use transforge_av::MediaAttributes;

/// Configuration-class rule errors. All of them are fatal at load time.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(
        "invalid predicate '{predicate}' in rule '{rule}' (expected one of: {})",
        PREDICATE_NAMES.join(", ")
    )]
    UnknownPredicate { rule: String, predicate: String },

    #[error("invalid comparison '{value}' for '{predicate}' in rule '{rule}'")]
    InvalidComparison {
        rule: String,
        predicate: String,
        value: String,
    },

    #[error("invalid regex '{pattern}' in rule '{rule}': {source}")]
    InvalidRegex {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("profile '{profile}' referenced from rule '{rule}' not found")]
    UnknownProfile { rule: String, profile: String },
}

/// What a matching rule asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Profile(String),
    Skip,
}

/// A compiled rule: every predicate must hold for it to match.
#[derive(Debug, Clone)]
pub struct Rule {
    pub description: String,
    pub target: RuleTarget,
    pub predicates: Vec<Predicate>,
}

impl Rule {
    /// Compile a configured rule, checking its target against `profiles`.
    pub fn compile(
        config: &RuleConfig,
        profiles: &HashMap<String, Profile>,
    ) -> Result<Self, RuleError> {
        let target = if config.profile.eq_ignore_ascii_case(SKIP_PROFILE) {
            RuleTarget::Skip
        } else if profiles.contains_key(&config.profile) {
            RuleTarget::Profile(config.profile.clone())
        } else {
            return Err(RuleError::UnknownProfile {
                rule: config.description.clone(),
                profile: config.profile.clone(),
            });
        };

        let predicates = config
            .criteria
            .iter()
            .map(|(name, value)| Predicate::parse(&config.description, name, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            description: config.description.clone(),
            target,
            predicates,
        })
    }

    /// A rule with no predicates matches everything.
    pub fn matches(&self, path: &Path, attrs: &MediaAttributes) -> bool {
        self.predicates.iter().all(|p| p.matches(path, attrs))
    }
}

/// Find the first rule, in declaration order, that matches.
pub fn find_matching_rule<'a>(
    path: &Path,
    attrs: &MediaAttributes,
    rules: &'a [Rule],
) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.matches(path, attrs))
}
