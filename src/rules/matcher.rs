use super::{find_matching_rule, Rule, RuleError, RuleTarget};
use crate::config::{Profile, RuleConfig};
use std::collections::HashMap;
use std::path::Path;
use transforge_av::MediaAttributes;

/// Outcome of matching one file against the rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    Transcode { profile: &'a str, rule: &'a str },
    Skip { rule: &'a str },
    NoMatch,
}

/// Ordered, compiled rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    rules: Vec<Rule>,
}

impl RuleMatcher {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile configured rules in order. The first invalid rule aborts.
    pub fn compile(
        rules: &[RuleConfig],
        profiles: &HashMap<String, Profile>,
    ) -> Result<Self, RuleError> {
        let rules = rules
            .iter()
            .map(|rule| Rule::compile(rule, profiles))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn find_match(&self, path: &Path, attrs: &MediaAttributes) -> Option<&Rule> {
        find_matching_rule(path, attrs, &self.rules)
    }

    pub fn verdict(&self, path: &Path, attrs: &MediaAttributes) -> Verdict<'_> {
        match self.find_match(path, attrs) {
            Some(rule) => match &rule.target {
                RuleTarget::Profile(profile) => Verdict::Transcode {
                    profile,
                    rule: &rule.description,
                },
                RuleTarget::Skip => Verdict::Skip {
                    rule: &rule.description,
                },
            },
            None => Verdict::NoMatch,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
