//! Typed rule predicates.
//!
//! Predicates are parsed from their configured text once, when the
//! configuration is loaded. Matching never interprets text.

use super::RuleError;
use crate::config::PredicateValue;
use regex::Regex;
use std::fmt;
use std::path::Path;
use transforge_av::MediaAttributes;

/// Predicate names accepted in a rule's criteria table.
pub const PREDICATE_NAMES: &[&str] = &[
    "vcodec",
    "res_height",
    "res_width",
    "runtime",
    "source_size",
    "fps",
    "path",
];

/// A numeric media attribute a predicate can compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    ResHeight,
    ResWidth,
    /// Minutes.
    Runtime,
    /// Megabytes.
    SourceSize,
    Fps,
}

impl Attribute {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "res_height" => Some(Attribute::ResHeight),
            "res_width" => Some(Attribute::ResWidth),
            "runtime" => Some(Attribute::Runtime),
            "source_size" => Some(Attribute::SourceSize),
            "fps" => Some(Attribute::Fps),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Attribute::ResHeight => "res_height",
            Attribute::ResWidth => "res_width",
            Attribute::Runtime => "runtime",
            Attribute::SourceSize => "source_size",
            Attribute::Fps => "fps",
        }
    }

    fn value(self, attrs: &MediaAttributes) -> f64 {
        match self {
            Attribute::ResHeight => f64::from(attrs.res_height),
            Attribute::ResWidth => f64::from(attrs.res_width),
            Attribute::Runtime => f64::from(attrs.runtime_minutes),
            Attribute::SourceSize => attrs.source_size_mb,
            Attribute::Fps => f64::from(attrs.fps),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// Split a leading operator off `text`. No operator means equality.
    fn split(text: &str) -> (Self, &str) {
        // Two-character operators first so "<=" is not read as "<".
        const OPERATORS: &[(&str, Comparison)] = &[
            ("<=", Comparison::Le),
            (">=", Comparison::Ge),
            ("==", Comparison::Eq),
            ("!=", Comparison::Ne),
            ("<", Comparison::Lt),
            (">", Comparison::Gt),
            ("=", Comparison::Eq),
        ];

        for (op, comparison) in OPERATORS {
            if let Some(rest) = text.strip_prefix(op) {
                return (*comparison, rest);
            }
        }
        (Comparison::Eq, text)
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Predicate {
    /// Video codec equality.
    VideoCodec { codec: String, negate: bool },
    /// Numeric attribute comparison.
    Numeric {
        attribute: Attribute,
        comparison: Comparison,
        value: f64,
        negate: bool,
    },
    /// Regular expression matched at the start of the file path.
    Path { pattern: Regex, negate: bool },
}

impl Predicate {
    /// Parse one `name = value` entry of rule `rule`.
    pub fn parse(rule: &str, name: &str, value: &PredicateValue) -> Result<Self, RuleError> {
        let text = value.to_string();
        let (negate, body) = split_negation(&text);

        if name == "vcodec" {
            let (comparison, codec) = Comparison::split(body.trim());
            let negate = match comparison {
                Comparison::Eq => negate,
                Comparison::Ne => !negate,
                _ => {
                    return Err(RuleError::InvalidComparison {
                        rule: rule.to_string(),
                        predicate: name.to_string(),
                        value: text.clone(),
                    })
                }
            };
            return Ok(Predicate::VideoCodec {
                codec: codec.trim().to_string(),
                negate,
            });
        }

        if name == "path" {
            let pattern = Regex::new(&format!("^(?:{})", body)).map_err(|source| {
                RuleError::InvalidRegex {
                    rule: rule.to_string(),
                    pattern: body.to_string(),
                    source,
                }
            })?;
            return Ok(Predicate::Path { pattern, negate });
        }

        let attribute = Attribute::from_key(name).ok_or_else(|| RuleError::UnknownPredicate {
            rule: rule.to_string(),
            predicate: name.to_string(),
        })?;

        let (comparison, operand) = Comparison::split(body.trim());
        let value = operand
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RuleError::InvalidComparison {
                rule: rule.to_string(),
                predicate: name.to_string(),
                value: text.clone(),
            })?;

        Ok(Predicate::Numeric {
            attribute,
            comparison,
            value,
            negate,
        })
    }

    pub fn matches(&self, path: &Path, attrs: &MediaAttributes) -> bool {
        match self {
            Predicate::VideoCodec { codec, negate } => {
                let equal = attrs
                    .video_codec
                    .as_deref()
                    .is_some_and(|actual| actual.eq_ignore_ascii_case(codec));
                equal != *negate
            }
            Predicate::Numeric {
                attribute,
                comparison,
                value,
                negate,
            } => comparison.apply(attribute.value(attrs), *value) != *negate,
            Predicate::Path { pattern, negate } => {
                pattern.is_match(&path.to_string_lossy()) != *negate
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = |negate: bool| if negate { "!" } else { "" };
        match self {
            Predicate::VideoCodec { codec, negate } => {
                let op = if *negate { "!=" } else { "==" };
                write!(f, "vcodec {} {}", op, codec)
            }
            Predicate::Numeric {
                attribute,
                comparison,
                value,
                negate,
            } => write!(
                f,
                "{}{} {} {}",
                bang(*negate),
                attribute.key(),
                comparison.symbol(),
                value
            ),
            Predicate::Path { pattern, negate } => {
                write!(f, "{}path ~ {}", bang(*negate), pattern.as_str())
            }
        }
    }
}

/// A leading `!` inverts the predicate, unless it starts a `!=` operator.
fn split_negation(text: &str) -> (bool, &str) {
    match text.strip_prefix('!') {
        Some(rest) if !rest.is_empty() && !rest.starts_with('=') => (true, rest),
        _ => (false, text),
    }
}
