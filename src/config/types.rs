use crate::rules::RuleMatcher;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Rule target meaning "mark complete without transcoding".
pub const SKIP_PROFILE: &str = "SKIP";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub config: GeneralConfig,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Rules in declaration order.
    #[serde(default, deserialize_with = "deserialize_rules")]
    pub rules: Vec<RuleConfig>,

    /// Compiled form of `rules`, built at load time.
    #[serde(skip)]
    pub matcher: RuleMatcher,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Transcoding executable, also used for probing.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Maximum number of transcodes running at once.
    #[serde(default = "default_concurrent_jobs")]
    pub concurrent_jobs: usize,

    /// Number of jobs that may wait in the queue before the producer blocks.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Pending-file processed when no files are given on the command line.
    #[serde(default)]
    pub default_queue_file: Option<PathBuf>,

    /// Plex server (`host:port`) to refresh after a run.
    #[serde(default)]
    pub plex_server: Option<String>,

    /// Token sent as `X-Plex-Token` with the refresh request.
    #[serde(default)]
    pub plex_token: Option<String>,

    /// File extensions picked up when a directory is given as input.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_concurrent_jobs() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    crate::queue::DEFAULT_CAPACITY
}

fn default_extensions() -> Vec<String> {
    [
        "mkv", "mp4", "m4v", "avi", "mov", "wmv", "mpg", "mpeg", "ts", "webm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            concurrent_jobs: default_concurrent_jobs(),
            queue_capacity: default_queue_capacity(),
            default_queue_file: None,
            plex_server: None,
            plex_token: None,
            extensions: default_extensions(),
        }
    }
}

/// A named transcode recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    /// Arguments placed before `-i <input>`.
    #[serde(default)]
    pub input_options: String,

    /// Arguments placed between the input and the output path.
    #[serde(default)]
    pub output_options: String,

    /// Extension of the transcoded file, with or without the leading dot.
    pub extension: String,
}

impl Profile {
    pub fn input_args(&self) -> Vec<&str> {
        self.input_options.split_whitespace().collect()
    }

    pub fn output_args(&self) -> Vec<&str> {
        self.output_options.split_whitespace().collect()
    }
}

/// A rule as written in the configuration file.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Unique description; also the table key in the file.
    pub description: String,

    /// Target profile name, or [`SKIP_PROFILE`].
    pub profile: String,

    /// Predicate name to configured value. Empty means "always matches".
    pub criteria: BTreeMap<String, PredicateValue>,
}

#[derive(Debug, Deserialize)]
struct RuleBody {
    profile: String,

    #[serde(default, alias = "rules")]
    criteria: BTreeMap<String, PredicateValue>,
}

/// Raw predicate value: TOML lets users write `res_height = 720` as well as
/// `res_height = "<720"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredicateValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateValue::Integer(i) => write!(f, "{}", i),
            PredicateValue::Float(x) => write!(f, "{}", x),
            PredicateValue::Text(s) => f.write_str(s),
        }
    }
}

/// Deserialize the `[rules]` table into a list that keeps document order.
fn deserialize_rules<'de, D>(deserializer: D) -> Result<Vec<RuleConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RulesVisitor;

    impl<'de> Visitor<'de> for RulesVisitor {
        type Value = Vec<RuleConfig>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of rules keyed by description")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut rules: Vec<RuleConfig> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((description, body)) = map.next_entry::<String, RuleBody>()? {
                if rules.iter().any(|r| r.description == description) {
                    return Err(de::Error::custom(format!(
                        "duplicate rule description: {}",
                        description
                    )));
                }
                rules.push(RuleConfig {
                    description,
                    profile: body.profile,
                    criteria: body.criteria,
                });
            }
            Ok(rules)
        }
    }

    deserializer.deserialize_map(RulesVisitor)
}
