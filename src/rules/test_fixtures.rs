use crate::config::{PredicateValue, Profile, RuleConfig};
use std::collections::{BTreeMap, HashMap};
use transforge_av::MediaAttributes;

pub fn make_attrs(codec: &str, width: u32, height: u32) -> MediaAttributes {
    MediaAttributes {
        video_codec: Some(codec.to_string()),
        res_height: height,
        res_width: width,
        runtime_minutes: 42,
        source_size_mb: 1500.0,
        fps: 24,
    }
}

pub fn text(value: &str) -> PredicateValue {
    PredicateValue::Text(value.to_string())
}

pub fn make_profiles() -> HashMap<String, Profile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "hevc".to_string(),
        Profile {
            input_options: String::new(),
            output_options: "-c:v libx265 -c:a copy".to_string(),
            extension: "mkv".to_string(),
        },
    );
    profiles.insert(
        "mobile".to_string(),
        Profile {
            input_options: "-hwaccel auto".to_string(),
            output_options: "-c:v libx264 -vf scale=-2:720".to_string(),
            extension: ".mp4".to_string(),
        },
    );
    profiles
}

pub fn make_rule_config(description: &str, profile: &str, criteria: &[(&str, &str)]) -> RuleConfig {
    RuleConfig {
        description: description.to_string(),
        profile: profile.to_string(),
        criteria: criteria
            .iter()
            .map(|(k, v)| (k.to_string(), text(v)))
            .collect::<BTreeMap<_, _>>(),
    }
}
