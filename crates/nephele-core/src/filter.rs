//! Filter translation for EC2 instance listings
//!
//! Users filter with short `key=value` pairs. Each key maps to an EC2 filter
//! name, and each value is expanded into wildcard patterns for the value as
//! typed, Title-cased and lower-cased, so `name=web` also matches instances
//! tagged `Web-01`.
//!
//! | key     | EC2 filter            |
//! |---------|-----------------------|
//! | `az`    | `availability-zone`   |
//! | `id`    | `instance-id`         |
//! | `name`  | `tag:Name`            |
//! | `state` | `instance-state-name` |
//! | `type`  | `instance-type`       |

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};

/// User filter key -> EC2 filter name
const FILTER_KEYS: &[(&str, &str)] = &[
    ("az", "availability-zone"),
    ("id", "instance-id"),
    ("name", "tag:Name"),
    ("state", "instance-state-name"),
    ("type", "instance-type"),
];

/// Errors produced while translating user filters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter error: invalid filter format: '{0}'")]
    InvalidFormat(String),

    #[error("filter error: invalid filter key: '{0}'")]
    InvalidKey(String),

    #[error("filter error: empty value for filter key: '{0}'")]
    EmptyValue(String),

    #[error("filter file error: {reason} ({path})")]
    InvalidFile { path: String, reason: String },
}

/// A provider-native filter: EC2 filter name plus match patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    /// Translate a single `key=value` argument
    pub fn translate(user_filter: &str) -> Result<Self, FilterError> {
        let (key, value) = user_filter
            .split_once('=')
            .ok_or_else(|| FilterError::InvalidFormat(user_filter.to_string()))?;

        Self::from_key_values(key, &[value])
    }

    /// Translate a user key and one or more raw values
    pub fn from_key_values<S: AsRef<str>>(key: &str, values: &[S]) -> Result<Self, FilterError> {
        let name =
            provider_key(key).ok_or_else(|| FilterError::InvalidKey(key.to_string()))?;

        if values.is_empty() {
            return Err(FilterError::EmptyValue(key.to_string()));
        }

        let mut patterns: Vec<String> = Vec::with_capacity(values.len() * 3);
        for value in values {
            let value = value.as_ref();
            if value.is_empty() {
                return Err(FilterError::EmptyValue(key.to_string()));
            }
            for pattern in expand_value(value) {
                if !patterns.contains(&pattern) {
                    patterns.push(pattern);
                }
            }
        }

        trace!("Translated filter {} -> {} {:?}", key, name, patterns);
        Ok(Self {
            name: name.to_string(),
            values: patterns,
        })
    }
}

/// Look up the EC2 filter name for a user key
pub fn provider_key(user_key: &str) -> Option<&'static str> {
    FILTER_KEYS
        .iter()
        .find(|(key, _)| *key == user_key)
        .map(|(_, name)| *name)
}

/// Supported user filter keys, in table order
pub fn supported_keys() -> impl Iterator<Item = &'static str> {
    FILTER_KEYS.iter().map(|(key, _)| *key)
}

/// Expand a value into `*value*`, `*Title(value)*`, `*lower(value)*`,
/// dropping repeats while keeping first-seen order.
pub fn expand_value(value: &str) -> Vec<String> {
    let variants = [
        value.to_string(),
        title_case(value),
        value.to_lowercase(),
    ];

    let mut patterns = Vec::with_capacity(variants.len());
    for variant in variants {
        let pattern = format!("*{}*", variant);
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
    patterns
}

/// Upper-case the first letter of every word.
///
/// A word starts after any character that is not a letter, digit, or
/// underscore. Letters inside a word keep their case.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }

    out
}

/// Filter entry as written in a JSON filter file
#[derive(Debug, Deserialize)]
struct FileFilter {
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(rename = "Values", alias = "values", default)]
    values: Vec<String>,
}

/// Ordered collection of translated filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate `key=value` arguments, stopping at the first bad one
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, FilterError> {
        let filters = args
            .iter()
            .map(|arg| Filter::translate(arg.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Translated {} filter argument(s)", filters.len());
        Ok(Self { filters })
    }

    /// Load filters from a JSON file of `{"Name": key, "Values": [...]}` entries
    pub fn from_json_file(path: &Path) -> Result<Self, FilterError> {
        let display = path.display().to_string();

        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            return Err(FilterError::InvalidFile {
                path: display,
                reason: "invalid file format".to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| FilterError::InvalidFile {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let entries: Vec<FileFilter> =
            serde_json::from_str(&content).map_err(|e| FilterError::InvalidFile {
                path: display.clone(),
                reason: e.to_string(),
            })?;

        let filters = entries
            .iter()
            .map(|entry| Filter::from_key_values(&entry.name, &entry.values))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} filter(s) from {}", filters.len(), display);
        Ok(Self { filters })
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Append every filter from `other`
    pub fn extend(&mut self, other: FilterSet) {
        self.filters.extend(other.filters);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    pub fn as_slice(&self) -> &[Filter] {
        &self.filters
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_translate_name_filter() {
        let filter = Filter::translate("name=web").unwrap();
        assert_eq!(filter.name, "tag:Name");
        assert_eq!(filter.values, vec!["*web*", "*Web*"]);
    }

    #[test]
    fn test_translate_all_keys() {
        let cases = [
            ("az=us-east-1a", "availability-zone"),
            ("id=i-0a12b345", "instance-id"),
            ("name=api", "tag:Name"),
            ("state=running", "instance-state-name"),
            ("type=t2.micro", "instance-type"),
        ];
        for (input, expected) in cases {
            assert_eq!(Filter::translate(input).unwrap().name, expected, "{input}");
        }
    }

    #[test]
    fn test_translate_emits_three_distinct_variants() {
        let filter = Filter::translate("name=PROD db").unwrap();
        assert_eq!(filter.values, vec!["*PROD db*", "*PROD Db*", "*prod db*"]);
    }

    #[test]
    fn test_translate_collapses_duplicate_variants() {
        // already Title-cased: as-is and Title variants are identical
        let filter = Filter::translate("state=Running").unwrap();
        assert_eq!(filter.values, vec!["*Running*", "*running*"]);

        // all lower with no letters to capitalise
        let filter = Filter::translate("id=123").unwrap();
        assert_eq!(filter.values, vec!["*123*"]);
    }

    #[test]
    fn test_translate_splits_on_first_equals() {
        let filter = Filter::translate("name=a=b").unwrap();
        assert_eq!(filter.values[0], "*a=b*");
    }

    #[test]
    fn test_translate_missing_equals() {
        assert_eq!(
            Filter::translate("name"),
            Err(FilterError::InvalidFormat("name".to_string()))
        );
    }

    #[test]
    fn test_translate_unknown_key() {
        let err = Filter::translate("color=red").unwrap_err();
        assert_eq!(err, FilterError::InvalidKey("color".to_string()));
        assert_eq!(err.to_string(), "filter error: invalid filter key: 'color'");
    }

    #[test]
    fn test_translate_keys_are_case_sensitive() {
        assert!(matches!(
            Filter::translate("Name=web"),
            Err(FilterError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_translate_empty_key_and_value() {
        assert_eq!(
            Filter::translate("=web"),
            Err(FilterError::InvalidKey(String::new()))
        );
        assert_eq!(
            Filter::translate("name="),
            Err(FilterError::EmptyValue("name".to_string()))
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("web"), "Web");
        assert_eq!(title_case("my-web server"), "My-Web Server");
        assert_eq!(title_case("t2.micro"), "T2.Micro");
        assert_eq!(title_case("snake_case"), "Snake_case");
        assert_eq!(title_case("1st place"), "1st Place");
        assert_eq!(title_case("mIxEd"), "MIxEd");
        assert_eq!(title_case(""), "");
        assert_eq!(title_case("élan vital"), "Élan Vital");
    }

    #[test]
    fn test_expand_value_wraps_in_wildcards() {
        assert_eq!(expand_value("Db"), vec!["*Db*", "*db*"]);
    }

    #[test]
    fn test_filter_set_from_args_returns_first_error() {
        let args = vec![
            "name=web".to_string(),
            "colour=red".to_string(),
            "broken".to_string(),
        ];
        assert_eq!(
            FilterSet::from_args(&args),
            Err(FilterError::InvalidKey("colour".to_string()))
        );
    }

    #[test]
    fn test_filter_set_keeps_repeated_keys() {
        let set = FilterSet::from_args(&["name=web", "name=api"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|f| f.name == "tag:Name"));
    }

    #[test]
    fn test_filter_set_empty() {
        let empty: [&str; 0] = [];
        let set = FilterSet::from_args(&empty).unwrap();
        assert!(set.is_empty());
        assert_eq!(set, FilterSet::new());
    }

    #[test]
    fn test_filter_set_extend_preserves_order() {
        let mut set = FilterSet::from_args(&["state=running"]).unwrap();
        set.extend(FilterSet::from_args(&["type=t3.large"]).unwrap());
        let names: Vec<_> = set.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["instance-state-name", "instance-type"]);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"Name": "state", "Values": ["running", "Stopped"]}},
                {{"name": "az", "values": ["eu-west-1a"]}}
            ]"#
        )
        .unwrap();

        let set = FilterSet::from_json_file(file.path()).unwrap();
        assert_eq!(set.len(), 2);

        let state = &set.as_slice()[0];
        assert_eq!(state.name, "instance-state-name");
        assert_eq!(
            state.values,
            vec!["*running*", "*Running*", "*Stopped*", "*stopped*"]
        );

        let az = &set.as_slice()[1];
        assert_eq!(az.name, "availability-zone");
        assert_eq!(az.values, vec!["*eu-west-1a*", "*Eu-West-1a*"]);
    }

    #[test]
    fn test_from_json_file_rejects_non_json_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = FilterSet::from_json_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid file format"));
    }

    #[test]
    fn test_from_json_file_unknown_key() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"Name": "owner", "Values": ["me"]}}]"#).unwrap();

        assert_eq!(
            FilterSet::from_json_file(file.path()),
            Err(FilterError::InvalidKey("owner".to_string()))
        );
    }

    #[test]
    fn test_from_json_file_missing_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"Name": "name"}}]"#).unwrap();

        assert_eq!(
            FilterSet::from_json_file(file.path()),
            Err(FilterError::EmptyValue("name".to_string()))
        );
    }

    #[test]
    fn test_from_json_file_malformed() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();

        assert!(matches!(
            FilterSet::from_json_file(file.path()),
            Err(FilterError::InvalidFile { .. })
        ));
    }

    #[test]
    fn test_from_json_file_missing_file() {
        let err = FilterSet::from_json_file(Path::new("/nonexistent/filters.json")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFile { .. }));
    }

    #[test]
    fn test_supported_keys() {
        let keys: Vec<_> = supported_keys().collect();
        assert_eq!(keys, vec!["az", "id", "name", "state", "type"]);
    }
}
