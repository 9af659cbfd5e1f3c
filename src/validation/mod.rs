//! Config and result validation.
//!
//! Config validation runs three checks in a fixed order and stops at the
//! first one that fails:
//! - the tag grammar ([`grammar`])
//! - uniqueness of every `name="..."` in the config text
//! - every `toName="..."` target names a declared tag
//!
//! Result validation (regions, relations, whole annotations) lives in
//! [`results`].

pub mod grammar;
mod report;
pub mod results;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::LabelInterface;
use crate::error::LabelConfigError;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex is valid"));
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\sname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("name regex is valid")
});
static TO_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\stoName\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("toName regex is valid")
});

/// Validates a config text. Returns the first failing check's error.
pub fn validate_config(config: &str) -> Result<(), LabelConfigError> {
    let report = grammar::check_config(config)?;
    if !report.is_ok() {
        return Err(LabelConfigError::Grammar { report });
    }

    let text = strip_comments(config);
    let duplicates = duplicate_names(&text);
    if !duplicates.is_empty() {
        return Err(LabelConfigError::DuplicateNames { names: duplicates });
    }

    let names = attribute_values(&NAME_RE, &text);
    if let Some(to_name) = unknown_to_names(&text, &names).into_iter().next() {
        return Err(LabelConfigError::UnknownToName {
            to_name,
            known: sorted_unique(&names),
        });
    }

    Ok(())
}

/// Runs every config check and collects all issues into one report.
///
/// Unlike [`validate_config`] this does not stop at the first failing check.
pub fn validate_config_report(config: &str) -> Result<ValidationReport, LabelConfigError> {
    let mut report = grammar::check_config(config)?;

    let text = strip_comments(config);
    for name in duplicate_names(&text) {
        report.add(ValidationIssue::error(
            IssueCode::DuplicateName,
            format!("name '{}' is used by more than one tag", name),
            IssueContext::Config,
        ));
    }

    let names = attribute_values(&NAME_RE, &text);
    for to_name in unknown_to_names(&text, &names) {
        report.add(ValidationIssue::error(
            IssueCode::UnknownToName,
            format!("toName=\"{}\" does not match any tag name", to_name),
            IssueContext::Config,
        ));
    }

    Ok(report)
}

impl LabelInterface {
    /// Validates the config this interface was parsed from.
    pub fn validate(&self) -> Result<(), LabelConfigError> {
        validate_config(self.config())
    }

    /// Every grammar, name and reference issue of the config.
    pub fn validate_report(&self) -> Result<ValidationReport, LabelConfigError> {
        validate_config_report(self.config())
    }
}

fn strip_comments(config: &str) -> String {
    COMMENT_RE.replace_all(config, "").into_owned()
}

fn attribute_values(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Names declared more than once, in order of their second occurrence.
fn duplicate_names(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for name in attribute_values(&NAME_RE, text) {
        if !seen.insert(name.clone()) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

fn unknown_to_names(text: &str, names: &[String]) -> Vec<String> {
    let mut unknown = Vec::new();
    for raw in attribute_values(&TO_NAME_RE, text) {
        for target in raw.split(',').map(str::trim) {
            if !names.iter().any(|n| n == target) && !unknown.iter().any(|u| u == target) {
                unknown.push(target.to_string());
            }
        }
    }
    unknown
}

fn sorted_unique(names: &[String]) -> Vec<String> {
    names
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_passes() {
        let config = r#"<View>
            <Image name="image" value="$image"/>
            <RectangleLabels name="box" toName="image"><Label value="Car"/></RectangleLabels>
          </View>"#;
        validate_config(config).expect("valid");
        assert!(validate_config_report(config).expect("report").is_clean());
    }

    #[test]
    fn duplicate_names_are_reported() {
        let config = r#"<View>
            <Text name="text" value="$a"/>
            <Text name="text" value="$b"/>
            <Choices name="c" toName="text"><Choice value="A"/></Choices>
          </View>"#;
        match validate_config(config) {
            Err(LabelConfigError::DuplicateNames { names }) => assert_eq!(names, vec!["text"]),
            other => panic!("expected DuplicateNames, got {:?}", other),
        }
    }

    #[test]
    fn to_name_without_match() {
        let config = r#"<View>
            <Text name="text" value="$text"/>
            <Choices name="c" toName="text,missing"><Choice value="A"/></Choices>
          </View>"#;
        match validate_config(config) {
            Err(LabelConfigError::UnknownToName { to_name, known }) => {
                assert_eq!(to_name, "missing");
                assert_eq!(known, vec!["c", "text"]);
            }
            other => panic!("expected UnknownToName, got {:?}", other),
        }
    }

    #[test]
    fn grammar_runs_first() {
        // Both a grammar error and a duplicate name; grammar wins.
        let config = r#"<View>
            <Text name="t" value="$a"/>
            <Text name="t" value="$b"/>
            <Choices name="c" toName="t"/>
          </View>"#;
        assert!(matches!(
            validate_config(config),
            Err(LabelConfigError::Grammar { .. })
        ));
    }

    #[test]
    fn commented_out_tags_are_ignored() {
        let config = r#"<View>
            <Text name="t" value="$a"/>
            <!-- <Text name="t" value="$b"/> -->
            <Choices name="c" toName="t"><Choice value="A"/></Choices>
          </View>"#;
        validate_config(config).expect("comment is not a tag");
    }

    #[test]
    fn report_collects_every_check() {
        let config = r#"<View>
            <Text name="t" value="$a"/>
            <Text name="t" value="$b"/>
            <Labels name="l" toName="ghost"/>
          </View>"#;
        let report = validate_config_report(config).expect("report");
        assert!(report.has_code(IssueCode::DuplicateName));
        assert!(report.has_code(IssueCode::UnknownToName));
        assert!(report.has_code(IssueCode::NoLabels));
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn interface_validate_delegates() {
        let li = LabelInterface::parse(
            r#"<View><Text name="t" value="$t"/><Choices name="c" toName="x"><Choice value="A"/></Choices></View>"#,
        )
        .expect("linking never fails on dangling targets");
        assert!(li.control_objects(li.get_control(Some("c")).expect("c")).is_empty());
        assert!(matches!(
            li.validate(),
            Err(LabelConfigError::UnknownToName { .. })
        ));
    }
}
