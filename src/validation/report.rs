//! Issue reports shared by config checks and result checks.
//!
//! Grammar, name and reference checks on a config and per-entry checks on
//! annotation results all push [`ValidationIssue`]s into one
//! [`ValidationReport`]. The CLI prints it as text or serializes it to JSON.

use std::fmt;

use serde::Serialize;

/// Every issue found by one validation run, in the order it was found.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Moves the issues of `other` to the end of this report.
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Warnings alone do not fail a config or a result list.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// One `"<context>: <message>"` line per error.
    pub fn messages(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| format!("{}: {}", i.context, i.message))
            .collect()
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl FromIterator<ValidationIssue> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ValidationIssue>>(iter: I) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// One problem in a config or a result entry.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    /// Which tag, result entry or relation the issue belongs to.
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Reported, but the config still loads and validates.
    Warning,
    /// Fails validation.
    Error,
}

/// Machine-readable issue kind. Serialized by variant name in JSON reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Grammar issues
    /// The root element is not `<View>`.
    RootNotView,
    /// A required attribute is missing.
    MissingAttribute,
    /// A required attribute is present but empty.
    EmptyAttribute,
    /// A `Label`/`Choice`/`Relation` is outside its control.
    MisplacedLeaf,
    /// A static `Choices` has no `Choice` children.
    EmptyChoices,
    /// A label leaf has neither `value` nor `alias`.
    MissingLabelValue,
    /// A label control declares no labels.
    NoLabels,
    /// A boolean attribute is not `true`/`false`.
    InvalidBoolean,
    /// An enumerated attribute has an unknown value.
    InvalidEnumValue,
    /// A numeric attribute does not parse.
    InvalidNumber,
    /// A numeric attribute is outside its allowed range.
    OutOfRange,
    /// Related numeric attributes are in the wrong order (e.g. min > max).
    InvalidRangeOrder,

    // Name issues
    /// Multiple tags share a name.
    DuplicateName,
    /// A `toName` does not match any declared name.
    UnknownToName,

    // Result issues
    /// A result entry is not shaped like a region or relation.
    MalformedResult,
    /// `from_name` does not match any control.
    UnknownControl,
    /// `to_name` does not match any object.
    UnknownObject,
    /// The result `type` does not match the control kind.
    TypeMismatch,
    /// `to_name` is not a target of the control.
    UnexpectedToName,
    /// The value fails the control's value shape.
    InvalidValue,
    /// A relation has a missing or unknown direction.
    InvalidDirection,
    /// A relation references a region that is missing or invalid.
    UnknownRegionRef,
}

/// Where in the config or result list an issue was found.
#[derive(Clone, Debug, Serialize)]
pub enum IssueContext {
    /// The config as a whole (names and references).
    Config,
    /// One element, with its ancestor path such as `View > Choices`.
    Tag {
        kind: String,
        name: Option<String>,
        path: String,
    },
    /// The region at `index` of a result list.
    Result {
        index: usize,
        from_name: Option<String>,
    },
    /// The relation at `index` of a result list.
    Relation { index: usize },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Config => write!(f, "config"),
            IssueContext::Tag {
                kind,
                name: Some(name),
                path,
            } => write!(f, "<{} name=\"{}\"> at {}", kind, name, path),
            IssueContext::Tag {
                kind,
                name: None,
                path,
            } => write!(f, "<{}> at {}", kind, path),
            IssueContext::Result {
                index,
                from_name: Some(from_name),
            } => write!(f, "result[{}] ({})", index, from_name),
            IssueContext::Result {
                index,
                from_name: None,
            } => write!(f, "result[{}]", index),
            IssueContext::Relation { index } => write!(f, "relation result[{}]", index),
        }
    }
}
