//! Artifact coordinates.

use crate::error::{ErrorKind, Result};
use depot_pattern::{Lookup, Tokens};
use std::fmt;

/// The logical identity of an artifact, independent of its bytes.
///
/// Every field ends up as (part of) a single path segment, so fields may not
/// contain path separators, NUL bytes, pattern brackets or the `*` that
/// stands for "any directory" when probing, and may not be `.` or `..`. Optional fields given as empty strings are treated as absent.
///
/// # Examples
///
/// ```
/// use depot_storage::Coordinate;
///
/// let coordinate = Coordinate::new("org.example", "lib", "1.0", "jar", "lib")
///     .unwrap()
///     .with_extension("jar")
///     .unwrap();
/// assert_eq!(coordinate.to_string(), "org.example:lib:1.0:lib@jar.jar");
/// assert!(Coordinate::new("org.example", "", "1.0", "jar", "lib").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    organisation: String,
    module: String,
    branch: Option<String>,
    revision: String,
    kind: String,
    artifact: String,
    classifier: Option<String>,
    extension: Option<String>,
}

impl Coordinate {
    /// Token names a coordinate can fill in when rendering a pattern.
    pub const TOKENS: &[&str] = &[
        "organisation",
        "organization",
        "module",
        "branch",
        "revision",
        "type",
        "artifact",
        "classifier",
        "ext",
    ];

    /// Create a coordinate from its required fields.
    ///
    /// `kind` is the artifact type (`jar`, `pom`, `source`, ...).
    pub fn new(
        organisation: impl Into<String>,
        module: impl Into<String>,
        revision: impl Into<String>,
        kind: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            organisation: required("organisation", organisation.into())?,
            module: required("module", module.into())?,
            branch: None,
            revision: required("revision", revision.into())?,
            kind: required("type", kind.into())?,
            artifact: required("artifact", artifact.into())?,
            classifier: None,
            extension: None,
        })
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Result<Self> {
        self.branch = optional("branch", branch.into())?;
        Ok(self)
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Result<Self> {
        self.classifier = optional("classifier", classifier.into())?;
        Ok(self)
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Result<Self> {
        self.extension = optional("ext", extension.into())?;
        Ok(self)
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// The artifact type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

/// Coordinates answer the standard artifact tokens. Anything else (notably
/// `sha1`) is unknown, so the placeholder survives the first rendering pass.
impl Tokens for Coordinate {
    fn lookup(&self, token: &str) -> Lookup<'_> {
        match token {
            "organisation" | "organization" => self.organisation().into(),
            "module" => self.module().into(),
            "branch" => self.branch().into(),
            "revision" => self.revision().into(),
            "type" => self.kind().into(),
            "artifact" => self.artifact().into(),
            "classifier" => self.classifier().into(),
            "ext" => self.extension().into(),
            _ => Lookup::Unknown,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.organisation, self.module, self.revision, self.artifact)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, "@{}", self.kind)?;
        if let Some(extension) = &self.extension {
            write!(f, ".{extension}")?;
        }
        if let Some(branch) = &self.branch {
            write!(f, " (branch {branch})")?;
        }
        Ok(())
    }
}

fn required(field: &'static str, value: String) -> Result<String> {
    if value.is_empty() {
        exn::bail!(ErrorKind::InvalidCoordinate(format!("{field} must not be empty")));
    }
    check_segment(field, &value)?;
    Ok(value)
}

fn optional(field: &'static str, value: String) -> Result<Option<String>> {
    if value.is_empty() {
        return Ok(None);
    }
    check_segment(field, &value)?;
    Ok(Some(value))
}

fn check_segment(field: &'static str, value: &str) -> Result<()> {
    if value == "." || value == ".." {
        exn::bail!(ErrorKind::InvalidCoordinate(format!("{field} must not be `{value}`")));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '/' | '\\' | '\0' | '[' | ']' | '*')) {
        exn::bail!(ErrorKind::InvalidCoordinate(format!("{field} contains forbidden character {c:?}")));
    }
    Ok(())
}
