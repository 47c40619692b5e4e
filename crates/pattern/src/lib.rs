//! Path templating for artifact coordinates.
//!
//! A pattern is a single-level sequence of literal text, tokens written
//! `[name]`, and optional groups written `( ... )`:
//!
//! ```text
//! [organisation]/[module](/[branch])/[revision]/[type]/[sha1]/[artifact]-[revision](-[classifier])(.[ext])
//! ```
//!
//! - A token outside a group must resolve to a value, otherwise rendering
//!   fails with [`MissingToken`](crate::error::ErrorKind::MissingToken).
//! - An optional group renders as the empty string (punctuation included)
//!   when any token inside it is absent.
//! - A token the [`Tokens`] source doesn't know about is emitted verbatim,
//!   placeholder and all, so a later [`substitute_token`] pass can fill it
//!   in once its value exists.
//!
//! # Example
//!
//! ```
//! use depot_pattern::{PathPattern, substitute_token};
//! use std::collections::HashMap;
//!
//! let pattern: PathPattern = "[module](-[classifier])/[sha1]".parse().unwrap();
//! let tokens = HashMap::from([("module", Some("lib")), ("classifier", None)]);
//!
//! let first_pass = pattern.render(&tokens).unwrap();
//! assert_eq!(first_pass, "lib/[sha1]");
//! assert_eq!(substitute_token(&first_pass, "sha1", "abc123"), "lib/abc123");
//! ```

pub mod error;
mod parse;
mod render;

pub use crate::render::{Lookup, Tokens, substitute_token};
use crate::error::{Error, ErrorKind, Result};
use crate::parse::{Element, Node};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Characters with meaning in pattern source.
const SYNTAX: [char; 4] = ['[', ']', '(', ')'];

/// A parsed path pattern.
///
/// Constructed via [`FromStr`], which parses eagerly so that syntax errors
/// surface at creation time rather than at render time. A pattern is
/// immutable and can be rendered any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    nodes: Vec<Node>,
}
impl FromStr for PathPattern {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let nodes = parse::parse(s)?;
        Ok(Self { source: s.to_string(), nodes })
    }
}
impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
impl PathPattern {
    /// Pattern source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of every token in the pattern, in order of appearance
    /// (duplicates included).
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .flat_map(|node| match node {
                Node::Element(element) => std::slice::from_ref(element),
                Node::Optional(elements) => elements.as_slice(),
            })
            .filter_map(|element| match element {
                Element::Token(name) => Some(name.as_str()),
                Element::Literal(_) => None,
            })
    }

    /// Returns `true` if `token` appears outside any optional group, meaning
    /// every rendered path contains it.
    pub fn requires_token(&self, token: &str) -> bool {
        self.nodes.iter().any(|node| matches!(node, Node::Element(Element::Token(name)) if name == token))
    }

    /// Returns a new pattern with every occurrence of `[token]` replaced by
    /// literal text.
    ///
    /// Used to derive enumeration patterns, e.g. replacing a hash token with
    /// a `*` wildcard segment. The replacement must not contain pattern
    /// syntax characters.
    ///
    /// ```
    /// use depot_pattern::PathPattern;
    ///
    /// let pattern: PathPattern = "[module]/[sha1]/[artifact](.[ext])".parse().unwrap();
    /// let wildcard = pattern.replace_token("sha1", "*").unwrap();
    /// assert_eq!(wildcard.to_string(), "[module]/*/[artifact](.[ext])");
    /// ```
    pub fn replace_token(&self, token: &str, replacement: &str) -> Result<Self> {
        if replacement.contains(SYNTAX) {
            exn::bail!(ErrorKind::InvalidReplacement(replacement.to_string()));
        }
        let replace = |element: &Element| match element {
            Element::Token(name) if name == token => Element::Literal(replacement.to_string()),
            other => other.clone(),
        };
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .map(|node| match node {
                Node::Element(element) => Node::Element(replace(element)),
                Node::Optional(elements) => Node::Optional(elements.iter().map(replace).collect()),
            })
            .collect();
        // Parse the regenerated source again so the new literal merges with
        // its neighbours, exactly as if the pattern had been written that way.
        nodes.iter().map(ToString::to_string).collect::<String>().parse()
    }

    /// Renders the pattern against a token source.
    ///
    /// Unknown tokens are left as `[name]` placeholders; see the
    /// [crate documentation](crate) for the full rules.
    #[instrument(level = "trace", skip(self, tokens), fields(pattern = %self.source))]
    pub fn render(&self, tokens: impl Tokens) -> Result<String> {
        let mut output = String::with_capacity(self.source.len());
        for node in &self.nodes {
            match node {
                Node::Element(Element::Literal(text)) => output.push_str(text),
                Node::Element(Element::Token(name)) => match tokens.lookup(name) {
                    Lookup::Value(value) => output.push_str(&value),
                    Lookup::Absent => exn::bail!(ErrorKind::MissingToken(name.clone())),
                    Lookup::Unknown => output.push_str(&format!("[{name}]")),
                },
                Node::Optional(elements) => {
                    if let Some(group) = Self::render_group(elements, &tokens) {
                        output.push_str(&group);
                    }
                },
            }
        }
        Ok(output)
    }

    /// Renders an optional group, or returns `None` if it should be dropped.
    fn render_group(elements: &[Element], tokens: &impl Tokens) -> Option<String> {
        let mut group = String::new();
        for element in elements {
            match element {
                Element::Literal(text) => group.push_str(text),
                Element::Token(name) => match tokens.lookup(name) {
                    Lookup::Value(value) => group.push_str(&value),
                    Lookup::Absent => return None,
                    Lookup::Unknown => group.push_str(&format!("[{name}]")),
                },
            }
        }
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    const ARTIFACT: &str =
        "[organisation]/[module](/[branch])/[revision]/[type]/[sha1]/[artifact]-[revision](-[classifier])(.[ext])";

    fn coordinate<'a>(
        branch: Option<&'a str>,
        classifier: Option<&'a str>,
        ext: Option<&'a str>,
    ) -> HashMap<&'static str, Option<&'a str>> {
        HashMap::from([
            ("organisation", Some("org.example")),
            ("module", Some("lib")),
            ("branch", branch),
            ("revision", Some("1.0")),
            ("type", Some("jar")),
            ("artifact", Some("lib")),
            ("classifier", classifier),
            ("ext", ext),
        ])
    }

    #[rstest]
    #[case(None, None, Some("jar"), "org.example/lib/1.0/jar/[sha1]/lib-1.0.jar")]
    #[case(Some("trunk"), None, Some("jar"), "org.example/lib/trunk/1.0/jar/[sha1]/lib-1.0.jar")]
    #[case(None, Some("sources"), Some("jar"), "org.example/lib/1.0/jar/[sha1]/lib-1.0-sources.jar")]
    #[case(None, None, None, "org.example/lib/1.0/jar/[sha1]/lib-1.0")]
    fn test_renders_artifact_pattern(
        #[case] branch: Option<&str>,
        #[case] classifier: Option<&str>,
        #[case] ext: Option<&str>,
        #[case] expected: &str,
    ) {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        assert_eq!(pattern.render(coordinate(branch, classifier, ext)).unwrap(), expected);
    }

    #[test]
    fn test_absent_optional_leaves_no_stray_separators() {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        let path = pattern.render(coordinate(None, None, Some("jar"))).unwrap();
        assert!(!path.contains("//"));
        assert!(!path.contains("--"));
        assert!(!path.ends_with('-'));
    }

    #[test]
    fn test_group_dropped_when_any_token_absent() {
        let pattern: PathPattern = "a(-[classifier].[ext])".parse().unwrap();
        let tokens = HashMap::from([("classifier", Some("sources")), ("ext", None::<&str>)]);
        assert_eq!(pattern.render(&tokens).unwrap(), "a");
    }

    #[test]
    fn test_missing_required_token_fails() {
        let pattern: PathPattern = "[organisation]/[module]".parse().unwrap();
        let tokens = HashMap::from([("organisation", Some("org")), ("module", None::<&str>)]);
        let err = pattern.render(&tokens).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingToken("module".to_string()));
    }

    #[test]
    fn test_unknown_token_kept_verbatim() {
        let pattern: PathPattern = "[module]/[sha1](/[digest])".parse().unwrap();
        let tokens = HashMap::from([("module", Some("lib"))]);
        assert_eq!(pattern.render(&tokens).unwrap(), "lib/[sha1]/[digest]");
    }

    #[test]
    fn test_two_pass_rendering() {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        let first = pattern.render(coordinate(None, None, Some("jar"))).unwrap();
        let hash = "a9993e364706816aba3e25717850c26c9cd0d89d";
        assert_eq!(
            substitute_token(&first, "sha1", hash),
            format!("org.example/lib/1.0/jar/{hash}/lib-1.0.jar")
        );
    }

    #[test]
    fn test_replace_token_with_wildcard() {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        let wildcard = pattern.replace_token("sha1", "*").unwrap();
        assert_eq!(
            wildcard.as_str(),
            "[organisation]/[module](/[branch])/[revision]/[type]/*/[artifact]-[revision](-[classifier])(.[ext])"
        );
        assert_eq!(
            wildcard.render(coordinate(None, None, Some("jar"))).unwrap(),
            "org.example/lib/1.0/jar/*/lib-1.0.jar"
        );
        // Round-trips through the parser.
        assert_eq!(wildcard.as_str().parse::<PathPattern>().unwrap(), wildcard);
    }

    #[test]
    fn test_replace_token_equals_written_pattern() {
        let pattern: PathPattern = "[a]/[sha1]/[b]".parse().unwrap();
        let written: PathPattern = "[a]/*/[b]".parse().unwrap();
        assert_eq!(pattern.replace_token("sha1", "*").unwrap(), written);

        let grouped: PathPattern = "[a](-[sha1]-)[b]".parse().unwrap();
        assert_eq!(grouped.replace_token("sha1", "x").unwrap(), "[a](-x-)[b]".parse::<PathPattern>().unwrap());
    }

    #[test]
    fn test_replace_token_rejects_syntax() {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        let err = pattern.replace_token("sha1", "[x]").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidReplacement(_)));
    }

    #[test]
    fn test_requires_token() {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        assert!(pattern.requires_token("sha1"));
        assert!(pattern.requires_token("revision"));
        assert!(!pattern.requires_token("branch"));
        assert!(!pattern.requires_token("missing"));
    }

    #[test]
    fn test_tokens_in_order() {
        let pattern: PathPattern = "[a]/([b])/[c]-[a]".parse().unwrap();
        assert_eq!(pattern.tokens().collect::<Vec<_>>(), vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let pattern: PathPattern = ARTIFACT.parse().unwrap();
        let tokens = coordinate(Some("main"), Some("javadoc"), Some("jar"));
        assert_eq!(pattern.render(&tokens).unwrap(), pattern.render(&tokens).unwrap());
    }
}
