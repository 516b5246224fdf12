//! Glob compilation.
//!
//! Globs are compiled segment by segment into regular expressions:
//!
//! | glob   | regex          | matches                                           |
//! |--------|----------------|---------------------------------------------------|
//! | `**`   | `(?:.+\/)?`    | zero or more whole segments (when not last)       |
//! | `**`   | `.*`           | anything, across segments (when last)             |
//! | `*`    | `[^/]*`        | any run of characters inside one segment          |
//! | `?`    | `[^/]` or `\?` | one character, or a literal `?` in URL contexts   |
//!
//! Every other character matches itself. The compiled regexes are consumed
//! both here (matching build output files) and by the cache runtime, so only
//! syntax shared by common regex dialects is emitted. Matching uses the
//! [`regex`] crate, which runs in linear time regardless of the pattern.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;

const QUESTION_MARK: &str = "[^/]";
const WILD_SINGLE: &str = "[^/]*";
const WILD_OPEN: &str = r"(?:.+\/)?";
const WILD_TAIL: &str = ".*";
const SEPARATOR: &str = r"\/";

/// Compiles the body of a glob into an unanchored regular expression.
///
/// ```
/// use swgen_generator::glob::glob_to_regex;
/// assert_eq!(glob_to_regex("/assets/**", false), r"\/assets\/.*");
/// assert_eq!(glob_to_regex("/*.js", false), r"\/[^/]*\.js");
/// assert_eq!(glob_to_regex("/search?q=*", true), r"\/search\?q=[^/]*");
/// ```
pub fn glob_to_regex(glob: &str, literal_question_mark: bool) -> String {
    let mut regex = String::with_capacity(glob.len() * 2);
    let mut segments = glob.split('/').peekable();
    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();
        if segment == "**" {
            regex.push_str(if last { WILD_TAIL } else { WILD_OPEN });
            continue;
        }
        for c in segment.chars() {
            match c {
                '*' => regex.push_str(WILD_SINGLE),
                '?' if !literal_question_mark => regex.push_str(QUESTION_MARK),
                '\\' | '.' | '+' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' => {
                    regex.push('\\');
                    regex.push(c);
                },
                _ => regex.push(c),
            }
        }
        if !last {
            regex.push_str(SEPARATOR);
        }
    }
    regex
}

/// A compiled, anchored glob.
#[derive(Debug, Clone)]
pub struct Glob {
    source: String,
    regex: Regex,
}

impl Glob {
    /// Compiles `pattern` into an anchored matcher.
    ///
    /// Returns [`InvalidGlob`](ErrorKind::InvalidGlob) for an empty pattern
    /// or when the resulting expression is rejected by the regex engine.
    pub fn compile(pattern: &str, literal_question_mark: bool) -> Result<Self> {
        if pattern.is_empty() {
            exn::bail!(ErrorKind::InvalidGlob(pattern.to_string()));
        }
        let anchored = format!("^{}$", glob_to_regex(pattern, literal_question_mark));
        let regex = Regex::new(&anchored).or_raise(|| ErrorKind::InvalidGlob(pattern.to_string()))?;
        Ok(Self { source: pattern.to_string(), regex })
    }

    /// The glob this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// The anchored regular expression, as written into manifests.
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// An ordered list of globs, each optionally negated with a leading `!`.
///
/// A candidate matches when at least one positive glob matches it and no
/// negative glob does. An empty list matches nothing.
///
/// ```
/// use swgen_generator::glob::GlobList;
/// let globs = GlobList::compile(["/**/*.js", "!/vendor/**"]).unwrap();
/// assert!(globs.is_match("/app/main.js"));
/// assert!(!globs.is_match("/vendor/lib.js"));
/// assert!(!globs.is_match("/styles.css"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GlobList {
    entries: Vec<(bool, Glob)>,
}

impl GlobList {
    /// Compiles file globs (`?` is a wildcard).
    pub fn compile<S: AsRef<str>>(globs: impl IntoIterator<Item = S>) -> Result<Self> {
        let entries = globs
            .into_iter()
            .map(|glob| -> Result<(bool, Glob)> {
                let glob = glob.as_ref();
                let (positive, body) = match glob.strip_prefix('!') {
                    Some(body) => (false, body),
                    None => (true, glob),
                };
                Ok((positive, Glob::compile(body, false)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Left fold from "no match": positive globs can only turn the result on,
    /// negative globs can only turn it off.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.entries.iter().fold(false, |matched, (positive, glob)| match positive {
            true => matched || glob.is_match(candidate),
            false => matched && !glob.is_match(candidate),
        })
    }
}
