//! URL joining and URL-pattern compilation.

use crate::error::Result;
use crate::glob::Glob;

/// Joins two URL parts with exactly one `/` at the junction.
///
/// ```
/// use swgen_generator::join_urls;
/// assert_eq!(join_urls("/", "/main.js"), "/main.js");
/// assert_eq!(join_urls("/app", "main.js"), "/app/main.js");
/// assert_eq!(join_urls("/app/", "main.js"), "/app/main.js");
/// assert_eq!(join_urls("/app", "/main.js"), "/app/main.js");
/// ```
pub fn join_urls(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Compiles a URL glob, prefixing relative patterns with the base href.
///
/// A pattern is relative when it neither starts with `/` nor carries a
/// scheme (`://`). A leading `.` of a relative base href (`./app/`) is
/// dropped so the result stays root-anchored.
pub(crate) fn url_to_glob(url: &str, base_href: &str, literal_question_mark: bool) -> Result<Glob> {
    if url.is_empty() || url.starts_with('/') || url.contains("://") {
        return Glob::compile(url, literal_question_mark);
    }
    let base_href = match base_href.starts_with("./") {
        true => &base_href[1..],
        false => base_href,
    };
    Glob::compile(&join_urls(base_href, url), literal_question_mark)
}
