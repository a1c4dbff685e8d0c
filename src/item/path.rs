//! Stored path helpers.
//!
//! Item paths are stored relative to the storage root, with `/` as the
//! separator and no leading or trailing separator. Prefix tests always
//! respect component boundaries: `a/b` is an ancestor of `a/b/c` but not
//! of `a/bc`.

/// Path of a child named `name` under `parent` (or at the root).
pub fn child_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) if !p.is_empty() => format!("{p}/{name}"),
        _ => name.to_string(),
    }
}

/// Path of the containing directory, `None` for root-level paths.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Path of a sibling of `path` named `name`.
pub fn sibling_path(path: &str, name: &str) -> String {
    child_path(parent_path(path), name)
}

/// Move `path` from under `old_prefix` to under `new_prefix`.
///
/// Returns `None` when `path` is neither `old_prefix` itself nor below it.
pub fn rebase_path(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(old_prefix)?;
    if rest.is_empty() {
        Some(new_prefix.to_string())
    } else if rest.starts_with('/') {
        Some(format!("{new_prefix}{rest}"))
    } else {
        None
    }
}

/// SQL `LIKE` pattern matching every path strictly below `prefix`.
///
/// Used with `ESCAPE '\'`. The pattern is only a prefilter; callers confirm
/// each match with [`rebase_path`].
pub(crate) fn descendant_like_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 2);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push_str("/%");
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path(None, "docs"), "docs");
        assert_eq!(child_path(Some("docs"), "a.txt"), "docs/a.txt");
        assert_eq!(child_path(Some("a/b"), "c"), "a/b/c");
        assert_eq!(child_path(Some(""), "c"), "c");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("docs"), None);
        assert_eq!(parent_path("docs/a.txt"), Some("docs"));
        assert_eq!(parent_path("a/b/c"), Some("a/b"));
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(sibling_path("docs", "documents"), "documents");
        assert_eq!(sibling_path("a/b", "x"), "a/x");
    }

    #[test]
    fn test_rebase_self() {
        assert_eq!(rebase_path("a/b", "a/b", "a/z").as_deref(), Some("a/z"));
    }

    #[test]
    fn test_rebase_descendant() {
        assert_eq!(
            rebase_path("a/b/c/d.txt", "a/b", "a/z").as_deref(),
            Some("a/z/c/d.txt")
        );
    }

    #[test]
    fn test_rebase_respects_component_boundary() {
        assert_eq!(rebase_path("a/bc", "a/b", "a/z"), None);
        assert_eq!(rebase_path("a/bc/d", "a/b", "a/z"), None);
        assert_eq!(rebase_path("x/a/b", "a/b", "a/z"), None);
    }

    #[test]
    fn test_rebase_only_first_occurrence() {
        assert_eq!(rebase_path("a/a/a", "a", "b").as_deref(), Some("b/a/a"));
    }

    #[test]
    fn test_descendant_like_pattern_escapes_wildcards() {
        assert_eq!(descendant_like_pattern("docs"), "docs/%");
        assert_eq!(descendant_like_pattern("50%_off"), "50\\%\\_off/%");
        assert_eq!(descendant_like_pattern("a/b"), "a/b/%");
    }
}
