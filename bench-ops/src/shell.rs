//! Quoting for values interpolated into `sh -c` command lines.

use std::borrow::Cow;
use std::path::Path;

use shell_escape::unix::escape;

/// Quote `value` for POSIX sh. Strings made only of safe characters are
/// returned unchanged.
pub fn quote(value: &str) -> String {
    escape(Cow::Borrowed(value)).into_owned()
}

pub fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_are_untouched() {
        assert_eq!(quote("site1.local"), "site1.local");
        assert_eq!(quote_path(Path::new("/srv/bench/env/bin/pip")), "/srv/bench/env/bin/pip");
    }

    #[test]
    fn metacharacters_are_single_quoted() {
        assert_eq!(quote("p@ss word"), "'p@ss word'");
        assert_eq!(quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn embedded_single_quote_is_escaped() {
        let q = quote("it's");
        assert!(q.starts_with('\'') && q.ends_with('\''), "got {q}");
        assert!(q.contains("\\'"), "got {q}");
    }
}
