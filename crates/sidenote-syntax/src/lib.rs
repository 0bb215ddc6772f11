//! Language awareness for comment editing.
//!
//! The editing core needs two language-specific facts: what a line comment
//! marker looks like, and whether a given character offset sits inside a
//! comment, inside an unterminated string literal, or in ordinary code. This
//! crate supplies both. [`CommentSyntax`] describes the marker for one
//! language (a regex plus the string-quote characters that can hide a false
//! marker), and [`ScanTracker`] answers positional queries against a
//! [`Document`](sidenote_doc::Document) by scanning lines on demand.
//!
//! Trackers are deliberately line-local: a string literal never carries
//! across a newline, which matches how line comments behave in practice and
//! keeps the scanner O(line) per query. Hosts with a richer parse can
//! substitute their own [`LexicalTracker`] implementation.

pub mod render;
pub mod scan;
pub mod tracker;

pub use render::{RenderError, RenderMode, RenderRule, RenderRules};
pub use tracker::{LexState, LexicalTracker, ScanTracker};

use regex::Regex;
use thiserror::Error;

/// Errors raised while building a [`CommentSyntax`].
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The marker pattern failed to compile.
    #[error("invalid comment marker pattern for {language}: {source}")]
    BadPattern {
        language: String,
        #[source]
        source: regex::Error,
    },
}

/// How one language writes line comments.
///
/// The marker pattern is matched at the start of a (margin-stripped) line;
/// a match captures the literal marker text, e.g. `"// "` or `"#"`. The
/// `lead` character is a cheap first-byte filter so the scanner only runs
/// the regex at plausible columns.
#[derive(Debug, Clone)]
pub struct CommentSyntax {
    language: String,
    marker: Regex,
    lead: char,
    quotes: &'static [char],
    escape: bool,
}

/// Marker shape shared by a group of languages.
struct Family {
    pattern: &'static str,
    lead: char,
    quotes: &'static [char],
    escape: bool,
}

const SLASH: Family = Family {
    pattern: r"//+!?[ \t]?",
    lead: '/',
    quotes: &['"'],
    escape: true,
};

const HASH: Family = Family {
    pattern: r"#+[ \t]?",
    lead: '#',
    quotes: &['"', '\''],
    escape: true,
};

const DASH: Family = Family {
    pattern: r"--+[ \t]?",
    lead: '-',
    quotes: &['"', '\''],
    escape: true,
};

const SEMI: Family = Family {
    pattern: r";+[ \t]?",
    lead: ';',
    quotes: &['"'],
    escape: true,
};

const PERCENT: Family = Family {
    pattern: r"%+[ \t]?",
    lead: '%',
    quotes: &['"'],
    escape: true,
};

// Vim's comment lead is also its double-quote string delimiter; only
// single-quoted strings can hide a marker candidate.
const QUOTE: Family = Family {
    pattern: r#""+[ \t]?"#,
    lead: '"',
    quotes: &['\''],
    escape: false,
};

fn family_for(language: &str) -> Option<&'static Family> {
    match language {
        "rust" | "c" | "cpp" | "c++" | "go" | "java" | "javascript" | "js" | "typescript"
        | "ts" => Some(&SLASH),
        "python" | "py" | "shell" | "sh" | "bash" | "ruby" | "toml" | "yaml" | "make"
        | "makefile" => Some(&HASH),
        "lua" | "sql" | "haskell" => Some(&DASH),
        "lisp" | "scheme" | "clojure" | "elisp" | "asm" => Some(&SEMI),
        "erlang" | "tex" | "latex" | "matlab" | "prolog" => Some(&PERCENT),
        "vim" | "vimscript" => Some(&QUOTE),
        _ => None,
    }
}

impl CommentSyntax {
    /// Builds a syntax from a custom marker pattern.
    ///
    /// The pattern is matched literally at line starts; it should consume
    /// the marker and at most one following space or tab, never the comment
    /// text itself. String-literal detection defaults to double quotes with
    /// backslash escapes; override with [`with_quotes`](Self::with_quotes).
    pub fn new(
        language: impl Into<String>,
        pattern: &str,
        lead: char,
    ) -> Result<Self, SyntaxError> {
        let language = language.into();
        let marker = Regex::new(pattern).map_err(|source| SyntaxError::BadPattern {
            language: language.clone(),
            source,
        })?;
        Ok(Self {
            language,
            marker,
            lead,
            quotes: &['"'],
            escape: true,
        })
    }

    /// Replaces the string-quote set used to suppress false markers.
    pub fn with_quotes(mut self, quotes: &'static [char], escape: bool) -> Self {
        self.quotes = quotes;
        self.escape = escape;
        self
    }

    /// Looks up the built-in syntax for a language name.
    ///
    /// Names are matched case-insensitively and cover the common aliases
    /// (`"cpp"`/`"c++"`, `"js"`/`"javascript"`). Returns `None` for unknown
    /// languages; callers fall back to [`CommentSyntax::new`] with their own
    /// pattern.
    pub fn for_language(language: &str) -> Option<Self> {
        let name = language.to_ascii_lowercase();
        let family = family_for(&name)?;
        Self::new(name, family.pattern, family.lead)
            .ok()
            .map(|syntax| syntax.with_quotes(family.quotes, family.escape))
    }

    /// The language name this syntax was built for.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub(crate) fn lead(&self) -> char {
        self.lead
    }

    pub(crate) fn quotes(&self) -> &[char] {
        self.quotes
    }

    pub(crate) fn escape(&self) -> bool {
        self.escape
    }

    /// Matches the marker pattern at the very start of `line`.
    ///
    /// Returns the literal matched text. A marker found later in the line
    /// does not count; margin handling happens before this is called.
    pub fn match_at_start<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.marker
            .find(line)
            .filter(|m| m.start() == 0)
            .map(|m| m.as_str())
    }

    /// True when the marker pattern matches exactly at `byte_idx`.
    pub(crate) fn matches_at(&self, line: &str, byte_idx: usize) -> bool {
        self.marker
            .find(&line[byte_idx..])
            .is_some_and(|m| m.start() == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_rust_marker_consumes_one_space() {
        let syntax = CommentSyntax::for_language("rust").unwrap();
        assert_eq!(syntax.match_at_start("// hello"), Some("// "));
        assert_eq!(syntax.match_at_start("/// doc"), Some("/// "));
        assert_eq!(syntax.match_at_start("//!inner"), Some("//!"));
        assert_eq!(syntax.match_at_start("//  two"), Some("// "));
    }

    #[test]
    fn marker_must_start_the_line() {
        let syntax = CommentSyntax::for_language("rust").unwrap();
        assert_eq!(syntax.match_at_start("let x = 1; // tail"), None);
        assert_eq!(syntax.match_at_start("  // indented"), None);
    }

    #[test]
    fn language_aliases_share_a_family() {
        let cpp = CommentSyntax::for_language("C++").unwrap();
        assert_eq!(cpp.match_at_start("// x"), Some("// "));
        let sh = CommentSyntax::for_language("sh").unwrap();
        assert_eq!(sh.match_at_start("## section"), Some("## "));
        assert!(CommentSyntax::for_language("cobol").is_none());
    }

    #[test]
    fn custom_pattern_rejects_bad_regex() {
        let err = CommentSyntax::new("custom", "[", '[').unwrap_err();
        assert!(matches!(err, SyntaxError::BadPattern { .. }));
    }

    #[test]
    fn dash_family_needs_two_dashes() {
        let lua = CommentSyntax::for_language("lua").unwrap();
        assert_eq!(lua.match_at_start("-- note"), Some("-- "));
        assert_eq!(lua.match_at_start("-x"), None);
    }

    #[test]
    fn vim_family_marks_with_a_double_quote() {
        let vim = CommentSyntax::for_language("vim").unwrap();
        assert_eq!(vim.match_at_start("\" fold settings"), Some("\" "));
        assert_eq!(vim.match_at_start("\"\"header"), Some("\"\""));
        assert_eq!(vim.match_at_start("set nocompatible"), None);
    }
}
