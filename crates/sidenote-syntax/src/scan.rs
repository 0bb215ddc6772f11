//! Single-line lexical scan.
//!
//! One pass over a line classifies it for the tracker: is it blank, and at
//! which column (if any) does a comment marker start. Marker candidates
//! inside string literals are skipped, so `let s = "// not a comment";`
//! reports no marker. String state is line-local by construction.

use crate::CommentSyntax;

/// What one scan learned about a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineShape {
    /// Line is empty or whitespace-only (ignoring the newline).
    pub blank: bool,
    /// Character column of the first comment marker outside any string.
    pub marker_col: Option<usize>,
}

/// Scans `line` (with or without its trailing newline) for a comment marker.
pub(crate) fn line_shape(syntax: &CommentSyntax, line: &str) -> LineShape {
    let content = line.strip_suffix('\n').unwrap_or(line);
    let blank = content.chars().all(char::is_whitespace);
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut marker_col = None;
    for (col, (byte_idx, ch)) in content.char_indices().enumerate() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if syntax.escape() && ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
        } else if ch == syntax.lead() && syntax.matches_at(content, byte_idx) {
            marker_col = Some(col);
            break;
        } else if syntax.quotes().contains(&ch) {
            in_string = Some(ch);
        }
    }
    LineShape { blank, marker_col }
}

/// True when character column `col` of `line` falls inside a string literal.
///
/// The state is taken just before `col`, i.e. the opening quote itself is
/// not yet "inside" but every column after it is, up to and including the
/// closing quote.
pub(crate) fn in_string_at(syntax: &CommentSyntax, line: &str, col: usize) -> bool {
    let content = line.strip_suffix('\n').unwrap_or(line);
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (idx, ch) in content.chars().enumerate() {
        if idx >= col {
            break;
        }
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if syntax.escape() && ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
        } else if syntax.quotes().contains(&ch) {
            in_string = Some(ch);
        }
    }
    in_string.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rust() -> CommentSyntax {
        CommentSyntax::for_language("rust").unwrap()
    }

    #[test]
    fn marker_column_on_indented_comment() {
        let shape = line_shape(&rust(), "    // four in\n");
        assert_eq!(shape.marker_col, Some(4));
        assert!(!shape.blank);
    }

    #[test]
    fn marker_inside_string_is_ignored() {
        let shape = line_shape(&rust(), "let s = \"// nope\";\n");
        assert_eq!(shape.marker_col, None);
    }

    #[test]
    fn marker_after_closed_string_is_found() {
        let shape = line_shape(&rust(), "let s = \"x\"; // yes\n");
        assert_eq!(shape.marker_col, Some(13));
    }

    #[test]
    fn escaped_quote_does_not_close_the_string() {
        let shape = line_shape(&rust(), "let s = \"a\\\"// b\";\n");
        assert_eq!(shape.marker_col, None);
    }

    #[test]
    fn blank_lines_are_flagged() {
        assert!(line_shape(&rust(), "\n").blank);
        assert!(line_shape(&rust(), "   \n").blank);
        assert!(line_shape(&rust(), "").blank);
        assert!(!line_shape(&rust(), "x\n").blank);
    }

    #[test]
    fn string_state_tracks_open_and_close() {
        let syntax = rust();
        let line = "a \"bc\" d";
        assert!(!in_string_at(&syntax, line, 2));
        assert!(in_string_at(&syntax, line, 3));
        assert!(in_string_at(&syntax, line, 5));
        assert!(!in_string_at(&syntax, line, 6));
    }

    #[test]
    fn single_quotes_count_for_python_only() {
        let py = CommentSyntax::for_language("python").unwrap();
        assert!(in_string_at(&py, "x = 'ab", 5));
        assert!(!in_string_at(&rust(), "x = 'ab", 5));
    }

    #[test]
    fn vim_marker_hides_inside_single_quotes() {
        let vim = CommentSyntax::for_language("vim").unwrap();
        assert_eq!(line_shape(&vim, "echo 'a \" b'\n").marker_col, None);
        assert_eq!(line_shape(&vim, "set list \" trailing\n").marker_col, Some(9));
    }

    #[test]
    fn unicode_columns_are_character_based() {
        let shape = line_shape(&rust(), "\u{3042}\u{3042} // x\n");
        assert_eq!(shape.marker_col, Some(3));
    }
}
