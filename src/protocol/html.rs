//! HTML rendering of a diff for display

use crate::diff::{Diff, Operation};

/// Render a diff as inline HTML
///
/// Insertions are wrapped in `<ins>`, deletions in `<del>` and equalities in
/// `<span>`. Text is escaped and newlines are shown as a pilcrow.
///
/// # Example
/// ```
/// use textdelta::diff::Diff;
/// use textdelta::protocol::html::pretty_html;
///
/// let html = pretty_html(&[Diff::equal("a "), Diff::insert("b")]);
/// assert_eq!(html, "<span>a </span><ins style=\"background:#e6ffe6;\">b</ins>");
/// ```
pub fn pretty_html(diffs: &[Diff]) -> String {
    let mut html = String::new();
    for diff in diffs {
        let text = escape(&diff.text);
        match diff.op {
            Operation::Insert => {
                html.push_str("<ins style=\"background:#e6ffe6;\">");
                html.push_str(&text);
                html.push_str("</ins>");
            }
            Operation::Delete => {
                html.push_str("<del style=\"background:#ffe6e6;\">");
                html.push_str(&text);
                html.push_str("</del>");
            }
            Operation::Equal => {
                html.push_str("<span>");
                html.push_str(&text);
                html.push_str("</span>");
            }
        }
    }
    html
}

fn escape(text: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for &c in text {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\n' => escaped.push_str("&para;<br>"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_html() {
        let diffs = vec![Diff::equal("a\n"), Diff::delete("<B>b</B>"), Diff::insert("c&d")];
        assert_eq!(
            pretty_html(&diffs),
            "<span>a&para;<br></span><del style=\"background:#ffe6e6;\">&lt;B&gt;b&lt;/B&gt;</del><ins style=\"background:#e6ffe6;\">c&amp;d</ins>"
        );
    }

    #[test]
    fn test_empty_diff() {
        assert_eq!(pretty_html(&[]), "");
    }
}
