//! A small, allow-listed markup language for message bodies.
//!
//! Assistant replies use a markdown subset: `**bold**`, `*italic*`,
//! `` `inline code` `` and fenced code blocks. [`parse`] turns text into a
//! tree of [`Node`]s; nothing in the input is ever passed through as markup,
//! so renderers decide exactly what reaches the screen. [`to_html`] escapes
//! every piece of text it writes.
//!
//! Inline spans never cross a line break, and an opening delimiter without a
//! partner on the same line is kept as literal text.

const FENCE: &str = "```";

/// One element of parsed message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text, newlines included.
    Text(String),
    /// `**...**`
    Bold(Vec<Node>),
    /// `*...*`
    Italic(Vec<Node>),
    /// `` `...` ``
    InlineCode(String),
    /// A fenced block, with the optional language tag from the opening fence.
    CodeBlock {
        /// Language tag, e.g. `rust`.
        language: Option<String>,
        /// Verbatim block contents.
        code: String,
    },
}

/// Parses message text into nodes.
///
/// ```
/// use flowchat::markup::{Node, parse};
///
/// assert_eq!(
///     parse("use **bold** here"),
///     vec![
///         Node::Text("use ".to_string()),
///         Node::Bold(vec![Node::Text("bold".to_string())]),
///         Node::Text(" here".to_string()),
///     ]
/// );
/// ```
pub fn parse(input: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find(FENCE) {
        let after = &rest[start + FENCE.len()..];
        let Some(end) = after.find(FENCE) else {
            break;
        };
        extend_inline(&mut nodes, &rest[..start]);
        nodes.push(code_block(&after[..end]));
        rest = &after[end + FENCE.len()..];
    }
    extend_inline(&mut nodes, rest);
    nodes
}

fn code_block(body: &str) -> Node {
    let (language, code) = match body.split_once('\n') {
        Some((first, code)) if is_language_tag(first.trim()) => {
            (Some(first.trim().to_string()), code)
        }
        Some(("", code)) => (None, code),
        _ => (None, body),
    };
    Node::CodeBlock {
        language,
        code: code.strip_suffix('\n').unwrap_or(code).to_string(),
    }
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
}

fn extend_inline(nodes: &mut Vec<Node>, text: &str) {
    for node in parse_inline(text) {
        match (nodes.last_mut(), node) {
            (Some(Node::Text(prev)), Node::Text(next)) => prev.push_str(&next),
            (_, node) => nodes.push(node),
        }
    }
}

fn parse_inline(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut plain = String::new();
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let span = if rest.starts_with('`') {
            closing(&rest[1..], "`").map(|len| {
                (
                    Node::InlineCode(rest[1..1 + len].to_string()),
                    len + 2,
                )
            })
        } else if rest.starts_with("**") {
            closing(&rest[2..], "**")
                .map(|len| (Node::Bold(parse_inline(&rest[2..2 + len])), len + 4))
        } else if rest.starts_with('*') {
            closing(&rest[1..], "*")
                .map(|len| (Node::Italic(parse_inline(&rest[1..1 + len])), len + 2))
        } else {
            None
        };

        match span {
            Some((node, consumed)) => {
                if !plain.is_empty() {
                    nodes.push(Node::Text(std::mem::take(&mut plain)));
                }
                nodes.push(node);
                i += consumed;
            }
            None => {
                let Some(ch) = rest.chars().next() else {
                    break;
                };
                plain.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    if !plain.is_empty() {
        nodes.push(Node::Text(plain));
    }
    nodes
}

/// Length of a non-empty span ending at `delim`, searching the current line only.
fn closing(s: &str, delim: &str) -> Option<usize> {
    let line = s.find('\n').map_or(s, |nl| &s[..nl]);
    let end = line.find(delim)?;
    (end > 0).then_some(end)
}

/// Renders nodes as HTML, escaping all text.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_html(&mut out, nodes);
    out
}

fn write_html(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        match node {
            Node::Text(text) => escape_html(out, text),
            Node::Bold(children) => {
                out.push_str("<strong>");
                write_html(out, children);
                out.push_str("</strong>");
            }
            Node::Italic(children) => {
                out.push_str("<em>");
                write_html(out, children);
                out.push_str("</em>");
            }
            Node::InlineCode(code) => {
                out.push_str("<code>");
                escape_html(out, code);
                out.push_str("</code>");
            }
            Node::CodeBlock { language, code } => {
                match language {
                    // Tags are restricted by is_language_tag, but escape anyway.
                    Some(language) => {
                        out.push_str("<pre><code class=\"language-");
                        escape_html(out, language);
                        out.push_str("\">");
                    }
                    None => out.push_str("<pre><code>"),
                }
                escape_html(out, code);
                out.push_str("</code></pre>");
            }
        }
    }
}

fn escape_html(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

/// Renders nodes as plain text with all markup and terminal control
/// characters removed.
pub fn to_plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) | Node::InlineCode(text) => push_printable(&mut out, text),
            Node::Bold(children) | Node::Italic(children) => out.push_str(&to_plain_text(children)),
            Node::CodeBlock { code, .. } => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                push_printable(&mut out, code);
                out.push('\n');
            }
        }
    }
    out
}

/// Appends `text` without control characters (ESC, BEL, CR, DEL, C1 and the
/// like), so server text cannot drive the terminal. Newlines and tabs survive.
pub fn push_printable(out: &mut String, text: &str) {
    out.extend(text.chars().filter(|&c| is_printable(c)));
}

/// `text` with control characters removed; see [`push_printable`].
pub fn strip_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_printable(&mut out, text);
    out
}

fn is_printable(c: char) -> bool {
    c == '\n' || c == '\t' || !c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn plain_text_is_one_node() {
        assert_eq!(parse("hello\nworld"), vec![text("hello\nworld")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn inline_spans() {
        assert_eq!(
            parse("a *b* `c` **d**"),
            vec![
                text("a "),
                Node::Italic(vec![text("b")]),
                text(" "),
                Node::InlineCode("c".to_string()),
                text(" "),
                Node::Bold(vec![text("d")]),
            ]
        );
    }

    #[test]
    fn bold_can_hold_italic_and_code() {
        assert_eq!(
            parse("**x *y* `z`**"),
            vec![Node::Bold(vec![
                text("x "),
                Node::Italic(vec![text("y")]),
                text(" "),
                Node::InlineCode("z".to_string()),
            ])]
        );
    }

    #[test]
    fn code_is_not_interpreted() {
        assert_eq!(
            parse("`**not bold**`"),
            vec![Node::InlineCode("**not bold**".to_string())]
        );
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert_eq!(parse("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(parse("**open\nclose**"), vec![text("**open\nclose**")]);
        assert_eq!(parse("a `` b"), vec![text("a `` b")]);
    }

    #[test]
    fn fenced_block_with_language() {
        assert_eq!(
            parse("Try:\n```rust\nfn main() {}\n```\nDone."),
            vec![
                text("Try:\n"),
                Node::CodeBlock {
                    language: Some("rust".to_string()),
                    code: "fn main() {}".to_string(),
                },
                text("\nDone."),
            ]
        );
    }

    #[test]
    fn fenced_block_keeps_markup_verbatim() {
        assert_eq!(
            parse("```\n*a* `b`\n```"),
            vec![Node::CodeBlock {
                language: None,
                code: "*a* `b`".to_string(),
            }]
        );
        assert_eq!(
            parse("```x = 1```"),
            vec![Node::CodeBlock {
                language: None,
                code: "x = 1".to_string(),
            }]
        );
    }

    #[test]
    fn html_is_always_escaped() {
        let html = to_html(&parse("<script>alert('x')</script> **<b>** `a<b`"));
        assert_eq!(
            html,
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; <strong>&lt;b&gt;</strong> <code>a&lt;b</code>"
        );
        let html = to_html(&parse("```html\n<img src=x onerror=alert(1)>\n```"));
        assert_eq!(
            html,
            "<pre><code class=\"language-html\">&lt;img src=x onerror=alert(1)&gt;</code></pre>"
        );
    }

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            to_plain_text(&parse("**a** *b* `c`\n```\nd\n```")),
            "a b c\nd\n"
        );
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(
            parse("héllo **wörld** ✓"),
            vec![
                text("héllo "),
                Node::Bold(vec![text("wörld")]),
                text(" ✓"),
            ]
        );
    }

    #[test]
    fn plain_text_drops_terminal_controls() {
        let nodes = parse("hi \x1b]0;pwned\x07\x1b[2J `a\x1bb`\n```\nx\u{9b}31m\ty\r\n```");
        assert_eq!(to_plain_text(&nodes), "hi ]0;pwned[2J ab\nx31m\ty\n");
    }

    #[test]
    fn strip_controls_keeps_newlines_tabs_and_unicode() {
        assert_eq!(strip_controls("a\tb\nc\u{7f}\u{85}d é"), "a\tb\ncd é");
    }
}
