//! Markdown preview renderer.
//!
//! Converts a note body into an HTML fragment via line and pattern
//! substitution. The function is total: any input produces a string, and
//! unrecognized syntax falls through as a plain paragraph. All user text is
//! HTML-escaped and link/image URLs are checked against a scheme allow-list
//! before they reach an attribute position.

/// Converts markdown-flavored note content into an HTML fragment.
pub fn markdown_to_html(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        // Fenced code block: content is escaped, never re-interpreted.
        // An unclosed fence swallows the rest of the input.
        if line.trim_start().starts_with("```") {
            let mut code = String::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code.push_str(&escape_html(lines[i]));
                code.push('\n');
                i += 1;
            }
            i += 1; // skip the closing fence, if any
            out.push(format!("<pre><code>{}</code></pre>", code));
            continue;
        }

        // Pipe table: header row followed by a |---|---| separator.
        if line.trim_start().starts_with('|')
            && i + 1 < lines.len()
            && is_table_separator(lines[i + 1])
        {
            let mut table = String::from("<table>\n<thead>\n");
            table.push_str(&table_row(line, true));
            table.push_str("\n</thead>\n<tbody>");
            i += 2;
            while i < lines.len() && lines[i].trim_start().starts_with('|') {
                table.push('\n');
                table.push_str(&table_row(lines[i], false));
                i += 1;
            }
            table.push_str("\n</tbody>\n</table>");
            out.push(table);
            continue;
        }

        if let Some(rest) = line.strip_prefix("### ") {
            out.push(format!("<h3>{}</h3>", inline(rest)));
            i += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("## ") {
            out.push(format!("<h2>{}</h2>", inline(rest)));
            i += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("# ") {
            out.push(format!("<h1>{}</h1>", inline(rest)));
            i += 1;
            continue;
        }

        // Bullet and task items share a list; consecutive items are grouped.
        if task_item(line).is_some() || line.starts_with("- ") {
            let mut items = Vec::new();
            while i < lines.len() {
                if let Some((checked, rest)) = task_item(lines[i]) {
                    let checkbox = if checked {
                        "<input type=\"checkbox\" checked disabled> "
                    } else {
                        "<input type=\"checkbox\" disabled> "
                    };
                    items.push(format!("<li>{}{}</li>", checkbox, inline(rest)));
                    i += 1;
                } else if let Some(rest) = lines[i].strip_prefix("- ") {
                    items.push(format!("<li>{}</li>", inline(rest)));
                    i += 1;
                } else {
                    break;
                }
            }
            out.push(format!("<ul>\n{}\n</ul>", items.join("\n")));
            continue;
        }

        if numbered_item(line).is_some() {
            let mut items = Vec::new();
            while i < lines.len() {
                match numbered_item(lines[i]) {
                    Some(rest) => {
                        items.push(format!("<li>{}</li>", inline(rest)));
                        i += 1;
                    }
                    None => break,
                }
            }
            out.push(format!("<ol>\n{}\n</ol>", items.join("\n")));
            continue;
        }

        if line.starts_with("> ") {
            let mut quoted = Vec::new();
            while i < lines.len() {
                match lines[i].strip_prefix("> ") {
                    Some(rest) => {
                        quoted.push(format!("<p>{}</p>", inline(rest)));
                        i += 1;
                    }
                    None => break,
                }
            }
            out.push(format!("<blockquote>\n{}\n</blockquote>", quoted.join("\n")));
            continue;
        }

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        // Anything unrecognized passes through as a plain paragraph.
        out.push(format!("<p>{}</p>", inline(line)));
        i += 1;
    }

    out.join("\n")
}

/// Escapes the HTML-significant characters in user text.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn inline(text: &str) -> String {
    render_inline(&escape_html(text))
}

/// Applies inline substitutions (bold, italic, links, images) to
/// already-escaped text.
fn render_inline(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'!' && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            if let Some((alt, url, next)) = link_span(text, i + 1) {
                if is_safe_url(url) {
                    out.push_str(&format!("<img src=\"{}\" alt=\"{}\">", url.trim(), alt));
                } else {
                    out.push_str(alt);
                }
                i = next;
                continue;
            }
        }
        if bytes[i] == b'[' {
            if let Some((label, url, next)) = link_span(text, i) {
                if is_safe_url(url) {
                    out.push_str(&format!(
                        "<a href=\"{}\">{}</a>",
                        url.trim(),
                        render_inline(label)
                    ));
                } else {
                    out.push_str(&render_inline(label));
                }
                i = next;
                continue;
            }
        }
        if bytes[i] == b'*' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'*' {
                if let Some(rel) = text[i + 2..].find("**") {
                    let end = i + 2 + rel;
                    out.push_str("<strong>");
                    out.push_str(&render_inline(&text[i + 2..end]));
                    out.push_str("</strong>");
                    i = end + 2;
                    continue;
                }
            } else if let Some(rel) = text[i + 1..].find('*') {
                if rel > 0 {
                    let end = i + 1 + rel;
                    out.push_str("<em>");
                    out.push_str(&render_inline(&text[i + 1..end]));
                    out.push_str("</em>");
                    i = end + 1;
                    continue;
                }
            }
        }

        match text[i..].chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    out
}

/// Parses `[label](url)` starting at the opening bracket. Returns the label,
/// the url, and the byte offset just past the closing parenthesis.
fn link_span(text: &str, open: usize) -> Option<(&str, &str, usize)> {
    let rb = text[open + 1..].find(']')? + open + 1;
    if !text[rb + 1..].starts_with('(') {
        return None;
    }
    let close = text[rb + 2..].find(')')? + rb + 2;
    Some((&text[open + 1..rb], &text[rb + 2..close], close + 1))
}

/// Allow-list for URLs landing in `href`/`src` attributes. `data:` is only
/// accepted for non-SVG images, matching the embedded-image data URIs that
/// the editor produces.
fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
    {
        return true;
    }
    if lower.starts_with("data:image/") {
        return !lower.starts_with("data:image/svg");
    }
    // Scheme-less relative references are fine; any other scheme is not.
    !lower.contains(':')
}

/// Recognizes `- [ ] text` and `- [x] text` task lines.
fn task_item(line: &str) -> Option<(bool, &str)> {
    if let Some(rest) = line.strip_prefix("- [ ] ") {
        return Some((false, rest));
    }
    if let Some(rest) = line.strip_prefix("- [x] ").or_else(|| line.strip_prefix("- [X] ")) {
        return Some((true, rest));
    }
    None
}

/// Recognizes `1. text` numbered items (any digit run before the dot).
fn numbered_item(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn table_row(line: &str, header: bool) -> String {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    let tag = if header { "th" } else { "td" };

    let cells: String = trimmed
        .split('|')
        .map(|cell| format!("<{}>{}</{}>", tag, inline(cell.trim()), tag))
        .collect();

    format!("<tr>{}</tr>", cells)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn level_one_heading() {
        assert_eq!(markdown_to_html("# Hello"), "<h1>Hello</h1>");
    }

    #[test]
    fn heading_levels_two_and_three() {
        assert_eq!(markdown_to_html("## Sub"), "<h2>Sub</h2>");
        assert_eq!(markdown_to_html("### Deep"), "<h3>Deep</h3>");
        // Only three levels are recognized
        assert_eq!(markdown_to_html("#### Nope"), "<p>#### Nope</p>");
    }

    #[test]
    fn plain_text_wraps_to_a_paragraph() {
        assert_eq!(markdown_to_html("just plain text"), "<p>just plain text</p>");
    }

    #[test]
    fn bold_and_italic() {
        assert_eq!(markdown_to_html("**bold**"), "<p><strong>bold</strong></p>");
        assert_eq!(markdown_to_html("*italic*"), "<p><em>italic</em></p>");
        assert_eq!(
            markdown_to_html("**a *b* c**"),
            "<p><strong>a <em>b</em> c</strong></p>"
        );
    }

    #[test]
    fn unterminated_emphasis_is_literal() {
        assert_eq!(markdown_to_html("a ** b"), "<p>a ** b</p>");
        assert_eq!(markdown_to_html("a * b"), "<p>a * b</p>");
    }

    #[test]
    fn unordered_list_groups_consecutive_items() {
        assert_eq!(
            markdown_to_html("- a\n- b"),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>"
        );
    }

    #[test]
    fn ordered_list() {
        assert_eq!(
            markdown_to_html("1. first\n2. second"),
            "<ol>\n<li>first</li>\n<li>second</li>\n</ol>"
        );
    }

    #[test]
    fn task_list_items() {
        let html = markdown_to_html("- [ ] open\n- [x] done");
        assert!(html.contains("<input type=\"checkbox\" disabled> open"));
        assert!(html.contains("<input type=\"checkbox\" checked disabled> done"));
    }

    #[test]
    fn blockquote_groups_consecutive_lines() {
        assert_eq!(
            markdown_to_html("> one\n> two"),
            "<blockquote>\n<p>one</p>\n<p>two</p>\n</blockquote>"
        );
    }

    #[test]
    fn fenced_code_is_escaped_not_interpreted() {
        let html = markdown_to_html("```\n# not a heading\n<b>\n```");
        assert_eq!(html, "<pre><code># not a heading\n&lt;b&gt;\n</code></pre>");
    }

    #[test]
    fn unclosed_fence_swallows_the_rest() {
        let html = markdown_to_html("```\ncode to the end");
        assert_eq!(html, "<pre><code>code to the end\n</code></pre>");
    }

    #[test]
    fn links_and_images() {
        assert_eq!(
            markdown_to_html("[site](https://example.com)"),
            "<p><a href=\"https://example.com\">site</a></p>"
        );
        assert_eq!(
            markdown_to_html("![pic](data:image/png;base64,AAAA)"),
            "<p><img src=\"data:image/png;base64,AAAA\" alt=\"pic\"></p>"
        );
    }

    #[test]
    fn unsafe_url_schemes_are_stripped() {
        assert_eq!(
            markdown_to_html("[click](javascript:alert%281%29)"),
            "<p>click</p>"
        );
        assert_eq!(markdown_to_html("![x](data:image/svg+xml,foo)"), "<p>x</p>");
    }

    #[test]
    fn user_html_is_escaped() {
        assert_eq!(
            markdown_to_html("<script>alert(1)</script>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
        assert_eq!(markdown_to_html("# a & b"), "<h1>a &amp; b</h1>");
    }

    #[test]
    fn pipe_table() {
        let html = markdown_to_html("| H1 | H2 |\n|----|----|\n| a | b |");
        assert_eq!(
            html,
            "<table>\n<thead>\n<tr><th>H1</th><th>H2</th></tr>\n</thead>\n<tbody>\n\
             <tr><td>a</td><td>b</td></tr>\n</tbody>\n</table>"
        );
    }

    #[test]
    fn never_panics_on_malformed_input() {
        for input in [
            "*[![",
            "[]()",
            "![](",
            "| lonely pipe",
            "```",
            "- [",
            "**",
            "“curly” — unicode ✓",
        ] {
            let _ = markdown_to_html(input);
        }
    }

    #[test]
    fn blank_lines_separate_blocks() {
        assert_eq!(
            markdown_to_html("para one\n\npara two"),
            "<p>para one</p>\n<p>para two</p>"
        );
    }
}
