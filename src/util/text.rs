/// Reduces raw page markup to plain text suitable as summarization input.
///
/// Drops `<script>` and `<style>` blocks entirely (their text content is
/// never prose), strips all remaining tags, decodes non-breaking spaces, and
/// collapses whitespace runs to single spaces.
///
/// This is a single-pass scanner, not an HTML parser. Malformed markup
/// degrades to "strip everything between angle brackets", which is acceptable
/// for text destined to be compressed by a language model anyway.
///
/// # Examples
///
/// ```
/// use blockwise::util::tidy_html;
///
/// let html = "<p>Hello&nbsp;<b>world</b></p><script>var x = 1;</script>";
/// assert_eq!(tidy_html(html), "Hello world");
/// ```
pub fn tidy_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tag_start = &rest[lt..];

        // Elements whose body must be dropped, not just their tags.
        if let Some(after) = skip_container(tag_start, "script") {
            rest = after;
            out.push(' ');
            continue;
        }
        if let Some(after) = skip_container(tag_start, "style") {
            rest = after;
            out.push(' ');
            continue;
        }

        match tag_start.find('>') {
            Some(gt) => {
                out.push(' ');
                rest = &tag_start[gt + 1..];
            }
            None => {
                // Unterminated tag: drop the trailing fragment.
                rest = "";
            }
        }
    }
    out.push_str(rest);

    collapse_whitespace(&decode_nbsp(&out))
}

/// If `s` starts with `<name ...>`, returns the remainder after the matching
/// `</name>` close tag (or the empty string when the element is unclosed).
fn skip_container<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let lower = s.get(1..1 + name.len())?;
    if !lower.eq_ignore_ascii_case(name) {
        return None;
    }
    // Next char must end the tag name ('>' or whitespace or attributes).
    match s.as_bytes().get(1 + name.len()) {
        Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') => {}
        _ => return None,
    }

    let close = format!("</{name}");
    let hay = s.to_ascii_lowercase();
    match hay.find(&close) {
        Some(pos) => {
            let tail = &s[pos..];
            match tail.find('>') {
                Some(gt) => Some(&tail[gt + 1..]),
                None => Some(""),
            }
        }
        None => Some(""),
    }
}

fn decode_nbsp(s: &str) -> String {
    // Only the entity the summarization input actually trips over; full
    // entity decoding is not needed for model input.
    let mut out = s.replace("&nbsp;", " ");
    if out.contains("&NBSP;") {
        out = out.replace("&NBSP;", " ");
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_gap = true; // leading whitespace is dropped
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        } else {
            out.push(c);
            in_gap = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Truncates a string to at most `max` characters, on a char boundary.
///
/// Byte-slicing a UTF-8 string at an arbitrary length panics; provider
/// payloads are user-visible prose in any language, so truncation counts
/// chars.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tidy_strips_tags() {
        assert_eq!(tidy_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_tidy_drops_script_body() {
        let html = "before<script type=\"text/javascript\">alert('x');</script>after";
        assert_eq!(tidy_html(html), "before after");
    }

    #[test]
    fn test_tidy_drops_style_body() {
        let html = "a<style>.cls { color: red; }</style>b";
        assert_eq!(tidy_html(html), "a b");
    }

    #[test]
    fn test_tidy_unclosed_script_drops_tail() {
        let html = "keep<script>var x = '<p>not prose</p>'";
        assert_eq!(tidy_html(html), "keep");
    }

    #[test]
    fn test_tidy_decodes_nbsp_and_collapses_whitespace() {
        let html = "one&nbsp;&nbsp;two\n\n  three";
        assert_eq!(tidy_html(html), "one two three");
    }

    #[test]
    fn test_tidy_plain_text_passthrough() {
        assert_eq!(tidy_html("no markup here"), "no markup here");
    }

    #[test]
    fn test_tidy_case_insensitive_containers() {
        let html = "x<SCRIPT>bad()</SCRIPT>y";
        assert_eq!(tidy_html(html), "x y");
    }

    #[test]
    fn test_tidy_unterminated_tag() {
        assert_eq!(tidy_html("text <unclosed"), "text");
    }

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_chars_exact() {
        assert_eq!(truncate_chars("abcd", 4), "abcd");
        assert_eq!(truncate_chars("abcd", 3), "abc");
    }

    #[test]
    fn test_truncate_chars_multibyte_boundary() {
        // Each char is multi-byte; a byte slice at 4 would panic.
        assert_eq!(truncate_chars("日本語です", 2), "日本");
    }

    #[test]
    fn test_truncate_chars_zero() {
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
