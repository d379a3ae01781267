use std::borrow::Cow;

/// Escape HTML special characters: & < > " '
///
/// Returns the input unchanged (borrowed) when nothing needs escaping.
pub fn escape(input: &str) -> Cow<'_, str> {
    if !input.contains(|c| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_multiple() {
        assert_eq!(
            escape("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#39;xss&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escape_ampersand_and_quotes() {
        assert_eq!(escape("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
    }

    #[test]
    fn test_no_escape_needed_borrows() {
        assert!(matches!(escape("Hello, world!"), Cow::Borrowed("Hello, world!")));
    }
}
