//! Query text sanitization for logging

/// Placeholder written in place of every quoted literal
pub const REDACTED: &str = "[REDACTED]";

/// Longest sanitized query kept, in characters
pub const MAX_QUERY_CHARS: usize = 200;

/// Make a query safe and compact enough to log.
///
/// Quoted literals (single or double quotes, with doubled-quote and
/// backslash escapes) become `'[REDACTED]'` / `"[REDACTED]"`, runs of
/// whitespace collapse to one space, and anything beyond
/// [`MAX_QUERY_CHARS`] characters is cut and marked with `...`.
///
/// ```
/// use structured_logger::platform::sanitize_query;
///
/// let query = "SELECT *\n  FROM users\n  WHERE email = 'alice@example.com'";
/// assert_eq!(
///     sanitize_query(query),
///     "SELECT * FROM users WHERE email = '[REDACTED]'"
/// );
/// ```
pub fn sanitize_query(query: &str) -> String {
    let redacted = redact_literals(query);
    let collapsed = redacted.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() > MAX_QUERY_CHARS {
        let mut truncated: String = collapsed.chars().take(MAX_QUERY_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        collapsed
    }
}

fn redact_literals(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            out.push(c);
            continue;
        }

        let quote = c;
        while let Some(inner) = chars.next() {
            if inner == '\\' {
                chars.next();
            } else if inner == quote {
                // A doubled quote is an escaped quote inside the literal
                if chars.peek() == Some(&quote) {
                    chars.next();
                } else {
                    break;
                }
            }
        }

        out.push(quote);
        out.push_str(REDACTED);
        out.push(quote);
    }

    out
}
