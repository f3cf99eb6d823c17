//! Token grammar for provenance-tagged messages:
//! `((plain+file:line:function))`.

use super::caller::CallSite;

const PREFIX: &str = "((";
const SUFFIX: &str = "))";
const SEPARATOR: char = '+';

/// Outcome of [`decode`]: either the input untouched, or the plain text
/// with the location extracted from the last well-formed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Plain(String),
    Located {
        text: String,
        file: String,
        line: u32,
        function: String,
    },
}

impl Decoded {
    /// The message text regardless of whether a location was found.
    pub fn text(&self) -> &str {
        match self {
            Decoded::Plain(text) => text,
            Decoded::Located { text, .. } => text,
        }
    }
}

/// Encode `plain` with a call-site token, or return it unchanged when the
/// site is unresolved.
pub fn encode(plain: &str, site: Option<&CallSite>) -> String {
    match site {
        Some(site) => format!(
            "{PREFIX}{plain}{SEPARATOR}{}:{}:{}{SUFFIX}",
            site.file, site.line, site.function
        ),
        None => plain.to_string(),
    }
}

/// Extract the last provenance token from `text`.
///
/// Scans from the end so a literal `((` inside the plain text does not
/// shadow the real token. Any grammar mismatch returns the input unchanged;
/// this function never fails. Decoding already-plain text is a no-op, so
/// it is safe to apply twice.
pub fn decode(text: &str) -> Decoded {
    let plain = || Decoded::Plain(text.to_string());

    let Some(start) = text.rfind(PREFIX) else {
        return plain();
    };
    let Some(end) = text.rfind(SUFFIX) else {
        return plain();
    };
    if end < start + PREFIX.len() {
        return plain();
    }

    let interior = &text[start + PREFIX.len()..end];
    let Some(sep) = interior.rfind(SEPARATOR) else {
        return plain();
    };
    let inner = &interior[..sep];
    let location = &interior[sep + 1..];

    // Location must be exactly file:line:function with a numeric line.
    let fields: Vec<&str> = location.split(':').collect();
    if fields.len() != 3 {
        return plain();
    }
    let (file, line, function) = (fields[0], fields[1], fields[2]);
    if file.is_empty() || function.is_empty() {
        return plain();
    }
    let Ok(line) = line.parse::<u32>() else {
        return plain();
    };

    Decoded::Located {
        text: format!("{}{}{}", &text[..start], inner, &text[end + SUFFIX.len()..]),
        file: file.to_string(),
        line,
        function: function.to_string(),
    }
}
