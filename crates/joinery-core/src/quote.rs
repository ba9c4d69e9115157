//! MySQL quoting helpers.

/// Quotes an identifier (table, column or key name) with backticks.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a string literal with single quotes, escaping backslashes and
/// quotes.
#[must_use]
pub fn quote_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn strings() {
        assert_eq!(quote_string("plain"), "'plain'");
        assert_eq!(quote_string("it's"), "'it\\'s'");
        assert_eq!(quote_string("C:\\temp"), "'C:\\\\temp'");
    }
}
