//! Partner-country detection in free-text notes.
//!
//! Some preferential duty rows carry no structured partner column and only
//! name the partner in their notes ("Preferential tariff for IN goods"). The
//! match is an approximation: the notes must contain the ISO2 code as a
//! standalone, uppercase token. Structured partner columns always win.

/// A validated ISO2 partner code used to scan notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerToken(String);

impl PartnerToken {
    /// Build a token from a partner code. Anything that is not exactly two
    /// ASCII letters (`IND`, `1N`, empty) yields `None`.
    pub fn new(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(code.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// The normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `text` contains the code as a whole word.
    ///
    /// Word characters are alphanumerics and `_`, so `IN-CEPA` matches `IN`
    /// but `china` and `INR` do not.
    pub fn matches(&self, text: &str) -> bool {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| word == self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_standalone_token() {
        let token = PartnerToken::new("IN").unwrap();
        assert!(token.matches("Preferential tariff for IN goods"));
        assert!(token.matches("IN"));
        assert!(token.matches("(IN) CEPA schedule"));
        assert!(token.matches("India-UAE IN-CEPA"));
    }

    #[test]
    fn test_no_substring_match() {
        let token = PartnerToken::new("IN").unwrap();
        assert!(!token.matches("china tariff schedule"));
        assert!(!token.matches("CHINA tariff schedule"));
        assert!(!token.matches("rate in INR"));
        assert!(!token.matches("IN_CEPA"));
    }

    #[test]
    fn test_lowercase_code_is_normalized() {
        let token = PartnerToken::new("in").unwrap();
        assert_eq!(token.as_str(), "IN");
        assert!(token.matches("for IN goods"));
    }

    #[test]
    fn test_malformed_codes_build_nothing() {
        assert!(PartnerToken::new("IND").is_none());
        assert!(PartnerToken::new("1N").is_none());
        assert!(PartnerToken::new("").is_none());
        assert!(PartnerToken::new("I").is_none());
        assert!(PartnerToken::new("I.").is_none());
    }
}
