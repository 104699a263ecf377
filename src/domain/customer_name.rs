use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerName(String);

impl CustomerName {
    /// Trims the input; rejects blank, overlong or markup-looking names.
    pub fn parse(s: String) -> Result<CustomerName, String> {
        let s = s.trim().to_string();
        let is_empty = s.is_empty();
        let is_too_long = s.graphemes(true).count() > 256;
        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters = s.chars().any(|g| forbidden_characters.contains(&g));

        if is_empty {
            Err("Name is required".to_string())
        } else if is_too_long || contains_forbidden_characters {
            Err(format!("{} is not a valid name.", s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for CustomerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
