use ammonia::Builder;

/// Strips every tag from user supplied text (captions, review notes,
/// feedback) and trims surrounding whitespace.
pub fn clean_text(input: &str) -> String {
    Builder::empty().clean(input).to_string().trim().to_string()
}

/// Like `clean_text`, but maps blank results to `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input.map(clean_text).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_and_scripts_are_removed() {
        assert_eq!(
            clean_text("<script>alert(1)</script>Hello <b>world</b>  "),
            "Hello world"
        );
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(Some("<i></i>")), None);
        assert_eq!(clean_optional(None), None);
        assert_eq!(clean_optional(Some(" Audio is muted ")), Some("Audio is muted".to_string()));
    }
}
