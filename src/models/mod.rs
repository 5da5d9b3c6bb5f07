// Data models for the UniBro API

pub mod chat;
pub mod request;
pub mod user;

use serde::Deserialize;

/// Response of POST /sop-review
#[derive(Debug, Deserialize)]
pub struct SopReview {
    #[serde(default)]
    pub review: Option<ReviewData>,
}

/// Reviewer feedback on a statement of purpose.
///
/// When the upload is not recognised as an SOP only `message` is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReviewData {
    #[serde(default)]
    pub grammar_and_style: Option<String>,
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default)]
    pub clarity_and_coherence: Option<String>,
    #[serde(default)]
    pub research_interests_strength: Option<String>,
    #[serde(default)]
    pub overall_rating: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ReviewData {
    /// Titled feedback sections that are present, in display order
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Grammar and Style", &self.grammar_and_style),
            ("Structure", &self.structure),
            ("Clarity and Coherence", &self.clarity_and_coherence),
            ("Research Interests", &self.research_interests_strength),
            ("Overall Rating", &self.overall_rating),
        ]
        .into_iter()
        .filter_map(|(title, text)| text.as_deref().map(|t| (title, t)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_object_decodes() {
        let resp: SopReview = serde_json::from_str(
            r#"{"review":{"grammar_and_style":"Clean","structure":"Loose","overall_rating":"8/10"}}"#,
        )
        .unwrap();
        let review = resp.review.unwrap();
        assert_eq!(review.message, None);
        assert_eq!(
            review.sections(),
            vec![
                ("Grammar and Style", "Clean"),
                ("Structure", "Loose"),
                ("Overall Rating", "8/10"),
            ]
        );
    }

    #[test]
    fn test_invalid_sop_message_decodes() {
        let resp: SopReview =
            serde_json::from_str(r#"{"review":{"message":"This does not look like an SOP."}}"#)
                .unwrap();
        let review = resp.review.unwrap();
        assert_eq!(review.message.as_deref(), Some("This does not look like an SOP."));
        assert!(review.sections().is_empty());
    }
}
