//! Prompt construction for the image API.

use crate::constants::DEFAULT_PROMPT_TEMPLATE;
use crate::error::MandalaError;

const AGE_PLACEHOLDER: &str = "{age}";
const MOOD_PLACEHOLDER: &str = "{mood}";

/// A fixed natural-language template describing the mandala to generate.
///
/// The template must contain both `{age}` and `{mood}`; deployments can
/// swap the wording without a code change via `--prompt-template`.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Validates and wraps a template string.
    pub fn new(template: impl Into<String>) -> Result<Self, MandalaError> {
        let template = template.into();
        for placeholder in [AGE_PLACEHOLDER, MOOD_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(MandalaError::Validation(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Renders the prompt for one generation request.
    ///
    /// Pure substitution; callers are responsible for having validated
    /// age and mood beforehand.
    pub fn build(&self, age: u8, mood: &str) -> String {
        self.template
            .replace(AGE_PLACEHOLDER, &age.to_string())
            .replace(MOOD_PLACEHOLDER, mood)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        // The bundled template is known to carry both placeholders.
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_interpolates_age_and_mood() {
        let prompt = PromptTemplate::default().build(34, "peaceful");
        assert!(prompt.contains("34"));
        assert!(prompt.contains("peaceful"));
        assert_eq!(
            prompt,
            "Black and white line art mandala symbolizing peaceful emotion for a 34-year-old person. Highly detailed, symmetrical, spiritual tone."
        );
    }

    #[test]
    fn build_is_deterministic() {
        let template = PromptTemplate::default();
        assert_eq!(template.build(7, "curious"), template.build(7, "curious"));
    }

    #[test]
    fn custom_template_is_accepted() {
        let template = PromptTemplate::new("Mandala in warm colours for {mood}, age {age}.")
            .expect("valid template");
        assert_eq!(
            template.build(60, "nostalgic"),
            "Mandala in warm colours for nostalgic, age 60."
        );
    }

    #[test]
    fn template_without_mood_is_rejected() {
        let err = PromptTemplate::new("Mandala for a {age}-year-old.").unwrap_err();
        assert!(matches!(err, MandalaError::Validation(_)));
    }

    #[test]
    fn template_without_age_is_rejected() {
        let err = PromptTemplate::new("Mandala about {mood}.").unwrap_err();
        assert!(matches!(err, MandalaError::Validation(_)));
    }
}
