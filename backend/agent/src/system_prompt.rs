//! Grounding system prompt built from the extracted text.

/// Builds the system turn that grounds the conversation in the OCR output.
pub struct GroundingPrompt;

impl GroundingPrompt {
    pub fn build(grounding_text: &str) -> String {
        let extracted = if grounding_text.is_empty() {
            "No text was extracted from the image.".to_string()
        } else {
            format!("The text extracted from the image is:\n\"{grounding_text}\"")
        };

        format!(
            "You are a helpful assistant that answers questions about an image.\n\
             {extracted}\n\
             Answer the user's questions based on the image and the extracted text."
        )
    }
}
