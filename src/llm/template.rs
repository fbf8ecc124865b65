use async_trait::async_trait;

use super::{DraftContext, GenerationError, TextGenerator};

/// Generator that sends the rendered strategy template as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDrafter;

#[async_trait]
impl TextGenerator for TemplateDrafter {
    async fn generate(&self, context: &DraftContext) -> Result<String, GenerationError> {
        let draft = context.template_draft.trim();
        if draft.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(draft.to_string())
    }

    fn backend_name(&self) -> &'static str {
        "template"
    }
}
