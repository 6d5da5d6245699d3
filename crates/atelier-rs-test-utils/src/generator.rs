use async_trait::async_trait;
use atelier_rs_generation::{GeneratedImage, GenerationError, GenerationOptions, ImageGenerator};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Generator that returns the same image for every prompt.
#[derive(Debug, Clone)]
pub struct FixedGenerator {
    image_data: String,
}

impl FixedGenerator {
    pub fn new(image_data: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
        }
    }
}

#[async_trait]
impl ImageGenerator for FixedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GeneratedImage, GenerationError> {
        Ok(GeneratedImage {
            image_data: self.image_data.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    delay: Duration,
    error: Option<GenerationError>,
}

/// Generator whose latency and result are scripted per prompt substring.
///
/// The first rule whose needle occurs in the prompt applies; prompts with no
/// matching rule succeed immediately. Successful images are `data:<prompt>`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    rules: Vec<Rule>,
    seen: Arc<Mutex<Vec<String>>>,
    completed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay prompts containing `needle` before succeeding.
    pub fn delay(mut self, needle: impl Into<String>, delay: Duration) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            delay,
            error: None,
        });
        self
    }

    /// Fail prompts containing `needle` with `error`.
    pub fn fail(mut self, needle: impl Into<String>, error: GenerationError) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            delay: Duration::ZERO,
            error: Some(error),
        });
        self
    }

    /// Prompts received, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    /// Prompts whose request ran to completion, including timed out ones.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GeneratedImage, GenerationError> {
        self.seen.lock().push(prompt.to_string());
        let rule = self
            .rules
            .iter()
            .find(|rule| prompt.contains(&rule.needle))
            .cloned();
        if let Some(rule) = &rule
            && !rule.delay.is_zero()
        {
            tokio::time::sleep(rule.delay).await;
        }
        self.completed.lock().push(prompt.to_string());
        match rule.and_then(|rule| rule.error) {
            Some(err) => Err(err),
            None => Ok(GeneratedImage {
                image_data: format!("data:{prompt}"),
            }),
        }
    }
}
