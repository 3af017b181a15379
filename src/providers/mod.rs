pub mod gemini;
pub mod traits;

pub use gemini::GeminiProvider;
pub use traits::CompletionProvider;

#[cfg(test)]
pub(crate) mod testing {
    use super::CompletionProvider;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Answers every prompt with the same text, or fails when it has none.
    /// Prompts are recorded for assertions.
    #[derive(Clone, Default)]
    pub struct ScriptedProvider {
        answer: Option<String>,
        api_key: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                api_key: "key".to_string(),
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                api_key: "key".to_string(),
                ..Default::default()
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn boxed(&self) -> Box<dyn CompletionProvider + Send + Sync> {
            Box::new(self.clone())
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn new(api_key: String) -> Result<Self> {
            Ok(Self {
                api_key,
                ..Default::default()
            })
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer.clone().ok_or_else(|| anyhow!("offline"))
        }

        async fn get_model_info(&self) -> Result<String> {
            Ok("scripted".to_string())
        }

        fn get_api_key(&self) -> &String {
            &self.api_key
        }

        fn clone_box(&self) -> Box<dyn CompletionProvider + Send + Sync> {
            Box::new(self.clone())
        }
    }
}
