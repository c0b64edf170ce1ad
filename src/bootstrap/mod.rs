//! Startup checks
//!
//! Verifies that the generation server is up, the configured model is pulled
//! and the bid index exists. `doctor` treats a failed check as fatal; chat
//! only warns, since retrieval still works without the generator.

use crate::context::RagContext;
use crate::errors::Result;
use crate::streaming::OllamaClient;
use crate::vector_store::VectorStore;

/// Ollama detector used by `doctor` and before chat
pub struct Bootstrap {
    client: OllamaClient,
}

/// Generation server check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Ready,
    OllamaNotRunning,
    ModelNotAvailable(String),
}

/// Index check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    Ready(u64),
    Missing,
    Unreachable(String),
}

/// True when an installed model name satisfies the configured tag
///
/// An untagged name matches its `:latest` variant.
pub fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted || (!wanted.contains(':') && installed == format!("{}:latest", wanted))
}

impl Bootstrap {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }

    pub fn model_tag(&self) -> &str {
        self.client.model()
    }

    /// Check if Ollama API is reachable
    pub async fn check_ollama_running(&self) -> bool {
        self.client.health_check().await
    }

    /// Installed model names
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.client.list_models().await
    }

    /// Run the generation server check
    pub async fn check(&self) -> Result<BootstrapStatus> {
        if !self.check_ollama_running().await {
            return Ok(BootstrapStatus::OllamaNotRunning);
        }

        let models = self.list_models().await?;
        if !models.iter().any(|m| model_matches(m, self.model_tag())) {
            return Ok(BootstrapStatus::ModelNotAvailable(self.model_tag().to_string()));
        }

        Ok(BootstrapStatus::Ready)
    }

    /// Display installation instructions for Ollama
    pub fn show_ollama_install_instructions() {
        eprintln!("\n❌ Ollama not found or not running!");
        eprintln!("\nOllama generates the answers for bidrag.");
        eprintln!("\n📦 Installation:");
        eprintln!("   Linux:   curl -fsSL https://ollama.com/install.sh | sh");
        eprintln!("   macOS:   brew install ollama");
        eprintln!("\n🚀 Start Ollama:");
        eprintln!("   ollama serve");
        eprintln!();
    }

    /// Display instructions for pulling a model
    pub fn show_model_pull_instructions(model_tag: &str) {
        eprintln!("\n❌ Model '{}' not found!", model_tag);
        eprintln!("\nTo download this model, run:");
        eprintln!("   ollama pull {}", model_tag);
        eprintln!("\nOr choose a different model with:");
        eprintln!("   bidrag --model <model> chat");
        eprintln!();
    }
}

/// Check that the bid collection exists
pub async fn check_index(context: &RagContext) -> IndexStatus {
    match context.store().count(context.collection()).await {
        Ok(Some(count)) => IndexStatus::Ready(count),
        Ok(None) => IndexStatus::Missing,
        Err(e) => IndexStatus::Unreachable(e.to_string()),
    }
}

/// Exit code for setup needed
pub const EXIT_CODE_SETUP_NEEDED: i32 = 2;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::vector_store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Unit;

    #[async_trait]
    impl Embedder for Unit {
        fn dimension(&self) -> usize {
            1
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[test]
    fn test_detector_creation() {
        let client = OllamaClient::with_config("http://localhost:11434/", "gemma3").unwrap();
        let detector = Bootstrap::new(client);
        assert_eq!(detector.model_tag(), "gemma3");
    }

    #[test]
    fn test_model_matching() {
        assert!(model_matches("gemma3", "gemma3"));
        assert!(model_matches("gemma3:latest", "gemma3"));
        assert!(!model_matches("gemma3:12b", "gemma3"));
        assert!(!model_matches("gemma3:latest", "gemma3:12b"));
        assert!(model_matches("gemma3:12b", "gemma3:12b"));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = OllamaClient::with_config("http://127.0.0.1:1", "gemma3").unwrap();
        let detector = Bootstrap::new(client);
        assert_eq!(detector.check().await.unwrap(), BootstrapStatus::OllamaNotRunning);
    }

    #[tokio::test]
    async fn test_check_index() {
        let store = Arc::new(InMemoryStore::new());
        let context = RagContext::new(Arc::new(Unit), store.clone());
        assert_eq!(check_index(&context).await, IndexStatus::Missing);

        store.create_collection(context.collection(), 1).await.unwrap();
        assert_eq!(check_index(&context).await, IndexStatus::Ready(0));
    }
}
