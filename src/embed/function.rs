use anyhow::{Context, Result};
use model2vec_rs::model::StaticModel;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Lazily-loaded Model2Vec embedding function.
///
/// Mirrors the teacher's `MemoryManager` lazy-load pattern: the model is not
/// pulled off disk until the first embed call, then cached for the process
/// lifetime. CPU-bound encode calls run on the blocking thread pool.
pub struct EmbeddingFunction {
    model_id: String,
    model: Arc<OnceCell<Arc<StaticModel>>>,
    dim: OnceCell<usize>,
}

impl EmbeddingFunction {
    pub fn new(model_id: String) -> Self {
        Self {
            model_id,
            model: Arc::new(OnceCell::new()),
            dim: OnceCell::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn get_model(&self) -> Result<Arc<StaticModel>> {
        let model_id = self.model_id.clone();
        let model = self
            .model
            .get_or_try_init(|| async move {
                tracing::info!("Loading Model2Vec model: {}", model_id);
                tokio::task::spawn_blocking(move || {
                    StaticModel::from_pretrained(&model_id, None, None, None)
                        .map(Arc::new)
                        .with_context(|| format!("Failed to load Model2Vec model from '{}'", model_id))
                })
                .await?
            })
            .await?;
        Ok(model.clone())
    }

    /// Embedding dimension of the loaded model. Forces the model to load if
    /// it hasn't already (dimension is only known after a probe encode).
    pub async fn dimension(&self) -> Result<usize> {
        if let Some(d) = self.dim.get() {
            return Ok(*d);
        }
        let vector = self.embed("dimension probe").await?;
        let d = vector.len();
        let _ = self.dim.set(d);
        Ok(d)
    }

    /// Embed a single string. Callers are expected to have already normalized
    /// the text (see `ingest::normalize`) and checked for cache hits.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.get_model().await?;
        let text_owned = text.to_string();
        let embedding = tokio::task::spawn_blocking(move || model.encode_single(&text_owned))
            .await
            .context("embedding task panicked")?;
        Ok(embedding)
    }

    /// Embed a batch of strings in one blocking call, avoiding per-item
    /// thread-pool round trips during bulk ingestion.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.get_model().await?;
        tokio::task::spawn_blocking(move || model.encode(&texts))
            .await
            .context("batch embedding task panicked")
    }
}
