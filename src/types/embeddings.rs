use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Request body for an embeddings call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingsOptions {
    /// Texts to embed.
    pub input: Vec<String>,
}

impl EmbeddingsOptions {
    /// Embed a single text.
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            input: vec![text.into()],
        }
    }
}

/// One embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingItem {
    /// Position of the matching input.
    #[serde(default)]
    pub index: u32,

    /// The vector.
    pub embedding: Vec<f32>,
}

/// Response body of an embeddings call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embeddings {
    /// One item per input.
    #[serde(default)]
    pub data: Vec<EmbeddingItem>,
}

impl Embeddings {
    /// Take the vector for the first input.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the response carried no vectors.
    pub fn into_first(self) -> Result<Vec<f32>> {
        self.data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| Error::protocol("embeddings response contained no data"))
    }
}
