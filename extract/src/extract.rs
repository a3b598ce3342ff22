use crate::error::ExtractError;

/// Produces a fixed-length face embedding from raw image bytes.
///
/// Implementations wrap a face detection + embedding model and must be safe
/// for concurrent use (Send + Sync). All vectors returned by one
/// implementation have length [`FaceEmbedder::dimension`].
#[async_trait::async_trait]
pub trait FaceEmbedder: Send + Sync {
    /// Returns the embedding of the most prominent face in the image.
    ///
    /// Fails with [`ExtractError::NoFaceDetected`] when the image contains
    /// no usable face; callers propagate that as-is.
    async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, ExtractError>;

    /// Dimensionality of the produced vectors.
    fn dimension(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait::async_trait]
    impl FaceEmbedder for FixedEmbedder {
        async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, ExtractError> {
            if image.is_empty() {
                return Err(ExtractError::NoFaceDetected);
            }
            Ok(self.0.clone())
        }

        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    #[tokio::test]
    async fn trait_is_object_safe_and_usable() {
        let embedder: Box<dyn FaceEmbedder> = Box::new(FixedEmbedder(vec![0.5, 0.5]));
        assert_eq!(embedder.dimension(), 2);

        let v = embedder.extract(b"jpeg bytes").await.unwrap();
        assert_eq!(v.len(), 2);

        let err = embedder.extract(b"").await.unwrap_err();
        assert!(matches!(err, ExtractError::NoFaceDetected));
    }
}
