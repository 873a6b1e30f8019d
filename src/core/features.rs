use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClassifierError;
use crate::models::{FeatureKind, FeatureVector};

/// A text classifier producing raw (unnormalised) class scores
///
/// Implementations are initialised once and shared read-only across requests.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Feature space this classifier scores into
    fn kind(&self) -> FeatureKind;

    /// Raw class scores for every text, in the order of `FeatureKind::labels`
    async fn raw_scores(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError>;
}

/// Numerically stable softmax
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Turns statements into sentiment or personality feature vectors
///
/// Texts are sent to the classifier in batches of `batch_size`, each batch
/// under `timeout`. Vectors are memoised per text.
pub struct FeatureExtractor {
    kind: FeatureKind,
    classifier: Arc<dyn TextClassifier>,
    batch_size: usize,
    timeout: Duration,
    cache: Cache<String, Vec<f64>>,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("kind", &self.kind)
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl FeatureExtractor {
    pub fn new(
        classifier: Arc<dyn TextClassifier>,
        batch_size: usize,
        timeout: Duration,
        cache_size: u64,
    ) -> Self {
        Self {
            kind: classifier.kind(),
            classifier,
            batch_size: batch_size.max(1),
            timeout,
            cache: Cache::new(cache_size),
        }
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Feature vector for a single statement
    pub async fn extract(&self, text: &str) -> Result<FeatureVector, ClassifierError> {
        let mut vectors = self.extract_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| ClassifierError::InvalidResponse("no scores returned".to_string()))
    }

    /// Feature vectors for many statements, in input order
    pub async fn extract_batch(
        &self,
        texts: &[&str],
    ) -> Result<Vec<FeatureVector>, ClassifierError> {
        let mut values: Vec<Option<Vec<f64>>> = Vec::with_capacity(texts.len());
        let mut misses: Vec<(usize, String)> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(*text).await {
                Some(cached) => values.push(Some(cached)),
                None => {
                    values.push(None);
                    misses.push((i, text.to_string()));
                }
            }
        }

        tracing::debug!(
            "Extracting {} features: {} cached, {} to score",
            self.kind,
            texts.len() - misses.len(),
            misses.len()
        );

        for chunk in misses.chunks(self.batch_size) {
            let batch: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
            let scores = tokio::time::timeout(self.timeout, self.classifier.raw_scores(&batch))
                .await
                .map_err(|_| ClassifierError::Timeout(self.timeout))??;

            if scores.len() != batch.len() {
                return Err(ClassifierError::InvalidResponse(format!(
                    "expected {} score rows, got {}",
                    batch.len(),
                    scores.len()
                )));
            }

            for ((index, text), row) in chunk.iter().zip(scores) {
                if row.len() != self.kind.dimension() {
                    return Err(ClassifierError::InvalidResponse(format!(
                        "expected {} {} scores, got {}",
                        self.kind.dimension(),
                        self.kind,
                        row.len()
                    )));
                }
                let probabilities = softmax(&row);
                self.cache.insert(text.clone(), probabilities.clone()).await;
                values[*index] = Some(probabilities);
            }
        }

        values
            .into_iter()
            .map(|v| {
                v.map(|values| FeatureVector {
                    kind: self.kind,
                    values,
                })
                .ok_or_else(|| {
                    ClassifierError::InvalidResponse("missing feature vector".to_string())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores text by length so different texts get different vectors
    struct LengthClassifier {
        calls: AtomicUsize,
        largest_batch: AtomicUsize,
    }

    #[async_trait]
    impl TextClassifier for LengthClassifier {
        fn kind(&self) -> FeatureKind {
            FeatureKind::Sentiment
        }

        async fn raw_scores(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.largest_batch.fetch_max(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| vec![0.0, 1.0, t.len() as f64 / 10.0])
                .collect())
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl TextClassifier for SlowClassifier {
        fn kind(&self) -> FeatureKind {
            FeatureKind::Personality
        }

        async fn raw_scores(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![vec![0.0; 5]; texts.len()])
        }
    }

    fn length_classifier() -> Arc<LengthClassifier> {
        Arc::new(LengthClassifier {
            calls: AtomicUsize::new(0),
            largest_batch: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);

        let uniform = softmax(&[0.0; 5]);
        assert!(uniform.iter().all(|p| (p - 0.2).abs() < 1e-12));

        let large = softmax(&[1000.0, 0.0, -1000.0]);
        assert!(large.iter().all(|p| p.is_finite()));
    }

    #[tokio::test]
    async fn test_batches_respect_batch_size() {
        let classifier = length_classifier();
        let extractor = FeatureExtractor::new(classifier.clone(), 2, Duration::from_secs(1), 100);

        let texts = ["a", "bb", "ccc", "dddd", "eeeee"];
        let vectors = extractor.extract_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
        assert_eq!(classifier.largest_batch.load(Ordering::SeqCst), 2);
        for vector in &vectors {
            assert_eq!(vector.kind, FeatureKind::Sentiment);
            assert!((vector.values.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(vector.values.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert!(vectors[4].get("positive").unwrap() > vectors[0].get("positive").unwrap());
    }

    #[tokio::test]
    async fn test_batch_size_does_not_change_output() {
        let texts = ["one", "three", "fifteen", ""];
        let small = FeatureExtractor::new(length_classifier(), 1, Duration::from_secs(1), 0);
        let large = FeatureExtractor::new(length_classifier(), 128, Duration::from_secs(1), 0);

        assert_eq!(
            small.extract_batch(&texts).await.unwrap(),
            large.extract_batch(&texts).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_cached_texts_are_not_rescored() {
        let classifier = length_classifier();
        let extractor = FeatureExtractor::new(classifier.clone(), 8, Duration::from_secs(1), 100);

        let first = extractor.extract("hiking trip").await.unwrap();
        let second = extractor.extract("hiking trip").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_error() {
        let extractor =
            FeatureExtractor::new(Arc::new(SlowClassifier), 8, Duration::from_millis(10), 0);

        let result = extractor.extract("slow").await;
        assert!(matches!(result, Err(ClassifierError::Timeout(_))));
    }
}
