use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ClassifierBackend, ClassifierSettings};
use crate::core::features::{FeatureExtractor, TextClassifier};
use crate::error::ClassifierError;
use crate::models::FeatureKind;

/// Longest input, in tokens, the inference server should consider
const MAX_LENGTH: usize = 512;

#[derive(Debug, Deserialize)]
struct ModelInfo {
    labels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LogitsRequest<'a> {
    inputs: &'a [String],
    truncation: bool,
    max_length: usize,
}

#[derive(Debug, Deserialize)]
struct LogitsResponse {
    logits: Vec<Vec<f64>>,
}

/// Client for a sequence-classification model behind an inference server
///
/// Handles:
/// - Probing the model at startup (`GET /models/{model}`)
/// - Scoring batches of texts (`POST /models/{model}/logits`)
pub struct HttpClassifier {
    base_url: String,
    model: String,
    kind: FeatureKind,
    client: Client,
}

impl HttpClassifier {
    /// Connect to the inference server and verify the model is loaded
    ///
    /// Any failure here is a model load error: the premium tiers cannot run
    /// without it.
    pub async fn connect(
        base_url: impl Into<String>,
        model: impl Into<String>,
        kind: FeatureKind,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ClassifierError::ModelLoad(format!("Failed to create HTTP client: {}", e))
            })?;

        let classifier = Self {
            base_url: base_url.into(),
            model: model.into(),
            kind,
            client,
        };

        let url = classifier.model_url();
        tracing::debug!("Probing {} model at: {}", kind, url);

        let response = classifier
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                ClassifierError::ModelLoad(format!("{} unreachable: {}", classifier.model, e))
            })?;

        if !response.status().is_success() {
            return Err(ClassifierError::ModelLoad(format!(
                "{} not available: {}",
                classifier.model,
                response.status()
            )));
        }

        let info: ModelInfo = response.json().await.map_err(|e| {
            ClassifierError::ModelLoad(format!(
                "Invalid model info for {}: {}",
                classifier.model, e
            ))
        })?;

        if info.labels.len() != kind.dimension() {
            return Err(ClassifierError::ModelLoad(format!(
                "{} has {} labels, expected {} for {}",
                classifier.model,
                info.labels.len(),
                kind.dimension(),
                kind
            )));
        }

        tracing::info!("Loaded {} model {} ({:?})", kind, classifier.model, info.labels);

        Ok(classifier)
    }

    fn model_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.model)
        )
    }
}

#[async_trait]
impl TextClassifier for HttpClassifier {
    fn kind(&self) -> FeatureKind {
        self.kind
    }

    async fn raw_scores(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/logits", self.model_url());
        let response = self
            .client
            .post(&url)
            .json(&LogitsRequest {
                inputs: texts,
                truncation: true,
                max_length: MAX_LENGTH,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!(
                "Scoring {} texts with {} failed: {} - {}",
                texts.len(),
                self.model,
                status,
                body
            );
            return Err(ClassifierError::ApiError(format!(
                "Failed to score texts: {}",
                status
            )));
        }

        let body: LogitsResponse = response
            .json()
            .await
            .map_err(|e| {
                ClassifierError::InvalidResponse(format!("Failed to parse logits: {}", e))
            })?;

        Ok(body.logits)
    }
}

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "horrible", "worst", "sad", "angry", "disappointed",
    "poor", "boring", "delayed", "tired",
];
const NEUTRAL_WORDS: &[&str] = &[
    "okay", "fine", "average", "normal", "usual", "meeting", "schedule", "again",
];
const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "love", "amazing", "wonderful", "happy", "fantastic",
    "awesome", "best", "enjoyed", "fun", "beautiful",
];

const OPENNESS_WORDS: &[&str] = &[
    "art", "museum", "explore", "new", "curious", "culture", "music", "travel", "idea",
];
const CONSCIENTIOUSNESS_WORDS: &[&str] = &[
    "plan", "schedule", "work", "organized", "deadline", "prepared", "early", "goal",
];
const EXTRAVERSION_WORDS: &[&str] = &[
    "party", "friends", "meet", "club", "pub", "concert", "people", "fun", "match",
];
const AGREEABLENESS_WORDS: &[&str] = &[
    "thanks", "love", "kind", "help", "together", "family", "share", "team",
];
const NEUROTICISM_WORDS: &[&str] = &[
    "stress", "worried", "anxious", "hate", "annoyed", "late", "nervous", "afraid",
];

/// Offline classifier scoring texts by keyword hits per class
///
/// Raw scores are hit counts, so a text without hits gets a uniform
/// distribution after softmax.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    kind: FeatureKind,
    classes: Vec<AhoCorasick>,
}

impl LexiconClassifier {
    pub fn new(kind: FeatureKind) -> Result<Self, ClassifierError> {
        let lexicons: &[&[&str]] = match kind {
            FeatureKind::Sentiment => &[NEGATIVE_WORDS, NEUTRAL_WORDS, POSITIVE_WORDS],
            FeatureKind::Personality => &[
                OPENNESS_WORDS,
                CONSCIENTIOUSNESS_WORDS,
                EXTRAVERSION_WORDS,
                AGREEABLENESS_WORDS,
                NEUROTICISM_WORDS,
            ],
        };

        let classes = lexicons
            .iter()
            .map(|words| {
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(words.iter())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { kind, classes })
    }

    pub fn sentiment() -> Result<Self, ClassifierError> {
        Self::new(FeatureKind::Sentiment)
    }

    pub fn personality() -> Result<Self, ClassifierError> {
        Self::new(FeatureKind::Personality)
    }

    fn score(&self, text: &str) -> Vec<f64> {
        self.classes
            .iter()
            .map(|class| class.find_iter(text).count() as f64)
            .collect()
    }
}

#[async_trait]
impl TextClassifier for LexiconClassifier {
    fn kind(&self) -> FeatureKind {
        self.kind
    }

    async fn raw_scores(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError> {
        Ok(texts.iter().map(|text| self.score(text)).collect())
    }
}

/// Build the feature extractor for one feature kind from settings
///
/// Returns `None` when the classifier backend is disabled.
pub async fn build_extractor(
    settings: &ClassifierSettings,
    kind: FeatureKind,
) -> Result<Option<Arc<FeatureExtractor>>, ClassifierError> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let model = match kind {
        FeatureKind::Sentiment => &settings.sentiment_model,
        FeatureKind::Personality => &settings.personality_model,
    };

    let classifier: Arc<dyn TextClassifier> = match settings.backend {
        ClassifierBackend::Disabled => return Ok(None),
        ClassifierBackend::Lexicon => Arc::new(LexiconClassifier::new(kind)?),
        ClassifierBackend::Http => {
            Arc::new(HttpClassifier::connect(&settings.endpoint, model, kind, timeout).await?)
        }
    };

    Ok(Some(Arc::new(FeatureExtractor::new(
        classifier,
        settings.batch_size,
        timeout,
        settings.cache_size,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicon_sentiment_scores() {
        let classifier = LexiconClassifier::sentiment().unwrap();

        let scores = tokio_test::block_on(classifier.raw_scores(&[
            "Loved the hike, AMAZING views".to_string(),
            "Flight delayed again, awful".to_string(),
            "".to_string(),
        ]))
        .unwrap();

        assert_eq!(scores[0], vec![0.0, 0.0, 2.0]);
        assert_eq!(scores[1], vec![2.0, 1.0, 0.0]);
        assert_eq!(scores[2], vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_empty_text_is_uniform() {
        let extractor = FeatureExtractor::new(
            Arc::new(LexiconClassifier::personality().unwrap()),
            128,
            Duration::from_secs(1),
            10,
        );

        let vector = extractor.extract("   ").await.unwrap();
        assert_eq!(vector.kind, FeatureKind::Personality);
        assert!(vector.values.iter().all(|v| (v - 0.2).abs() < 1e-12));
    }

    #[tokio::test]
    async fn test_http_classifier_loads_and_scores() {
        let mut server = mockito::Server::new_async().await;
        let info = server
            .mock("GET", "/models/cardiffnlp%2Ftwitter-roberta-base-sentiment")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"labels": ["LABEL_0", "LABEL_1", "LABEL_2"]}"#)
            .create_async()
            .await;
        let logits = server
            .mock("POST", "/models/cardiffnlp%2Ftwitter-roberta-base-sentiment/logits")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"inputs": ["great hike", "awful queue"]}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"logits": [[-2.0, 0.1, 3.0], [4.0, 0.3, -1.9]]}"#)
            .create_async()
            .await;

        let classifier = HttpClassifier::connect(
            server.url(),
            "cardiffnlp/twitter-roberta-base-sentiment",
            FeatureKind::Sentiment,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let extractor =
            FeatureExtractor::new(Arc::new(classifier), 128, Duration::from_secs(5), 10);
        let vectors = extractor.extract_batch(&["great hike", "awful queue"]).await.unwrap();

        info.assert_async().await;
        logits.assert_async().await;
        assert!(vectors[0].get("positive").unwrap() > 0.9);
        assert!(vectors[1].get("negative").unwrap() > 0.9);
    }

    #[tokio::test]
    async fn test_http_classifier_label_mismatch_is_load_error() {
        let mut server = mockito::Server::new_async().await;
        let _info = server
            .mock("GET", "/models/personality")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"labels": ["a", "b", "c"]}"#)
            .create_async()
            .await;

        let result = HttpClassifier::connect(
            server.url(),
            "personality",
            FeatureKind::Personality,
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }

    #[tokio::test]
    async fn test_http_classifier_unavailable_is_load_error() {
        let mut server = mockito::Server::new_async().await;
        let _info = server
            .mock("GET", "/models/personality")
            .with_status(503)
            .create_async()
            .await;

        let result = HttpClassifier::connect(
            server.url(),
            "personality",
            FeatureKind::Personality,
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }

    #[tokio::test]
    async fn test_build_extractor_backends() {
        let lexicon = ClassifierSettings {
            backend: ClassifierBackend::Lexicon,
            batch_size: 4,
            ..ClassifierSettings::default()
        };
        let extractor = build_extractor(&lexicon, FeatureKind::Personality)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(extractor.kind(), FeatureKind::Personality);

        let disabled = ClassifierSettings {
            backend: ClassifierBackend::Disabled,
            ..ClassifierSettings::default()
        };
        assert!(build_extractor(&disabled, FeatureKind::Sentiment)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_build_extractor_unreachable_server() {
        let settings = ClassifierSettings {
            backend: ClassifierBackend::Http,
            endpoint: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            ..ClassifierSettings::default()
        };

        let result = build_extractor(&settings, FeatureKind::Sentiment).await;
        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }
}
