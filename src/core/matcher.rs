use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{
    clustering::SimilarityClusterer,
    features::FeatureExtractor,
    filters::filter_basic,
    lexicon::InterestLexicon,
    overlap::filter_overlap,
};
use crate::error::MatchError;
use crate::models::{
    ClusteringParams, FeatureVector, QueryTraveller, Tier, TravellerRecord, SENTINEL_NAME,
};

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub tier: Tier,
    /// Matched travellers, unique by name, never the query traveller
    pub travellers: Vec<TravellerRecord>,
    pub total_candidates: usize,
    /// Set when a premium tier fell back to basic matches
    pub degraded: bool,
    pub warnings: Vec<String>,
}

/// Main matching orchestrator - composes the pipeline per subscription tier
///
/// # Pipeline Stages
/// 1. Overlap filter (same city, intersecting trip dates)
/// 2. Preference filter (mood, free time, networking)
/// 3. Premium tiers only: text features, clustering, overlap filter on the
///    travellers sharing the query traveller's cluster
/// 4. Union and de-duplication
#[derive(Debug, Clone)]
pub struct Matcher {
    lexicon: InterestLexicon,
    sentiment: Option<Arc<FeatureExtractor>>,
    personality: Option<Arc<FeatureExtractor>>,
    interest_clusterer: SimilarityClusterer,
    psychology_clusterer: SimilarityClusterer,
}

impl Matcher {
    pub fn new(
        interest: ClusteringParams,
        psychology: ClusteringParams,
    ) -> Result<Self, MatchError> {
        Ok(Self {
            lexicon: InterestLexicon::new()?,
            sentiment: None,
            personality: None,
            interest_clusterer: SimilarityClusterer::new(interest),
            psychology_clusterer: SimilarityClusterer::new(psychology),
        })
    }

    /// Matcher with five clusters per path, seeded 0 for interests and 42 for psychology
    pub fn with_default_params() -> Result<Self, MatchError> {
        Self::new(
            ClusteringParams::default(),
            ClusteringParams {
                seed: 42,
                ..ClusteringParams::default()
            },
        )
    }

    /// Enable the Interest tier
    pub fn with_sentiment(mut self, extractor: Arc<FeatureExtractor>) -> Self {
        self.sentiment = Some(extractor);
        self
    }

    /// Enable the Psychology tier
    pub fn with_personality(mut self, extractor: Arc<FeatureExtractor>) -> Self {
        self.personality = Some(extractor);
        self
    }

    pub fn supports(&self, tier: Tier) -> bool {
        match tier {
            Tier::Basic => true,
            Tier::Interest => self.sentiment.is_some(),
            Tier::Psychology => self.personality.is_some(),
        }
    }

    /// Basic tier: overlap filter followed by the preference filter
    pub fn basic_matches<'a>(
        &self,
        records: &'a [TravellerRecord],
        query: &QueryTraveller,
    ) -> Vec<&'a TravellerRecord> {
        let simultaneous = filter_overlap(records, query);
        tracing::debug!("{} travellers overlap with the query trip", simultaneous.len());

        let similar = filter_basic(simultaneous, query);
        tracing::debug!("{} travellers share declared preferences", similar.len());

        similar
    }

    /// Travellers sharing the query traveller's latent similarity group
    ///
    /// Clusters every record plus the sentinel, then keeps the sentinel's
    /// co-members that overlap with the query trip. The Interest tier only
    /// clusters statements mentioning an interest keyword; if the query
    /// statement mentions none the result is empty.
    pub async fn latent_matches<'a>(
        &self,
        records: &'a [TravellerRecord],
        query: &QueryTraveller,
        tier: Tier,
    ) -> Result<Vec<&'a TravellerRecord>, MatchError> {
        let (extractor, clusterer, prefilter) = match tier {
            Tier::Basic => return Ok(Vec::new()),
            Tier::Interest => (self.sentiment.as_ref(), &self.interest_clusterer, true),
            Tier::Psychology => (self.personality.as_ref(), &self.psychology_clusterer, false),
        };
        let extractor = extractor.ok_or(MatchError::ExtractorUnavailable(tier.as_str()))?;

        let sentinel = query.to_sentinel();
        if prefilter && !self.lexicon.mentions_interest(&sentinel.tweet) {
            tracing::debug!("Query statement mentions no interest, no latent matches");
            return Ok(Vec::new());
        }

        let batch: Vec<&TravellerRecord> = records
            .iter()
            .filter(|r| !r.is_sentinel())
            .chain(std::iter::once(&sentinel))
            .filter(|r| !prefilter || self.lexicon.mentions_interest(&r.tweet))
            .collect();

        if batch.len() == 1 {
            tracing::debug!("{} tier: no candidate statement to compare against", tier);
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = batch.iter().map(|r| r.tweet.as_str()).collect();
        let vectors = extractor.extract_batch(&texts).await?;

        let labelled: Vec<(String, FeatureVector)> = batch
            .iter()
            .map(|r| r.name.clone())
            .zip(vectors)
            .collect();

        let assignment = clusterer.cluster(&labelled)?;
        let members = assignment.co_members(SENTINEL_NAME);

        tracing::debug!(
            "{} tier: {} of {} travellers share the query traveller's cluster",
            tier,
            members.len(),
            labelled.len()
        );

        let latent = records
            .iter()
            .filter(|r| !r.is_sentinel() && members.contains(&r.name));

        Ok(filter_overlap(latent, query))
    }

    /// Find matches for the query traveller at the given tier
    ///
    /// Premium enrichment failures never drop the basic matches: the result
    /// is marked degraded and carries a warning instead.
    pub async fn find_matches(
        &self,
        records: &[TravellerRecord],
        query: &QueryTraveller,
        tier: Tier,
    ) -> MatchResult {
        let basic = self.basic_matches(records, query);

        let mut warnings = Vec::new();
        let latent = match self.latent_matches(records, query, tier).await {
            Ok(latent) => latent,
            Err(e) => {
                tracing::warn!("{} matching failed, falling back to basic matches: {}", tier, e);
                warnings.push(format!(
                    "{} matching unavailable, showing basic matches only: {}",
                    tier, e
                ));
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let travellers: Vec<TravellerRecord> = basic
            .into_iter()
            .chain(latent)
            .filter(|r| !r.is_sentinel() && seen.insert(r.name.as_str()))
            .cloned()
            .collect();

        MatchResult {
            tier,
            travellers,
            total_candidates: records.len(),
            degraded: !warnings.is_empty(),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::TextClassifier;
    use crate::error::ClassifierError;
    use crate::models::{FeatureKind, FreeTime, Mood};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Duration;

    /// Positive score when the text contains "love", negative for "hate"
    struct KeywordClassifier(FeatureKind);

    #[async_trait]
    impl TextClassifier for KeywordClassifier {
        fn kind(&self) -> FeatureKind {
            self.0
        }

        async fn raw_scores(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut row = vec![0.0; self.0.dimension()];
                    if t.contains("love") {
                        row[self.0.dimension() - 1] = 6.0;
                    }
                    if t.contains("hate") {
                        row[0] = 6.0;
                    }
                    row
                })
                .collect())
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl TextClassifier for FailingClassifier {
        fn kind(&self) -> FeatureKind {
            FeatureKind::Sentiment
        }

        async fn raw_scores(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            Err(ClassifierError::ApiError("503 Service Unavailable".to_string()))
        }
    }

    fn extractor(classifier: impl TextClassifier + 'static) -> Arc<FeatureExtractor> {
        Arc::new(FeatureExtractor::new(
            Arc::new(classifier),
            16,
            Duration::from_secs(5),
            100,
        ))
    }

    fn create_candidate(
        name: &str,
        company: &str,
        arrival: u32,
        return_day: u32,
        tweet: &str,
    ) -> TravellerRecord {
        TravellerRecord {
            name: name.to_string(),
            trip: format!("trip-{}", name),
            id: name.to_string(),
            arrival_date: NaiveDate::from_ymd_opt(2024, 6, arrival).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2024, 6, return_day).unwrap(),
            departure_city: "London".to_string(),
            arrival_city: "Paris".to_string(),
            company: company.to_string(),
            networking: true,
            mood: Mood::Adventure,
            free_time: FreeTime::Evenings,
            accommodation: Some("Novotel".to_string()),
            tweet: tweet.to_string(),
            music_genre: None,
            suggested_venue: None,
        }
    }

    fn create_query(statement: &str) -> QueryTraveller {
        QueryTraveller::new(
            "Paris",
            NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 18).unwrap(),
            "Acme",
            Mood::Adventure,
            true,
            FreeTime::Evenings,
            statement,
        )
        .unwrap()
    }

    fn two_cluster_matcher() -> Matcher {
        let params = ClusteringParams {
            clusters: 2,
            ..ClusteringParams::default()
        };
        Matcher::new(params, params).unwrap()
    }

    fn names(result: &MatchResult) -> Vec<&str> {
        result.travellers.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_basic_tier() {
        let matcher = Matcher::with_default_params().unwrap();
        let records = vec![
            create_candidate("X", "Globex", 10, 15, ""),
            create_candidate("Y", "Globex", 20, 25, ""),
            create_candidate("C", "Acme", 12, 14, ""),
        ];

        let result = matcher
            .find_matches(&records, &create_query(""), Tier::Basic)
            .await;

        assert_eq!(names(&result), vec!["X"]);
        assert!(!result.degraded);
        assert_eq!(result.total_candidates, 3);
    }

    #[tokio::test]
    async fn test_interest_tier_merges_latent_matches() {
        let matcher = two_cluster_matcher()
            .with_sentiment(extractor(KeywordClassifier(FeatureKind::Sentiment)));

        let records = vec![
            // Basic match and latent match at once
            create_candidate("A", "Globex", 10, 15, "love hiking"),
            // Colleague: only reachable through the latent group
            create_candidate("B", "Acme", 11, 13, "love the museum"),
            create_candidate("C", "Initech", 12, 16, "hate the cinema"),
            // Same cluster but not in Paris at the same time
            create_candidate("D", "Initech", 1, 3, "love travel"),
            // No interest keyword, never clustered
            create_candidate("E", "Acme", 12, 16, "love everything"),
        ];

        let result = matcher
            .find_matches(&records, &create_query("I love football"), Tier::Interest)
            .await;

        assert!(!result.degraded);
        assert_eq!(names(&result), vec!["A", "C", "B"]);
    }

    #[tokio::test]
    async fn test_interest_tier_without_keyword_is_basic_only() {
        let matcher = two_cluster_matcher()
            .with_sentiment(extractor(KeywordClassifier(FeatureKind::Sentiment)));
        let records = vec![
            create_candidate("A", "Acme", 10, 15, "love hiking"),
            create_candidate("B", "Globex", 10, 15, "love hiking"),
        ];

        let query = create_query("meetings all week");
        let latent = matcher
            .latent_matches(&records, &query, Tier::Interest)
            .await
            .unwrap();
        assert!(latent.is_empty());

        let result = matcher.find_matches(&records, &query, Tier::Interest).await;
        assert_eq!(names(&result), vec!["B"]);
    }

    #[tokio::test]
    async fn test_interest_tier_with_no_keyword_candidates() {
        let records = vec![create_candidate("E", "Acme", 12, 16, "love everything")];
        let query = create_query("I love football");

        let matcher = two_cluster_matcher()
            .with_sentiment(extractor(KeywordClassifier(FeatureKind::Sentiment)));
        let latent = matcher
            .latent_matches(&records, &query, Tier::Interest)
            .await
            .unwrap();
        assert!(latent.is_empty());

        // The query statement alone is never sent for scoring
        let matcher = two_cluster_matcher().with_sentiment(extractor(FailingClassifier));
        let result = matcher.find_matches(&records, &query, Tier::Interest).await;
        assert!(!result.degraded);
        assert!(result.warnings.is_empty());
        assert!(result.travellers.is_empty());
    }

    #[tokio::test]
    async fn test_psychology_tier_scores_all_texts() {
        let matcher = two_cluster_matcher()
            .with_personality(extractor(KeywordClassifier(FeatureKind::Personality)));
        let records = vec![
            create_candidate("B", "Acme", 11, 13, "love it"),
            create_candidate("C", "Acme", 12, 16, "hate it"),
        ];

        let latent = matcher
            .latent_matches(&records, &create_query("love work"), Tier::Psychology)
            .await
            .unwrap();

        let latent: Vec<&str> = latent.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(latent, vec!["B"]);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_basic() {
        let matcher = two_cluster_matcher().with_sentiment(extractor(FailingClassifier));
        let records = vec![create_candidate("X", "Globex", 10, 15, "love hiking")];

        let result = matcher
            .find_matches(&records, &create_query("love hiking"), Tier::Interest)
            .await;

        assert!(result.degraded);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(names(&result), vec!["X"]);
    }

    #[tokio::test]
    async fn test_missing_extractor_degrades() {
        let matcher = Matcher::with_default_params().unwrap();
        assert!(!matcher.supports(Tier::Psychology));

        let result = matcher
            .find_matches(&[], &create_query("love hiking"), Tier::Psychology)
            .await;
        assert!(result.degraded);
        assert!(result.travellers.is_empty());
    }

    #[tokio::test]
    async fn test_sentinel_named_record_never_returned() {
        let matcher = two_cluster_matcher()
            .with_personality(extractor(KeywordClassifier(FeatureKind::Personality)));
        let records = vec![
            create_candidate(SENTINEL_NAME, "Globex", 10, 15, "love it"),
            create_candidate("B", "Globex", 10, 15, "love it"),
        ];

        let result = matcher
            .find_matches(&records, &create_query("love it"), Tier::Psychology)
            .await;
        assert_eq!(names(&result), vec!["B"]);
    }
}
