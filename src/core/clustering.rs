use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::error::MatchError;
use crate::models::{ClusteringParams, FeatureVector};

/// Stack equally sized vectors into an observation matrix, one row each
fn to_matrix(vectors: &[Vec<f64>]) -> Result<Array2<f64>, MatchError> {
    let dims = vectors.first().map_or(0, Vec::len);
    if vectors.iter().any(|v| v.len() != dims) {
        return Err(MatchError::Clustering(
            "feature vectors have mismatched dimensions".to_string(),
        ));
    }

    let flat: Vec<f64> = vectors.iter().flatten().copied().collect();
    Array2::from_shape_vec((vectors.len(), dims), flat)
        .map_err(|e| MatchError::Clustering(e.to_string()))
}

/// Column-wise z-score using population standard deviation
fn standardize_matrix(data: &Array2<f64>) -> Array2<f64> {
    let Some(mean) = data.mean_axis(Axis(0)) else {
        return data.clone();
    };
    let scale = data
        .std_axis(Axis(0), 0.0)
        .mapv(|std| if std > f64::EPSILON { std } else { 1.0 });

    (data - &mean) / &scale
}

/// Standardize every dimension to zero mean and unit variance
///
/// Statistics come from this batch only. A constant dimension is centred but
/// not scaled.
pub fn standardize(vectors: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, MatchError> {
    if vectors.is_empty() {
        return Ok(Vec::new());
    }

    let data = to_matrix(vectors)?;
    Ok(standardize_matrix(&data)
        .outer_iter()
        .map(|row| row.to_vec())
        .collect())
}

/// Number of distinct rows; k-means++ cannot seed more centroids than this
fn distinct_rows(points: &[Vec<f64>]) -> usize {
    points
        .iter()
        .map(|p| p.iter().map(|v| (v + 0.0).to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}

/// Outcome of one k-means fit
#[derive(Debug, Clone, Default)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Mean squared distance of each point to its centroid
    pub inertia: f64,
}

/// Partition points into `params.clusters` groups with k-means
///
/// Runs `n_init` seeded k-means++ initialisations and keeps the fit with the
/// lowest inertia. `k` is clamped to the number of distinct points.
pub fn kmeans(points: &[Vec<f64>], params: &ClusteringParams) -> Result<KMeansFit, MatchError> {
    if params.clusters == 0 {
        return Err(MatchError::Clustering(
            "cluster count must be at least 1".to_string(),
        ));
    }
    if points.is_empty() {
        return Ok(KMeansFit::default());
    }

    let k = params.clusters.min(distinct_rows(points));
    let dataset = DatasetBase::from(to_matrix(points)?);

    let model = KMeans::params_with_rng(k, StdRng::seed_from_u64(params.seed))
        .n_runs(params.n_init.max(1))
        .max_n_iterations(params.max_iterations.max(1) as u64)
        .tolerance(params.tolerance)
        .fit(&dataset)
        .map_err(|e| MatchError::Clustering(e.to_string()))?;

    let centroids = model
        .centroids()
        .outer_iter()
        .map(|c| c.to_vec())
        .collect();
    let inertia = model.inertia();

    let DatasetBase { targets, .. } = model.predict(dataset);

    Ok(KMeansFit {
        labels: targets.to_vec(),
        centroids,
        inertia,
    })
}

/// Cluster labels of one clustering run, in batch order
#[derive(Debug, Clone, Default)]
pub struct ClusterAssignment {
    labels: Vec<(String, usize)>,
    pub inertia: f64,
}

impl ClusterAssignment {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_of(&self, id: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(member, _)| member == id)
            .map(|(_, label)| *label)
    }

    /// Everyone sharing a cluster with `id`, excluding `id` itself
    ///
    /// Empty when `id` was not part of the batch.
    pub fn co_members(&self, id: &str) -> HashSet<String> {
        let Some(label) = self.label_of(id) else {
            return HashSet::new();
        };

        self.labels
            .iter()
            .filter(|(member, l)| *l == label && member != id)
            .map(|(member, _)| member.clone())
            .collect()
    }
}

/// Groups travellers by latent text-derived similarity
#[derive(Debug, Clone, Copy)]
pub struct SimilarityClusterer {
    params: ClusteringParams,
}

impl SimilarityClusterer {
    pub fn new(params: ClusteringParams) -> Self {
        Self { params }
    }

    /// Standardize the batch and assign every identity a cluster label
    ///
    /// An empty batch yields an empty assignment.
    pub fn cluster(
        &self,
        batch: &[(String, FeatureVector)],
    ) -> Result<ClusterAssignment, MatchError> {
        if batch.is_empty() {
            tracing::debug!("Nothing to cluster, returning empty assignment");
            return Ok(ClusterAssignment::default());
        }

        let raw: Vec<Vec<f64>> = batch.iter().map(|(_, v)| v.values.clone()).collect();
        let standardized = standardize(&raw)?;
        let fit = kmeans(&standardized, &self.params)?;

        tracing::debug!(
            "Clustered {} travellers into {} groups (inertia: {:.4})",
            batch.len(),
            fit.centroids.len(),
            fit.inertia
        );

        Ok(ClusterAssignment {
            labels: batch
                .iter()
                .zip(fit.labels)
                .map(|((id, _), label)| (id.clone(), label))
                .collect(),
            inertia: fit.inertia,
        })
    }
}
