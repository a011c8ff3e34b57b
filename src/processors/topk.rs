//! Ranked-output selection for classification scores.

use std::collections::HashMap;

/// Result structure for top-k selection over one prediction.
///
/// Contains the top-k class indexes and their corresponding confidence
/// scores, ranked from most to least confident.
#[derive(Debug, Clone)]
pub struct TopkResult {
    /// Class indexes ranked by descending score.
    pub indexes: Vec<usize>,
    /// Scores corresponding to the indexes.
    pub scores: Vec<f32>,
    /// Label names for the indexes, if a class map is available.
    pub class_names: Option<Vec<String>>,
}

/// A processor for extracting top-k results from classification outputs.
///
/// Processes a model's score vector to extract the k most confident
/// predictions along with their class names (if available). Ties are broken
/// by first-encountered order: the sort is stable, so equal scores keep
/// their class-index order.
#[derive(Debug)]
pub struct Topk {
    /// Optional mapping from class IDs to class names.
    class_id_map: Option<HashMap<usize, String>>,
}

impl Topk {
    /// Creates a new Topk processor with optional class name mapping.
    pub fn new(class_id_map: Option<HashMap<usize, String>>) -> Self {
        Self { class_id_map }
    }

    /// Creates a new Topk processor without class name mapping.
    pub fn without_class_names() -> Self {
        Self::new(None)
    }

    /// Creates a new Topk processor with class names from a vector.
    ///
    /// The vector index corresponds to the class ID.
    pub fn from_class_names(class_names: Vec<String>) -> Self {
        let class_id_map: HashMap<usize, String> = class_names.into_iter().enumerate().collect();
        Self::new(Some(class_id_map))
    }

    /// Processes one score vector to extract its top-k entries.
    ///
    /// # Arguments
    ///
    /// * `prediction` - Confidence scores for all classes of one prediction.
    /// * `k` - Number of top predictions to extract (must be > 0).
    ///
    /// # Returns
    ///
    /// * `Ok(TopkResult)` - Top-k indexes, scores, and optional class names.
    ///   An empty prediction yields an empty result.
    /// * `Err(String)` - If k is 0.
    pub fn process_single(&self, prediction: &[f32], k: usize) -> Result<TopkResult, String> {
        if k == 0 {
            return Err("k must be greater than 0".to_string());
        }

        if prediction.is_empty() {
            return Ok(TopkResult {
                indexes: vec![],
                scores: vec![],
                class_names: self.class_id_map.as_ref().map(|_| vec![]),
            });
        }

        let effective_k = k.min(prediction.len());

        let mut indexed_scores: Vec<(usize, f32)> = prediction
            .iter()
            .enumerate()
            .map(|(idx, &score)| (idx, score))
            .collect();

        // Stable descending sort keeps first-encountered order for ties.
        indexed_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (indexes, scores): (Vec<usize>, Vec<f32>) =
            indexed_scores.into_iter().take(effective_k).unzip();

        let class_names = self
            .class_id_map
            .as_ref()
            .map(|_| self.map_indexes_to_names(&indexes));

        Ok(TopkResult {
            indexes,
            scores,
            class_names,
        })
    }

    /// Maps class indexes to class names using the internal mapping.
    ///
    /// Indexes missing from the map fall back to `class_<id>`.
    fn map_indexes_to_names(&self, indexes: &[usize]) -> Vec<String> {
        if let Some(ref class_map) = self.class_id_map {
            indexes
                .iter()
                .map(|&idx| {
                    class_map
                        .get(&idx)
                        .cloned()
                        .unwrap_or_else(|| format!("class_{}", idx))
                })
                .collect()
        } else {
            indexes.iter().map(|&idx| idx.to_string()).collect()
        }
    }

    /// Gets the class name for a given class ID.
    pub fn get_class_name(&self, class_id: usize) -> Option<&String> {
        self.class_id_map.as_ref()?.get(&class_id)
    }

    /// Gets the number of classes in the mapping.
    pub fn num_classes(&self) -> Option<usize> {
        self.class_id_map.as_ref().map(|map| map.len())
    }
}

impl Default for Topk {
    /// Creates a default Topk processor without class name mapping.
    fn default() -> Self {
        Self::without_class_names()
    }
}

/// Applies a numerically stable softmax to a score vector.
///
/// Classifier exports commonly emit raw logits; softmax turns them into a
/// probability distribution so confidences land in [0, 1]. An empty input
/// yields an empty output.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return vec![];
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topk_without_class_names() {
        let topk = Topk::without_class_names();
        let result = topk.process_single(&[0.1, 0.8, 0.1], 2).unwrap();
        assert_eq!(result.indexes, vec![1, 0]);
        assert!(result.class_names.is_none());
    }

    #[test]
    fn test_topk_with_class_names() {
        let topk = Topk::from_class_names(vec![
            "cat".to_string(),
            "dog".to_string(),
            "bird".to_string(),
        ]);
        let result = topk.process_single(&[0.1, 0.8, 0.1], 2).unwrap();
        assert_eq!(result.indexes, vec![1, 0]);
        assert_eq!(result.class_names.as_ref().unwrap(), &["dog", "cat"]);
    }

    #[test]
    fn test_topk_tie_keeps_first_encountered_order() {
        let topk = Topk::without_class_names();
        let result = topk.process_single(&[0.4, 0.4, 0.2], 2).unwrap();
        assert_eq!(result.indexes, vec![0, 1]);
    }

    #[test]
    fn test_topk_k_larger_than_classes() {
        let topk = Topk::without_class_names();
        let result = topk.process_single(&[0.1, 0.8], 5).unwrap();
        assert_eq!(result.indexes.len(), 2);
    }

    #[test]
    fn test_topk_invalid_k() {
        let topk = Topk::without_class_names();
        assert!(topk.process_single(&[0.1, 0.8, 0.1], 0).is_err());
    }

    #[test]
    fn test_topk_empty_prediction() {
        let topk = Topk::without_class_names();
        let result = topk.process_single(&[], 1).unwrap();
        assert!(result.indexes.is_empty());
        assert!(result.scores.is_empty());
    }

    #[test]
    fn test_missing_class_id_falls_back() {
        let topk = Topk::from_class_names(vec!["daffodil".to_string()]);
        let result = topk.process_single(&[0.2, 0.8], 1).unwrap();
        assert_eq!(result.class_names.as_ref().unwrap(), &["class_1"]);
    }

    #[test]
    fn test_topk_class_map_accessors() {
        let topk = Topk::from_class_names(vec!["cat".to_string(), "dog".to_string()]);
        assert_eq!(topk.num_classes(), Some(2));
        assert_eq!(topk.get_class_name(1), Some(&"dog".to_string()));
        assert!(Topk::default().num_classes().is_none());
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_empty_input() {
        assert!(softmax(&[]).is_empty());
    }
}
