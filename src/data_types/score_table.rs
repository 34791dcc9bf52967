use std::ops::AddAssign;

/// Confusion-matrix counts for one taxonomic rank over a batch of
/// (true, predicted) pairs, plus the derived metrics.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScoreTable {
    /// Truth resolved to this rank but the prediction did not
    pub false_negatives: u64,
    /// Truth and prediction resolved to the same taxon at this rank
    pub true_positives: u64,
    /// Truth and prediction resolved to different taxa at this rank
    pub false_positives: u64,
    /// Truth did not resolve to this rank
    pub true_negatives: u64
}

impl AddAssign for ScoreTable {
    // Enables += when merging per-pair or per-batch tables
    fn add_assign(&mut self, rhs: Self) {
        self.false_negatives += rhs.false_negatives;
        self.true_positives += rhs.true_positives;
        self.false_positives += rhs.false_positives;
        self.true_negatives += rhs.true_negatives;
    }
}

impl ScoreTable {
    /// Constructor
    pub fn new(false_negatives: u64, true_positives: u64, false_positives: u64, true_negatives: u64) -> Self {
        Self {
            false_negatives, true_positives, false_positives, true_negatives
        }
    }

    /// Precision = TP / (TP + FP); None when no positive calls were made
    pub fn precision(&self) -> Option<f64> {
        let denom = self.true_positives + self.false_positives;
        if denom > 0 {
            Some(self.true_positives as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Recall = TP / (TP + FP + FN); None when the denominator is empty.
    /// The FP term in the denominator is deliberate, matching the reference
    /// evaluation rather than the textbook TP / (TP + FN).
    pub fn recall(&self) -> Option<f64> {
        let denom = self.true_positives + self.false_positives + self.false_negatives;
        if denom > 0 {
            Some(self.true_positives as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Harmonic mean of precision and recall, when both are defined
    pub fn f1(&self) -> Option<f64> {
        if let (Some(precision), Some(recall)) = (self.precision(), self.recall()) {
            Some(2.0 * precision * recall / (precision + recall))
        } else {
            None
        }
    }
}
