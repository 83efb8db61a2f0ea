//! Constraint records and the cutting-plane working set
//!
//! Each record encodes one linear inequality found by the argmax oracle.
//! The working set keeps a compact, replayable record list per training
//! example, discarding near-duplicates the retained records already imply.

/// One linear inequality `<w, feature_difference> >= bound - slack[owner]`
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintRecord {
    /// Feature difference `Psi(x, y_truth) - Psi(x, y_hat)`
    pub feature_difference: Vec<f64>,
    /// Loss-derived bound (the task loss of the violating label)
    pub bound: f64,
    /// Index of the training example this constraint belongs to
    pub owner: usize,
}

impl ConstraintRecord {
    /// Create a new constraint record
    pub fn new(feature_difference: Vec<f64>, bound: f64, owner: usize) -> Self {
        Self {
            feature_difference,
            bound,
            owner,
        }
    }
}

/// Similarity between two constraint rows: one minus the Euclidean
/// distance relative to the larger of the two norms
///
/// Magnitude matters: a scaled copy of a row is not near-identical,
/// since the scaled inequality is not implied by the original one. Two
/// zero rows are identical (1.0); a zero row scores 0.0 against any
/// non-zero row.
fn row_similarity(a: &[f64], b: &[f64]) -> f64 {
    let norm_a: f64 = a.iter().map(|&v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&v| v * v).sum::<f64>().sqrt();

    if norm_a == 0.0 && norm_b == 0.0 {
        return 1.0;
    }

    let distance: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt();
    1.0 - distance / norm_a.max(norm_b)
}

/// Ordered, deduplicated collection of constraint records
///
/// Insertion order is preserved so a solver can replay the constraints
/// reproducibly. Records of the same owner are deduplicated by relative
/// Euclidean distance: a near-identical row with a lower-or-equal bound
/// is dominated and discarded, while a near-identical row with a
/// strictly larger bound supersedes the old record in place.
#[derive(Debug)]
pub struct WorkingSet {
    records: Vec<ConstraintRecord>,
    /// Positions in `records` per owner index
    by_owner: Vec<Vec<usize>>,
    threshold: f64,
}

impl WorkingSet {
    /// Create a working set for `n_examples` owners with the given
    /// near-identical similarity threshold
    pub fn new(n_examples: usize, threshold: f64) -> Self {
        Self {
            records: Vec::new(),
            by_owner: vec![Vec::new(); n_examples],
            threshold,
        }
    }

    /// Insert a record, returning whether the set changed
    ///
    /// Idempotent under exact duplicates: inserting the same row and
    /// bound twice never grows the set.
    pub fn insert(&mut self, record: ConstraintRecord) -> bool {
        if record.owner >= self.by_owner.len() {
            self.by_owner.resize_with(record.owner + 1, Vec::new);
        }
        let slots = &self.by_owner[record.owner];

        for &pos in slots {
            let existing = &self.records[pos];
            let similarity = row_similarity(&existing.feature_difference, &record.feature_difference);
            if similarity >= self.threshold {
                if existing.bound >= record.bound {
                    // Dominated by what we already have
                    return false;
                }
                // Strictly larger bound supersedes the old record; the
                // slot is reused to keep replay order stable
                self.records[pos] = record;
                return true;
            }
        }

        let pos = self.records.len();
        self.by_owner[record.owner].push(pos);
        self.records.push(record);
        true
    }

    /// All records in stable insertion order
    pub fn all_records(&self) -> &[ConstraintRecord] {
        &self.records
    }

    /// Number of records held for one training example
    ///
    /// An owner the set has never seen holds zero records.
    pub fn count_for(&self, owner: usize) -> usize {
        self.by_owner.get(owner).map_or(0, Vec::len)
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the set holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: Vec<f64>, bound: f64, owner: usize) -> ConstraintRecord {
        ConstraintRecord::new(row, bound, owner)
    }

    #[test]
    fn test_insert_and_count() {
        let mut set = WorkingSet::new(2, 0.9999);
        assert!(set.insert(record(vec![1.0, 0.0], 1.0, 0)));
        assert!(set.insert(record(vec![0.0, 1.0], 1.0, 0)));
        assert!(set.insert(record(vec![1.0, 0.0], 1.0, 1)));

        assert_eq!(set.len(), 3);
        assert_eq!(set.count_for(0), 2);
        assert_eq!(set.count_for(1), 1);
    }

    #[test]
    fn test_exact_duplicate_is_idempotent() {
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![2.0, -2.0], 1.0, 0)));
        assert!(!set.insert(record(vec![2.0, -2.0], 1.0, 0)));
        assert_eq!(set.count_for(0), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_dominated_record_discarded() {
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![1.0, 1.0], 1.0, 0)));
        // Nearly the same row, smaller bound: dominated
        assert!(!set.insert(record(vec![1.00001, 1.0], 0.5, 0)));
        assert_eq!(set.count_for(0), 1);
        assert_eq!(set.all_records()[0].bound, 1.0);
    }

    #[test]
    fn test_scaled_row_is_not_near_identical() {
        // A colinear row of twice the magnitude asks for a different
        // inequality, so it must be kept even with a smaller bound
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![1.0, 1.0], 1.0, 0)));
        assert!(set.insert(record(vec![2.0, 2.0], 0.5, 0)));
        assert_eq!(set.count_for(0), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_larger_bound_supersedes_in_place() {
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![1.0, 0.0], 0.5, 0)));
        assert!(set.insert(record(vec![0.0, 1.0], 0.5, 0)));
        assert!(set.insert(record(vec![1.0, 0.0], 2.0, 0)));

        // Count unchanged, first slot rewritten, order stable
        assert_eq!(set.count_for(0), 2);
        assert_eq!(set.all_records()[0].bound, 2.0);
        assert_eq!(set.all_records()[1].feature_difference, vec![0.0, 1.0]);
    }

    #[test]
    fn test_dissimilar_rows_coexist() {
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![1.0, 0.0], 1.0, 0)));
        assert!(set.insert(record(vec![-1.0, 0.0], 1.0, 0)));
        assert_eq!(set.count_for(0), 2);
    }

    #[test]
    fn test_same_row_different_owner_both_kept() {
        let mut set = WorkingSet::new(2, 0.9999);
        assert!(set.insert(record(vec![1.0], 1.0, 0)));
        assert!(set.insert(record(vec![1.0], 1.0, 1)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_zero_rows() {
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![0.0, 0.0], 1.0, 0)));
        // Second zero row is near-identical and dominated
        assert!(!set.insert(record(vec![0.0, 0.0], 0.5, 0)));
        // Zero vs. non-zero is dissimilar
        assert!(set.insert(record(vec![1.0, 0.0], 0.5, 0)));
        assert_eq!(set.count_for(0), 2);
    }

    #[test]
    fn test_row_similarity() {
        assert_eq!(row_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        // Colinear but scaled: half the relative distance away
        assert_eq!(row_similarity(&[1.0, 0.0], &[2.0, 0.0]), 0.5);
        assert_eq!(row_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
        assert!(row_similarity(&[1.0, 0.0], &[0.0, 1.0]) < 0.0);
        assert_eq!(row_similarity(&[0.0], &[0.0]), 1.0);
        assert_eq!(row_similarity(&[0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_out_of_range_owner_is_accommodated() {
        let mut set = WorkingSet::new(1, 0.9999);
        assert!(set.insert(record(vec![1.0], 1.0, 5)));
        assert_eq!(set.count_for(5), 1);
        assert_eq!(set.count_for(99), 0);
        assert_eq!(set.len(), 1);
    }
}
