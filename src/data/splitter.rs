// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and cuts them into
// three disjoint sets:
//   - Training set:   used to update model weights
//   - Validation set: picks the best checkpoint each epoch
//   - Test set:       scored once, after training finishes
//
// Seeding makes the split reproducible between runs, so a
// checkpoint's reported test loss always refers to the same rows.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// The three partitions produced by `split_three_way`.
#[derive(Debug)]
pub struct Splits<T> {
    pub train: Vec<T>,
    pub val:   Vec<T>,
    pub test:  Vec<T>,
}

/// Shuffle with `seed`, then split into (train, rest) at `train_fraction`.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let rest = samples.split_off(split_at);
    (samples, rest)
}

/// Train / validation / test split. Whatever is not train or
/// validation goes to test, so no sample is lost to rounding.
pub fn split_three_way<T>(samples: Vec<T>, train_fraction: f64, val_fraction: f64, seed: u64) -> Splits<T> {
    let total = samples.len();
    let (train, mut rest) = split_train_val(samples, train_fraction, seed);

    let val_len = ((total as f64) * val_fraction).round() as usize;
    let val_len = val_len.min(rest.len());
    let test    = rest.split_off(val_len);

    tracing::debug!(
        "Dataset split: {} train, {} validation, {} test",
        train.len(),
        rest.len(),
        test.len(),
    );

    Splits { train, val: rest, test }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.8, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_three_way_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let s = split_three_way(items, 0.7, 0.15, 42);
        assert_eq!(s.train.len(), 70);
        assert_eq!(s.val.len(),   15);
        assert_eq!(s.test.len(),  15);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..53).collect();
        let s = split_three_way(items, 0.7, 0.15, 7);

        let mut all: Vec<usize> = s.train.into_iter().chain(s.val).chain(s.test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..53).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_three_way((0..40).collect::<Vec<usize>>(), 0.7, 0.15, 42);
        let b = split_three_way((0..40).collect::<Vec<usize>>(), 0.7, 0.15, 42);
        assert_eq!(a.train, b.train);
        assert_eq!(a.val,   b.val);
        assert_eq!(a.test,  b.test);
    }

    #[test]
    fn test_empty_dataset() {
        let s = split_three_way(Vec::<usize>::new(), 0.7, 0.15, 42);
        assert!(s.train.is_empty());
        assert!(s.val.is_empty());
        assert!(s.test.is_empty());
    }
}
