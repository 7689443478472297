//! Rank labels for sorted scores.

/// Label descending-sorted scores with `"rank/total"`.
///
/// Equal scores share a rank, and the next distinct score takes its
/// 1-based position, so `[0.9, 0.7, 0.7, 0.5]` becomes
/// `["1/4", "2/4", "2/4", "4/4"]`.
pub fn rank_labels(scores: &[f64]) -> Vec<String> {
    let total = scores.len();
    let mut labels = Vec::with_capacity(total);
    let mut rank = 0;

    for (i, score) in scores.iter().enumerate() {
        if i == 0 || *score != scores[i - 1] {
            rank = i + 1;
        }
        labels.push(format!("{}/{}", rank, total));
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_share_rank() {
        assert_eq!(
            rank_labels(&[0.9, 0.7, 0.7, 0.5]),
            vec!["1/4", "2/4", "2/4", "4/4"]
        );
    }

    #[test]
    fn test_all_distinct() {
        assert_eq!(rank_labels(&[3.0, 2.0, 1.0]), vec!["1/3", "2/3", "3/3"]);
    }

    #[test]
    fn test_all_tied() {
        assert_eq!(rank_labels(&[1.0, 1.0]), vec!["1/2", "1/2"]);
    }

    #[test]
    fn test_empty() {
        assert!(rank_labels(&[]).is_empty());
    }
}
