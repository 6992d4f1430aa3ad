//! Stratified recency sampling of message histories.
//!
//! Extraction prompts must stay the same size no matter how long a history
//! is. When a history exceeds the cap `M`, the sample is drawn from three
//! segments:
//!
//! | Segment | Share | Where |
//! |---------|-------|-------|
//! | recent  | `floor(0.4·M)` | the last messages |
//! | middle  | `floor(0.3·M)` | starting at the one-third mark |
//! | oldest  | the rest | from the head |
//!
//! Selected messages are returned in their original order, so the recent
//! segment is always a verbatim suffix of the input.
//!
//! # Example
//!
//! ```rust
//! use chatminer::core::sampler::sample_messages;
//!
//! let history: Vec<u32> = (0..1000).collect();
//! let sample = sample_messages(&history, 300);
//!
//! assert_eq!(sample.len(), 300);
//! assert_eq!(&sample[180..], &history[880..]);
//! ```

/// Cap used for single-person analysis.
pub const PERSON_SAMPLE: usize = 300;

/// Share of the budget drawn from the most recent messages, in tenths.
const RECENT_TENTHS: usize = 4;

/// Share of the budget drawn from the middle of the history, in tenths.
const MIDDLE_TENTHS: usize = 3;

/// Indices selected from a history of `len` items under cap `max`, ascending.
pub fn sample_indices(len: usize, max: usize) -> Vec<usize> {
    if len <= max {
        return (0..len).collect();
    }

    let mut selected = vec![false; len];

    let recent = max * RECENT_TENTHS / 10;
    let recent_start = len - recent;
    for flag in &mut selected[recent_start..] {
        *flag = true;
    }

    let middle = max * MIDDLE_TENTHS / 10;
    let middle_start = (len / 3).min(recent_start);
    let middle_end = (middle_start + middle).min(recent_start);
    for flag in &mut selected[middle_start..middle_end] {
        *flag = true;
    }

    let mut remaining = max - recent - (middle_end - middle_start);
    for flag in &mut selected {
        if remaining == 0 {
            break;
        }
        if !*flag {
            *flag = true;
            remaining -= 1;
        }
    }

    selected
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}

/// Returns at most `max` items of `messages` using stratified recency sampling.
///
/// Histories of `max` items or fewer are returned unchanged.
pub fn sample_messages<T: Clone>(messages: &[T], max: usize) -> Vec<T> {
    sample_indices(messages.len(), max)
        .into_iter()
        .map(|i| messages[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_history_unchanged() {
        let history: Vec<u32> = (0..300).collect();
        assert_eq!(sample_messages(&history, 300), history);

        let short: Vec<u32> = (0..7).collect();
        assert_eq!(sample_messages(&short, 300), short);
    }

    #[test]
    fn test_exact_budget_and_recent_suffix() {
        let history: Vec<u32> = (0..1000).collect();
        let sample = sample_messages(&history, PERSON_SAMPLE);
        assert_eq!(sample.len(), 300);
        assert_eq!(&sample[sample.len() - 120..], &history[880..]);
    }

    #[test]
    fn test_segments_for_1000() {
        let idx = sample_indices(1000, 300);
        // head: 0..90, middle: 333..423, recent: 880..1000
        assert_eq!(idx[..90].to_vec(), (0..90).collect::<Vec<usize>>());
        assert_eq!(idx[90..180].to_vec(), (333..423).collect::<Vec<usize>>());
        assert_eq!(idx[180..].to_vec(), (880..1000).collect::<Vec<usize>>());
    }

    #[test]
    fn test_overlapping_segments_still_fill_budget() {
        // middle segment runs into the recent one
        let idx = sample_indices(301, 300);
        assert_eq!(idx.len(), 300);
        let mut dedup = idx.clone();
        dedup.dedup();
        assert_eq!(dedup.len(), 300);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_small_caps() {
        assert_eq!(sample_indices(10, 0), Vec::<usize>::new());
        assert_eq!(sample_indices(10, 1), vec![0]);
        assert_eq!(sample_indices(10, 3), vec![0, 1, 9]);
    }

    #[test]
    fn test_other_caps() {
        for (len, max) in [(500, 150), (81, 80), (1000, 200), (10_000, 80)] {
            let idx = sample_indices(len, max);
            assert_eq!(idx.len(), max, "len={len} max={max}");
            assert_eq!(*idx.last().unwrap(), len - 1);
        }
    }
}
