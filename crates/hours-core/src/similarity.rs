//! Character-level similarity based on longest matching blocks
//! (Ratcliff/Obershelp).
//!
//! The ratio is `2·M / T` where `T` is the combined length of both inputs and
//! `M` the number of characters covered by the matching blocks. Blocks are
//! found by taking the longest common substring, then recursing on the pieces
//! to its left and to its right.

/// A run of `size` equal characters at `a[a_start..]` and `b[b_start..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Similarity ratio in `[0, 1]` between two strings, compared per `char`.
///
/// Two empty strings are identical and score `1.0`.
///
/// # Examples
///
/// ```
/// use hours_core::similarity::similarity_ratio;
///
/// assert_eq!(similarity_ratio("dupont", "dupont"), 1.0);
/// assert_eq!(similarity_ratio("abcd", "bcde"), 0.75);
/// assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
/// ```
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched: usize = matching_blocks(&a, &b).iter().map(|m| m.size).sum();
    2.0 * matched as f64 / total as f64
}

/// All non-overlapping matching blocks between `a` and `b`, sorted by
/// position.
pub fn matching_blocks<T: PartialEq>(a: &[T], b: &[T]) -> Vec<MatchingBlock> {
    let mut blocks = Vec::new();
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let block = longest_match(a, b, alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }

        let (i, j, k) = (block.a_start, block.b_start, block.size);
        blocks.push(block);
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    blocks.sort_by_key(|m| (m.a_start, m.b_start));
    blocks
}

/// Longest common run inside `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Among runs of equal length the one starting earliest in `a` wins, then the
/// one starting earliest in `b`.
fn longest_match<T: PartialEq>(
    a: &[T],
    b: &[T],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> MatchingBlock {
    let mut best = MatchingBlock {
        a_start: alo,
        b_start: blo,
        size: 0,
    };

    // run[j + 1] = length of the common run ending at (i - 1, j)
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[col - 1] + 1;
                curr[col] = k;
                if k > best.size {
                    best = MatchingBlock {
                        a_start: i + 1 - k,
                        b_start: j + 1 - k,
                        size: k,
                    };
                }
            } else {
                curr[col] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
