//! Ratcliff/Obershelp similarity: twice the number of characters in matching
//! blocks divided by the total length of both strings. Blocks are found by
//! repeatedly taking the longest common contiguous run and recursing on the
//! pieces to its left and right.

pub const DEFAULT_THRESHOLD: f64 = 0.65;

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// True when `found` is close enough to `expected` to be read as a typo of it.
/// The comparison is strict: a ratio equal to the threshold does not match.
pub fn is_typo_of(found: &str, expected: &str, threshold: f64) -> bool {
    ratio(found, expected) > threshold
}

/// Index of the candidate with the strictly highest ratio above `threshold`.
/// On ties the earliest candidate wins.
pub fn best_match(found: &str, candidates: &[&str], threshold: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let score = ratio(found, candidate);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }

    best.filter(|(_, score)| *score > threshold)
        .map(|(index, _)| index)
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }

        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

// Longest common run of a[alo..ahi] and b[blo..bhi]. Among equally long runs
// the one starting earliest in `a`, then earliest in `b`, is returned.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);

    // run[j + 1 - blo]: length of the common run ending at a[i], b[j].
    let width = bhi - blo + 1;
    let mut previous = vec![0usize; width];
    let mut row = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j + 1 - blo;
            row[slot] = if a[i] == b[j] { previous[slot - 1] + 1 } else { 0 };

            let size = row[slot];
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        std::mem::swap(&mut previous, &mut row);
    }

    best
}
