//! Maximal marginal relevance selection over retained candidate vectors.

/// Cosine similarity of two vectors; zero for mismatched lengths or zero
/// magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

/// Greedy MMR selection.
///
/// Each round picks the unselected candidate maximizing
/// `lambda * sim(query, candidate) - (1 - lambda) * max sim(candidate,
/// selected)`, until `k` candidates are chosen or the pool is exhausted.
/// Returns indices into `candidates` in pick order; the first pick is always
/// the most query-relevant candidate.
pub fn select(query: &[f32], candidates: &[Vec<f32>], lambda: f32, k: usize) -> Vec<usize> {
    let target = k.min(candidates.len());
    let mut selected: Vec<usize> = Vec::with_capacity(target);
    if target == 0 {
        return selected;
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate))
        .collect();

    while selected.len() < target {
        let mut best: Option<(usize, f32)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if selected.contains(&idx) {
                continue;
            }
            let redundancy = selected
                .iter()
                .map(|&chosen| cosine_similarity(candidate, &candidates[chosen]))
                .fold(0.0_f32, f32::max);
            let score = lambda * relevance[idx] - (1.0 - lambda) * redundancy;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }
        match best {
            Some((idx, _)) => selected.push(idx),
            None => break,
        }
    }

    selected
}
