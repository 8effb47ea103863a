use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Proportional stratified sample.
///
/// The overall size is `min(target, rows.len())`; each stratum contributes
/// `floor(size * stratum_len / total)` rows picked uniformly at random. Strata
/// are emitted in sorted key order, the way a pandas `groupby` iterates, and
/// rows keep their original relative order within a stratum.
pub fn stratified_sample<T, F>(rows: Vec<T>, target: usize, seed: u64, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let total = rows.len();
    if total == 0 {
        return Vec::new();
    }
    let sample_size = target.min(total);

    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(&row).to_string()).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sampled = Vec::with_capacity(sample_size);

    for group in groups.into_values() {
        let take = (sample_size as u128 * group.len() as u128 / total as u128) as usize;
        if take == 0 {
            continue;
        }

        let mut picked = rand::seq::index::sample(&mut rng, group.len(), take).into_vec();
        picked.sort_unstable();

        let mut picked = picked.into_iter().peekable();
        for (i, row) in group.into_iter().enumerate() {
            if picked.peek() == Some(&i) {
                picked.next();
                sampled.push(row);
            }
        }
    }

    sampled
}
