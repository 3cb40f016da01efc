use std::collections::HashMap;

/// Renames `candidates` so none of them collides with `existing_names` or with
/// each other, by suffixing `_<k>` with the smallest free positive `k`.
///
/// The count table is local to one call; given the same existing set the
/// renaming is deterministic and order-preserving.
pub fn make_unique(existing_names: &[String], candidates: &[&str]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in existing_names {
        *counts.entry(name.clone()).or_insert(0) += 1;
    }

    let mut unique = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        let name = if counts.get(candidate).copied().unwrap_or(0) > 0 {
            let mut counter = 1;
            while counts
                .get(&format!("{candidate}_{counter}"))
                .copied()
                .unwrap_or(0)
                > 0
            {
                counter += 1;
            }
            format!("{candidate}_{counter}")
        } else {
            candidate.to_string()
        };
        counts.insert(name.clone(), 1);
        unique.push(name);
    }
    unique
}
