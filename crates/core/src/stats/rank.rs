/// Average ranks (1-based); ties share the mean of the ranks they span.
pub fn rank_data(data: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = data.iter().cloned().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; data.len()];
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j + 1 < indexed.len() && indexed[j].1 == indexed[j + 1].1 {
            j += 1;
        }
        let rank = (i + 1..=j + 1).sum::<usize>() as f64 / (j - i + 1) as f64;
        for entry in &indexed[i..=j] {
            ranks[entry.0] = rank;
        }
        i = j + 1;
    }
    ranks
}
