//! Agglomerative hierarchical clustering used to reorder heatmap axes.

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::stats::describe::mean;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Euclidean,
    Sqeuclidean,
    #[strum(serialize = "cityblock", serialize = "manhattan")]
    Cityblock,
    Cosine,
    Correlation,
    Chebyshev,
}

impl Metric {
    pub fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| x - y);
        match self {
            Metric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Metric::Sqeuclidean => diffs.map(|d| d * d).sum(),
            Metric::Cityblock => diffs.map(f64::abs).sum(),
            Metric::Chebyshev => diffs.map(f64::abs).fold(0.0, f64::max),
            Metric::Cosine => 1.0 - cosine(a.iter().copied(), b.iter().copied()),
            Metric::Correlation => {
                let (a, b) = (a.to_vec(), b.to_vec());
                let (ma, mb) = (mean(&a), mean(&b));
                1.0 - cosine(a.iter().map(|x| x - ma), b.iter().map(|y| y - mb))
            }
        }
    }
}

fn cosine(a: impl Iterator<Item = f64>, b: impl Iterator<Item = f64>) -> f64 {
    let (dot, na, nb) = a
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(d, na, nb), (x, y)| (d + x * y, na + x * x, nb + y * y));
    dot / (na.sqrt() * nb.sqrt())
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Single,
    Complete,
    #[default]
    Average,
    Weighted,
}

impl Method {
    /// Lance-Williams update of the distance from a merged cluster `a ∪ b` to `k`.
    fn update(&self, d_ak: f64, d_bk: f64, n_a: usize, n_b: usize) -> f64 {
        match self {
            Method::Single => d_ak.min(d_bk),
            Method::Complete => d_ak.max(d_bk),
            Method::Average => (n_a as f64 * d_ak + n_b as f64 * d_bk) / (n_a + n_b) as f64,
            Method::Weighted => (d_ak + d_bk) / 2.0,
        }
    }
}

/// One agglomeration step. Ids below the observation count are leaves; the
/// cluster formed by step `k` has id `n + k`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

/// Pairwise distances between the rows of `data`.
pub fn pdist(data: ArrayView2<f64>, metric: Metric) -> Array2<f64> {
    let n = data.nrows();
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in i + 1..n {
            let d = metric.distance(data.row(i), data.row(j));
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }
    out
}

/// Clusters the rows of `data`, returning `n - 1` merges in order.
pub fn linkage(data: ArrayView2<f64>, metric: Metric, method: Method) -> Result<Vec<Merge>> {
    let n = data.nrows();
    if n == 0 {
        return Err(Error::EmptyInput("nothing to cluster".into()));
    }
    let dist = pdist(data, metric);
    if dist.iter().any(|d| !d.is_finite()) {
        return Err(Error::Shape(format!(
            "{metric} distances between rows are not all finite"
        )));
    }

    // square table over every id that can appear, leaves and merged clusters
    let total = 2 * n - 1;
    let mut d = Array2::<f64>::from_elem((total, total), f64::INFINITY);
    d.slice_mut(ndarray::s![..n, ..n]).assign(&dist);
    let mut size = vec![1usize; total];
    let mut active: Vec<usize> = (0..n).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 0..n.saturating_sub(1) {
        let mut best = (0, 1, f64::INFINITY);
        for (ai, &a) in active.iter().enumerate() {
            for &b in &active[ai + 1..] {
                if d[[a, b]] < best.2 {
                    best = (a, b, d[[a, b]]);
                }
            }
        }
        let (a, b, distance) = best;
        let id = n + step;
        size[id] = size[a] + size[b];

        active.retain(|&k| k != a && k != b);
        for &k in &active {
            let v = method.update(d[[a, k]], d[[b, k]], size[a], size[b]);
            d[[id, k]] = v;
            d[[k, id]] = v;
        }
        active.push(id);

        merges.push(Merge {
            left: a.min(b),
            right: a.max(b),
            distance,
            size: size[id],
        });
    }
    Ok(merges)
}

/// Leaf ids left to right, visiting the left child of every merge first.
pub fn leaves_order(merges: &[Merge], n: usize) -> Vec<usize> {
    if merges.is_empty() {
        return (0..n).collect();
    }
    let mut order = Vec::with_capacity(n);
    let mut stack = vec![n + merges.len() - 1];
    while let Some(id) = stack.pop() {
        if id < n {
            order.push(id);
        } else {
            let m = &merges[id - n];
            stack.push(m.right);
            stack.push(m.left);
        }
    }
    order
}

/// A drawn dendrogram link: a horizontal bar at `height` joining two children.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub left: (f64, f64),
    pub right: (f64, f64),
    pub height: f64,
}

/// Links in leaf coordinates: leaf `k` in [`leaves_order`] sits at position `k`,
/// heights are merge distances.
pub fn dendrogram_links(merges: &[Merge], n: usize) -> Vec<Link> {
    let order = leaves_order(merges, n);
    let mut pos = vec![(0.0, 0.0); n + merges.len()];
    for (k, &leaf) in order.iter().enumerate() {
        pos[leaf] = (k as f64, 0.0);
    }
    merges
        .iter()
        .enumerate()
        .map(|(step, m)| {
            let (l, r) = (pos[m.left], pos[m.right]);
            pos[n + step] = ((l.0 + r.0) / 2.0, m.distance);
            Link {
                left: l,
                right: r,
                height: m.distance,
            }
        })
        .collect()
}
