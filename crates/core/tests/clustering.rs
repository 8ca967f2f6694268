use mixcorr::heatmap::cluster::{dendrogram_links, pdist};
use mixcorr::heatmap::{
    cluster_order, cluster_reorder, leaves_order, linkage, ClusterSpec, HeatmapOptions,
    LabeledMatrix, Merge, Method, Metric,
};
use mixcorr::{parse_option, CorrType, Error};
use ndarray::{array, Array2};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn two_blobs() -> Array2<f64> {
    array![[0.0, 0.0], [10.0, 10.0], [0.1, 0.0], [10.0, 10.2]]
}

#[test]
fn metrics_match_hand_computed_distances() {
    let a = array![0.0, 3.0];
    let b = array![4.0, 0.0];
    assert!(approx_eq(Metric::Euclidean.distance(a.view(), b.view()), 5.0, 1e-12));
    assert!(approx_eq(Metric::Sqeuclidean.distance(a.view(), b.view()), 25.0, 1e-12));
    assert!(approx_eq(Metric::Cityblock.distance(a.view(), b.view()), 7.0, 1e-12));
    assert!(approx_eq(Metric::Chebyshev.distance(a.view(), b.view()), 4.0, 1e-12));
    assert!(approx_eq(Metric::Cosine.distance(a.view(), b.view()), 1.0, 1e-12));
    assert_eq!(parse_option::<Metric>("metric", "manhattan").unwrap(), Metric::Cityblock);

    let d = pdist(two_blobs().view(), Metric::Euclidean);
    assert_eq!(d.dim(), (4, 4));
    assert_eq!(d[[1, 3]], d[[3, 1]]);
    assert_eq!(d[[2, 2]], 0.0);
}

#[test]
fn linkage_merges_closest_pairs_first() {
    let merges = linkage(two_blobs().view(), Metric::Euclidean, Method::Average).expect("linkage");
    assert_eq!(merges.len(), 3);
    assert_eq!((merges[0].left, merges[0].right), (0, 2));
    assert!(approx_eq(merges[0].distance, 0.1, 1e-12));
    assert_eq!((merges[1].left, merges[1].right), (1, 3));
    assert_eq!((merges[2].left, merges[2].right), (4, 5));
    assert_eq!(merges[2].size, 4);
    assert!(merges.windows(2).all(|w| w[0].distance <= w[1].distance));

    let single = linkage(two_blobs().view(), Metric::Euclidean, Method::Single).expect("linkage");
    let complete = linkage(two_blobs().view(), Metric::Euclidean, Method::Complete).expect("linkage");
    assert!(single[2].distance <= merges[2].distance);
    assert!(merges[2].distance <= complete[2].distance);
}

#[test]
fn leaf_order_is_a_permutation_keeping_clusters_together() {
    let merges = linkage(two_blobs().view(), Metric::Euclidean, Method::Average).expect("linkage");
    let order = leaves_order(&merges, 4);
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2, 3]);
    assert_eq!(order, vec![0, 2, 1, 3]);

    let links = dendrogram_links(&merges, 4);
    assert_eq!(links.len(), 3);
    assert!(approx_eq(links[2].left.0, 0.5, 1e-12));
    assert!(approx_eq(links[2].right.0, 2.5, 1e-12));
    assert_eq!(leaves_order(&[], 3), vec![0, 1, 2]);
}

#[test]
fn non_finite_rows_cannot_be_clustered() {
    let data = array![[0.0, 1.0], [f64::NAN, 2.0], [3.0, 4.0]];
    assert!(matches!(
        linkage(data.view(), Metric::Euclidean, Method::Average),
        Err(Error::Shape(_))
    ));
}

#[test]
fn supplied_linkage_is_validated_and_used() {
    let data = two_blobs();
    let bad = ClusterSpec {
        linkage: Some(vec![]),
        ..ClusterSpec::default()
    };
    assert!(matches!(cluster_order(data.view(), &bad), Err(Error::Shape(_))));

    let tree = vec![
        Merge { left: 1, right: 3, distance: 0.2, size: 2 },
        Merge { left: 0, right: 2, distance: 0.1, size: 2 },
        Merge { left: 4, right: 5, distance: 14.0, size: 4 },
    ];
    let given = ClusterSpec {
        linkage: Some(tree),
        ..ClusterSpec::default()
    };
    assert_eq!(cluster_order(data.view(), &given).expect("order"), vec![1, 3, 0, 2]);
}

#[test]
fn supplied_linkage_must_use_every_cluster_once() {
    let data = array![[0.0], [1.0], [5.0]];
    let reused_leaf = vec![
        Merge { left: 0, right: 1, distance: 0.1, size: 2 },
        Merge { left: 0, right: 3, distance: 0.2, size: 3 },
    ];
    let unformed = vec![
        Merge { left: 0, right: 4, distance: 0.1, size: 2 },
        Merge { left: 1, right: 2, distance: 0.2, size: 3 },
    ];
    let self_merge = vec![
        Merge { left: 1, right: 1, distance: 0.1, size: 2 },
        Merge { left: 0, right: 3, distance: 0.2, size: 3 },
    ];
    for tree in [reused_leaf, unformed, self_merge] {
        let spec = ClusterSpec {
            linkage: Some(tree),
            ..ClusterSpec::default()
        };
        assert!(matches!(cluster_order(data.view(), &spec), Err(Error::Shape(_))));
    }

    let fine = ClusterSpec {
        linkage: Some(vec![
            Merge { left: 0, right: 1, distance: 1.0, size: 2 },
            Merge { left: 3, right: 2, distance: 4.5, size: 3 },
        ]),
        ..ClusterSpec::default()
    };
    let mut order = cluster_order(data.view(), &fine).expect("order");
    order.sort_unstable();
    assert_eq!(order, vec![0, 1, 2]);
}

#[test]
fn reordering_moves_mask_and_kinds_with_values() {
    let names = labels(&["a", "b", "c", "d"]);
    let values = array![
        [1.0, 0.1, 0.9, 0.2],
        [0.1, 1.0, 0.15, 0.8],
        [0.9, 0.15, 1.0, 0.1],
        [0.2, 0.8, 0.1, 1.0],
    ];
    let matrix = LabeledMatrix::new(names.clone(), names.clone(), values).expect("matrix");
    let mut mask = Array2::from_elem((4, 4), false);
    mask[[0, 3]] = true;
    let mut kinds = Array2::from_elem((4, 4), Some(CorrType::NumVsNum));
    kinds[[1, 2]] = Some(CorrType::CatVsCat);

    let options = HeatmapOptions {
        row_cluster: Some(ClusterSpec::default()),
        col_cluster: Some(ClusterSpec::new(Metric::Correlation, Method::Complete)),
        ..HeatmapOptions::default()
    };
    let out = cluster_reorder(&matrix, Some(&kinds), Some(&mask), &options).expect("reorder");

    let pos = |label: &str| names.iter().position(|n| n == label).unwrap();
    let rows = &out.matrix.row_labels;
    let cols = &out.matrix.col_labels;
    let mut sorted = rows.clone();
    sorted.sort();
    assert_eq!(sorted, names);

    let out_mask = out.mask.as_ref().unwrap();
    let out_kinds = out.kinds.as_ref().unwrap();
    for (i, r) in rows.iter().enumerate() {
        for (j, c) in cols.iter().enumerate() {
            let (oi, oj) = (pos(r), pos(c));
            assert_eq!(out.matrix.values[[i, j]], matrix.values[[oi, oj]]);
            assert_eq!(out_mask[[i, j]], mask[[oi, oj]]);
            assert_eq!(out_kinds[[i, j]], kinds[[oi, oj]]);
        }
    }

    // similar rows end up next to each other
    let ra = rows.iter().position(|r| r == "a").unwrap() as i64;
    let rc = rows.iter().position(|r| r == "c").unwrap() as i64;
    assert_eq!((ra - rc).abs(), 1);
}
