use mixcorr::grid::proportions;
use mixcorr::histogram::error_summary;
use mixcorr::imscatter::frame_colors;
use mixcorr::smooth::smooth_series;
use mixcorr::stats::describe::{auto_bin_count, histogram, mean, MAX_AUTO_BINS};
use mixcorr::table::Column;
use mixcorr::{
    infer_orient, parse_option, sorted_order, ColGrid, Error, ErrorHistogramOptions, FrameColor,
    ImScatterOptions, Image, Interact, IntervalType, Lowess, OrderBy, Orient,
    SmoothScatterOptions, Table,
};
use plotters::style::{RGBColor, BLACK};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn grid_pairs_follow_interaction() {
    let product = ColGrid::with_defaults(names(&["a", "b"]), Some(names(&["y", "z"]))).expect("grid");
    assert_eq!(product.num_plots(), 4);
    assert_eq!(product.pairs()[1], ("a".to_string(), Some("z".to_string())));
    assert_eq!(product.col_wrap, 4);
    assert_eq!(product.num_rows(), 1);

    let zip = ColGrid::new(
        names(&["a", "b", "c"]),
        Some(names(&["y", "z"])),
        Interact::Zip,
        None,
        3.0,
        1.0,
    )
    .expect("grid");
    assert_eq!(zip.num_plots(), 2);

    let comb = ColGrid::new(names(&["a", "b", "c", "d"]), None, Interact::Comb, Some(2), 2.0, 1.5)
        .expect("grid");
    assert_eq!(comb.num_plots(), 6);
    assert_eq!(comb.num_rows(), 3);
    assert_eq!(comb.figure_size(), (6.0, 6.0));
    assert_eq!(comb.pixel_size(100.0), (600, 600));

    let alone = ColGrid::with_defaults(names(&["a", "b", "c"]), None).expect("grid");
    assert_eq!(alone.pairs()[2], ("c".to_string(), None));
}

#[test]
fn grid_rejects_conflicts_and_unknown_modes() {
    let err = ColGrid::new(names(&["a", "b"]), Some(names(&["y"])), Interact::Comb, None, 3.0, 1.0)
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert!(matches!(
        parse_option::<Interact>("interact", "cross"),
        Err(Error::UnknownOption { .. })
    ));
    assert_eq!(parse_option::<Interact>("interact", "ZIP").unwrap(), Interact::Zip);
}

#[test]
fn lowess_reproduces_a_straight_line() {
    let x: Vec<f64> = (0..25).map(|i| i as f64 * 0.4).collect();
    let y: Vec<f64> = x.iter().map(|v| 3.0 - 2.0 * v).collect();
    for fraction in [0.3, 0.5, 1.0] {
        let fit = Lowess::new(fraction, 1).fit(&x, &y).expect("fit");
        for (s, t) in fit.smoothed.iter().zip(&y) {
            assert!(approx_eq(*s, *t, 1e-9));
        }
        assert!(fit.sigma() < 1e-9);
    }
}

#[test]
fn lowess_intervals_bracket_the_curve() {
    let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, v)| 0.5 * v + ((i * 7) % 5) as f64 * 0.3)
        .collect();
    let smoother = Lowess::default();
    let plain = smoother.fit(&x, &y).expect("fit");
    assert!(plain.interval.is_none());
    assert!(plain.sigma() > 0.0);
    for ((r, s), t) in plain.residuals.iter().zip(&plain.smoothed).zip(&y) {
        assert!(approx_eq(*r, t - s, 1e-9));
    }

    let band = |kind| {
        let fit = smoother.fit_with_interval(&x, &y, kind, 0.95).expect("fit");
        let (lo, hi) = fit.interval.clone().expect("interval");
        (fit.smoothed, lo, hi)
    };
    let (s, lo, hi) = band(IntervalType::Confidence);
    let (_, plo, phi) = band(IntervalType::Prediction);
    let (_, slo, shi) = band(IntervalType::Sigma);
    for i in 0..x.len() {
        assert!(approx_eq(s[i], plain.smoothed[i], 1e-9));
        assert!(lo[i] <= s[i] + 1e-12 && s[i] <= hi[i] + 1e-12);
        assert!(phi[i] - plo[i] >= hi[i] - lo[i]);
        assert!(approx_eq(shi[i] - s[i], s[i] - slo[i], 1e-9));
    }
    let expected_sigma = 1.959964 * plain.sigma();
    assert!(approx_eq(shi[0] - s[0], expected_sigma, 1e-4));
    assert_eq!(
        parse_option::<IntervalType>("interval", "prediction_interval").unwrap(),
        IntervalType::Prediction
    );
}

#[test]
fn lowess_validates_input() {
    assert!(matches!(Lowess::default().fit(&[1.0], &[1.0]), Err(Error::TooFewSamples { .. })));
    assert!(matches!(Lowess::default().fit(&[1.0, 2.0], &[1.0]), Err(Error::LengthMismatch { .. })));
    assert!(matches!(
        Lowess::new(0.0, 1).fit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        Lowess::default().fit_with_interval(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], IntervalType::Sigma, 95.0),
        Err(Error::Conflict(_))
    ));
}

#[test]
fn smoothed_series_is_sorted_and_clean() {
    let options = SmoothScatterOptions {
        linreg: true,
        seed: Some(7),
        ..SmoothScatterOptions::default()
    };
    let series = smooth_series(
        &[3.0, 1.0, f64::NAN, 2.0, 4.0],
        &[30.0, 10.0, 5.0, 20.0, 40.0],
        &options,
    )
    .expect("series");
    assert_eq!(series.x, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(series.y, vec![10.0, 20.0, 30.0, 40.0]);
    assert_eq!(series.points.len(), 4);
    assert_eq!(series.points[0], (1.0, 10.0));
    let line = series.linreg.expect("linear fit");
    assert!(approx_eq(line.slope, 10.0, 1e-12));
    assert!(approx_eq(line.predict(5.0), 50.0, 1e-9));
    assert!(series.smoothed.is_some() && series.interval.is_some());

    assert!(matches!(
        smooth_series(&[], &[], &options),
        Err(Error::EmptyInput(_))
    ));
}

#[test]
fn jitter_only_moves_points_and_is_seeded() {
    let options = SmoothScatterOptions {
        x_jitter: Some(0.5),
        seed: Some(11),
        smoothed: false,
        ..SmoothScatterOptions::default()
    };
    let x = [1.0, 2.0, 3.0];
    let y = [1.0, 4.0, 9.0];
    let a = smooth_series(&x, &y, &options).expect("series");
    let b = smooth_series(&x, &y, &options).expect("series");
    assert_eq!(a.points, b.points);
    assert_eq!(a.x, x.to_vec());
    assert!(a.points.iter().zip(&x).any(|(p, x)| p.0 != *x));
    assert!(a.points.iter().zip(&y).all(|(p, y)| p.1 == *y));
}

#[test]
fn error_summary_reports_mae_and_mse() {
    let y_true = [1.0, 2.0, 3.0, 4.0];
    let y_pred = [1.0, 2.0, 3.0, 6.0];
    let raw = ErrorHistogramOptions {
        standardize_outputs: false,
        ..ErrorHistogramOptions::default()
    };
    let summary = error_summary(&y_true, &y_pred, &raw).expect("summary");
    assert_eq!(summary.errors, vec![0.0, 0.0, 0.0, -2.0]);
    assert!(approx_eq(summary.mae, 0.5, 1e-12));
    assert!(approx_eq(summary.mse, 1.0, 1e-12));
    let binned: usize = summary.error_bins.iter().map(|b| b.count).sum();
    assert_eq!(binned, 4);

    let standardized = error_summary(&y_true, &y_pred, &ErrorHistogramOptions::default())
        .expect("summary");
    assert!(approx_eq(mean(&standardized.outputs), 0.0, 1e-12));
    assert!(standardized.mae < summary.mae);

    let scaled_on_other = ErrorHistogramOptions {
        fit_scaling: Some(vec![0.0, 100.0]),
        ..ErrorHistogramOptions::default()
    };
    let other = error_summary(&y_true, &y_pred, &scaled_on_other).expect("summary");
    assert!(approx_eq(other.outputs[0], (1.0 - 50.0) / 50.0, 1e-12));

    assert!(error_summary(&y_true, &y_pred[..2], &raw).is_err());
}

#[test]
fn histogram_covers_every_finite_value() {
    let values: Vec<f64> = (0..50).map(|i| (i as f64).sqrt()).chain([f64::NAN]).collect();
    let bins = histogram(&values);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 50);
    assert_eq!(bins[0].lo, 0.0);
    assert!(approx_eq(bins[bins.len() - 1].hi, 49f64.sqrt(), 1e-12));
}

#[test]
fn far_outlier_caps_the_bin_count() {
    let values: Vec<f64> = (0..100).map(f64::from).chain([1e12]).collect();
    assert_eq!(auto_bin_count(&values), MAX_AUTO_BINS);
    let bins = histogram(&values);
    assert_eq!(bins.len(), MAX_AUTO_BINS);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
    assert_eq!(bins[bins.len() - 1].count, 1);

    assert_eq!(auto_bin_count(&[2.0, 2.0, 2.0]), 1);
    assert_eq!(auto_bin_count(&[]), 1);
}

#[test]
fn groups_sorted_by_statistic() {
    let groups: Vec<Option<String>> = ["a", "a", "b", "b", "c"]
        .iter()
        .map(|g| Some(g.to_string()))
        .chain([None])
        .collect();
    let values = [5.0, 7.0, 1.0, 2.0, f64::NAN, 100.0];
    assert_eq!(sorted_order(&groups, &values, OrderBy::Median).unwrap(), names(&["b", "a", "c"]));
    assert_eq!(sorted_order(&groups, &values, OrderBy::Max).unwrap(), names(&["b", "a", "c"]));
    assert!(sorted_order(&groups, &values[..2], OrderBy::Mean).is_err());
}

#[test]
fn orientation_follows_numeric_variable() {
    let num = Column::Numeric(vec![1.0, 2.0]);
    let cat = Column::Categorical(vec![Some("a".into()), Some("b".into())]);
    assert_eq!(infer_orient(Some(&cat), Some(&num), None).unwrap(), Orient::Vertical);
    assert_eq!(infer_orient(Some(&num), Some(&cat), None).unwrap(), Orient::Horizontal);
    assert_eq!(infer_orient(None, Some(&num), None).unwrap(), Orient::Vertical);
    assert_eq!(infer_orient(Some(&num), None, None).unwrap(), Orient::Horizontal);
    assert_eq!(
        infer_orient(Some(&cat), Some(&num), Some(Orient::Horizontal)).unwrap(),
        Orient::Horizontal
    );
    assert!(infer_orient(Some(&cat), Some(&cat), None).is_err());
    assert_eq!(parse_option::<Orient>("orient", "h").unwrap(), Orient::Horizontal);
}

#[test]
fn proportions_per_group() {
    let table = Table::new()
        .with_categorical("sex", vec![Some("m"), Some("m"), Some("f"), Some("f"), Some("f")])
        .and_then(|t| {
            t.with_categorical("survived", vec![Some("yes"), Some("no"), Some("yes"), Some("yes"), None])
        })
        .expect("table");
    let props = proportions(&table, "sex", &["survived"]).expect("proportions");
    assert_eq!(props.groups, names(&["f", "m"]));
    assert_eq!(props.dummies, names(&["survived=no", "survived=yes"]));
    assert!(approx_eq(props.values[[0, 0]], 0.0, 1e-12));
    assert!(approx_eq(props.values[[0, 1]], 2.0 / 3.0, 1e-12));
    assert!(approx_eq(props.values[[1, 0]], 0.5, 1e-12));
    assert!(approx_eq(props.values[[1, 1]], 0.5, 1e-12));

    assert!(matches!(proportions(&table, "age", &["survived"]), Err(Error::MissingColumn(_))));
    assert!(matches!(proportions(&table, "sex", &["age"]), Err(Error::MissingColumn(_))));
    assert!(matches!(proportions(&table, "sex", &[]), Err(Error::EmptyInput(_))));
}

#[test]
fn proportions_concatenate_every_prop_column() {
    let table = Table::new()
        .with_categorical("sex", vec![Some("m"), Some("m"), Some("f"), Some("f")])
        .and_then(|t| t.with_categorical("survived", vec![Some("yes"), Some("no"), Some("yes"), Some("yes")]))
        .and_then(|t| t.with_categorical("class", vec![Some("1"), Some("2"), Some("2"), None]))
        .expect("table");
    let props = proportions(&table, "sex", &["survived", "class"]).expect("proportions");
    assert_eq!(props.groups, names(&["f", "m"]));
    assert_eq!(
        props.dummies,
        names(&["survived=no", "survived=yes", "class=1", "class=2"])
    );
    assert_eq!(props.values.dim(), (2, 4));
    assert!(approx_eq(props.values[[0, 1]], 1.0, 1e-12));
    assert!(approx_eq(props.values[[0, 2]], 0.0, 1e-12));
    assert!(approx_eq(props.values[[0, 3]], 0.5, 1e-12));
    assert!(approx_eq(props.values[[1, 2]], 0.5, 1e-12));
    assert!(approx_eq(props.values[[1, 3]], 0.5, 1e-12));

    let single = proportions(&table, "sex", &["class"]).expect("proportions");
    assert_eq!(single.values.column(1), props.values.column(3));
}

#[test]
fn frame_colors_default_to_black() {
    let options = ImScatterOptions::default();
    assert_eq!(frame_colors(3, &options).unwrap(), vec![BLACK; 3]);

    let red = RGBColor(255, 0, 0);
    let mixed = ImScatterOptions {
        frame_colors: Some(vec![FrameColor::Fixed(red), FrameColor::Value(1.0)]),
        ..ImScatterOptions::default()
    };
    let colors = frame_colors(2, &mixed).unwrap();
    assert_eq!(colors[0], red);
    assert_eq!(colors[1], mixed.frame_cmap.sample(1.0));
    assert!(matches!(frame_colors(3, &mixed), Err(Error::LengthMismatch { .. })));
}

#[test]
fn images_zoom_by_nearest_neighbour() {
    let image = Image::new(2, 1, vec![255, 0, 0, 0, 0, 255]).expect("image");
    let zoomed = image.zoomed(2.0);
    assert_eq!((zoomed.width, zoomed.height), (4, 2));
    let row: Vec<u8> = [[255, 0, 0], [255, 0, 0], [0, 0, 255], [0, 0, 255]].concat();
    assert_eq!(&zoomed.rgb[..12], &row[..]);
    assert_eq!(&zoomed.rgb[12..], &row[..]);
    assert_eq!(image.zoomed(1.0), image);

    assert!(Image::new(2, 2, vec![0; 5]).is_err());
    assert_eq!(Image::solid(3, 2, BLACK).rgb.len(), 18);
}
