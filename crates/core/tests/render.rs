use mixcorr::heatmap::geometry::CellShape;
use mixcorr::heatmap::{layout_zaric, zaric_cells, LabeledMatrix, ZaricCells, ZaricOptions};
use mixcorr::render::{format_g, parse_color, wrap_custom, wrap_label, Colormap, PowerNorm};
use mixcorr::{CorrType, Error};
use ndarray::{array, Array2};
use plotters::style::RGBColor;
use proptest::prelude::*;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn wrap_breaks_hard_without_separators() {
    assert_eq!(wrap_label("abcdefgh", 3), "abc\ndef\ngh");
    assert_eq!(wrap_label("abcdef", 3), "abc\ndef");
    assert_eq!(wrap_label("short", 12), "short");
}

#[test]
fn wrap_prefers_last_separator() {
    assert_eq!(wrap_label("passenger_class", 12), "passenger_\nclass");
    assert_eq!(wrap_custom("one two three", &[' '], 8, false), "one two\nthree");
}

proptest! {
    #[test]
    fn wrap_keeps_every_character(source in "[a-z_-]{0,60}", width in 1usize..15) {
        let wrapped = wrap_label(&source, width);
        prop_assert_eq!(wrapped.replace('\n', ""), source.clone());
        for line in wrapped.split('\n') {
            prop_assert!(line.chars().count() <= width);
        }
    }

    #[test]
    fn hard_breaks_land_on_width(source in "[a-z]{1,60}", width in 1usize..15) {
        let wrapped = wrap_label(&source, width);
        let lines: Vec<&str> = wrapped.split('\n').collect();
        for line in &lines[..lines.len() - 1] {
            prop_assert_eq!(line.len(), width);
        }
    }
}

#[test]
fn format_g_matches_printf() {
    assert_eq!(format_g(0.123456, 3), "0.123");
    assert_eq!(format_g(1234567.0, 3), "1.23e+06");
    assert_eq!(format_g(0.0001234, 3), "0.000123");
    assert_eq!(format_g(0.00001234, 2), "1.2e-05");
    assert_eq!(format_g(2.0, 3), "2");
    assert_eq!(format_g(-0.5, 3), "-0.5");
    assert_eq!(format_g(f64::NAN, 3), "nan");
}

#[test]
fn power_norm_maps_range_onto_unit_interval() {
    let norm = PowerNorm::with_range(2.0, 0.0, 4.0);
    assert_eq!(norm.apply(0.0), 0.0);
    assert!(approx_eq(norm.apply(4.0), 1.0, 1e-12));
    assert!(approx_eq(norm.apply(2.0), 0.25, 1e-12));
    assert_eq!(norm.apply(-3.0), 0.0);
    assert!(norm.apply(f64::NAN).is_nan());
    assert!(approx_eq(norm.inverse(0.25), 2.0, 1e-12));

    assert_eq!(PowerNorm::with_range(0.5, 1.0, 1.0).apply(1.0), 0.0);

    let mut auto = PowerNorm::new(1.0);
    auto.autoscale(&[f64::NAN, -2.0, 6.0]);
    assert_eq!((auto.vmin, auto.vmax), (Some(-2.0), Some(6.0)));
}

#[test]
fn colormaps_and_colors() {
    let gray = Colormap::greys();
    assert_ne!(gray.sample(0.0), gray.sample(1.0));
    assert_eq!(gray.clone().reversed().sample(0.0), gray.sample(1.0));
    assert_eq!(Colormap::by_name("jet_r").unwrap().sample(0.0), Colormap::jet().sample(1.0));
    assert!(matches!(Colormap::by_name("rainbowish"), Err(Error::UnknownOption { .. })));

    assert_eq!(parse_color("#ff8000").unwrap(), RGBColor(255, 128, 0));
    assert_eq!(parse_color("k").unwrap(), RGBColor(0, 0, 0));
    assert!(parse_color("#ff80").is_err());
}

fn two_by_two() -> ZaricCells {
    ZaricCells::new(
        labels(&["r1", "r1", "r2", "r2"]),
        labels(&["c1", "c2", "c1", "c2"]),
        vec![0.5, f64::NAN, 0.3, -0.2],
    )
    .with_size(vec![0.5, 0.4, 0.0, 0.2])
}

fn drawn(cells: &ZaricCells) -> Vec<usize> {
    layout_zaric(cells, &ZaricOptions::default(), (600, 500))
        .expect("layout")
        .cells
        .iter()
        .map(|c| c.index)
        .collect()
}

#[test]
fn zaric_skips_nan_zero_and_masked_cells() {
    assert_eq!(drawn(&two_by_two()), vec![0, 3]);
    let masked = two_by_two().with_mask(vec![false, false, false, true]);
    assert_eq!(drawn(&masked), vec![0]);
}

#[test]
fn zaric_cell_size_follows_magnitude() {
    let cells = ZaricCells::new(
        labels(&["a", "a", "b", "b"]),
        labels(&["x", "y", "x", "y"]),
        vec![1.0, -0.25, 0.25, -1.0],
    )
    .with_size(vec![1.0, 0.25, 0.25, 1.0])
    .with_circular(vec![true, true, false, false]);
    let layout = layout_zaric(&cells, &ZaricOptions::default(), (500, 500)).expect("layout");
    assert_eq!(layout.cells.len(), 4);

    let extent = |i: usize| layout.cells[i].shape.extent();
    assert!(extent(0).0 > extent(1).0);
    assert!(extent(3).0 > extent(2).0);
    assert!(matches!(layout.cells[0].shape, CellShape::Circle { .. }));
    assert!(matches!(layout.cells[2].shape, CellShape::Rect { .. }));

    // symmetric colour scale around zero
    assert_eq!(layout.color_norm.vmin, Some(-1.0));
    assert_eq!(layout.color_norm.vmax, Some(1.0));
    assert_ne!(layout.cells[0].color, layout.cells[3].color);
}

#[test]
fn zaric_rejects_bad_input() {
    let empty = ZaricCells::new(vec![], vec![], vec![]);
    assert!(matches!(
        layout_zaric(&empty, &ZaricOptions::default(), (400, 400)),
        Err(Error::EmptyInput(_))
    ));

    let short = ZaricCells::new(labels(&["a", "b"]), labels(&["x"]), vec![1.0, 2.0]);
    assert!(matches!(
        layout_zaric(&short, &ZaricOptions::default(), (400, 400)),
        Err(Error::LengthMismatch { .. })
    ));

    let options = ZaricOptions {
        col_order: Some(labels(&["x"])),
        ..ZaricOptions::default()
    };
    let cells = ZaricCells::new(labels(&["a", "a"]), labels(&["x", "y"]), vec![1.0, 2.0]);
    assert!(matches!(layout_zaric(&cells, &options, (400, 400)), Err(Error::Shape(_))));
}

#[test]
fn matrix_flattens_into_zaric_cells() {
    let matrix = LabeledMatrix::new(
        labels(&["u", "v"]),
        labels(&["u", "v"]),
        array![[1.0, -0.4], [-0.4, 1.0]],
    )
    .expect("matrix");
    let mut kinds = Array2::from_elem((2, 2), Some(CorrType::NumVsNum));
    kinds[[0, 0]] = None;
    kinds[[1, 1]] = None;
    let mask = array![[true, false], [false, true]];

    let cells = zaric_cells(&matrix, Some(&kinds), Some(&mask));
    assert_eq!(cells.rows, labels(&["u", "u", "v", "v"]));
    assert_eq!(cells.cols, labels(&["u", "v", "u", "v"]));
    assert_eq!(cells.size, Some(vec![1.0, 0.4, 0.4, 1.0]));
    assert_eq!(cells.circular, Some(vec![false, true, true, false]));
    assert_eq!(drawn(&cells), vec![1, 2]);

    assert!(LabeledMatrix::new(labels(&["u"]), labels(&["u", "v"]), Array2::zeros((2, 2))).is_err());
}
