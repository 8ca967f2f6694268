use mixcorr::heatmap::corr_mask;
use mixcorr::stats::{correlation_ratio, theils_sym_u, theils_u};
use mixcorr::table::format_category;
use mixcorr::{
    corr, parse_option, select_columns, CorrHeatmapOptions, CorrMethod, CorrOptions, CorrType,
    Error, NanStrategy, Table,
};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn mixed_table() -> Table {
    Table::new()
        .with_numeric("age", vec![22.0, 38.0, 26.0, 35.0, f64::NAN, 54.0, 2.0, 27.0])
        .and_then(|t| t.with_numeric("fare", vec![7.25, 71.3, 7.9, 53.1, 8.05, 51.9, 21.1, 11.1]))
        .and_then(|t| {
            t.with_categorical(
                "sex",
                vec![Some("m"), Some("f"), Some("f"), Some("f"), Some("m"), None, Some("m"), Some("f")],
            )
        })
        .and_then(|t| {
            t.with_categorical(
                "class",
                vec![Some("3"), Some("1"), Some("3"), Some("1"), Some("3"), Some("1"), Some("3"), Some("3")],
            )
        })
        .expect("table")
}

#[test]
fn diagonal_is_one_for_every_strategy() {
    let table = mixed_table();
    for strategy in [NanStrategy::Mask, NanStrategy::Replace] {
        let assoc = corr(&table, &CorrOptions::default().with_nan_strategy(strategy)).expect("corr");
        assert_eq!(assoc.len(), 4);
        for i in 0..assoc.len() {
            assert_eq!(assoc.values[[i, i]], 1.0);
            assert_eq!(assoc.pvalues[[i, i]], 0.0);
            assert_eq!(assoc.kinds[[i, i]], None);
        }
    }
}

#[test]
fn kinds_are_symmetric_and_follow_roles() {
    let assoc = corr(&mixed_table(), &CorrOptions::default()).expect("corr");
    let n = assoc.len();
    for i in 0..n {
        for j in 0..n {
            assert_eq!(assoc.kinds[[i, j]], assoc.kinds[[j, i]]);
        }
    }
    assert_eq!(assoc.kind("age", "fare"), Some(CorrType::NumVsNum));
    assert_eq!(assoc.kind("age", "sex"), Some(CorrType::NumVsCat));
    assert_eq!(assoc.kind("sex", "class"), Some(CorrType::CatVsCat));
    assert_eq!(assoc.numeric, strings(&["age", "fare"]));
    assert_eq!(assoc.categorical, strings(&["sex", "class"]));
}

#[test]
fn numeric_pairs_are_exactly_symmetric() {
    for method in [CorrMethod::Pearson, CorrMethod::Spearman, CorrMethod::Kendall] {
        let assoc = corr(&mixed_table(), &CorrOptions::default().with_method(method)).expect("corr");
        let (a, f) = (assoc.index_of("age").unwrap(), assoc.index_of("fare").unwrap());
        assert_eq!(assoc.values[[a, f]], assoc.values[[f, a]]);
        assert!(assoc.values[[a, f]].abs() <= 1.0);
    }
}

#[test]
fn uncertainty_coefficient_is_asymmetric_unless_requested() {
    let table = Table::new()
        .with_categorical("fine", vec![Some("a"), Some("a"), Some("b"), Some("b"), Some("c"), Some("c")])
        .and_then(|t| {
            t.with_categorical("coarse", vec![Some("p"), Some("p"), Some("q"), Some("q"), Some("q"), Some("q")])
        })
        .expect("table");

    let asym = corr(&table, &CorrOptions::default()).expect("corr");
    // knowing `fine` determines `coarse`
    assert!(approx_eq(asym.value("coarse", "fine").unwrap(), 1.0, 1e-12));
    assert!(asym.value("fine", "coarse").unwrap() < 1.0);

    let sym = corr(&table, &CorrOptions::default().with_sym_u(true)).expect("corr");
    assert_eq!(sym.value("coarse", "fine"), sym.value("fine", "coarse"));
}

#[test]
fn mask_only_uses_complete_rows() {
    let table = Table::new()
        .with_numeric("A", vec![1.0, 2.0, 3.0, f64::NAN])
        .and_then(|t| t.with_categorical("B", vec![Some("x"), Some("y"), Some("x"), Some("y")]))
        .expect("table");

    let assoc = corr(&table, &CorrOptions::default()).expect("corr");
    let expected = correlation_ratio(&strings(&["x", "y", "x"]), &[1.0, 2.0, 3.0]);
    assert_eq!(assoc.value("A", "B"), Some(expected));
    assert_eq!(assoc.kind("A", "B"), Some(CorrType::NumVsCat));

    let replaced = corr(
        &table,
        &CorrOptions::default()
            .with_nan_strategy(NanStrategy::Replace)
            .with_nan_replace_value(0.0),
    )
    .expect("corr");
    let expected = correlation_ratio(&strings(&["x", "y", "x", "y"]), &[1.0, 2.0, 3.0, 0.0]);
    assert!(approx_eq(replaced.value("A", "B").unwrap(), expected, 1e-12));
    assert!(approx_eq(expected, 0.2f64.sqrt(), 1e-12));
}

#[test]
fn strategies_agree_without_invalid_values() {
    let table = Table::new()
        .with_numeric("x", vec![1.0, 4.0, 2.0, 8.0, 5.0])
        .and_then(|t| t.with_numeric("y", vec![2.0, 3.0, 1.0, 9.0, 4.0]))
        .and_then(|t| t.with_categorical("g", vec![Some("u"), Some("v"), Some("u"), Some("v"), Some("u")]))
        .expect("table");
    let masked = corr(&table, &CorrOptions::default()).expect("corr");
    let replaced = corr(&table, &CorrOptions::default().with_nan_strategy(NanStrategy::Replace))
        .expect("corr");
    assert_eq!(masked.values, replaced.values);
    assert_eq!(masked.pvalues, replaced.pvalues);
}

#[test]
fn explicit_roles_override_storage_type() {
    let table = Table::new()
        .with_numeric("pclass", vec![1.0, 3.0, 2.0, 3.0])
        .and_then(|t| t.with_numeric("fare", vec![80.0, 7.0, 20.0, 8.0]))
        .and_then(|t| t.with_numeric("unused", vec![0.0, 1.0, 0.0, 1.0]))
        .expect("table");
    let options = CorrOptions::default()
        .with_categorical(["pclass"])
        .with_numeric(["fare"]);
    let assoc = corr(&table, &options).expect("corr");
    assert_eq!(assoc.labels, strings(&["pclass", "fare"]));
    assert_eq!(assoc.kind("pclass", "fare"), Some(CorrType::CatVsNum));
}

#[test]
fn perfect_linear_relation_has_tiny_pvalue() {
    let table = Table::new()
        .with_numeric("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .and_then(|t| t.with_numeric("y", vec![-2.0, -4.0, -6.0, -8.0, -10.0, -12.0]))
        .expect("table");
    let assoc = corr(&table, &CorrOptions::default()).expect("corr");
    assert!(approx_eq(assoc.value("x", "y").unwrap(), -1.0, 1e-12));
    assert!(assoc.pvalue("x", "y").unwrap() < 1e-6);
}

#[test]
fn correlation_mask_hides_insignificant_cells_and_diagonal() {
    let table = Table::new()
        .with_numeric("x", vec![1.0, 2.0, 3.0, 4.0])
        .and_then(|t| t.with_numeric("twice", vec![2.0, 4.0, 6.0, 8.0]))
        .and_then(|t| t.with_numeric("flat", vec![1.0, -1.0, -1.0, 1.0]))
        .expect("table");
    let assoc = corr(&table, &CorrOptions::default()).expect("corr");
    let options = CorrHeatmapOptions {
        p_bound: Some(0.05),
        ..CorrHeatmapOptions::default()
    };
    let mask = corr_mask(&assoc, &options).expect("mask");
    let (x, twice, flat) = (0, 1, 2);
    assert!(mask[[x, x]] && mask[[flat, flat]]);
    assert!(!mask[[x, twice]]);
    assert!(mask[[x, flat]] && mask[[flat, x]]);

    let keep = CorrHeatmapOptions {
        mask_diagonal: false,
        ..CorrHeatmapOptions::default()
    };
    assert!(corr_mask(&assoc, &keep).expect("mask").iter().all(|&m| !m));
}

#[test]
fn entropy_based_measures() {
    let x = strings(&["a", "b", "a", "c", "b", "a"]);
    let y = strings(&["p", "q", "q", "p", "q", "p"]);
    assert!(approx_eq(theils_u(&x, &x), 1.0, 1e-12));
    assert_eq!(theils_sym_u(&x, &y), theils_sym_u(&y, &x));
    let constant = strings(&["k", "k", "k"]);
    assert_eq!(theils_sym_u(&constant, &constant), 1.0);

    let groups = strings(&["lo", "lo", "hi", "hi"]);
    assert!(approx_eq(correlation_ratio(&groups, &[1.0, 1.0, 5.0, 5.0]), 1.0, 1e-12));
    assert!(correlation_ratio(&[], &[]).is_nan());
}

#[test]
fn unknown_option_names_are_reported() {
    let err = parse_option::<NanStrategy>("nan strategy", "drop").unwrap_err();
    assert!(matches!(err, Error::UnknownOption { kind: "nan strategy", .. }));
    assert_eq!(parse_option::<NanStrategy>("nan strategy", "Replace").unwrap(), NanStrategy::Replace);
    assert_eq!(parse_option::<CorrMethod>("method", "kendall_tau").unwrap(), CorrMethod::Kendall);
}

#[test]
fn table_reader_infers_column_types() {
    let data = "name,age,survived\nann,22,1\nbob,NA,0\n,31,1\n";
    let table = Table::from_reader(data.as_bytes(), b',').expect("csv");
    assert_eq!(table.n_rows(), 3);
    let (cat, num) = mixcorr::split_col_by_type(&table);
    assert_eq!(cat, strings(&["name"]));
    assert_eq!(num, strings(&["age", "survived"]));
    assert!(matches!(table.column("missing"), Err(Error::MissingColumn(_))));
}

#[test]
fn pair_kinds_serialize_in_snake_case() {
    assert_eq!(serde_json::to_string(&CorrType::NumVsCat).unwrap(), "\"num_vs_cat\"");
    assert_eq!(CorrType::CatVsCat.to_string(), "cat_vs_cat");
    let kind: CorrType = serde_json::from_str("\"cat_vs_num\"").unwrap();
    assert_eq!(kind, CorrType::CatVsNum);
}

#[test]
fn column_in_both_role_lists_is_numeric() {
    let table = mixed_table();
    let options = CorrOptions::default()
        .with_categorical(["sex", "class"])
        .with_numeric(["age", "class"]);
    let assoc = corr(&table, &options).expect("corr");
    assert_eq!(assoc.labels, strings(&["age", "sex", "class"]));
    assert_eq!(assoc.numeric, strings(&["age", "class"]));
    assert_eq!(assoc.categorical, strings(&["sex"]));
    assert_eq!(assoc.kind("age", "class"), Some(CorrType::NumVsNum));
    assert_eq!(assoc.kind("sex", "class"), Some(CorrType::CatVsNum));
    assert_eq!(assoc.kind("age", "sex"), Some(CorrType::NumVsCat));
    assert_eq!(assoc.index_of("fare"), None);
}

#[test]
fn missing_role_list_is_inferred_from_the_other() {
    let table = mixed_table();

    let cats = strings(&["age", "sex"]);
    let only_cat = select_columns(&table, Some(&cats), None);
    assert_eq!(only_cat.categorical, strings(&["age", "sex"]));
    assert_eq!(only_cat.numeric, strings(&["fare"]));
    assert_eq!(only_cat.selected, strings(&["age", "fare", "sex"]));

    let nums = strings(&["fare", "class"]);
    let only_num = select_columns(&table, None, Some(&nums));
    assert_eq!(only_num.numeric, strings(&["fare", "class"]));
    assert_eq!(only_num.categorical, strings(&["sex"]));
    assert!(only_num.is_numeric("class") && !only_num.is_numeric("age"));

    let assoc = corr(&table, &CorrOptions::default().with_categorical(["age", "sex"])).expect("corr");
    assert_eq!(assoc.kind("age", "fare"), Some(CorrType::CatVsNum));
    assert_eq!(assoc.kind("age", "sex"), Some(CorrType::CatVsCat));
}

#[test]
fn infinities_are_categories_not_missing() {
    assert_eq!(format_category(f64::INFINITY), "inf");
    assert_eq!(format_category(f64::NEG_INFINITY), "-inf");

    let table = Table::new()
        .with_numeric("n", vec![1.0, f64::INFINITY, 2.0, f64::INFINITY])
        .and_then(|t| t.with_categorical("g", vec![Some("a"), Some("b"), Some("a"), Some("b")]))
        .expect("table");
    let assoc = corr(&table, &CorrOptions::default().with_categorical(["n", "g"])).expect("corr");
    assert_eq!(assoc.kind("n", "g"), Some(CorrType::CatVsCat));
    assert!(approx_eq(assoc.value("n", "g").unwrap(), 2.0 / 3.0, 1e-9));
    assert!(approx_eq(assoc.value("g", "n").unwrap(), 1.0, 1e-9));
}
