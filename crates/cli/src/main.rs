use std::error::Error;
use std::fs::File;
use std::io::{self, Cursor, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use csv::WriterBuilder;
use flate2::{
    read::{GzDecoder, MultiGzDecoder},
    write::GzEncoder,
    Compression,
};
use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;
use tar::{Archive, Builder, Header};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mixcorr::heatmap::{ClusterSpec, CorrHeatmapPlot, HeatmapOptions};
use mixcorr::render::{save, Plot};
use mixcorr::{
    corr, crosstab_plot, numpy_crosstab, parse_option, Associations, CorrHeatmapOptions,
    CorrMethod, CorrOptions, CorrType, Crosstab, MapType, NanStrategy, Normalize, Table,
};

#[derive(Debug, Parser)]
#[command(name = "mixcorr", version, about = "Associations between mixed-type columns")]
struct Cli {
    /// Worker threads for pair evaluation; all cores by default.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Print a timing breakdown.
    #[arg(long, global = true)]
    time: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the association matrix of a table.
    Corr(CorrCommand),
    /// Draw the association heatmap of a table.
    Heatmap(HeatmapCommand),
    /// Count co-occurrences of two columns.
    Crosstab(CrosstabCommand),
}

#[derive(Debug, Args)]
struct CorrArgs {
    /// Delimited table (.csv, .tsv, optionally .gz or .tar.gz).
    table: String,

    #[arg(long, value_delimiter = ',')]
    categorical: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',')]
    numeric: Option<Vec<String>>,

    /// pearson, spearman or kendall.
    #[arg(long, default_value = "pearson")]
    method: String,

    /// mask or replace.
    #[arg(long, default_value = "mask")]
    nan_strategy: String,

    #[arg(long, default_value_t = 0.0)]
    nan_replace: f64,

    /// Symmetric uncertainty coefficient for categorical pairs.
    #[arg(long)]
    sym_u: bool,
}

impl CorrArgs {
    fn options(&self) -> mixcorr::Result<CorrOptions> {
        let mut options = CorrOptions::default()
            .with_method(parse_option::<CorrMethod>("correlation method", &self.method)?)
            .with_nan_strategy(parse_option::<NanStrategy>("nan strategy", &self.nan_strategy)?)
            .with_nan_replace_value(self.nan_replace)
            .with_sym_u(self.sym_u);
        options.categorical = self.categorical.clone();
        options.numeric = self.numeric.clone();
        Ok(options)
    }
}

#[derive(Debug, Args)]
struct CorrCommand {
    #[command(flatten)]
    corr: CorrArgs,

    /// Write JSON instead of a .tar.gz of TSV matrices.
    #[arg(long)]
    json: bool,

    /// Output path; JSON goes to stdout when omitted.
    #[arg(long, short)]
    output: Option<String>,
}

#[derive(Debug, Args)]
struct HeatmapCommand {
    #[command(flatten)]
    corr: CorrArgs,

    /// Output image (.svg or a bitmap format).
    image: String,

    /// zaric, standard or dendrograms.
    #[arg(long, default_value = "zaric")]
    map_type: String,

    /// Hide cells whose p-value is at least this bound.
    #[arg(long)]
    p_bound: Option<f64>,

    #[arg(long)]
    keep_diagonal: bool,

    #[arg(long)]
    annot: bool,

    #[arg(long)]
    row_cluster: bool,

    #[arg(long)]
    col_cluster: bool,

    #[arg(long, default_value_t = 900)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,
}

#[derive(Debug, Args)]
struct CrosstabCommand {
    table: String,
    /// Column shown along the plot's x axis.
    x: String,
    y: String,

    #[arg(long)]
    dropna: bool,

    #[arg(long)]
    shownan: bool,

    /// rows or columns.
    #[arg(long)]
    normalize: Option<String>,

    /// Draw the crosstab into this image.
    #[arg(long)]
    plot: Option<String>,

    #[arg(long, default_value = "zaric")]
    map_type: String,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 700)]
    height: u32,
}

/// Phase timings collected with `--time`.
#[derive(Default)]
struct Timings {
    enabled: bool,
    phases: Vec<(&'static str, Duration)>,
}

impl Timings {
    fn run<T>(&mut self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        if self.enabled {
            let elapsed = start.elapsed();
            eprintln!("{name} finished in {:.3} seconds.", elapsed.as_secs_f64());
            self.phases.push((name, elapsed));
        }
        out
    }

    fn report(&self) {
        if !self.enabled || self.phases.is_empty() {
            return;
        }
        let mut total = Duration::ZERO;
        for (name, duration) in &self.phases {
            eprintln!("{:<24}{:8.3} seconds", format!("{name}:"), duration.as_secs_f64());
            total += *duration;
        }
        eprintln!("{:<24}{:8.3} seconds", "Total time:", total.as_secs_f64());
    }
}

/// `.csv` tables are comma separated, everything else is tab separated.
fn delimiter_for(path: &str) -> u8 {
    let stem = path
        .trim_end_matches(".gz")
        .trim_end_matches(".tar");
    if stem.to_ascii_lowercase().ends_with(".csv") {
        b','
    } else {
        b'\t'
    }
}

fn read_table(path: &str) -> Result<Table, Box<dyn Error>> {
    if path.ends_with(".tar.gz") {
        let file = File::open(path)?;
        let mut archive = Archive::new(GzDecoder::new(file));
        for entry in archive.entries()? {
            let entry = entry?;
            if entry.header().entry_type().is_file() {
                let name = entry.path()?.to_string_lossy().into_owned();
                debug!(archive = path, entry = %name, "reading archive member");
                return Ok(Table::from_reader(entry, delimiter_for(&name))?);
            }
        }
        Err("No readable file found in tar archive".into())
    } else if path.ends_with(".gz") {
        let file = File::open(path)?;
        Ok(Table::from_reader(MultiGzDecoder::new(file), delimiter_for(path))?)
    } else {
        Ok(Table::from_reader(File::open(path)?, delimiter_for(path))?)
    }
}

/// File name of `path` without `.gz`, `.tar` and the table extension.
fn input_basename(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    let name = name.trim_end_matches(".gz").trim_end_matches(".tar");
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string()
}

fn matrix_tsv<T>(
    labels: &[String],
    matrix: &Array2<T>,
    cell: impl Fn(&T) -> String,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut buf = Vec::<u8>::new();
    {
        let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(&mut buf);
        wtr.write_record(std::iter::once("").chain(labels.iter().map(String::as_str)))?;
        for (label, row) in labels.iter().zip(matrix.rows()) {
            let cells: Vec<String> = row.iter().map(&cell).collect();
            wtr.write_record(std::iter::once(label.as_str()).chain(cells.iter().map(String::as_str)))?;
        }
        wtr.flush()?;
    }
    Ok(buf)
}

fn write_tar_gz(path: &str, entries: Vec<(String, Vec<u8>)>) -> Result<(), Box<dyn Error>> {
    let enc = GzEncoder::new(File::create(path)?, Compression::default());
    let mut tar_builder = Builder::new(enc);
    for (name, data) in entries {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar_builder.append_data(&mut header, name, &mut Cursor::new(data))?;
    }
    tar_builder.into_inner()?.finish()?;
    Ok(())
}

#[derive(Serialize)]
struct AssociationsJson<'a> {
    labels: &'a [String],
    categorical: &'a [String],
    numeric: &'a [String],
    values: Vec<Vec<f64>>,
    pvalues: Vec<Vec<f64>>,
    kinds: Vec<Vec<Option<CorrType>>>,
}

fn rows_of<T: Clone>(matrix: &Array2<T>) -> Vec<Vec<T>> {
    matrix.rows().into_iter().map(|r| r.to_vec()).collect()
}

fn write_associations(
    assoc: &Associations,
    cmd: &CorrCommand,
    method: &str,
) -> Result<(), Box<dyn Error>> {
    if cmd.json {
        let json = AssociationsJson {
            labels: &assoc.labels,
            categorical: &assoc.categorical,
            numeric: &assoc.numeric,
            values: rows_of(&assoc.values),
            pvalues: rows_of(&assoc.pvalues),
            kinds: rows_of(&assoc.kinds),
        };
        match &cmd.output {
            Some(path) => {
                serde_json::to_writer_pretty(File::create(path)?, &json)?;
                println!("Associations written to {path}.");
            }
            None => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                serde_json::to_writer_pretty(&mut lock, &json)?;
                writeln!(lock)?;
            }
        }
        return Ok(());
    }

    let base = format!("{}_{}", input_basename(&cmd.corr.table), method);
    let path = cmd
        .output
        .clone()
        .unwrap_or_else(|| format!("{base}_associations.tar.gz"));
    let entries = vec![
        (
            format!("{base}_values.tsv"),
            matrix_tsv(&assoc.labels, &assoc.values, |v| v.to_string())?,
        ),
        (
            format!("{base}_pvalues.tsv"),
            matrix_tsv(&assoc.labels, &assoc.pvalues, |v| v.to_string())?,
        ),
        (
            format!("{base}_kinds.tsv"),
            matrix_tsv(&assoc.labels, &assoc.kinds, |k| {
                k.map(|k| k.to_string()).unwrap_or_default()
            })?,
        ),
    ];
    write_tar_gz(&path, entries)?;
    println!("Associations written to {path}.");
    Ok(())
}

fn run_corr(cmd: &CorrCommand, timings: &mut Timings) -> Result<(), Box<dyn Error>> {
    let options = cmd.corr.options()?;
    let table = timings.run("Data loading", || read_table(&cmd.corr.table))?;
    // JSON on stdout stays machine readable
    let chatty = !(cmd.json && cmd.output.is_none());
    if chatty {
        println!("Table dimensions: {} rows x {} columns", table.n_rows(), table.n_cols());
        println!("Computing {} associations...", options.method);
    }
    let assoc = timings.run("Association matrix", || corr(&table, &options))?;
    if chatty {
        println!(
            "{} numeric and {} categorical columns used.",
            assoc.numeric.len(),
            assoc.categorical.len()
        );
    }
    let method = options.method.to_string();
    timings.run("Output writing", || write_associations(&assoc, cmd, &method))
}

fn heatmap_options(
    map_type: &str,
    annot: bool,
    row_cluster: bool,
    col_cluster: bool,
) -> mixcorr::Result<HeatmapOptions> {
    Ok(HeatmapOptions {
        map_type: parse_option::<MapType>("map type", map_type)?,
        annot: annot.then_some(true),
        row_cluster: row_cluster.then(ClusterSpec::default),
        col_cluster: col_cluster.then(ClusterSpec::default),
        ..HeatmapOptions::default()
    })
}

fn run_heatmap(cmd: &HeatmapCommand, timings: &mut Timings) -> Result<(), Box<dyn Error>> {
    let corr_options = cmd.corr.options()?;
    let options = CorrHeatmapOptions {
        mask_diagonal: !cmd.keep_diagonal,
        p_bound: cmd.p_bound,
        mask: None,
        heatmap: heatmap_options(&cmd.map_type, cmd.annot, cmd.row_cluster, cmd.col_cluster)?,
    };
    let table = timings.run("Data loading", || read_table(&cmd.corr.table))?;
    println!("Table dimensions: {} rows x {} columns", table.n_rows(), table.n_cols());

    let plot = CorrHeatmapPlot {
        table: &table,
        corr: &corr_options,
        options: &options,
    };
    let assoc = timings.run("Rendering", || save(&plot, &cmd.image, (cmd.width, cmd.height)))?;
    println!(
        "{} map of {} columns written to {}.",
        options.heatmap.map_type,
        assoc.len(),
        cmd.image
    );
    Ok(())
}

/// A crosstab drawn as a heatmap.
struct CrosstabFigure<'a> {
    x: (&'a str, &'a [Option<String>]),
    y: (&'a str, &'a [Option<String>]),
    dropna: bool,
    shownan: bool,
    normalize: Option<Normalize>,
    options: HeatmapOptions,
}

impl Plot for CrosstabFigure<'_> {
    type Output = Crosstab;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> mixcorr::Result<Crosstab> {
        crosstab_plot(
            area,
            self.x,
            self.y,
            self.dropna,
            self.shownan,
            self.normalize,
            &self.options,
        )
    }
}

fn print_crosstab(tab: &Crosstab) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(stdout.lock());
    let corner = format!(
        "{}\\{}",
        tab.row_name.as_deref().unwrap_or(""),
        tab.col_name.as_deref().unwrap_or("")
    );
    wtr.write_record(std::iter::once(corner.as_str()).chain(tab.col_labels.iter().map(String::as_str)))?;
    for (label, row) in tab.row_labels.iter().zip(tab.counts.rows()) {
        let cells: Vec<String> = row.iter().map(u64::to_string).collect();
        wtr.write_record(std::iter::once(label.as_str()).chain(cells.iter().map(String::as_str)))?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_crosstab(cmd: &CrosstabCommand, timings: &mut Timings) -> Result<(), Box<dyn Error>> {
    let normalize = cmd
        .normalize
        .as_deref()
        .map(|n| parse_option::<Normalize>("normalisation", n))
        .transpose()?;
    let table = timings.run("Data loading", || read_table(&cmd.table))?;
    let x = table.column(&cmd.x)?.to_categorical();
    let y = table.column(&cmd.y)?.to_categorical();

    let tab = match &cmd.plot {
        Some(image) => {
            let figure = CrosstabFigure {
                x: (cmd.x.as_str(), x.as_slice()),
                y: (cmd.y.as_str(), y.as_slice()),
                dropna: cmd.dropna,
                shownan: cmd.shownan,
                normalize,
                options: heatmap_options(&cmd.map_type, false, false, false)?,
            };
            let tab = timings.run("Rendering", || save(&figure, image, (cmd.width, cmd.height)))?;
            eprintln!("Crosstab plot written to {image}.");
            tab
        }
        None => {
            let mut tab = numpy_crosstab(&y, &x, cmd.dropna, cmd.shownan)?;
            tab.row_name = Some(cmd.y.clone());
            tab.col_name = Some(cmd.x.clone());
            tab
        }
    };
    print_crosstab(&tab)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Configure thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| format!("Failed to set thread pool: {}", e))?;
        eprintln!("Using {} threads.", threads);
    }

    let mut timings = Timings {
        enabled: cli.time,
        ..Timings::default()
    };
    match &cli.command {
        Command::Corr(cmd) => run_corr(cmd, &mut timings)?,
        Command::Heatmap(cmd) => run_heatmap(cmd, &mut timings)?,
        Command::Crosstab(cmd) => run_crosstab(cmd, &mut timings)?,
    }
    timings.report();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_follows_extension() {
        assert_eq!(delimiter_for("data.csv"), b',');
        assert_eq!(delimiter_for("data.csv.gz"), b',');
        assert_eq!(delimiter_for("data.tsv.gz"), b'\t');
        assert_eq!(delimiter_for("data.txt"), b'\t');
    }

    #[test]
    fn basename_strips_compression() {
        assert_eq!(input_basename("/tmp/titanic.csv"), "titanic");
        assert_eq!(input_basename("expr.tsv.gz"), "expr");
        assert_eq!(input_basename("bundle.tar.gz"), "bundle");
    }

    #[test]
    fn cli_parses_heatmap_flags() {
        let cli = Cli::parse_from([
            "mixcorr", "heatmap", "t.csv", "out.svg", "--map-type", "standard", "--p-bound", "0.05",
            "--categorical", "a,b",
        ]);
        let Command::Heatmap(cmd) = cli.command else {
            panic!("expected heatmap subcommand");
        };
        assert_eq!(cmd.corr.categorical, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(cmd.p_bound, Some(0.05));
        let options = heatmap_options(&cmd.map_type, cmd.annot, false, false).unwrap();
        assert_eq!(options.map_type, MapType::Standard);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let cli = Cli::parse_from(["mixcorr", "corr", "t.csv", "--method", "bicor"]);
        let Command::Corr(cmd) = cli.command else {
            panic!("expected corr subcommand");
        };
        assert!(cmd.corr.options().is_err());
    }
}
