pub mod corr;
pub mod crosstab;
pub mod error;
pub mod finite;
pub mod grid;
pub mod heatmap;
pub mod histogram;
pub mod imscatter;
pub mod render;
pub mod smooth;
pub mod stats;
pub mod table;

pub use corr::{corr, corr_with, select_columns, Associations, CorrOptions, CorrType, Partition};
pub use crosstab::{crosstab_plot, numpy_crosstab, Crosstab, Normalize};
pub use error::{parse_option, Error, Result};
pub use finite::{make_finite, NanStrategy};
pub use grid::{infer_orient, proportion_plot, sorted_order, ColGrid, Interact, OrderBy, Orient};
pub use heatmap::{
    corr_heatmap, heatmap, CorrHeatmapOptions, HeatmapOptions, LabeledMatrix, MapType,
};
pub use histogram::{error_histogram, ErrorHistogramOptions, ErrorSummary};
pub use imscatter::{imscatter, FrameColor, ImScatterOptions, Image, PlacedImage};
pub use smooth::{smoothscatter, IntervalType, Lowess, SmoothScatterOptions, SmoothedSeries};
pub use stats::{rank_data, CorrMethod, Correlation};
pub use table::{split_col_by_type, Column, Table};
