pub mod association;
pub mod correlation;
pub mod describe;
pub mod pvalue;
pub mod rank;

pub use association::{conditional_entropy, correlation_ratio, entropy, theils_sym_u, theils_u};
pub use correlation::{kendall, pearson, spearman, CorrMethod, Correlation};
pub use rank::rank_data;
