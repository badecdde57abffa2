pub mod util;

pub use util::{parse_seeds, parse_strategies, run_label, write_export};
