//! Bar sources and analysis export

pub mod csv_feed;
pub mod export;
pub mod provider;
pub mod synthetic;

pub use csv_feed::{read_bars, read_bars_from_path, CsvFeed};
pub use export::{analysis_json, write_analysis_csv, write_analysis_csv_file};
pub use provider::{BarFeed, FeedError};
pub use synthetic::SyntheticFeed;
