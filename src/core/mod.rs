pub mod batch;
pub mod format;
pub mod orchestrator;
pub mod reuse;

pub use crate::domain::model::{CarryOverState, FormattedRow, PipelineResult, RawRow};
pub use crate::domain::ports::{AdsApi, AdvertiserConfig, ProgressSink, TableStore};
pub use crate::utils::error::Result;
pub use batch::{read_all_rows, select_records, BatchDriver, BatchReport};
pub use orchestrator::RowPipeline;
