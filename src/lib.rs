pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{FeishuClient, PlanningApi, ReadOnlyTable, RetryPolicy, TiktokClient};
pub use config::AppConfig;
pub use crate::core::{BatchDriver, BatchReport, RowPipeline};
pub use domain::model::{PipelineResult, RawRow, Stage, StageError, StageId};
pub use domain::ports::{AdsApi, AdvertiserConfig, ProgressEvent, ProgressSink, TableStore};
pub use utils::error::{AdsError, Result};
