pub mod dry_run;
pub mod feishu;
pub mod http;
pub mod tiktok;

pub use dry_run::{PlanningApi, ReadOnlyTable};
pub use feishu::{FeishuClient, FeishuSettings};
pub use http::{post_with_retry, ReqwestTransport, RetryPolicy};
pub use tiktok::TiktokClient;
