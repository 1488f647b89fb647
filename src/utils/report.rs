use crate::domain::model::{IdOrigin, PipelineResult, StageError, StageOutcome};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// CSV 報表的一列
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    record_id: &'a str,
    success: bool,
    campaign_id: &'a str,
    campaign_status: &'static str,
    adgroup_id: &'a str,
    adgroup_status: &'static str,
    ad_id: &'a str,
    ad_status: &'static str,
    error: &'a str,
    write_back_error: &'a str,
}

fn split(outcome: &StageOutcome) -> (&str, &'static str) {
    match outcome {
        Ok(stage_id) => (
            stage_id.id.as_str(),
            match stage_id.origin {
                IdOrigin::Existing => "existing",
                IdOrigin::Reused => "reused",
                IdOrigin::Created => "created",
            },
        ),
        Err(StageError::CallFailed { .. }) => ("", "failed"),
        Err(StageError::Skipped { .. }) => ("", "skipped"),
    }
}

pub fn write_report<W: Write>(writer: W, results: &[PipelineResult]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for result in results {
        let (campaign_id, campaign_status) = split(&result.campaign);
        let (adgroup_id, adgroup_status) = split(&result.adgroup);
        let (ad_id, ad_status) = split(&result.ad);

        csv_writer.serialize(ReportRow {
            record_id: &result.record_id,
            success: result.success,
            campaign_id,
            campaign_status,
            adgroup_id,
            adgroup_status,
            ad_id,
            ad_status,
            error: result.error.as_deref().unwrap_or_default(),
            write_back_error: result.write_back_error.as_deref().unwrap_or_default(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_report_file<P: AsRef<Path>>(path: P, results: &[PipelineResult]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(&path)?;
    write_report(file, results)?;
    tracing::info!("📁 Report saved to: {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Stage, StageId};

    #[test]
    fn test_report_columns_and_statuses() {
        let ok = PipelineResult::new(
            "recA".to_string(),
            Ok(StageId::reused("C1")),
            Ok(StageId::created("G1")),
            Ok(StageId::existing("A1")),
        );
        let failed = PipelineResult::new(
            "recB".to_string(),
            Err(StageError::CallFailed {
                stage: Stage::Campaign,
                message: "HTTP error! status: 500".to_string(),
            }),
            Err(StageError::Skipped {
                stage: Stage::AdGroup,
                upstream: Stage::Campaign,
            }),
            Err(StageError::Skipped {
                stage: Stage::Ad,
                upstream: Stage::Campaign,
            }),
        );

        let mut buffer = Vec::new();
        write_report(&mut buffer, &[ok, failed]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "record_id,success,campaign_id,campaign_status,adgroup_id,adgroup_status,ad_id,ad_status,error,write_back_error"
        );
        assert_eq!(lines[1], "recA,true,C1,reused,G1,created,A1,existing,,");
        assert!(lines[2].starts_with("recB,false,,failed,,skipped,,skipped,"));
    }

    #[test]
    fn test_report_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.csv");

        write_report_file(&path, &[]).unwrap();

        assert!(path.exists());
    }
}
