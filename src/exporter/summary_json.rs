// ==========================================
// 两剂次疫苗接种排程系统 - 运行汇总 JSON 导出
// ==========================================

use crate::engine::orchestrator::ScheduleRunSummary;
use crate::exporter::error::{ExportError, ExportResult};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

pub struct SummaryJsonWriter;

impl SummaryJsonWriter {
    /// 以缩进格式写出运行汇总
    pub fn write_file<P: AsRef<Path>>(&self, path: P, summary: &ScheduleRunSummary) -> ExportResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
        info!(path = %path.display(), run_id = %summary.run_id, "运行汇总写出完成");
        Ok(())
    }
}
