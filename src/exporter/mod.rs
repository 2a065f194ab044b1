// ==========================================
// 两剂次疫苗接种排程系统 - 导出层
// ==========================================
// 职责: 预约 CSV 写出 / 读回, 运行汇总 JSON
// 红线: 只在整次运行成功后写出
// ==========================================

pub mod assignment_csv;
pub mod error;
pub mod summary_json;

pub use assignment_csv::{AssignmentCsvReader, AssignmentCsvWriter, ASSIGNMENT_HEADER};
pub use error::{ExportError, ExportResult};
pub use summary_json::SummaryJsonWriter;
