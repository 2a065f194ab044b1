// ==========================================
// 两剂次疫苗接种排程系统 - 导入层
// ==========================================
// 职责: 外部数据导入, 生成领域记录
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod dataset_loader;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use dataset_loader::InputDataset;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
