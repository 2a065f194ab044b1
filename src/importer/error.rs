// ==========================================
// 两剂次疫苗接种排程系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::PhaseParseError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("字段映射失败 ({table} 行 {row}): {message}")]
    FieldMappingError {
        table: &'static str,
        row: usize,
        message: String,
    },

    #[error("类型转换失败 ({table} 行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        table: &'static str,
        row: usize,
        field: String,
        message: String,
    },

    #[error("日期格式错误 ({table} 行 {row}, 字段 {field}): 期望 DD/MM/YYYY 或 YYYY-MM-DD，实际 {value}")]
    DateFormatError {
        table: &'static str,
        row: usize,
        field: String,
        value: String,
    },

    // ===== 数据质量错误 =====
    #[error("主键缺失 ({table} 行 {row}): {field} 为空")]
    PrimaryKeyMissing {
        table: &'static str,
        row: usize,
        field: &'static str,
    },

    #[error("接种阶段无效 ({table} 行 {row}): {source}")]
    InvalidPhase {
        table: &'static str,
        row: usize,
        #[source]
        source: PhaseParseError,
    },

    #[error("疫苗品牌 {brand_id} 的所需剂次为 0")]
    InvalidBrand { brand_id: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
