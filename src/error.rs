// ==========================================
// 两剂次疫苗接种排程系统 - 统一错误类型
// ==========================================
// 职责: 汇总各层错误, 供库调用方统一处理
// ==========================================

use crate::config::ConfigError;
use crate::engine::ScheduleError;
use crate::exporter::ExportError;
use crate::importer::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("导入错误: {0}")]
    Import(#[from] ImportError),

    #[error("排程错误: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
