// ==========================================
// 两剂次疫苗接种排程系统 - 引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 无重试; 任一错误都使整次运行无效
// ==========================================

use crate::domain::types::Phase;
use chrono::NaiveDate;
use thiserror::Error;

/// 排程引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    // ===== 供给错误 =====
    #[error("受种者队列已空但仍有剩余配额 (接种点 {clinic_id}, 阶段 {phase})")]
    SupplyExhaustion { clinic_id: String, phase: Phase },

    // ===== 数据错误 =====
    #[error("批次 {lot_id} 引用了未知疫苗品牌 {brand_id}")]
    UnknownBrand { lot_id: String, brand_id: String },

    #[error("受种者 {patient_id} 的接种记录引用了未知疫苗品牌 {brand_id}")]
    UnknownEventBrand { patient_id: String, brand_id: String },

    #[error("疫苗品牌 {brand_id} 的所需剂次为 0")]
    InvalidBrand { brand_id: String },

    #[error("接种点 {clinic_id} 日接种能力为 0")]
    ZeroDailyCapacity { clinic_id: String },

    // ===== 日期错误 =====
    #[error("日期计算溢出: {base} + {days} 天")]
    DateArithmeticOverflow { base: NaiveDate, days: u64 },
}

/// Result 类型别名
pub type ScheduleResult<T> = Result<T, ScheduleError>;
