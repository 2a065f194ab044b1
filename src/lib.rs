// ==========================================
// 两剂次疫苗接种排程系统 - 核心库
// ==========================================
// 系统定位: 离线批量计算 (单次运行, 结果确定)
// 流程: 导入 -> 评分 -> 分配 -> 排序 -> 导出
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 评分与分配
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 导出层 - 结果文件
pub mod exporter;

// 配置层 - 排程配置
pub mod config;

// 统一错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DoseNumber, HealthFlag, Phase};

// 领域实体
pub use domain::{
    Assignment, Clinic, ExclusionSet, Patient, PatientRecord, VaccinationEvent, VaccineBrand,
    VaccineLot,
};

// 配置
pub use config::ScheduleConfig;

// 引擎
pub use engine::{
    AppointmentDateResolver, AssignmentLedger, CapacityAllocator, LotScheduler, PriorityModel,
    ScheduleInput, ScheduleOrchestrator, ScheduleRun, ScheduleRunSummary,
};

// 错误
pub use error::{AppError, AppResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "两剂次疫苗接种排程系统";
