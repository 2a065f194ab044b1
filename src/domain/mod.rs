// ==========================================
// 两剂次疫苗接种排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、产能约束接口
// 红线: 不含文件读写逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod capacity;
pub mod clinic;
pub mod exclusion;
pub mod patient;
pub mod types;
pub mod vaccine;

// 重导出核心类型
pub use assignment::{Assignment, VaccinationEvent};
pub use capacity::{CapacityConstraint, ClinicQuota, DailyDoseTally, PhaseCapacityState};
pub use clinic::{Clinic, PhaseQuotas};
pub use exclusion::{ExclusionEntry, ExclusionSet};
pub use patient::{Patient, PatientAttributes, PatientRecord, PriorityComponents};
pub use types::{DoseNumber, HealthFlag, Phase, PhaseParseError};
pub use vaccine::{VaccineBrand, VaccineLot};
