// ==========================================
// 两剂次疫苗接种排程系统 - 引擎层
// ==========================================
// 职责: 评分、排队、批次调度、产能分配、日期解析、台账
// 红线: 引擎不读写文件, 配置显式传入
// ==========================================

pub mod capacity_allocator;
pub mod date_resolver;
pub mod error;
pub mod ledger;
pub mod lot_scheduler;
pub mod orchestrator;
pub mod patient_queue;
pub mod priority;

// 重导出核心引擎
pub use capacity_allocator::{AllocationOutcome, CapacityAllocator, PhaseSummary};
pub use date_resolver::AppointmentDateResolver;
pub use error::{ScheduleError, ScheduleResult};
pub use ledger::AssignmentLedger;
pub use lot_scheduler::{LotScheduler, ScheduledLot};
pub use orchestrator::{ScheduleInput, ScheduleOrchestrator, ScheduleRun, ScheduleRunSummary};
pub use patient_queue::{PatientQueue, PatientQueues};
pub use priority::{
    LookupMiss, PriorityDimension, PriorityModel, PriorityTable, PriorityTables, ScoringOutcome,
};
