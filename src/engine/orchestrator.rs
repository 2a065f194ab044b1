// ==========================================
// 两剂次疫苗接种排程系统 - 引擎编排器
// ==========================================
// 用途: 协调各引擎的执行顺序
// 流程: 评分 -> 分组排队 -> 批次排序 -> 逐阶段分配 -> 台账排序
// ==========================================
// 红线: 单线程顺序执行; 任一步失败则整次运行无效
// ==========================================

use crate::config::ScheduleConfig;
use crate::domain::assignment::{Assignment, VaccinationEvent};
use crate::domain::clinic::Clinic;
use crate::domain::exclusion::ExclusionSet;
use crate::domain::patient::PatientRecord;
use crate::domain::vaccine::{VaccineBrand, VaccineLot};
use crate::engine::capacity_allocator::{CapacityAllocator, PhaseSummary};
use crate::engine::error::ScheduleResult;
use crate::engine::ledger::AssignmentLedger;
use crate::engine::lot_scheduler::LotScheduler;
use crate::engine::patient_queue::PatientQueues;
use crate::engine::priority::{LookupMiss, PriorityModel, PriorityTables};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// ScheduleInput - 排程输入
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScheduleInput {
    pub clinics: Vec<Clinic>,                   // 加载顺序即轮询顺序
    pub patients: Vec<PatientRecord>,
    pub tables: PriorityTables,
    pub brands: HashMap<String, VaccineBrand>,
    pub lots: Vec<VaccineLot>,
    pub exclusions: ExclusionSet,
}

// ==========================================
// ScheduleRunSummary - 运行汇总
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub patients_loaded: usize,
    pub patients_excluded_skipped: usize,
    pub lookup_misses: usize,
    pub lots_total: usize,
    pub lots_usable: usize,
    pub phases: Vec<PhaseSummary>,
    pub total_assignments: usize,
}

// ==========================================
// ScheduleRun - 排程结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    pub assignments: Vec<Assignment>, // 已按输出键排序
    pub lookup_misses: Vec<LookupMiss>,
    pub summary: ScheduleRunSummary,
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator {
    priority: PriorityModel,
    lot_scheduler: LotScheduler,
    allocator: CapacityAllocator,
}

impl ScheduleOrchestrator {
    /// 构造函数
    ///
    /// # 参数
    /// - `config`: 已校验的排程配置
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            priority: PriorityModel::from_config(config),
            lot_scheduler: LotScheduler::new(),
            allocator: CapacityAllocator::from_config(config),
        }
    }

    /// 执行完整排程
    #[instrument(skip_all, fields(
        clinics = input.clinics.len(),
        patients = input.patients.len(),
        lots = input.lots.len()
    ))]
    pub fn run(&self, input: ScheduleInput) -> ScheduleResult<ScheduleRun> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "开始排程");

        let ScheduleInput {
            clinics,
            patients,
            tables,
            brands,
            lots,
            exclusions,
        } = input;
        let patients_loaded = patients.len();

        // 1. 评分
        let scoring = self.priority.score_all(patients, &tables);

        // 2. 按接种点排队
        let mut queues = PatientQueues::build(scoring.patients);

        // 3. 批次排序
        let mut scheduled_lots = self.lot_scheduler.schedule(&lots, &brands)?;
        let lots_usable = scheduled_lots.iter().filter(|l| l.is_usable()).count();

        // 4. 逐阶段分配
        let outcome = self
            .allocator
            .allocate(&clinics, &mut scheduled_lots, &mut queues, &exclusions)?;

        // 5. 输出排序
        let assignments = outcome.ledger.into_sorted();

        let summary = ScheduleRunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            patients_loaded,
            patients_excluded_skipped: queues.excluded_skipped(),
            lookup_misses: scoring.lookup_misses.len(),
            lots_total: scheduled_lots.len(),
            lots_usable,
            phases: outcome.phases,
            total_assignments: assignments.len(),
        };

        info!(
            %run_id,
            patients_loaded = summary.patients_loaded,
            excluded_skipped = summary.patients_excluded_skipped,
            lookup_misses = summary.lookup_misses,
            lots_usable = summary.lots_usable,
            total_assignments = summary.total_assignments,
            "排程完成"
        );

        Ok(ScheduleRun {
            assignments,
            lookup_misses: scoring.lookup_misses,
            summary,
        })
    }

    /// 对账模式: 由实际接种记录生成预约（不经过评分与分配）
    pub fn reconcile(
        &self,
        events: &[VaccinationEvent],
        brands: &HashMap<String, VaccineBrand>,
    ) -> ScheduleResult<Vec<Assignment>> {
        Ok(AssignmentLedger::reconcile(events, brands)?.into_sorted())
    }
}
