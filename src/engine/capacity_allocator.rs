// ==========================================
// 两剂次疫苗接种排程系统 - 产能分配引擎
// ==========================================
// 职责: 逐阶段、逐批次在各接种点间轮询分配受种者
// 输入: 接种点 + 已排序批次 + 受种者队列 + 排除名单
// 输出: 预约台账 + 各阶段汇总
// ==========================================
// 红线: 阶段内严格顺序执行 (序号依赖轮询顺序)
// 红线: 配额计数不得为负; 第二剂 >= 第一剂 + 品牌间隔
// ==========================================

use crate::config::{
    AllocationPolicy, CapacityConfig, LotRoundsPolicy, ScheduleConfig, SecondDoseAnchor,
    TallyScope,
};
use crate::domain::assignment::Assignment;
use crate::domain::capacity::{CapacityConstraint, DailyDoseTally, PhaseCapacityState};
use crate::domain::clinic::Clinic;
use crate::domain::exclusion::ExclusionSet;
use crate::domain::types::{DoseNumber, Phase};
use crate::engine::date_resolver::{add_days, AppointmentDateResolver};
use crate::engine::error::{ScheduleError, ScheduleResult};
use crate::engine::ledger::AssignmentLedger;
use crate::engine::lot_scheduler::ScheduledLot;
use crate::engine::patient_queue::PatientQueues;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

// ==========================================
// PhaseSummary - 单阶段汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub quota_total: u64,
    pub patients_assigned: u64,
    pub unfilled_quota: u64,
    pub rounds_consumed: u64,
    pub lots_drawn: usize,
}

/// 全部阶段分配结果
#[derive(Debug, Clone, Default)]
pub struct AllocationOutcome {
    pub ledger: AssignmentLedger,
    pub phases: Vec<PhaseSummary>,
}

// ==========================================
// CapacityAllocator - 产能分配引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct CapacityAllocator {
    capacity: CapacityConfig,
    policy: AllocationPolicy,
    resolver: AppointmentDateResolver,
}

impl CapacityAllocator {
    pub fn new(capacity: CapacityConfig, policy: AllocationPolicy) -> Self {
        Self {
            capacity,
            policy,
            resolver: AppointmentDateResolver::new(),
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.capacity.clone(), config.policy)
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 按固定顺序分配全部 12 个阶段
    ///
    /// # 参数
    /// - `clinics`: 接种点（加载顺序即轮询顺序）
    /// - `lots`: 已按到货日期排序的批次（累计模式下会被修改）
    /// - `queues`: 受种者队列（跨阶段共享, 会被消耗）
    /// - `exclusions`: 排除名单
    ///
    /// # 返回
    /// - Err(SupplyExhaustion): 某接种点仍有配额但队列已空
    #[instrument(skip_all, fields(
        clinics = clinics.len(),
        lots = lots.len(),
        lot_rounds = ?self.policy.lot_rounds,
        tally_scope = ?self.policy.tally_scope
    ))]
    pub fn allocate(
        &self,
        clinics: &[Clinic],
        lots: &mut [ScheduledLot],
        queues: &mut PatientQueues,
        exclusions: &ExclusionSet,
    ) -> ScheduleResult<AllocationOutcome> {
        self.check_daily_capacity(clinics)?;

        let mut outcome = AllocationOutcome::default();
        let mut shared_tally = DailyDoseTally::new();

        for phase in Phase::ALL {
            let mut phase_tally = DailyDoseTally::new();
            let tally = match self.policy.tally_scope {
                TallyScope::PerPhase => &mut phase_tally,
                TallyScope::Shared => &mut shared_tally,
            };

            let summary =
                self.allocate_phase(phase, clinics, lots, queues, exclusions, tally, &mut outcome.ledger)?;
            outcome.phases.push(summary);
        }

        info!(
            assignments = outcome.ledger.len(),
            excluded_skipped = queues.excluded_skipped(),
            "全部阶段分配完成"
        );
        Ok(outcome)
    }

    /// 单阶段分配
    ///
    /// 规则：
    /// 1) 剩余配额 = 接种点该阶段配额; 配额 <= 0 的接种点不参与
    /// 2) 批次轮次 > 1 才参与; 进入后逐轮分配直到轮次耗尽
    /// 3) 每轮按加载顺序遍历接种点, 有剩余配额则出队一人
    /// 4) 每轮遍历结束后, 全部配额已满则结束本阶段
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(phase = %phase))]
    pub fn allocate_phase(
        &self,
        phase: Phase,
        clinics: &[Clinic],
        lots: &mut [ScheduledLot],
        queues: &mut PatientQueues,
        exclusions: &ExclusionSet,
        tally: &mut DailyDoseTally,
        ledger: &mut AssignmentLedger,
    ) -> ScheduleResult<PhaseSummary> {
        let mut state = PhaseCapacityState::new(phase, clinics);
        let quota_total = state.total_quota();
        let mut rounds_consumed: u64 = 0;
        let mut lots_drawn = 0;

        if quota_total > 0 {
            'lots: for lot in lots.iter_mut() {
                let mut rounds = match self.policy.lot_rounds {
                    LotRoundsPolicy::PerPhaseReset => lot.rounds_total,
                    LotRoundsPolicy::Cumulative => lot.rounds_remaining,
                };
                if rounds <= 1 {
                    continue;
                }

                let before = rounds;
                // 进入门槛是轮次 > 1, 进入后一直分配到 0 (3 轮批次两接种点可排 3 人)
                while rounds > 0 {
                    let mut served_in_pass = 0;
                    for (idx, clinic) in clinics.iter().enumerate() {
                        if rounds == 0 {
                            break;
                        }
                        if !state.can_serve(idx) {
                            continue;
                        }

                        self.assign_patient(
                            phase, clinic, idx, lot, &mut state, queues, exclusions, tally, ledger,
                        )?;
                        rounds -= 1;
                        served_in_pass += 1;
                    }

                    if state.is_exhausted() || served_in_pass == 0 {
                        break;
                    }
                }

                let used = before - rounds;
                if used > 0 {
                    lots_drawn += 1;
                    rounds_consumed += used as u64;
                    debug!(lot_id = %lot.lot_id, rounds_used = used, rounds_left = rounds, "批次分配");
                }
                if self.policy.lot_rounds == LotRoundsPolicy::Cumulative {
                    lot.rounds_remaining = rounds;
                }

                if state.is_exhausted() {
                    break 'lots;
                }
            }
        }

        let patients_assigned = state.total_assigned();
        let unfilled_quota = state.total_remaining();
        if unfilled_quota > 0 {
            warn!(
                phase = %phase,
                quota_total,
                unfilled_quota,
                "批次轮次不足, 阶段配额未满"
            );
        }
        info!(phase = %phase, quota_total, patients_assigned, rounds_consumed, "阶段分配完成");

        Ok(PhaseSummary {
            phase,
            quota_total,
            patients_assigned,
            unfilled_quota,
            rounds_consumed,
            lots_drawn,
        })
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 为一位受种者生成两剂预约
    #[allow(clippy::too_many_arguments)]
    fn assign_patient(
        &self,
        phase: Phase,
        clinic: &Clinic,
        clinic_index: usize,
        lot: &ScheduledLot,
        state: &mut PhaseCapacityState,
        queues: &mut PatientQueues,
        exclusions: &ExclusionSet,
        tally: &mut DailyDoseTally,
        ledger: &mut AssignmentLedger,
    ) -> ScheduleResult<()> {
        let patient = queues.draw(&clinic.clinic_id, phase, exclusions)?;
        let sequence_order = state.next_sequence_order(clinic_index);
        let daily_capacity = clinic.daily_capacity(&self.capacity);

        // 第一剂: 到货日期 + 物流提前期
        let first_candidate = add_days(lot.arrival_date, clinic.lead_time(&self.capacity) as u64)?;
        let first_date =
            self.resolver
                .resolve(&clinic.clinic_id, tally, first_candidate, daily_capacity)?;
        tally.record(&clinic.clinic_id, first_date);

        let mut record = Assignment {
            patient_id: patient.patient_id.clone(),
            clinic_id: clinic.clinic_id.clone(),
            brand_id: lot.brand_id.clone(),
            dose_number: DoseNumber::First,
            sequence_order,
            date: first_date,
            phase: Some(phase),
        };

        if lot.requires_second_dose() {
            let anchor = match self.policy.second_dose_anchor {
                SecondDoseAnchor::ResolvedFirstDose => first_date,
                SecondDoseAnchor::FirstDoseCandidate => first_candidate,
            };
            let second_candidate = add_days(anchor, lot.interval_days)?;
            let second_date =
                self.resolver
                    .resolve(&clinic.clinic_id, tally, second_candidate, daily_capacity)?;
            tally.record(&clinic.clinic_id, second_date);

            ledger.record(record.clone());
            record.dose_number = DoseNumber::Second;
            record.date = second_date;
        }
        ledger.record(record);

        state.consume(clinic_index);
        trace!(
            patient_id = %patient.patient_id,
            clinic_id = %clinic.clinic_id,
            lot_id = %lot.lot_id,
            sequence_order,
            %first_date,
            "受种者分配"
        );
        Ok(())
    }

    /// 日接种能力为 0 时日期顺延永不终止, 分配前拒绝
    fn check_daily_capacity(&self, clinics: &[Clinic]) -> ScheduleResult<()> {
        match clinics
            .iter()
            .find(|c| c.daily_capacity(&self.capacity) == 0)
        {
            Some(clinic) => Err(ScheduleError::ZeroDailyCapacity {
                clinic_id: clinic.clinic_id.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinic::PhaseQuotas;
    use crate::domain::patient::Patient;
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn create_test_lot(lot_id: &str, day: u32, rounds: u32) -> ScheduledLot {
        ScheduledLot {
            lot_id: lot_id.to_string(),
            brand_id: "X".to_string(),
            arrival_date: date(day),
            units: rounds * 2,
            doses_required: 2,
            interval_days: 7,
            rounds_total: rounds,
            rounds_remaining: rounds,
        }
    }

    fn create_test_allocator(policy: AllocationPolicy) -> CapacityAllocator {
        let capacity = CapacityConfig {
            stations_per_clinic: 1,
            doses_per_station_per_day: 1000,
            default_lead_time_days: 0,
        };
        CapacityAllocator::new(capacity, policy)
    }

    fn patients(clinic: &str, n: usize) -> Vec<Patient> {
        (1..=n)
            .map(|i| Patient::prescored(&format!("{}-P{}", clinic, i), clinic, i as f64))
            .collect()
    }

    // ==========================================
    // 轮询与轮次
    // ==========================================

    #[test]
    fn test_round_robin_across_clinics() {
        let clinics = vec![
            Clinic::new("C01", PhaseQuotas::single(Phase::N1a, 2)),
            Clinic::new("C02", PhaseQuotas::single(Phase::N1a, 1)),
        ];
        let mut lots = vec![create_test_lot("L1", 1, 10)];
        let mut all = patients("C01", 3);
        all.extend(patients("C02", 3));
        let mut queues = PatientQueues::build(all);

        let allocator = create_test_allocator(AllocationPolicy::default());
        let outcome = allocator
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();

        let firsts: Vec<(&str, u32)> = outcome
            .ledger
            .assignments()
            .iter()
            .filter(|a| a.dose_number == DoseNumber::First)
            .map(|a| (a.patient_id.as_str(), a.sequence_order))
            .collect();
        assert_eq!(firsts, vec![("C01-P1", 1), ("C02-P1", 1), ("C01-P2", 2)]);

        let n1a = &outcome.phases[0];
        assert_eq!(n1a.quota_total, 3);
        assert_eq!(n1a.patients_assigned, 3);
        assert_eq!(n1a.unfilled_quota, 0);
        assert_eq!(n1a.rounds_consumed, 3);
        assert_eq!(outcome.phases.len(), 12);
    }

    #[test]
    fn test_lot_rounds_never_overdrawn() {
        let clinics = vec![
            Clinic::new("C01", PhaseQuotas::single(Phase::N1a, 5)),
            Clinic::new("C02", PhaseQuotas::single(Phase::N1a, 5)),
            Clinic::new("C03", PhaseQuotas::single(Phase::N1a, 5)),
        ];
        let mut lots = vec![create_test_lot("L1", 1, 4)];
        let mut all = patients("C01", 5);
        all.extend(patients("C02", 5));
        all.extend(patients("C03", 5));
        let mut queues = PatientQueues::build(all);

        let outcome = create_test_allocator(AllocationPolicy::default())
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();

        let n1a = &outcome.phases[0];
        assert_eq!(n1a.patients_assigned, 4);
        assert_eq!(n1a.unfilled_quota, 11);
        assert_eq!(outcome.ledger.len(), 8);
    }

    #[test]
    fn test_per_phase_reset_reuses_lot_rounds() {
        let mut quotas = PhaseQuotas::single(Phase::N1a, 2);
        quotas.set(Phase::N1b, 2);
        let clinics = vec![Clinic::new("C01", quotas)];
        let mut queues = PatientQueues::build(patients("C01", 4));
        let mut lots = vec![create_test_lot("L1", 1, 2)];

        let outcome = create_test_allocator(AllocationPolicy::default())
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();
        assert_eq!(outcome.phases[0].patients_assigned, 2);
        assert_eq!(outcome.phases[1].patients_assigned, 2);
    }

    #[test]
    fn test_cumulative_rounds_span_phases() {
        let mut quotas = PhaseQuotas::single(Phase::N1a, 2);
        quotas.set(Phase::N1b, 2);
        let clinics = vec![Clinic::new("C01", quotas)];
        let mut queues = PatientQueues::build(patients("C01", 4));
        let mut lots = vec![create_test_lot("L1", 1, 3)];

        let policy = AllocationPolicy {
            lot_rounds: LotRoundsPolicy::Cumulative,
            ..Default::default()
        };
        let outcome = create_test_allocator(policy)
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();

        // n1a 消耗 2 轮, 剩余 1 轮不足以进入 n1b
        assert_eq!(outcome.phases[0].patients_assigned, 2);
        assert_eq!(outcome.phases[1].patients_assigned, 0);
        assert_eq!(lots[0].rounds_remaining, 1);
    }

    // ==========================================
    // 日期与产能
    // ==========================================

    #[test]
    fn test_lead_time_and_backoff() {
        let mut clinic = Clinic::new("C01", PhaseQuotas::single(Phase::N1a, 3));
        clinic.lead_time_days = Some(2);
        clinic.doses_per_station_per_day = Some(2);
        let clinics = vec![clinic];
        let mut queues = PatientQueues::build(patients("C01", 3));
        let mut lots = vec![create_test_lot("L1", 1, 3)];

        let outcome = create_test_allocator(AllocationPolicy::default())
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();

        let firsts: Vec<NaiveDate> = outcome
            .ledger
            .assignments()
            .iter()
            .filter(|a| a.dose_number == DoseNumber::First)
            .map(|a| a.date)
            .collect();
        // 日接种能力 2: 前两人 1/3, 第三人顺延到 1/4
        assert_eq!(firsts, vec![date(3), date(3), date(4)]);
    }

    #[test]
    fn test_first_dose_candidate_anchor() {
        let mut clinic = Clinic::new("C01", PhaseQuotas::single(Phase::N1a, 2));
        clinic.doses_per_station_per_day = Some(1);
        let clinics = vec![clinic];
        let mut lots = vec![create_test_lot("L1", 1, 2)];
        let policy = AllocationPolicy {
            second_dose_anchor: SecondDoseAnchor::FirstDoseCandidate,
            ..Default::default()
        };

        let mut queues = PatientQueues::build(patients("C01", 2));
        let outcome = create_test_allocator(policy)
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();

        let p2: Vec<NaiveDate> = outcome
            .ledger
            .assignments()
            .iter()
            .filter(|a| a.patient_id == "C01-P2")
            .map(|a| a.date)
            .collect();
        // 第一剂 1/2, 第二剂候选 1/8 已被占用 => 1/9
        assert_eq!(p2, vec![date(2), date(9)]);
    }

    #[test]
    fn test_shared_tally_spans_phases() {
        let mut quotas = PhaseQuotas::single(Phase::N1a, 1);
        quotas.set(Phase::N1b, 1);
        let mut clinic = Clinic::new("C01", quotas);
        clinic.doses_per_station_per_day = Some(1);
        let clinics = vec![clinic];
        let lot = || vec![create_test_lot("L1", 1, 2)];

        let run = |scope: TallyScope| {
            let policy = AllocationPolicy {
                tally_scope: scope,
                ..Default::default()
            };
            let mut queues = PatientQueues::build(patients("C01", 2));
            create_test_allocator(policy)
                .allocate(&clinics, &mut lot(), &mut queues, &ExclusionSet::new())
                .unwrap()
        };

        let per_phase = run(TallyScope::PerPhase);
        let shared = run(TallyScope::Shared);
        let n1b_first = |o: &AllocationOutcome| {
            o.ledger
                .assignments()
                .iter()
                .find(|a| a.phase == Some(Phase::N1b) && a.dose_number == DoseNumber::First)
                .map(|a| a.date)
        };
        assert_eq!(n1b_first(&per_phase), Some(date(1)));
        assert_eq!(n1b_first(&shared), Some(date(2)));
    }

    #[test]
    fn test_single_dose_brand_emits_first_dose_only() {
        let clinics = vec![Clinic::new("C01", PhaseQuotas::single(Phase::N1a, 2))];
        let mut lot = create_test_lot("L1", 1, 2);
        lot.doses_required = 1;
        lot.interval_days = 0;
        let mut lots = vec![lot];
        let mut queues = PatientQueues::build(patients("C01", 2));

        let outcome = create_test_allocator(AllocationPolicy::default())
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap();
        assert_eq!(outcome.ledger.len(), 2);
        assert!(outcome
            .ledger
            .assignments()
            .iter()
            .all(|a| a.dose_number == DoseNumber::First));
    }

    // ==========================================
    // 错误
    // ==========================================

    #[test]
    fn test_supply_exhaustion_is_fatal() {
        let clinics = vec![Clinic::new("C01", PhaseQuotas::single(Phase::N2a, 3))];
        let mut lots = vec![create_test_lot("L1", 1, 5)];
        let mut queues = PatientQueues::build(patients("C01", 2));

        let err = create_test_allocator(AllocationPolicy::default())
            .allocate(&clinics, &mut lots, &mut queues, &ExclusionSet::new())
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::SupplyExhaustion {
                clinic_id: "C01".to_string(),
                phase: Phase::N2a
            }
        );
    }

    #[test]
    fn test_zero_daily_capacity_rejected_before_allocation() {
        let mut clinic = Clinic::new("C01", PhaseQuotas::single(Phase::N1a, 1));
        clinic.stations_per_dependency = Some(0);
        let clinics = vec![clinic];
        let mut queues = PatientQueues::build(patients("C01", 1));

        let err = create_test_allocator(AllocationPolicy::default())
            .allocate(&clinics, &mut [], &mut queues, &ExclusionSet::new())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::ZeroDailyCapacity { .. }));
        assert_eq!(queues.remaining(), 1);
    }
}
