// ==========================================
// 两剂次疫苗接种排程系统 - 受种者队列
// ==========================================
// 职责: 按接种点分组, 按综合分值稳定升序, 出队时跳过排除名单
// 红线: 有剩余配额但队列已空 => SupplyExhaustion (不静默容忍)
// ==========================================

use crate::domain::exclusion::ExclusionSet;
use crate::domain::patient::Patient;
use crate::domain::types::Phase;
use crate::engine::error::{ScheduleError, ScheduleResult};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

// ==========================================
// PatientQueue - 单接种点队列
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PatientQueue {
    patients: VecDeque<Patient>,
}

impl PatientQueue {
    /// 以综合分值稳定升序构造（同分保持输入顺序）
    pub fn from_patients(mut patients: Vec<Patient>) -> Self {
        patients.sort_by(|a, b| a.score.total_cmp(&b.score));
        Self {
            patients: patients.into(),
        }
    }

    /// 取出下一位未被排除的受种者
    ///
    /// # 返回
    /// - Some(patient): 下一位受种者
    /// - None: 队列已空
    /// - `skipped`: 本次跳过的排除人数会累加到该计数
    pub fn pop_next(&mut self, exclusions: &ExclusionSet, skipped: &mut usize) -> Option<Patient> {
        while let Some(patient) = self.patients.pop_front() {
            if exclusions.contains(&patient.patient_id) {
                debug!(
                    patient_id = %patient.patient_id,
                    reason = exclusions.reason(&patient.patient_id).unwrap_or(""),
                    "受种者在排除名单中, 跳过"
                );
                *skipped += 1;
                continue;
            }
            return Some(patient);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// 队首（不出队）
    pub fn peek(&self) -> Option<&Patient> {
        self.patients.front()
    }
}

// ==========================================
// PatientQueues - 全部接种点队列
// ==========================================
// 跨阶段共享: 某阶段出队的受种者后续阶段不再出现
#[derive(Debug, Clone, Default)]
pub struct PatientQueues {
    queues: HashMap<String, PatientQueue>,
    excluded_skipped: usize,
}

impl PatientQueues {
    /// 按所属接种点分组
    pub fn build(patients: Vec<Patient>) -> Self {
        let mut grouped: HashMap<String, Vec<Patient>> = HashMap::new();
        for patient in patients {
            grouped
                .entry(patient.clinic_id.clone())
                .or_default()
                .push(patient);
        }

        let queues = grouped
            .into_iter()
            .map(|(clinic_id, patients)| (clinic_id, PatientQueue::from_patients(patients)))
            .collect();

        Self {
            queues,
            excluded_skipped: 0,
        }
    }

    /// 从指定接种点取出下一位受种者
    ///
    /// 没有受种者的接种点视为空队列
    pub fn draw(
        &mut self,
        clinic_id: &str,
        phase: Phase,
        exclusions: &ExclusionSet,
    ) -> ScheduleResult<Patient> {
        let skipped = &mut self.excluded_skipped;
        self.queues
            .get_mut(clinic_id)
            .and_then(|queue| queue.pop_next(exclusions, skipped))
            .ok_or_else(|| ScheduleError::SupplyExhaustion {
                clinic_id: clinic_id.to_string(),
                phase,
            })
    }

    /// 剩余受种者总数（含尚未跳过的排除者）
    pub fn remaining(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }

    /// 累计跳过的排除人数
    pub fn excluded_skipped(&self) -> usize {
        self.excluded_skipped
    }
}
