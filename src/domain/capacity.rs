// ==========================================
// 两剂次疫苗接种排程系统 - 阶段产能状态
// ==========================================
// 用途: 剩余配额 + 接种点每日剂次计数
// 红线: 配额计数不得为负; 每日计数不得超过日接种能力
// ==========================================

use crate::domain::clinic::Clinic;
use crate::domain::types::Phase;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ==========================================
// DailyDoseTally - 接种点每日剂次计数
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DailyDoseTally {
    counts: HashMap<String, BTreeMap<NaiveDate, u64>>,
}

impl DailyDoseTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某接种点某日已排剂次（无记录视为 0）
    pub fn count(&self, clinic_id: &str, date: NaiveDate) -> u64 {
        self.counts
            .get(clinic_id)
            .and_then(|days| days.get(&date))
            .copied()
            .unwrap_or(0)
    }

    /// 记录一剂
    pub fn record(&mut self, clinic_id: &str, date: NaiveDate) {
        *self
            .counts
            .entry(clinic_id.to_string())
            .or_default()
            .entry(date)
            .or_insert(0) += 1;
    }
}

// ==========================================
// ClinicQuota - 单接种点阶段配额
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicQuota {
    pub clinic_id: String,
    pub quota: u32,
    pub remaining: u32,
}

// ==========================================
// PhaseCapacityState - 单阶段产能状态
// ==========================================
// 下标与接种点加载顺序一致
#[derive(Debug, Clone)]
pub struct PhaseCapacityState {
    pub phase: Phase,
    pub quotas: Vec<ClinicQuota>,
}

impl PhaseCapacityState {
    /// 以接种点的阶段配额初始化
    pub fn new(phase: Phase, clinics: &[Clinic]) -> Self {
        let quotas = clinics
            .iter()
            .map(|c| {
                let quota = c.quotas.effective(phase);
                ClinicQuota {
                    clinic_id: c.clinic_id.clone(),
                    quota,
                    remaining: quota,
                }
            })
            .collect();
        Self { phase, quotas }
    }

    pub fn total_quota(&self) -> u64 {
        self.quotas.iter().map(|q| q.quota as u64).sum()
    }

    pub fn total_assigned(&self) -> u64 {
        self.total_quota() - self.total_remaining()
    }
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: Capacity Allocator 配额检查接口
pub trait CapacityConstraint {
    /// 接种点是否还有剩余配额
    fn can_serve(&self, clinic_index: usize) -> bool;

    /// 下一位受种者在该接种点的序号 (配额 - 剩余 + 1)
    fn next_sequence_order(&self, clinic_index: usize) -> u32;

    /// 消耗一个配额
    fn consume(&mut self, clinic_index: usize);

    /// 全部接种点剩余配额之和
    fn total_remaining(&self) -> u64;

    /// 是否已全部分配完毕
    fn is_exhausted(&self) -> bool {
        self.total_remaining() == 0
    }
}

impl CapacityConstraint for PhaseCapacityState {
    fn can_serve(&self, clinic_index: usize) -> bool {
        self.quotas
            .get(clinic_index)
            .map(|q| q.remaining > 0)
            .unwrap_or(false)
    }

    fn next_sequence_order(&self, clinic_index: usize) -> u32 {
        let q = &self.quotas[clinic_index];
        q.quota - q.remaining + 1
    }

    fn consume(&mut self, clinic_index: usize) {
        let q = &mut self.quotas[clinic_index];
        q.remaining = q.remaining.saturating_sub(1);
    }

    fn total_remaining(&self) -> u64 {
        self.quotas.iter().map(|q| q.remaining as u64).sum()
    }
}
