// ==========================================
// 两剂次疫苗接种排程系统 - 接种点领域模型
// ==========================================
// 用途: 接种点位置、日接种能力、各阶段配额
// 红线: 加载后不可变
// ==========================================

use crate::config::CapacityConfig;
use crate::domain::types::Phase;
use serde::{Deserialize, Serialize};

// ==========================================
// PhaseQuotas - 12 个阶段配额
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseQuotas([i64; 12]);

impl PhaseQuotas {
    pub fn new(values: [i64; 12]) -> Self {
        Self(values)
    }

    /// 只设置单个阶段（其余为 0）
    pub fn single(phase: Phase, quota: i64) -> Self {
        let mut quotas = Self::default();
        quotas.set(phase, quota);
        quotas
    }

    pub fn get(&self, phase: Phase) -> i64 {
        self.0[phase.index()]
    }

    pub fn set(&mut self, phase: Phase, quota: i64) {
        self.0[phase.index()] = quota;
    }

    /// 有效配额（负值视为 0）
    pub fn effective(&self, phase: Phase) -> u32 {
        self.get(phase).clamp(0, u32::MAX as i64) as u32
    }
}

// ==========================================
// Clinic - 接种点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clinic {
    // ===== 主键 =====
    pub clinic_id: String,

    // ===== 基础信息 =====
    pub name: String,
    pub department: Option<String>,
    pub municipality: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // ===== 接种能力 =====
    pub station_capacity: Option<u32>,             // 接种台数量 (vaccCap, 仅记录)
    pub stations_per_dependency: Option<u32>,      // 覆盖全局配置
    pub doses_per_station_per_day: Option<u32>,    // 覆盖全局配置
    pub lead_time_days: Option<u32>,               // 物流提前期, 覆盖全局配置

    // ===== 阶段配额 =====
    pub quotas: PhaseQuotas,
}

impl Clinic {
    /// 以默认值构造接种点（导入器 / 测试使用）
    pub fn new(clinic_id: &str, quotas: PhaseQuotas) -> Self {
        Self {
            clinic_id: clinic_id.to_string(),
            name: clinic_id.to_string(),
            department: None,
            municipality: None,
            latitude: None,
            longitude: None,
            station_capacity: None,
            stations_per_dependency: None,
            doses_per_station_per_day: None,
            lead_time_days: None,
            quotas,
        }
    }

    /// 日接种能力 = 接种台数 × 单台日接种量
    pub fn daily_capacity(&self, config: &CapacityConfig) -> u64 {
        let stations = self
            .stations_per_dependency
            .unwrap_or(config.stations_per_clinic) as u64;
        let throughput = self
            .doses_per_station_per_day
            .unwrap_or(config.doses_per_station_per_day) as u64;
        stations * throughput
    }

    /// 物流提前期（天）
    pub fn lead_time(&self, config: &CapacityConfig) -> u32 {
        self.lead_time_days.unwrap_or(config.default_lead_time_days)
    }
}
