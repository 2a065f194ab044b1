// ==========================================
// 两剂次疫苗接种排程系统 - 排程配置
// ==========================================
// 职责: 产能参数、优先级权重、分配策略、输入输出文件
// 红线: 运行期间不可变, 显式传入各引擎 (无全局状态)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ==========================================
// ScheduleConfig - 顶层配置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub capacity: CapacityConfig,
    pub weights: PriorityWeights,
    pub policy: AllocationPolicy,
    pub files: InputFiles,
}

impl ScheduleConfig {
    /// 分配前校验
    ///
    /// # 返回
    /// - Err(ConfigError::ZeroDailyCapacity): 日接种能力为 0（日期回退永不终止）
    pub fn validate(&self) -> ConfigResult<()> {
        let stations = self.capacity.stations_per_clinic;
        let throughput = self.capacity.doses_per_station_per_day;
        if stations == 0 || throughput == 0 {
            return Err(ConfigError::ZeroDailyCapacity {
                stations,
                throughput,
            });
        }
        Ok(())
    }
}

// ==========================================
// CapacityConfig - 接种点产能默认值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub stations_per_clinic: u32,        // 每个接种点的接种台数
    pub doses_per_station_per_day: u32,  // 单台日最大接种量
    pub default_lead_time_days: u32,     // 疫苗运抵接种点所需天数
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            stations_per_clinic: 1,
            doses_per_station_per_day: 100,
            default_lead_time_days: 0,
        }
    }
}

// ==========================================
// PriorityWeights - 各维度权重
// ==========================================
// 0 = 忽略该维度 (使用哨兵值)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub age: u32,
    pub residence: u32,
    pub work_unit: u32,
    pub role: u32,
    pub prior_infection: u32,
    pub diabetes: u32,
    pub obesity: u32,
    pub cancer: u32,
    pub hiv: u32,
    pub renal: u32,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            age: 1,
            residence: 1,
            work_unit: 1,
            role: 1,
            prior_infection: 1,
            diabetes: 1,
            obesity: 1,
            cancer: 1,
            hiv: 1,
            renal: 1,
        }
    }
}

// ==========================================
// AllocationPolicy - 分配策略开关
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    pub score_coupling: ScoreCoupling,
    pub lot_rounds: LotRoundsPolicy,
    pub tally_scope: TallyScope,
    pub second_dose_anchor: SecondDoseAnchor,
}

/// 综合评分的累加方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCoupling {
    /// 每个为正的因素都累加年龄维度值（与历史输出一致）
    #[default]
    Legacy,
    /// 每个为正的因素累加自身的归一化值
    Corrected,
}

/// 批次轮次在阶段间的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotRoundsPolicy {
    /// 每个阶段从批次的初始轮次重新开始
    #[default]
    PerPhaseReset,
    /// 跨阶段累计消耗
    Cumulative,
}

/// 每日剂次计数的作用范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyScope {
    #[default]
    PerPhase,
    Shared,
}

/// 第二剂候选日期的基准
///
/// 默认 `ResolvedFirstDose`: 第二剂 >= 第一剂实际日期 + 品牌间隔, 第一剂顺延时间隔仍成立。
/// `FirstDoseCandidate` 与历史输出一致, 但第一剂顺延后两剂间隔可能短于品牌间隔。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondDoseAnchor {
    /// 第一剂实际日期 + 间隔
    #[default]
    ResolvedFirstDose,
    /// 第一剂候选日期 + 间隔（顺延前）
    FirstDoseCandidate,
}

// ==========================================
// InputFiles - 输入输出文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub data_dir: PathBuf,
    pub patients: String,
    pub lots: String,
    pub role_priority: String,
    pub age_priority: String,
    pub residence_priority: String,
    pub work_unit_priority: String,
    pub brands: String,
    pub clinics: String,
    pub exclusions: String,
    pub vaccinated: String,
    pub assignments_output: String,
    pub reconciliation_output: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            patients: "fakedata.csv".to_string(),
            lots: "lote_vacunas.csv".to_string(),
            role_priority: "prioridadCargos.csv".to_string(),
            age_priority: "prioridadEdad.csv".to_string(),
            residence_priority: "prioridadMunicipios.csv".to_string(),
            work_unit_priority: "prioridadUnidades.csv".to_string(),
            brands: "vacunas.csv".to_string(),
            clinics: "combinado.csv".to_string(),
            exclusions: "excluidos.csv".to_string(),
            vaccinated: "vacunados.csv".to_string(),
            assignments_output: "asignaciones.csv".to_string(),
            reconciliation_output: "asignaciones_vacunados.csv".to_string(),
        }
    }
}

impl InputFiles {
    /// 数据目录下的文件路径
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }
}
