// ==========================================
// 两剂次疫苗接种排程系统 - 优先级评分引擎
// ==========================================
// 职责: 按加权属性与四张查表计算受种者综合优先级
// 输入: PatientRecord + PriorityTables + PriorityWeights
// 输出: Patient (综合分值 >= 0, 越小越优先) + 查表缺失诊断
// ==========================================
// 红线: 纯函数, 查表缺失不报错 (使用各维度的默认值)
// ==========================================

use crate::config::{PriorityWeights, ScheduleConfig, ScoreCoupling};
use crate::domain::patient::{Patient, PatientRecord, PriorityComponents};
use crate::domain::types::HealthFlag;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, instrument};

/// 权重为 0 或取值未知时, 健康标志使用的哨兵值
pub const HEALTH_FLAG_SENTINEL: f64 = 2.0;

/// 权重为 0 时, 分类维度使用的哨兵值
pub const CATEGORICAL_SENTINEL: f64 = 10.0;

// ==========================================
// PriorityDimension - 查表维度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityDimension {
    Age,
    Role,
    Residence,
    WorkUnit,
}

impl PriorityDimension {
    /// 查表缺失时的默认优先级
    pub fn fallback(&self) -> f64 {
        match self {
            PriorityDimension::Age => 5.0,
            PriorityDimension::Role => 4.0,
            PriorityDimension::Residence => 2.0,
            PriorityDimension::WorkUnit => 5.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityDimension::Age => "age",
            PriorityDimension::Role => "role",
            PriorityDimension::Residence => "residence",
            PriorityDimension::WorkUnit => "work_unit",
        }
    }
}

impl fmt::Display for PriorityDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// PriorityTable - 单维度查表
// ==========================================
#[derive(Debug, Clone)]
pub struct PriorityTable<K: Eq + Hash> {
    dimension: PriorityDimension,
    entries: HashMap<K, f64>,
}

impl<K: Eq + Hash> PriorityTable<K> {
    pub fn new(dimension: PriorityDimension) -> Self {
        Self {
            dimension,
            entries: HashMap::new(),
        }
    }

    pub fn from_entries<I: IntoIterator<Item = (K, f64)>>(
        dimension: PriorityDimension,
        entries: I,
    ) -> Self {
        Self {
            dimension,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, key: K, priority: f64) {
        self.entries.insert(key, priority);
    }

    pub fn get<Q>(&self, key: &Q) -> Option<f64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).copied()
    }

    pub fn dimension(&self) -> PriorityDimension {
        self.dimension
    }

    /// 未命中时使用的默认值
    pub fn default_value(&self) -> f64 {
        self.dimension.fallback()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// PriorityTables - 四张查表
// ==========================================
#[derive(Debug, Clone)]
pub struct PriorityTables {
    pub age: PriorityTable<u32>,        // 年龄段 (十岁) -> 优先级
    pub role: PriorityTable<String>,    // 岗位 -> 优先级
    pub residence: PriorityTable<String>, // "省份, 城市" -> 优先级
    pub work_unit: PriorityTable<String>, // 单位代码 -> 优先级
}

impl Default for PriorityTables {
    fn default() -> Self {
        Self {
            age: PriorityTable::new(PriorityDimension::Age),
            role: PriorityTable::new(PriorityDimension::Role),
            residence: PriorityTable::new(PriorityDimension::Residence),
            work_unit: PriorityTable::new(PriorityDimension::WorkUnit),
        }
    }
}

// ==========================================
// LookupMiss - 查表缺失诊断 (非错误)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupMiss {
    pub patient_id: String,
    pub dimension: PriorityDimension,
    pub key: Option<String>, // 属性缺失时为空
}

/// 批量评分结果
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub patients: Vec<Patient>,
    pub lookup_misses: Vec<LookupMiss>,
}

// ==========================================
// PriorityModel - 优先级评分引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct PriorityModel {
    weights: PriorityWeights,
    coupling: ScoreCoupling,
}

impl PriorityModel {
    pub fn new(weights: PriorityWeights, coupling: ScoreCoupling) -> Self {
        Self { weights, coupling }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.weights, config.policy.score_coupling)
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 批量评分（与顺序无关）
    #[instrument(skip_all, fields(records = records.len(), coupling = ?self.coupling))]
    pub fn score_all(&self, records: Vec<PatientRecord>, tables: &PriorityTables) -> ScoringOutcome {
        let mut outcome = ScoringOutcome {
            patients: Vec::with_capacity(records.len()),
            lookup_misses: Vec::new(),
        };
        for record in records {
            let patient = self.score(record, tables, &mut outcome.lookup_misses);
            outcome.patients.push(patient);
        }
        debug!(
            patients = outcome.patients.len(),
            lookup_misses = outcome.lookup_misses.len(),
            "优先级评分完成"
        );
        outcome
    }

    /// 单个受种者评分
    ///
    /// 已有预设分值时直接使用, 不查表
    pub fn score(
        &self,
        record: PatientRecord,
        tables: &PriorityTables,
        misses: &mut Vec<LookupMiss>,
    ) -> Patient {
        let (components, score) = match record.preset_score {
            Some(score) => (None, score.max(0.0)),
            None => {
                let components = self.components(&record, tables, misses);
                let score = self.composite(&components);
                (Some(components), score)
            }
        };

        Patient {
            patient_id: record.patient_id,
            clinic_id: record.clinic_id,
            phase: record.phase,
            components,
            score,
        }
    }

    /// 计算各维度归一化值
    ///
    /// 规则：
    /// 1) 权重 > 0 且取值已知: 原始值 / 权重
    /// 2) 否则: 健康标志取 2, 分类维度取 10
    /// 3) 查表未命中: 原始值取该维度默认值, 并记录 LookupMiss
    pub fn components(
        &self,
        record: &PatientRecord,
        tables: &PriorityTables,
        misses: &mut Vec<LookupMiss>,
    ) -> PriorityComponents {
        let attrs = &record.attributes;
        let w = &self.weights;

        let age_raw = lookup(
            &record.patient_id,
            &tables.age,
            attrs.age_bracket().as_ref(),
            misses,
        );
        let role_raw = lookup(&record.patient_id, &tables.role, attrs.role.as_deref(), misses);
        let residence_key = attrs.residence_key();
        let residence_raw = lookup(
            &record.patient_id,
            &tables.residence,
            residence_key.as_deref(),
            misses,
        );
        let work_unit_raw = lookup(
            &record.patient_id,
            &tables.work_unit,
            attrs.work_unit.as_deref(),
            misses,
        );

        PriorityComponents {
            age: normalize_categorical(age_raw, w.age),
            role: normalize_categorical(role_raw, w.role),
            residence: normalize_categorical(residence_raw, w.residence),
            work_unit: normalize_categorical(work_unit_raw, w.work_unit),
            prior_infection: normalize_flag(attrs.prior_infection, w.prior_infection),
            diabetes: normalize_flag(attrs.diabetes, w.diabetes),
            obesity: normalize_flag(attrs.obesity, w.obesity),
            cancer: normalize_flag(attrs.cancer, w.cancer),
            hiv: normalize_flag(attrs.hiv, w.hiv),
            renal: normalize_flag(attrs.renal, w.renal),
        }
    }

    /// 综合分值
    ///
    /// HIV 与肾病维度只参与归一化, 不计入综合分值
    pub fn composite(&self, c: &PriorityComponents) -> f64 {
        let facts = [
            c.role,
            c.residence,
            c.work_unit,
            c.prior_infection,
            c.diabetes,
            c.obesity,
            c.cancer,
        ];
        let age = c.age.max(0.0);

        match self.coupling {
            ScoreCoupling::Legacy => {
                let positive = facts.iter().filter(|v| **v > 0.0).count() as f64;
                if age > 0.0 {
                    age + age * positive
                } else {
                    0.0
                }
            }
            ScoreCoupling::Corrected => {
                age + facts.iter().filter(|v| **v > 0.0).sum::<f64>()
            }
        }
    }
}

fn lookup<K, Q>(
    patient_id: &str,
    table: &PriorityTable<K>,
    key: Option<&Q>,
    misses: &mut Vec<LookupMiss>,
) -> f64
where
    K: Eq + Hash + Borrow<Q>,
    Q: Hash + Eq + ToString + ?Sized,
{
    if let Some(value) = key.and_then(|k| table.get(k)) {
        return value;
    }

    let key = key.map(|k| k.to_string());
    debug!(
        patient_id,
        dimension = %table.dimension(),
        key = key.as_deref().unwrap_or(""),
        fallback = table.default_value(),
        "查表未命中, 使用默认值"
    );
    misses.push(LookupMiss {
        patient_id: patient_id.to_string(),
        dimension: table.dimension(),
        key,
    });
    table.default_value()
}

fn normalize_categorical(raw: f64, weight: u32) -> f64 {
    if weight > 0 {
        raw / weight as f64
    } else {
        CATEGORICAL_SENTINEL
    }
}

fn normalize_flag(flag: HealthFlag, weight: u32) -> f64 {
    match flag.raw_value() {
        Some(raw) if weight > 0 => raw / weight as f64,
        _ => HEALTH_FLAG_SENTINEL,
    }
}
