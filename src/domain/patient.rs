// ==========================================
// 两剂次疫苗接种排程系统 - 受种者领域模型
// ==========================================
// 红线: 加载后不可变, 每个受种者只能出队一次
// ==========================================

use crate::domain::types::{HealthFlag, Phase};
use serde::{Deserialize, Serialize};

// ==========================================
// PatientAttributes - 原始优先级属性
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientAttributes {
    // ===== 分类维度 (查表) =====
    pub age: Option<u32>,              // 年龄 (按十岁段查表)
    pub role: Option<String>,          // 岗位
    pub department: Option<String>,    // 居住省份
    pub municipality: Option<String>,  // 居住城市
    pub work_unit: Option<String>,     // 所属单位代码

    // ===== 健康标志 =====
    pub prior_infection: HealthFlag,   // 既往感染
    pub diabetes: HealthFlag,          // 糖尿病
    pub obesity: HealthFlag,           // 肥胖
    pub cancer: HealthFlag,            // 癌症
    pub hiv: HealthFlag,               // HIV 阳性
    pub renal: HealthFlag,             // 肾病
}

impl PatientAttributes {
    /// 居住地查表键: "省份, 城市"
    pub fn residence_key(&self) -> Option<String> {
        match (&self.department, &self.municipality) {
            (Some(d), Some(m)) => Some(format!("{}, {}", d, m)),
            _ => None,
        }
    }

    /// 年龄段查表键: 年龄向下取整到十位
    pub fn age_bracket(&self) -> Option<u32> {
        self.age.map(|a| a - a % 10)
    }
}

// ==========================================
// PatientRecord - 导入后的受种者记录 (未评分)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub clinic_id: String,             // 所属接种点
    pub phase: Option<Phase>,          // 所属阶段 (仅记录, 不参与出队)
    pub attributes: PatientAttributes,
    pub preset_score: Option<f64>,     // 外部已评分时直接使用
}

// ==========================================
// PriorityComponents - 各维度归一化值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityComponents {
    pub age: f64,
    pub role: f64,
    pub residence: f64,
    pub work_unit: f64,
    pub prior_infection: f64,
    pub diabetes: f64,
    pub obesity: f64,
    pub cancer: f64,
    pub hiv: f64,
    pub renal: f64,
}

// ==========================================
// Patient - 已评分受种者 (进入队列)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub clinic_id: String,
    pub phase: Option<Phase>,
    pub components: Option<PriorityComponents>, // 预评分时为空
    pub score: f64,                             // 综合优先级 (越小越优先)
}

impl Patient {
    /// 以既定分值构造（外部预评分 / 测试）
    pub fn prescored(patient_id: &str, clinic_id: &str, score: f64) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            clinic_id: clinic_id.to_string(),
            phase: None,
            components: None,
            score,
        }
    }
}
