// ==========================================
// 两剂次疫苗接种排程系统 - 预约分配记录
// ==========================================
// 输出契约: patientId,clinicId,brandId,doseNumber,sequenceOrder,date
// 红线: 生成后不可变
// ==========================================

use crate::domain::types::{DoseNumber, Phase};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ==========================================
// Assignment - 单剂次预约
// ==========================================
// 字段顺序即输出列顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub patient_id: String,
    pub clinic_id: String,
    pub brand_id: String,
    pub dose_number: DoseNumber,
    pub sequence_order: u32,
    pub date: NaiveDate,

    // 仅内存使用，不写入输出文件
    #[serde(skip)]
    pub phase: Option<Phase>,
}

impl Assignment {
    /// 输出排序: (接种点, 日期, 剂次, 序号) 升序
    pub fn output_order(&self, other: &Assignment) -> Ordering {
        compare_clinic_ids(&self.clinic_id, &other.clinic_id)
            .then_with(|| self.date.cmp(&other.date))
            .then_with(|| self.dose_number.cmp(&other.dose_number))
            .then_with(|| self.sequence_order.cmp(&other.sequence_order))
    }

    /// 输出文件可见字段（用于往返比对）
    pub fn output_key(&self) -> (&str, &str, &str, u8, u32, NaiveDate) {
        (
            &self.patient_id,
            &self.clinic_id,
            &self.brand_id,
            self.dose_number.as_u8(),
            self.sequence_order,
            self.date,
        )
    }
}

/// 接种点编号比较: 双方均为整数时按数值, 否则按字符串
pub fn compare_clinic_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

// ==========================================
// VaccinationEvent - 实际接种事件 (对账模式输入)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationEvent {
    pub patient_id: String,
    pub clinic_id: String,
    pub brand_id: String,
    pub date: NaiveDate,
}
