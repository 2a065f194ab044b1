// ==========================================
// 两剂次疫苗接种排程系统 - 疫苗品牌与批次
// ==========================================
// 红线: 轮次 = 单位数 / 品牌剂次数 (余数作废)
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// VaccineBrand - 疫苗品牌
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccineBrand {
    pub brand_id: String,
    pub name: String,
    pub doses_required: u32,           // 每人所需剂次
    pub interval_weeks: u32,           // 两剂间隔 (周)
    pub storage_temperature: Option<String>,
    pub notes: Option<String>,
}

impl VaccineBrand {
    pub fn new(brand_id: &str, doses_required: u32, interval_weeks: u32) -> Self {
        Self {
            brand_id: brand_id.to_string(),
            name: brand_id.to_string(),
            doses_required,
            interval_weeks,
            storage_temperature: None,
            notes: None,
        }
    }

    /// 是否需要第二剂
    pub fn requires_second_dose(&self) -> bool {
        self.doses_required >= 2
    }

    /// 两剂间隔（天）
    pub fn interval_days(&self) -> u64 {
        self.interval_weeks as u64 * 7
    }
}

// ==========================================
// VaccineLot - 到货批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineLot {
    pub lot_id: String,
    pub brand_id: String,
    pub arrival_date: NaiveDate,
    pub units: u32,
}

impl VaccineLot {
    pub fn new(lot_id: &str, brand_id: &str, arrival_date: NaiveDate, units: u32) -> Self {
        Self {
            lot_id: lot_id.to_string(),
            brand_id: brand_id.to_string(),
            arrival_date,
            units,
        }
    }
}
