// ==========================================
// 两剂次疫苗接种排程系统 - 预约台账
// ==========================================
// 职责: 收集预约记录并按输出键排序; 对账模式由实际接种记录生成预约
// 输出排序: (接种点, 日期, 剂次, 序号) 升序
// ==========================================

use crate::domain::assignment::{Assignment, VaccinationEvent};
use crate::domain::types::DoseNumber;
use crate::domain::vaccine::VaccineBrand;
use crate::engine::date_resolver::add_days;
use crate::engine::error::{ScheduleError, ScheduleResult};
use std::collections::HashMap;
use tracing::{info, instrument};

// ==========================================
// AssignmentLedger - 预约台账
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AssignmentLedger {
    assignments: Vec<Assignment>,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// 按记录顺序
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// 排序后输出（稳定排序）
    pub fn into_sorted(mut self) -> Vec<Assignment> {
        self.assignments.sort_by(|a, b| a.output_order(b));
        self.assignments
    }

    // ==========================================
    // 对账模式
    // ==========================================

    /// 由实际接种记录生成预约
    ///
    /// 规则：
    /// 1) 不经过优先级与产能分配
    /// 2) 第一剂 = 接种日期, 第二剂 = 接种日期 + 品牌间隔
    /// 3) 序号 = 输入顺序 (从 1 开始)
    /// 4) 单剂次品牌只生成第一剂
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn reconcile(
        events: &[VaccinationEvent],
        brands: &HashMap<String, VaccineBrand>,
    ) -> ScheduleResult<AssignmentLedger> {
        let mut ledger = AssignmentLedger::new();

        for (idx, event) in events.iter().enumerate() {
            let brand = brands
                .get(&event.brand_id)
                .ok_or_else(|| ScheduleError::UnknownEventBrand {
                    patient_id: event.patient_id.clone(),
                    brand_id: event.brand_id.clone(),
                })?;
            let sequence_order = idx as u32 + 1;

            ledger.record(Assignment {
                patient_id: event.patient_id.clone(),
                clinic_id: event.clinic_id.clone(),
                brand_id: event.brand_id.clone(),
                dose_number: DoseNumber::First,
                sequence_order,
                date: event.date,
                phase: None,
            });

            if brand.requires_second_dose() {
                ledger.record(Assignment {
                    patient_id: event.patient_id.clone(),
                    clinic_id: event.clinic_id.clone(),
                    brand_id: event.brand_id.clone(),
                    dose_number: DoseNumber::Second,
                    sequence_order,
                    date: add_days(event.date, brand.interval_days())?,
                    phase: None,
                });
            }
        }

        info!(records = ledger.len(), "对账预约生成完成");
        Ok(ledger)
    }
}

impl FromIterator<Assignment> for AssignmentLedger {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        Self {
            assignments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, month, day).unwrap()
    }

    fn event(patient: &str, clinic: &str, brand: &str, day: u32) -> VaccinationEvent {
        VaccinationEvent {
            patient_id: patient.to_string(),
            clinic_id: clinic.to_string(),
            brand_id: brand.to_string(),
            date: date(2, day),
        }
    }

    fn create_test_brands() -> HashMap<String, VaccineBrand> {
        [VaccineBrand::new("X", 2, 4), VaccineBrand::new("J", 1, 0)]
            .into_iter()
            .map(|b| (b.brand_id.clone(), b))
            .collect()
    }

    #[test]
    fn test_reconcile_second_dose_after_interval() {
        let events = vec![event("P1", "C02", "X", 3), event("P2", "C01", "X", 5)];
        let ledger = AssignmentLedger::reconcile(&events, &create_test_brands()).unwrap();
        assert_eq!(ledger.len(), 4);

        let sorted = ledger.into_sorted();
        // C01 在前
        assert_eq!(sorted[0].patient_id, "P2");
        assert_eq!(sorted[0].sequence_order, 2);
        assert_eq!(sorted[1].dose_number, DoseNumber::Second);
        assert_eq!(sorted[1].date, date(3, 5)); // 2/5 + 28 天
        assert_eq!(sorted[2].patient_id, "P1");
        assert_eq!(sorted[2].sequence_order, 1);
    }

    #[test]
    fn test_reconcile_single_dose_brand() {
        let events = vec![event("P1", "C01", "J", 3)];
        let sorted = AssignmentLedger::reconcile(&events, &create_test_brands())
            .unwrap()
            .into_sorted();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].dose_number, DoseNumber::First);
    }

    #[test]
    fn test_reconcile_unknown_brand() {
        let events = vec![event("P1", "C01", "Q", 3)];
        assert!(matches!(
            AssignmentLedger::reconcile(&events, &create_test_brands()),
            Err(ScheduleError::UnknownEventBrand { .. })
        ));
    }

    #[test]
    fn test_sort_by_output_key() {
        let mk = |clinic: &str, day: u32, dose: DoseNumber, order: u32| Assignment {
            patient_id: format!("{}-{}", clinic, order),
            clinic_id: clinic.to_string(),
            brand_id: "X".to_string(),
            dose_number: dose,
            sequence_order: order,
            date: date(1, day),
            phase: None,
        };
        let ledger: AssignmentLedger = vec![
            mk("C02", 1, DoseNumber::First, 1),
            mk("C01", 8, DoseNumber::Second, 1),
            mk("C01", 1, DoseNumber::First, 2),
            mk("C01", 1, DoseNumber::First, 1),
        ]
        .into_iter()
        .collect();

        let keys: Vec<(String, u32, u8, u32)> = ledger
            .into_sorted()
            .iter()
            .map(|a| (a.clinic_id.clone(), a.date.day(), a.dose_number.as_u8(), a.sequence_order))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("C01".to_string(), 1, 1, 1),
                ("C01".to_string(), 1, 1, 2),
                ("C01".to_string(), 8, 2, 1),
                ("C02".to_string(), 1, 1, 1),
            ]
        );
    }
}
