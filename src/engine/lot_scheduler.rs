// ==========================================
// 两剂次疫苗接种排程系统 - 批次调度
// ==========================================
// 职责: 批次按到货日期稳定升序, 计算每批可用轮次
// 红线: 轮次 = 单位数 / 品牌剂次数, 余数作废
// ==========================================

use crate::domain::vaccine::{VaccineBrand, VaccineLot};
use crate::engine::error::{ScheduleError, ScheduleResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// ScheduledLot - 已排序批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledLot {
    pub lot_id: String,
    pub brand_id: String,
    pub arrival_date: NaiveDate,
    pub units: u32,
    pub doses_required: u32,
    pub interval_days: u64,
    pub rounds_total: u32,      // 初始轮次
    pub rounds_remaining: u32,  // 跨阶段累计模式下的剩余轮次
}

impl ScheduledLot {
    /// 至少 2 轮才参与分配
    pub fn is_usable(&self) -> bool {
        self.rounds_total > 1
    }

    pub fn requires_second_dose(&self) -> bool {
        self.doses_required >= 2
    }
}

// ==========================================
// LotScheduler - 批次调度引擎
// ==========================================
#[derive(Debug, Default)]
pub struct LotScheduler {
    // 无状态引擎，不需要注入依赖
}

impl LotScheduler {
    pub fn new() -> Self {
        Self {}
    }

    /// 每批可用轮次
    pub fn rounds(units: u32, doses_required: u32) -> u32 {
        if doses_required == 0 {
            0
        } else {
            units / doses_required
        }
    }

    /// 排序并计算轮次
    ///
    /// # 返回
    /// - Err(UnknownBrand): 批次引用的品牌不在品牌表中
    /// - Err(InvalidBrand): 品牌所需剂次为 0
    #[instrument(skip_all, fields(lots = lots.len(), brands = brands.len()))]
    pub fn schedule(
        &self,
        lots: &[VaccineLot],
        brands: &HashMap<String, VaccineBrand>,
    ) -> ScheduleResult<Vec<ScheduledLot>> {
        let mut scheduled = Vec::with_capacity(lots.len());
        for lot in lots {
            let brand = brands
                .get(&lot.brand_id)
                .ok_or_else(|| ScheduleError::UnknownBrand {
                    lot_id: lot.lot_id.clone(),
                    brand_id: lot.brand_id.clone(),
                })?;
            if brand.doses_required == 0 {
                return Err(ScheduleError::InvalidBrand {
                    brand_id: brand.brand_id.clone(),
                });
            }

            let rounds = Self::rounds(lot.units, brand.doses_required);
            debug!(
                lot_id = %lot.lot_id,
                brand_id = %lot.brand_id,
                units = lot.units,
                rounds,
                wasted = lot.units - rounds * brand.doses_required,
                "批次轮次"
            );
            scheduled.push(ScheduledLot {
                lot_id: lot.lot_id.clone(),
                brand_id: lot.brand_id.clone(),
                arrival_date: lot.arrival_date,
                units: lot.units,
                doses_required: brand.doses_required,
                interval_days: brand.interval_days(),
                rounds_total: rounds,
                rounds_remaining: rounds,
            });
        }

        // 稳定排序: 同日到货保持输入顺序
        scheduled.sort_by_key(|l| l.arrival_date);
        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn create_test_brands() -> HashMap<String, VaccineBrand> {
        [VaccineBrand::new("X", 2, 1), VaccineBrand::new("J", 1, 0)]
            .into_iter()
            .map(|b| (b.brand_id.clone(), b))
            .collect()
    }

    #[test]
    fn test_rounds_discard_remainder() {
        assert_eq!(LotScheduler::rounds(5, 2), 2);
        assert_eq!(LotScheduler::rounds(4, 2), 2);
        assert_eq!(LotScheduler::rounds(1, 2), 0);
        assert_eq!(LotScheduler::rounds(3, 1), 3);
    }

    #[test]
    fn test_lots_sorted_by_arrival_stable() {
        let lots = vec![
            VaccineLot::new("L3", "X", date(9), 10),
            VaccineLot::new("L1", "X", date(2), 10),
            VaccineLot::new("L2", "J", date(2), 3),
        ];
        let scheduled = LotScheduler::new().schedule(&lots, &create_test_brands()).unwrap();

        let ids: Vec<&str> = scheduled.iter().map(|l| l.lot_id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "L2", "L3"]);
        assert_eq!(scheduled[0].rounds_total, 5);
        assert_eq!(scheduled[0].interval_days, 7);
        assert!(!scheduled[1].requires_second_dose());
    }

    #[test]
    fn test_single_round_lot_is_unusable() {
        let lots = vec![VaccineLot::new("L1", "X", date(1), 3)];
        let scheduled = LotScheduler::new().schedule(&lots, &create_test_brands()).unwrap();
        assert_eq!(scheduled[0].rounds_total, 1);
        assert!(!scheduled[0].is_usable());
    }

    #[test]
    fn test_unknown_brand_rejected() {
        let lots = vec![VaccineLot::new("L1", "Z", date(1), 3)];
        let err = LotScheduler::new().schedule(&lots, &create_test_brands()).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::UnknownBrand {
                lot_id: "L1".to_string(),
                brand_id: "Z".to_string()
            }
        );
    }

    #[test]
    fn test_zero_dose_brand_rejected() {
        let mut brands = create_test_brands();
        brands.insert("B0".to_string(), VaccineBrand::new("B0", 0, 0));
        let lots = vec![VaccineLot::new("L1", "B0", date(1), 3)];
        assert!(matches!(
            LotScheduler::new().schedule(&lots, &brands),
            Err(ScheduleError::InvalidBrand { .. })
        ));
    }
}
