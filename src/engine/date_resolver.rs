// ==========================================
// 两剂次疫苗接种排程系统 - 预约日期解析
// ==========================================
// 职责: 候选日期已满时逐日顺延, 直到接种点当日有余量
// 红线: 纯函数, 不修改计数 (由调用方登记)
// ==========================================

use crate::domain::capacity::DailyDoseTally;
use crate::engine::error::{ScheduleError, ScheduleResult};
use chrono::{Days, NaiveDate};
use tracing::trace;

// ==========================================
// AppointmentDateResolver - 日期顺延
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AppointmentDateResolver {
    // 无状态引擎，不需要注入依赖
}

impl AppointmentDateResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析预约日期
    ///
    /// 规则：
    /// 1) 当日计数 >= 日接种能力 时顺延一天
    /// 2) 无记录的日期计数为 0
    ///
    /// # 参数
    /// - `clinic_id`: 接种点
    /// - `tally`: 当前每日剂次计数
    /// - `candidate`: 候选日期
    /// - `daily_capacity`: 日接种能力 (接种台数 × 单台日接种量)
    ///
    /// # 返回
    /// 首个有余量的日期（>= candidate）
    pub fn resolve(
        &self,
        clinic_id: &str,
        tally: &DailyDoseTally,
        candidate: NaiveDate,
        daily_capacity: u64,
    ) -> ScheduleResult<NaiveDate> {
        if daily_capacity == 0 {
            return Err(ScheduleError::ZeroDailyCapacity {
                clinic_id: clinic_id.to_string(),
            });
        }

        let mut date = candidate;
        while tally.count(clinic_id, date) >= daily_capacity {
            date = date
                .succ_opt()
                .ok_or(ScheduleError::DateArithmeticOverflow { base: date, days: 1 })?;
        }

        if date != candidate {
            trace!(clinic_id, %candidate, resolved = %date, "候选日期已满, 顺延");
        }
        Ok(date)
    }
}

/// 日期加天数（溢出报错）
pub fn add_days(base: NaiveDate, days: u64) -> ScheduleResult<NaiveDate> {
    base.checked_add_days(Days::new(days))
        .ok_or(ScheduleError::DateArithmeticOverflow { base, days })
}
