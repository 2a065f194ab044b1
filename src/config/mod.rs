// ==========================================
// 两剂次疫苗接种排程系统 - 配置层
// ==========================================
// 职责: 配置加载与校验
// 存储: JSON 文件 / 历史 config.txt
// ==========================================

pub mod config_loader;
pub mod error;
pub mod schedule_config;

// 重导出核心配置
pub use error::{ConfigError, ConfigResult};
pub use schedule_config::{
    AllocationPolicy, CapacityConfig, InputFiles, LotRoundsPolicy, PriorityWeights,
    ScheduleConfig, ScoreCoupling, SecondDoseAnchor, TallyScope,
};
