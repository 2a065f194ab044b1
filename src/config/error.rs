// ==========================================
// 两剂次疫苗接种排程系统 - 配置错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 配置错误在分配开始前终止运行
// ==========================================

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 文件相关错误 =====
    #[error("配置文件读取失败 ({path}): {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件 JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ===== 值相关错误 =====
    #[error("配置缺失 (第 {line} 行, key: {key})")]
    MissingValue { line: usize, key: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("日接种能力必须大于 0 (接种台数 {stations} × 单台日接种量 {throughput})")]
    ZeroDailyCapacity { stations: u32, throughput: u32 },
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
