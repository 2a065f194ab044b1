// ==========================================
// 两剂次疫苗接种排程系统 - 领域类型定义
// ==========================================
// 职责: 接种阶段、剂次、健康标志等基础枚举
// 红线: 阶段顺序固定 (n1a 最高优先级)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 接种阶段 (Phase)
// ==========================================
// 依据: 全国接种计划分期 (阶段 + 子阶段)
// 序列化格式: 小写 (与输入文件列名一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    N1a, // 一线医护
    N1b,
    N1c,
    N2a,
    N2b,
    N2c,
    N2d,
    N3a,
    N4a,
    N4b,
    N4c,
    N4d,
}

impl Phase {
    /// 全部阶段（按处理顺序）
    pub const ALL: [Phase; 12] = [
        Phase::N1a,
        Phase::N1b,
        Phase::N1c,
        Phase::N2a,
        Phase::N2b,
        Phase::N2c,
        Phase::N2d,
        Phase::N3a,
        Phase::N4a,
        Phase::N4b,
        Phase::N4c,
        Phase::N4d,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::N1a => "n1a",
            Phase::N1b => "n1b",
            Phase::N1c => "n1c",
            Phase::N2a => "n2a",
            Phase::N2b => "n2b",
            Phase::N2c => "n2c",
            Phase::N2d => "n2d",
            Phase::N3a => "n3a",
            Phase::N4a => "n4a",
            Phase::N4b => "n4b",
            Phase::N4c => "n4c",
            Phase::N4d => "n4d",
        }
    }

    /// 在 ALL 中的下标（用于配额数组寻址）
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 由 "阶段" + "子阶段" 两列组合解析
    ///
    /// 接受 ("1", "a") / ("n1", "a") / ("1a", "") 等写法
    pub fn from_parts(phase: &str, subphase: &str) -> Result<Phase, PhaseParseError> {
        let phase = phase.trim().to_lowercase();
        let subphase = subphase.trim().to_lowercase();
        let phase = phase.strip_prefix('n').unwrap_or(&phase);
        format!("n{}{}", phase, subphase).parse()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 未识别的阶段名
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未识别的接种阶段: {0}")]
pub struct PhaseParseError(pub String);

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Phase::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| PhaseParseError(s.to_string()))
    }
}

// ==========================================
// 剂次 (Dose Number)
// ==========================================
// 序列化格式: 1 / 2 (与输出文件一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DoseNumber {
    First,  // 第一剂
    Second, // 第二剂
}

impl DoseNumber {
    pub fn as_u8(&self) -> u8 {
        match self {
            DoseNumber::First => 1,
            DoseNumber::Second => 2,
        }
    }
}

impl TryFrom<u8> for DoseNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DoseNumber::First),
            2 => Ok(DoseNumber::Second),
            other => Err(format!("剂次只能为 1 或 2，实际 {}", other)),
        }
    }
}

impl fmt::Display for DoseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for DoseNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for DoseNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        DoseNumber::try_from(raw).map_err(serde::de::Error::custom)
    }
}

// ==========================================
// 健康标志 (Health Flag)
// ==========================================
// 取值: 有(1) / 无(0) / 未知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthFlag {
    Present,
    Absent,
    #[default]
    Unknown,
}

impl HealthFlag {
    /// 原始数值 (未知返回 None)
    pub fn raw_value(&self) -> Option<f64> {
        match self {
            HealthFlag::Present => Some(1.0),
            HealthFlag::Absent => Some(0.0),
            HealthFlag::Unknown => None,
        }
    }

    /// 从输入文件文本解析（Si/No 等）
    pub fn parse_lenient(value: &str) -> HealthFlag {
        match value.trim().to_lowercase().as_str() {
            "si" | "sí" | "s" | "yes" | "y" | "1" | "true" => HealthFlag::Present,
            "no" | "n" | "0" | "false" => HealthFlag::Absent,
            _ => HealthFlag::Unknown,
        }
    }
}

impl fmt::Display for HealthFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthFlag::Present => write!(f, "PRESENT"),
            HealthFlag::Absent => write!(f, "ABSENT"),
            HealthFlag::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
