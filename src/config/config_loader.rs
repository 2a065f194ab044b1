// ==========================================
// 两剂次疫苗接种排程系统 - 配置加载
// ==========================================
// 支持: JSON 配置文件 / 历史 config.txt (每行首个字段)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::schedule_config::ScheduleConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// 历史 config.txt 的行顺序
const LEGACY_NUMERIC_KEYS: [&str; 13] = [
    "stations_per_clinic",
    "doses_per_station_per_day",
    "default_lead_time_days",
    "weights.age",
    "weights.residence",
    "weights.work_unit",
    "weights.role",
    "weights.prior_infection",
    "weights.diabetes",
    "weights.obesity",
    "weights.cancer",
    "weights.hiv",
    "weights.renal",
];

const LEGACY_FILE_KEYS: [&str; 11] = [
    "files.data_dir",
    "files.patients",
    "files.lots",
    "files.role_priority",
    "files.age_priority",
    "files.residence_priority",
    "files.work_unit_priority",
    "files.brands",
    "files.clinics",
    "files.exclusions",
    "files.vaccinated",
];

impl ScheduleConfig {
    /// 根据扩展名加载配置（.json 为 JSON, 其余按历史文本格式）
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            Self::from_json_file(path)?
        } else {
            Self::from_legacy_file(path)?
        };
        config.validate()?;

        info!(
            path = %path.display(),
            stations = config.capacity.stations_per_clinic,
            doses_per_station = config.capacity.doses_per_station_per_day,
            lead_time_days = config.capacity.default_lead_time_days,
            "配置加载完成"
        );
        Ok(config)
    }

    /// 从 JSON 文件加载（缺省字段取默认值）
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 从历史 config.txt 加载
    pub fn from_legacy_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = read_to_string(path.as_ref())?;
        Self::from_legacy_str(&content)
    }

    /// 解析历史格式
    ///
    /// 规则：
    /// 1) 每行取第一个空格前的字段, 其后为注释
    /// 2) 前 13 行为数值（产能 3 项 + 权重 10 项），必填
    /// 3) 第 14~24 行为数据目录与文件名，可省略（取默认值）
    pub fn from_legacy_str(content: &str) -> ConfigResult<Self> {
        let tokens: Vec<&str> = content
            .lines()
            .map(|line| line.trim_start().split(' ').next().unwrap_or("").trim())
            .collect();

        let mut numbers = [0u32; 13];
        for (idx, key) in LEGACY_NUMERIC_KEYS.iter().enumerate() {
            let token = tokens
                .get(idx)
                .copied()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ConfigError::MissingValue {
                    line: idx + 1,
                    key: key.to_string(),
                })?;
            numbers[idx] = parse_non_negative(key, token)?;
        }

        let mut config = ScheduleConfig::default();
        config.capacity.stations_per_clinic = numbers[0];
        config.capacity.doses_per_station_per_day = numbers[1];
        config.capacity.default_lead_time_days = numbers[2];
        config.weights.age = numbers[3];
        config.weights.residence = numbers[4];
        config.weights.work_unit = numbers[5];
        config.weights.role = numbers[6];
        config.weights.prior_infection = numbers[7];
        config.weights.diabetes = numbers[8];
        config.weights.obesity = numbers[9];
        config.weights.cancer = numbers[10];
        config.weights.hiv = numbers[11];
        config.weights.renal = numbers[12];

        let files = &mut config.files;
        for (offset, key) in LEGACY_FILE_KEYS.iter().enumerate() {
            let Some(token) = tokens
                .get(LEGACY_NUMERIC_KEYS.len() + offset)
                .copied()
                .filter(|t| !t.is_empty())
            else {
                debug!(key = *key, "历史配置未提供, 使用默认值");
                continue;
            };
            let value = token.to_string();
            match offset {
                0 => files.data_dir = PathBuf::from(value),
                1 => files.patients = value,
                2 => files.lots = value,
                3 => files.role_priority = value,
                4 => files.age_priority = value,
                5 => files.residence_priority = value,
                6 => files.work_unit_priority = value,
                7 => files.brands = value,
                8 => files.clinics = value,
                9 => files.exclusions = value,
                _ => files.vaccinated = value,
            }
        }

        Ok(config)
    }
}

fn read_to_string(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.display().to_string(),
        source,
    })
}

fn parse_non_negative(key: &str, token: &str) -> ConfigResult<u32> {
    let value = i64::from_str(token).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: token.to_string(),
        message: e.to_string(),
    })?;
    u32::try_from(value).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: token.to_string(),
        message: "必须为非负整数".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schedule_config::{LotRoundsPolicy, ScoreCoupling};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LEGACY_SHORT: &str = "2 estaciones por dependencia
50 vacunas por estacion por dia
3 dias para llevar vacunas
1 peso edad
1 peso habita
0 peso trabaja
1 peso cargo
1 peso covid
1 peso diabetes
1 peso sobrepeso
1 peso cancer
1 peso vih
1 peso renal
";

    #[test]
    fn test_legacy_numeric_lines() {
        let config = ScheduleConfig::from_legacy_str(LEGACY_SHORT).unwrap();
        assert_eq!(config.capacity.stations_per_clinic, 2);
        assert_eq!(config.capacity.doses_per_station_per_day, 50);
        assert_eq!(config.capacity.default_lead_time_days, 3);
        assert_eq!(config.weights.work_unit, 0);
        assert_eq!(config.weights.renal, 1);
        // 文件名取默认值
        assert_eq!(config.files.patients, "fakedata.csv");
    }

    #[test]
    fn test_legacy_file_lines() {
        let content = format!(
            "{}datos/ ruta\npacientes.csv\nlotes.csv\ncargos.csv\nedad.csv\nmuni.csv\nunidades.csv\nvacunas.csv\nclinicas.csv\nexcluidos.csv\nvacunados.csv\n",
            LEGACY_SHORT
        );
        let config = ScheduleConfig::from_legacy_str(&content).unwrap();
        assert_eq!(config.files.data_dir, PathBuf::from("datos/"));
        assert_eq!(config.files.patients, "pacientes.csv");
        assert_eq!(config.files.clinics, "clinicas.csv");
        assert_eq!(config.files.vaccinated, "vacunados.csv");
    }

    #[test]
    fn test_legacy_negative_weight_rejected() {
        let content = LEGACY_SHORT.replace("1 peso cancer", "-1 peso cancer");
        let err = ScheduleConfig::from_legacy_str(&content).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "weights.cancer"));
    }

    #[test]
    fn test_legacy_missing_line_rejected() {
        let content: String = LEGACY_SHORT.lines().take(5).collect::<Vec<_>>().join("\n");
        let err = ScheduleConfig::from_legacy_str(&content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { line: 6, .. }));
    }

    #[test]
    fn test_json_partial_config_uses_defaults() {
        let config = ScheduleConfig::from_json_str(
            r#"{"capacity": {"stations_per_clinic": 4},
                "policy": {"score_coupling": "corrected", "lot_rounds": "cumulative"}}"#,
        )
        .unwrap();
        assert_eq!(config.capacity.stations_per_clinic, 4);
        assert_eq!(config.capacity.doses_per_station_per_day, 100);
        assert_eq!(config.policy.score_coupling, ScoreCoupling::Corrected);
        assert_eq!(config.policy.lot_rounds, LotRoundsPolicy::Cumulative);
        assert_eq!(config.weights.age, 1);
    }

    #[test]
    fn test_json_negative_weight_rejected() {
        let result = ScheduleConfig::from_json_str(r#"{"weights": {"age": -2}}"#);
        assert!(matches!(result, Err(ConfigError::JsonParse(_))));
    }

    #[test]
    fn test_load_dispatches_on_extension() {
        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, r#"{{"capacity": {{"doses_per_station_per_day": 0}}}}"#).unwrap();
        // JSON 解析成功但校验失败
        assert!(matches!(
            ScheduleConfig::load(json_file.path()),
            Err(ConfigError::ZeroDailyCapacity { .. })
        ));

        let mut legacy_file = NamedTempFile::new().unwrap();
        write!(legacy_file, "{}", LEGACY_SHORT).unwrap();
        let config = ScheduleConfig::load(legacy_file.path()).unwrap();
        assert_eq!(config.capacity.stations_per_clinic, 2);
    }
}
