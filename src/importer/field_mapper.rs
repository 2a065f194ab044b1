// ==========================================
// 两剂次疫苗接种排程系统 - 字段映射器实现
// ==========================================
// 职责: 源字段 → 领域记录映射 + 类型转换
// 规则: 列名去空白后匹配, 支持别名; 空单元格视为缺失
// ==========================================

use crate::domain::assignment::VaccinationEvent;
use crate::domain::clinic::{Clinic, PhaseQuotas};
use crate::domain::exclusion::ExclusionEntry;
use crate::domain::patient::{PatientAttributes, PatientRecord};
use crate::domain::types::{HealthFlag, Phase};
use crate::domain::vaccine::{VaccineBrand, VaccineLot};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use chrono::{Days, NaiveDate, NaiveDateTime};

// 表名（用于错误定位）
pub const TABLE_CLINICS: &str = "clinics";
pub const TABLE_PATIENTS: &str = "patients";
pub const TABLE_LOTS: &str = "lots";
pub const TABLE_BRANDS: &str = "brands";
pub const TABLE_AGE_PRIORITY: &str = "age_priority";
pub const TABLE_ROLE_PRIORITY: &str = "role_priority";
pub const TABLE_RESIDENCE_PRIORITY: &str = "residence_priority";
pub const TABLE_WORK_UNIT_PRIORITY: &str = "work_unit_priority";
pub const TABLE_EXCLUSIONS: &str = "exclusions";
pub const TABLE_VACCINATED: &str = "vaccinated";

pub struct FieldMapper;

impl FieldMapper {
    // ==========================================
    // 接种点 / 受种者
    // ==========================================

    pub fn map_clinic(&self, row: &RawRow, row_number: usize) -> ImportResult<Clinic> {
        let t = TABLE_CLINICS;
        let clinic_id = self.require(row, "codigo", t, row_number)?;

        let mut quotas = PhaseQuotas::default();
        for phase in Phase::ALL {
            let quota = self.parse_integer(row, phase.as_str(), t, row_number)?;
            quotas.set(phase, quota.unwrap_or(0));
        }

        Ok(Clinic {
            name: self
                .get_string(row, "dependencia")
                .unwrap_or_else(|| clinic_id.clone()),
            department: self.get_string(row, "departamento"),
            municipality: self.get_string(row, "municipio"),
            latitude: self.parse_f64(row, "latitud", t, row_number)?,
            longitude: self.parse_f64(row, "longitud", t, row_number)?,
            station_capacity: self.parse_u32(row, "vaccCap", t, row_number)?,
            stations_per_dependency: self.parse_u32(row, "estaciones", t, row_number)?,
            doses_per_station_per_day: self.parse_u32(row, "vacunasPorEstacion", t, row_number)?,
            lead_time_days: self.parse_u32(row, "tiempo", t, row_number)?,
            quotas,
            clinic_id,
        })
    }

    pub fn map_patient(&self, row: &RawRow, row_number: usize) -> ImportResult<PatientRecord> {
        let t = TABLE_PATIENTS;
        let patient_id = self.require(row, "codigo", t, row_number)?;
        let clinic_id = self.require(row, "nombreUnidadAdscripcion", t, row_number)?;

        let phase = match self.get_string(row, "Fase") {
            None => None,
            Some(phase) => {
                let subphase = self.get_string(row, "SubFase").unwrap_or_default();
                let parsed = Phase::from_parts(&phase, &subphase).map_err(|source| {
                    ImportError::InvalidPhase {
                        table: t,
                        row: row_number,
                        source,
                    }
                })?;
                Some(parsed)
            }
        };

        let attributes = PatientAttributes {
            age: self.parse_u32(row, "edad", t, row_number)?,
            role: self.get_string(row, "cargo"),
            department: self.get_string(row, "departamento"),
            municipality: self.get_string(row, "municipio"),
            work_unit: Some(clinic_id.clone()),
            prior_infection: self.parse_flag(row, "tuvoCovid"),
            diabetes: self.parse_flag(row, "diabetico"),
            obesity: self.parse_flag(row, "sobrepeso"),
            cancer: self.parse_flag(row, "cancer"),
            hiv: self.parse_flag(row, "VIH"),
            renal: self.parse_flag(row, "Renal"),
        };

        Ok(PatientRecord {
            patient_id,
            clinic_id,
            phase,
            attributes,
            preset_score: self.parse_f64(row, "prioridad", t, row_number)?,
        })
    }

    // ==========================================
    // 疫苗品牌 / 批次
    // ==========================================

    pub fn map_brand(&self, row: &RawRow, row_number: usize) -> ImportResult<VaccineBrand> {
        let t = TABLE_BRANDS;
        let brand_id = self.require(row, "id_marca", t, row_number)?;
        let doses_required = self.parse_u32(row, "dosis", t, row_number)?.ok_or_else(|| {
            ImportError::FieldMappingError {
                table: t,
                row: row_number,
                message: "缺少所需剂次 (dosis)".to_string(),
            }
        })?;
        if doses_required == 0 {
            return Err(ImportError::InvalidBrand { brand_id });
        }

        Ok(VaccineBrand {
            name: self
                .get_string(row, "marca")
                .unwrap_or_else(|| brand_id.clone()),
            doses_required,
            // 单剂次品牌常留空
            interval_weeks: self
                .parse_u32(row, "tiempo_dosis (semanas)", t, row_number)?
                .unwrap_or(0),
            storage_temperature: self.get_string(row, "temp_conserv"),
            notes: self.get_string(row, "observaciones"),
            brand_id,
        })
    }

    pub fn map_lot(&self, row: &RawRow, row_number: usize) -> ImportResult<VaccineLot> {
        let t = TABLE_LOTS;
        let arrival_date = self
            .parse_date(row, "fecha_ingreso", t, row_number)?
            .ok_or(ImportError::PrimaryKeyMissing {
                table: t,
                row: row_number,
                field: "fecha_ingreso",
            })?;

        Ok(VaccineLot {
            lot_id: self.require(row, "id_lote", t, row_number)?,
            brand_id: self.require(row, "id_marca", t, row_number)?,
            arrival_date,
            units: self.parse_u32(row, "num_vacunas", t, row_number)?.unwrap_or(0),
        })
    }

    // ==========================================
    // 优先级查表
    // ==========================================

    pub fn map_age_priority(&self, row: &RawRow, row_number: usize) -> ImportResult<(u32, f64)> {
        let t = TABLE_AGE_PRIORITY;
        let age = self
            .parse_u32(row, "edad", t, row_number)?
            .ok_or(ImportError::PrimaryKeyMissing {
                table: t,
                row: row_number,
                field: "edad",
            })?;
        Ok((age, self.require_priority(row, t, row_number)?))
    }

    pub fn map_role_priority(&self, row: &RawRow, row_number: usize) -> ImportResult<(String, f64)> {
        let t = TABLE_ROLE_PRIORITY;
        Ok((
            self.require(row, "cargos", t, row_number)?,
            self.require_priority(row, t, row_number)?,
        ))
    }

    /// 居住地查表键: "省份, 城市"
    pub fn map_residence_priority(
        &self,
        row: &RawRow,
        row_number: usize,
    ) -> ImportResult<(String, f64)> {
        let t = TABLE_RESIDENCE_PRIORITY;
        let department = self.require(row, "Departamento", t, row_number)?;
        let municipality = self.require(row, "Municipio", t, row_number)?;
        Ok((
            format!("{}, {}", department, municipality),
            self.require_priority(row, t, row_number)?,
        ))
    }

    pub fn map_work_unit_priority(
        &self,
        row: &RawRow,
        row_number: usize,
    ) -> ImportResult<(String, f64)> {
        let t = TABLE_WORK_UNIT_PRIORITY;
        Ok((
            self.require(row, "dependencia", t, row_number)?,
            self.require_priority(row, t, row_number)?,
        ))
    }

    // ==========================================
    // 排除名单 / 实际接种
    // ==========================================

    pub fn map_exclusion(&self, row: &RawRow, row_number: usize) -> ImportResult<ExclusionEntry> {
        Ok(ExclusionEntry {
            patient_id: self.require(row, "codigo", TABLE_EXCLUSIONS, row_number)?,
            reason: self.get_string(row, "razon"),
        })
    }

    pub fn map_vaccination_event(
        &self,
        row: &RawRow,
        row_number: usize,
    ) -> ImportResult<VaccinationEvent> {
        let t = TABLE_VACCINATED;
        let date = self
            .parse_date(row, "fecha", t, row_number)?
            .ok_or(ImportError::PrimaryKeyMissing {
                table: t,
                row: row_number,
                field: "fecha",
            })?;

        Ok(VaccinationEvent {
            patient_id: self.require(row, "codigo", t, row_number)?,
            clinic_id: self.require(row, "clinica", t, row_number)?,
            brand_id: self.require(row, "vacuna", t, row_number)?,
            date,
        })
    }

    // ==========================================
    // 字段提取与类型转换
    // ==========================================

    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        // 定义列名别名映射
        let aliases: Vec<&str> = match key {
            "codigo" => vec!["codigo", "IdPaciente", "codigoDependencia"],
            "dependencia" => vec!["dependencia", "nombre"],
            "nombreUnidadAdscripcion" => vec!["nombreUnidadAdscripcion", "clinica"],
            "tiempo" => vec!["tiempo", "tiempoTraslado"],
            "tiempo_dosis (semanas)" => vec!["tiempo_dosis (semanas)", "tiempo_dosis"],
            "fecha_ingreso" => vec!["fecha_ingreso", "fecha"],
            "prioridad" => vec!["prioridad", "Prioridad"],
            "Departamento" => vec!["Departamento", "departamento"],
            "Municipio" => vec!["Municipio", "municipio"],
            "VIH" => vec!["VIH", "vih"],
            "Renal" => vec!["Renal", "renal"],
            _ => vec![key],
        };

        // 尝试所有可能的列名
        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    /// 必填字符串字段
    fn require(
        &self,
        row: &RawRow,
        key: &'static str,
        table: &'static str,
        row_number: usize,
    ) -> ImportResult<String> {
        self.get_string(row, key)
            .ok_or(ImportError::PrimaryKeyMissing {
                table,
                row: row_number,
                field: key,
            })
    }

    fn require_priority(
        &self,
        row: &RawRow,
        table: &'static str,
        row_number: usize,
    ) -> ImportResult<f64> {
        self.parse_f64(row, "prioridad", table, row_number)?
            .ok_or(ImportError::PrimaryKeyMissing {
                table,
                row: row_number,
                field: "prioridad",
            })
    }

    /// 健康标志: 空单元格视为未知
    fn parse_flag(&self, row: &RawRow, key: &str) -> HealthFlag {
        self.get_string(row, key)
            .map(|v| HealthFlag::parse_lenient(&v))
            .unwrap_or_default()
    }

    /// 解析浮点数
    fn parse_f64(
        &self,
        row: &RawRow,
        key: &str,
        table: &'static str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    table,
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为浮点数: {}", value),
                }),
        }
    }

    /// 解析整数（兼容 "12.0" 这类导出格式）
    fn parse_integer(
        &self,
        row: &RawRow,
        key: &str,
        table: &'static str,
        row_number: usize,
    ) -> ImportResult<Option<i64>> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };
        if let Ok(parsed) = value.parse::<i64>() {
            return Ok(Some(parsed));
        }
        match value.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
            _ => Err(ImportError::TypeConversionError {
                table,
                row: row_number,
                field: key.to_string(),
                message: format!("无法解析为整数: {}", value),
            }),
        }
    }

    /// 解析非负整数
    fn parse_u32(
        &self,
        row: &RawRow,
        key: &str,
        table: &'static str,
        row_number: usize,
    ) -> ImportResult<Option<u32>> {
        match self.parse_integer(row, key, table, row_number)? {
            None => Ok(None),
            Some(value) => u32::try_from(value).map(Some).map_err(|_| {
                ImportError::TypeConversionError {
                    table,
                    row: row_number,
                    field: key.to_string(),
                    message: format!("必须为非负整数: {}", value),
                }
            }),
        }
    }

    /// 解析日期
    ///
    /// 支持: DD/MM/YYYY / YYYY-MM-DD / YYYYMMDD / YYYY-MM-DD HH:MM:SS / Excel 序列号
    fn parse_date(
        &self,
        row: &RawRow,
        key: &str,
        table: &'static str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };

        let parsed = NaiveDate::parse_from_str(&value, "%d/%m/%Y")
            .or_else(|_| NaiveDate::parse_from_str(&value, "%Y-%m-%d"))
            .or_else(|_| NaiveDate::parse_from_str(&value, "%Y%m%d"))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
            })
            .ok()
            .or_else(|| excel_serial_date(&value));

        parsed.map(Some).ok_or(ImportError::DateFormatError {
            table,
            row: row_number,
            field: key.to_string(),
            value,
        })
    }
}

/// Excel 日期序列号（1900 日期系统, 起点 1899-12-30）
fn excel_serial_date(value: &str) -> Option<NaiveDate> {
    let serial = value.parse::<f64>().ok()?;
    if !(1.0..100_000.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    #[test]
    fn test_map_clinic_with_quotas() {
        let r = row(&[
            ("codigo", "C01"),
            ("dependencia", "Hospital General"),
            ("departamento", "Guatemala"),
            ("municipio", "Mixco"),
            ("latitud", "14.63"),
            ("longitud", "-90.6"),
            ("vaccCap", "4"),
            ("tiempo", "2"),
            ("n1a", "12.0"),
            ("n2c", "-3"),
        ]);
        let clinic = FieldMapper.map_clinic(&r, 1).unwrap();

        assert_eq!(clinic.clinic_id, "C01");
        assert_eq!(clinic.name, "Hospital General");
        assert_eq!(clinic.station_capacity, Some(4));
        assert_eq!(clinic.lead_time_days, Some(2));
        assert_eq!(clinic.stations_per_dependency, None);
        assert_eq!(clinic.quotas.get(Phase::N1a), 12);
        assert_eq!(clinic.quotas.get(Phase::N2c), -3);
        assert_eq!(clinic.quotas.get(Phase::N4d), 0); // 缺列视为 0
    }

    #[test]
    fn test_map_patient_flags_and_phase() {
        let r = row(&[
            ("codigo", "P001"),
            ("edad", "67"),
            ("cargo", "Medico"),
            ("nombreUnidadAdscripcion", "C01"),
            ("Fase", "1"),
            ("SubFase", "b"),
            ("tuvoCovid", "Si"),
            ("diabetico", "No"),
            ("sobrepeso", ""),
        ]);
        let record = FieldMapper.map_patient(&r, 1).unwrap();

        assert_eq!(record.patient_id, "P001");
        assert_eq!(record.clinic_id, "C01");
        assert_eq!(record.phase, Some(Phase::N1b));
        assert_eq!(record.attributes.age, Some(67));
        assert_eq!(record.attributes.work_unit.as_deref(), Some("C01"));
        assert_eq!(record.attributes.prior_infection, HealthFlag::Present);
        assert_eq!(record.attributes.diabetes, HealthFlag::Absent);
        assert_eq!(record.attributes.obesity, HealthFlag::Unknown);
        assert_eq!(record.preset_score, None);
    }

    #[test]
    fn test_map_patient_invalid_phase() {
        let r = row(&[
            ("codigo", "P001"),
            ("nombreUnidadAdscripcion", "C01"),
            ("Fase", "2"),
            ("SubFase", "z"),
        ]);
        let result = FieldMapper.map_patient(&r, 7);
        assert!(matches!(result, Err(ImportError::InvalidPhase { row: 7, .. })));
    }

    #[test]
    fn test_map_patient_missing_clinic() {
        let r = row(&[("codigo", "P001")]);
        assert!(matches!(
            FieldMapper.map_patient(&r, 3),
            Err(ImportError::PrimaryKeyMissing {
                field: "nombreUnidadAdscripcion",
                ..
            })
        ));
    }

    #[test]
    fn test_map_lot_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 15).unwrap();
        for value in ["15/01/2021", "2021-01-15", "20210115", "44211"] {
            let r = row(&[
                ("id_lote", "L1"),
                ("id_marca", "X"),
                ("fecha_ingreso", value),
                ("num_vacunas", "500"),
            ]);
            let lot = FieldMapper.map_lot(&r, 1).unwrap();
            assert_eq!(lot.arrival_date, expected, "{}", value);
            assert_eq!(lot.units, 500);
        }
    }

    #[test]
    fn test_map_lot_invalid_date() {
        let r = row(&[("id_lote", "L1"), ("id_marca", "X"), ("fecha_ingreso", "31/02/2021")]);
        assert!(matches!(
            FieldMapper.map_lot(&r, 2),
            Err(ImportError::DateFormatError { .. })
        ));
    }

    #[test]
    fn test_map_brand() {
        let r = row(&[
            ("id_marca", "X"),
            ("marca", "Vacuna X"),
            ("dosis", "2"),
            ("tiempo_dosis (semanas)", "4.0"),
            ("temp_conserv", "-70"),
        ]);
        let brand = FieldMapper.map_brand(&r, 1).unwrap();
        assert_eq!(brand.doses_required, 2);
        assert_eq!(brand.interval_weeks, 4);
        assert_eq!(brand.storage_temperature.as_deref(), Some("-70"));

        let single = row(&[("id_marca", "J"), ("dosis", "1"), ("tiempo_dosis (semanas)", "")]);
        assert_eq!(FieldMapper.map_brand(&single, 2).unwrap().interval_weeks, 0);

        let zero = row(&[("id_marca", "Z"), ("dosis", "0")]);
        assert!(matches!(
            FieldMapper.map_brand(&zero, 3),
            Err(ImportError::InvalidBrand { .. })
        ));
    }

    #[test]
    fn test_map_priority_tables() {
        let residence = row(&[("Departamento", "Guatemala"), ("Municipio", "Mixco"), ("Prioridad", "1")]);
        assert_eq!(
            FieldMapper.map_residence_priority(&residence, 1).unwrap(),
            ("Guatemala, Mixco".to_string(), 1.0)
        );

        let age = row(&[("edad", "60"), ("prioridad", "2")]);
        assert_eq!(FieldMapper.map_age_priority(&age, 1).unwrap(), (60, 2.0));

        let bad = row(&[("cargos", "Medico"), ("prioridad", "alta")]);
        assert!(matches!(
            FieldMapper.map_role_priority(&bad, 4),
            Err(ImportError::TypeConversionError { .. })
        ));
    }

    #[test]
    fn test_map_vaccination_event() {
        let r = row(&[
            ("codigo", "P9"),
            ("clinica", "C02"),
            ("fecha", "03/02/2021"),
            ("vacuna", "X"),
        ]);
        let event = FieldMapper.map_vaccination_event(&r, 1).unwrap();
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2021, 2, 3).unwrap());
        assert_eq!(event.clinic_id, "C02");
    }
}
