// ==========================================
// 两剂次疫苗接种排程系统 - 输入数据集加载
// ==========================================
// 职责: 按配置中的文件名加载全部输入表, 组装排程输入
// 流程: 文件解析 (UniversalFileParser) -> 字段映射 (FieldMapper)
// ==========================================

use crate::config::ScheduleConfig;
use crate::domain::assignment::VaccinationEvent;
use crate::domain::exclusion::ExclusionSet;
use crate::domain::vaccine::VaccineBrand;
use crate::engine::orchestrator::ScheduleInput;
use crate::engine::priority::{PriorityDimension, PriorityTable, PriorityTables};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument, warn};

// ==========================================
// InputDataset - 输入数据集加载器
// ==========================================
pub struct InputDataset {
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl Default for InputDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDataset {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    /// 加载排程所需的全部输入表
    ///
    /// 顺序: 接种点 -> 疫苗品牌 -> 批次 -> 查表 -> 受种者 -> 排除名单
    #[instrument(skip_all, fields(data_dir = %config.files.data_dir.display()))]
    pub fn load(&self, config: &ScheduleConfig) -> ImportResult<ScheduleInput> {
        let files = &config.files;

        let clinics = self.load_table(&files.resolve(&files.clinics), |row, n| {
            self.mapper.map_clinic(row, n)
        })?;
        let brands = self.load_brands(config)?;
        let lots = self.load_table(&files.resolve(&files.lots), |row, n| {
            self.mapper.map_lot(row, n)
        })?;
        let tables = self.load_priority_tables(config)?;
        let patients = self.load_table(&files.resolve(&files.patients), |row, n| {
            self.mapper.map_patient(row, n)
        })?;
        let exclusions: ExclusionSet = self
            .load_table(&files.resolve(&files.exclusions), |row, n| {
                self.mapper.map_exclusion(row, n)
            })?
            .into_iter()
            .collect();

        info!(
            clinics = clinics.len(),
            brands = brands.len(),
            lots = lots.len(),
            patients = patients.len(),
            exclusions = exclusions.len(),
            "输入数据加载完成"
        );

        Ok(ScheduleInput {
            clinics,
            patients,
            tables,
            brands,
            lots,
            exclusions,
        })
    }

    /// 疫苗品牌表（按品牌 ID 索引）
    pub fn load_brands(&self, config: &ScheduleConfig) -> ImportResult<HashMap<String, VaccineBrand>> {
        let files = &config.files;
        let brands = self.load_table(&files.resolve(&files.brands), |row, n| {
            self.mapper.map_brand(row, n)
        })?;

        let mut by_id = HashMap::with_capacity(brands.len());
        for brand in brands {
            if let Some(previous) = by_id.insert(brand.brand_id.clone(), brand) {
                warn!(brand_id = %previous.brand_id, "疫苗品牌重复, 以后出现者为准");
            }
        }
        Ok(by_id)
    }

    /// 实际接种记录（对账模式, 保持文件顺序）
    pub fn load_vaccination_events(
        &self,
        config: &ScheduleConfig,
    ) -> ImportResult<Vec<VaccinationEvent>> {
        let files = &config.files;
        self.load_table(&files.resolve(&files.vaccinated), |row, n| {
            self.mapper.map_vaccination_event(row, n)
        })
    }

    /// 四张优先级查表
    pub fn load_priority_tables(&self, config: &ScheduleConfig) -> ImportResult<PriorityTables> {
        let files = &config.files;

        let age = self.load_table(&files.resolve(&files.age_priority), |row, n| {
            self.mapper.map_age_priority(row, n)
        })?;
        let role = self.load_table(&files.resolve(&files.role_priority), |row, n| {
            self.mapper.map_role_priority(row, n)
        })?;
        let residence = self.load_table(&files.resolve(&files.residence_priority), |row, n| {
            self.mapper.map_residence_priority(row, n)
        })?;
        let work_unit = self.load_table(&files.resolve(&files.work_unit_priority), |row, n| {
            self.mapper.map_work_unit_priority(row, n)
        })?;

        Ok(PriorityTables {
            age: PriorityTable::from_entries(PriorityDimension::Age, age),
            role: PriorityTable::from_entries(PriorityDimension::Role, role),
            residence: PriorityTable::from_entries(PriorityDimension::Residence, residence),
            work_unit: PriorityTable::from_entries(PriorityDimension::WorkUnit, work_unit),
        })
    }

    /// 解析单个文件并逐行映射（行号从 1 开始, 不含表头）
    fn load_table<T, F>(&self, path: &Path, map_row: F) -> ImportResult<Vec<T>>
    where
        F: Fn(&RawRow, usize) -> ImportResult<T>,
    {
        let rows = self.parser.parse(path)?;
        rows.iter()
            .enumerate()
            .map(|(idx, row)| map_row(row, idx + 1))
            .collect()
    }
}
