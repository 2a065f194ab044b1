// ==========================================
// 两剂次疫苗接种排程系统 - 预约 CSV 读写
// ==========================================
// 输出契约: patientId,clinicId,brandId,doseNumber,sequenceOrder,date
// 日期格式: YYYY-MM-DD
// ==========================================

use crate::domain::assignment::Assignment;
use crate::exporter::error::{ExportError, ExportResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// 输出表头
pub const ASSIGNMENT_HEADER: [&str; 6] = [
    "patientId",
    "clinicId",
    "brandId",
    "doseNumber",
    "sequenceOrder",
    "date",
];

// ==========================================
// AssignmentCsvWriter - 写出
// ==========================================
pub struct AssignmentCsvWriter;

impl AssignmentCsvWriter {
    /// 写入文件（覆盖）
    pub fn write_file<P: AsRef<Path>>(&self, path: P, assignments: &[Assignment]) -> ExportResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.write(file, assignments)?;
        info!(path = %path.display(), records = assignments.len(), "预约文件写出完成");
        Ok(())
    }

    /// 写入任意输出流（表头 + 每条记录一行）
    pub fn write<W: Write>(&self, writer: W, assignments: &[Assignment]) -> ExportResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        // 空列表也输出表头
        csv_writer.write_record(ASSIGNMENT_HEADER)?;
        for assignment in assignments {
            csv_writer.serialize(assignment)?;
        }
        csv_writer.flush().map_err(|source| ExportError::Io {
            path: "<writer>".to_string(),
            source,
        })?;
        Ok(())
    }
}

// ==========================================
// AssignmentCsvReader - 读回
// ==========================================
pub struct AssignmentCsvReader;

impl AssignmentCsvReader {
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> ExportResult<Vec<Assignment>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.read(file)
    }

    pub fn read<R: Read>(&self, reader: R) -> ExportResult<Vec<Assignment>> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let assignments = csv_reader
            .deserialize::<Assignment>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }
}
