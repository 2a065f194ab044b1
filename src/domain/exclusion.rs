// ==========================================
// 两剂次疫苗接种排程系统 - 排除名单
// ==========================================
// 红线: 名单内受种者不产生任何预约
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionEntry {
    pub patient_id: String,
    pub reason: Option<String>,
}

// ==========================================
// ExclusionSet - 按受种者 ID 查询
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    entries: HashMap<String, Option<String>>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ExclusionEntry) {
        self.entries.insert(entry.patient_id, entry.reason);
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.entries.contains_key(patient_id)
    }

    /// 排除原因（不在名单中返回 None）
    pub fn reason(&self, patient_id: &str) -> Option<&str> {
        self.entries.get(patient_id).and_then(|r| r.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ExclusionEntry> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = ExclusionEntry>>(iter: I) -> Self {
        let mut set = ExclusionSet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter()
            .map(|id| ExclusionEntry {
                patient_id: id.to_string(),
                reason: None,
            })
            .collect()
    }
}
