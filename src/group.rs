//! Order-preserving grouping of records by source file.

use crate::models::Record;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
/// Records partitioned by their `file` field.
///
/// Files iterate in first-seen order and each file keeps its records in
/// extraction order.
pub struct FileGroup {
    files: Vec<(String, Vec<Record>)>,
    index: HashMap<String, usize>,
}

impl FileGroup {
    /// Group records by file. Records without a file are dropped; callers
    /// render those through the ungrouped path.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut group = FileGroup::default();
        for rec in records {
            group.push(rec);
        }
        group
    }

    /// Returns false when the record has no file and was not grouped.
    pub fn push(&mut self, record: Record) -> bool {
        let Some(file) = record.file().map(str::to_string) else {
            return false;
        };
        match self.index.get(&file) {
            Some(&i) => self.files[i].1.push(record),
            None => {
                self.index.insert(file.clone(), self.files.len());
                self.files.push((file, vec![record]));
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn record_count(&self) -> usize {
        self.files.iter().map(|(_, recs)| recs.len()).sum()
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(f, _)| f.as_str())
    }

    pub fn get(&self, file: &str) -> Option<&[Record]> {
        self.index.get(file).map(|&i| self.files[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.files.iter().map(|(f, recs)| (f.as_str(), recs.as_slice()))
    }

    /// Mutable access per file; each file's records are disjoint.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<Record>)> {
        self.files.iter_mut().map(|(f, recs)| (f.as_str(), recs))
    }

    /// Flatten back into a single list, file by file.
    pub fn into_records(self) -> Vec<Record> {
        self.files.into_iter().flat_map(|(_, recs)| recs).collect()
    }
}
