use std::collections::HashMap;

use crate::table::SampleTable;

pub type Label = i64;

/// Label → recordings, iterated in order of first discovery.
///
/// A label only exists once it holds at least one table.
#[derive(Debug, Clone, Default)]
pub struct GroupedDataset {
    groups: Vec<(Label, Vec<SampleTable>)>,
    index: HashMap<Label, usize>,
}

impl GroupedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: Label, table: SampleTable) {
        match self.index.get(&label) {
            Some(&slot) => self.groups[slot].1.push(table),
            None => {
                self.index.insert(label, self.groups.len());
                self.groups.push((label, vec![table]));
            }
        }
    }

    pub fn tables(&self, label: Label) -> &[SampleTable] {
        self.index
            .get(&label)
            .map(|&slot| self.groups[slot].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn labels(&self) -> Vec<Label> {
        self.groups.iter().map(|(label, _)| *label).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, &[SampleTable])> {
        self.groups.iter().map(|(label, tables)| (*label, tables.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.groups.iter().map(|(_, t)| t.len()).sum()
    }

    pub fn frame_count(&self, label: Label) -> usize {
        self.tables(label).iter().map(SampleTable::len).sum()
    }
}

impl FromIterator<(Label, SampleTable)> for GroupedDataset {
    fn from_iter<I: IntoIterator<Item = (Label, SampleTable)>>(iter: I) -> Self {
        let mut dataset = GroupedDataset::new();
        for (label, table) in iter {
            dataset.insert(label, table);
        }
        dataset
    }
}
