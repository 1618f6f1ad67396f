use std::collections::HashMap;

use super::model::{Field, GroupKey, ParsedFile};

/// Fields ignored when looking for the sub-range files of one measurement.
pub const COMBINE_EXCLUDED: [Field; 4] = [
    Field::Date,
    Field::DeviceDegradation,
    Field::DatapointCapture,
    Field::FrequencyRange,
];

/// Fields ignored when pooling replicates for the viewer; chemistry and
/// amplitude become plot dimensions instead.
pub const VIEWER_EXCLUDED: [Field; 5] = [
    Field::DeviceChemistry,
    Field::Date,
    Field::DeviceDegradation,
    Field::DevicePixel,
    Field::VoltageAmplitude,
];

/// Filenames sharing every retained field.
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    pub key: GroupKey,
    /// Filenames in the order they were first seen.
    pub files: Vec<String>,
}

/// Partition `files` by every field not listed in `excluded`.
///
/// Values are compared as raw filename tokens, so `0.5` and `0.50` are
/// different amplitudes. Groups come back in first-seen order.
pub fn group_files(files: &[ParsedFile], excluded: &[Field]) -> Vec<FileGroup> {
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for file in files {
        let key = GroupKey::of(&file.id, excluded);
        match index.get(&key) {
            Some(&i) => groups[i].files.push(file.name.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(FileGroup {
                    key,
                    files: vec![file.name.clone()],
                });
            }
        }
    }
    groups
}
