use crate::types::{GridError, GridResult};
use std::collections::BTreeMap;

/// Mapping from raw land-cover codes to the output vegetation classes
pub trait LandCoverRemapper {
    /// Output classes (1-based) the raw code belongs to; may be empty
    fn classes_for(&self, raw_code: i32) -> &[usize];

    /// Whether vegetation of this raw code can burn
    fn is_burnable(&self, raw_code: i32) -> bool;

    fn class_count(&self) -> usize;
}

/// CCI land-cover legend grouped into the 18 fire-product vegetation classes
#[derive(Debug, Clone, Default)]
pub struct CciLandCoverRemapping;

/// Raw CCI codes per output class, class `i + 1` at index `i`
const CCI_CLASSES: [&[i32]; 18] = [
    &[10, 11, 12],       // cropland, rainfed
    &[20],               // cropland, irrigated
    &[30],               // mosaic cropland / natural vegetation
    &[40],               // mosaic natural vegetation / cropland
    &[50],               // broadleaved evergreen forest
    &[60, 61, 62],       // broadleaved deciduous forest
    &[70, 71, 72],       // needleleaved evergreen forest
    &[80, 81, 82],       // needleleaved deciduous forest
    &[90],               // mixed forest
    &[100],              // mosaic tree and shrub / herbaceous
    &[110],              // mosaic herbaceous / tree and shrub
    &[120, 121, 122],    // shrubland
    &[130],              // grassland
    &[140],              // lichens and mosses
    &[150, 151, 152, 153], // sparse vegetation
    &[160],              // flooded forest, fresh water
    &[170],              // flooded forest, saline water
    &[180],              // flooded shrub or herbaceous
];

const CLASS_INDICES: [[usize; 1]; 18] = [
    [1], [2], [3], [4], [5], [6], [7], [8], [9], [10], [11], [12], [13], [14], [15], [16], [17], [18],
];

impl CciLandCoverRemapping {
    fn class_index(raw_code: i32) -> Option<usize> {
        CCI_CLASSES.iter().position(|codes| codes.contains(&raw_code))
    }
}

impl LandCoverRemapper for CciLandCoverRemapping {
    fn classes_for(&self, raw_code: i32) -> &[usize] {
        match Self::class_index(raw_code) {
            Some(i) => &CLASS_INDICES[i][..],
            None => &[],
        }
    }

    fn is_burnable(&self, raw_code: i32) -> bool {
        Self::class_index(raw_code).is_some()
    }

    fn class_count(&self) -> usize {
        CCI_CLASSES.len()
    }
}

/// Remapping read from an explicit code-to-classes table
#[derive(Debug, Clone, Default)]
pub struct TableRemapping {
    classes: BTreeMap<i32, Vec<usize>>,
    class_count: usize,
}

impl TableRemapping {
    pub fn new(class_count: usize) -> Self {
        Self {
            classes: BTreeMap::new(),
            class_count,
        }
    }

    /// Assign `raw_code` to the given 1-based classes; a code may belong to several
    pub fn insert(&mut self, raw_code: i32, classes: &[usize]) -> GridResult<()> {
        if let Some(&bad) = classes.iter().find(|&&c| c == 0 || c > self.class_count) {
            return Err(GridError::InvalidInput(format!(
                "Land-cover class {} outside 1..={}",
                bad, self.class_count
            )));
        }
        let entry = self.classes.entry(raw_code).or_default();
        for &class in classes {
            if !entry.contains(&class) {
                entry.push(class);
            }
        }
        entry.sort_unstable();
        Ok(())
    }

    pub fn with(mut self, raw_code: i32, classes: &[usize]) -> GridResult<Self> {
        self.insert(raw_code, classes)?;
        Ok(self)
    }
}

impl LandCoverRemapper for TableRemapping {
    fn classes_for(&self, raw_code: i32) -> &[usize] {
        self.classes.get(&raw_code).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_burnable(&self, raw_code: i32) -> bool {
        !self.classes_for(raw_code).is_empty()
    }

    fn class_count(&self) -> usize {
        self.class_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cci_remapping() {
        let remapping = CciLandCoverRemapping;
        assert_eq!(remapping.class_count(), 18);
        assert_eq!(remapping.classes_for(11), &[1]);
        assert_eq!(remapping.classes_for(62), &[6]);
        assert_eq!(remapping.classes_for(153), &[15]);
        assert_eq!(remapping.classes_for(180), &[18]);
        assert!(remapping.classes_for(190).is_empty());
        assert!(remapping.classes_for(0).is_empty());
        assert!(remapping.is_burnable(130));
        assert!(!remapping.is_burnable(210));
    }

    #[test]
    fn test_table_remapping_multiple_classes() {
        let remapping = TableRemapping::new(4)
            .with(7, &[2, 1])
            .unwrap()
            .with(7, &[2])
            .unwrap();
        assert_eq!(remapping.classes_for(7), &[1, 2]);
        assert!(remapping.classes_for(8).is_empty());
        assert!(!remapping.is_burnable(8));
    }

    #[test]
    fn test_table_remapping_rejects_out_of_range_class() {
        let mut remapping = TableRemapping::new(3);
        assert!(remapping.insert(1, &[4]).is_err());
        assert!(remapping.insert(1, &[0]).is_err());
    }
}
