//! Auxiliary reduction data. The executor contract asks every fragment for
//! reducible data alongside its pixels; this renderer has none to share.

/// Empty reduction payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceData;

/// Serialization and merging hooks for [`ReduceData`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceDataTools;

impl ReduceDataTools {
    pub fn serialize(&self, _data: &ReduceData, _out: &mut Vec<u8>) {}

    pub fn deserialize(&self, _bytes: &[u8]) -> ReduceData {
        ReduceData
    }

    pub fn reduce(&self, _left: ReduceData, _right: ReduceData) -> ReduceData {
        ReduceData
    }
}
