use num::Num;
use serde::de::Error as DeError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::SparseVec;

impl<N> Serialize for SparseVec<N>
where
    N: Num + Serialize + Copy,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // entries: (id, value) の Vec として id 昇順で出力する
        let entries: Vec<(u32, N)> = self.raw_iter().collect();
        let mut state = serializer.serialize_struct("SparseVec", 1)?;
        state.serialize_field("entries", &entries)?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for SparseVec<N>
where
    N: Num + Deserialize<'de> + Copy,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SparseVecData<N> {
            entries: Vec<(u32, N)>,
        }

        let data = SparseVecData::<N>::deserialize(deserializer)?;
        let mut inds = Vec::with_capacity(data.entries.len());
        let mut vals = Vec::with_capacity(data.entries.len());
        for (id, value) in data.entries {
            if inds.last().is_some_and(|&last| id <= last) {
                return Err(DeError::custom("SparseVec deserialize error: ids are not strictly increasing"));
            }
            if value == N::zero() {
                return Err(DeError::custom("SparseVec deserialize error: explicit zero entry"));
            }
            inds.push(id);
            vals.push(value);
        }
        Ok(SparseVec::from_parts_unchecked(inds, vals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip_json_keeps_entries() {
        let v = SparseVec::from_unsorted(vec![(3u32, 0.5f64), (1, 2.0)]);
        let s = serde_json::to_string(&v).unwrap();
        assert_eq!(s, r#"{"entries":[[1,2.0],[3,0.5]]}"#);
        let de: SparseVec<f64> = serde_json::from_str(&s).unwrap();
        assert_eq!(de, v);
    }

    #[test]
    fn serde_rejects_unordered_ids() {
        let bad = r#"{"entries":[[3,1],[1,2]]}"#;
        assert!(serde_json::from_str::<SparseVec<u32>>(bad).is_err());
    }

    #[test]
    fn serde_rejects_duplicate_ids_and_zeros() {
        assert!(serde_json::from_str::<SparseVec<u32>>(r#"{"entries":[[1,1],[1,2]]}"#).is_err());
        assert!(serde_json::from_str::<SparseVec<u32>>(r#"{"entries":[[1,0]]}"#).is_err());
    }
}
