use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::operation::Sku;

/// Ordered mapping from sku to a per-sku value.
///
/// Keys are unique and keep the position of their first insertion; inserting
/// an existing sku again replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkuMap<V>(IndexMap<Sku, V>);

impl<V> SkuMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Insert or replace; an existing sku keeps its position.
    pub fn insert(&mut self, sku: Sku, value: V) -> Option<V> {
        self.0.insert(sku, value)
    }

    #[must_use]
    pub fn get(&self, sku: Sku) -> Option<&V> {
        self.0.get(&sku)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Sku, V> {
        self.0.iter()
    }

    pub fn skus(&self) -> impl Iterator<Item = Sku> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Sku, V> {
        self.0.values()
    }

    #[must_use]
    pub fn into_inner(self) -> IndexMap<Sku, V> {
        self.0
    }

    /// Zip two parallel sequences.
    pub(crate) fn zip(skus: Vec<Sku>, values: Vec<V>) -> Result<Self, String> {
        if skus.len() != values.len() {
            return Err(format!(
                "{} skus but {} values in parallel arrays",
                skus.len(),
                values.len()
            ));
        }
        Ok(skus.into_iter().zip(values).collect())
    }
}

impl<V: DeserializeOwned> SkuMap<V> {
    /// Decode `{"skus": [...], "<values_key>": [...]}` into a map.
    pub(crate) fn from_parallel_arrays(value: Value, values_key: &str) -> Result<Self, String> {
        let Value::Object(mut object) = value else {
            return Err(format!("expected an object with 'skus' and '{values_key}'"));
        };
        let mut take = |key: &str| {
            object
                .remove(key)
                .ok_or_else(|| format!("missing '{key}' array"))
        };
        let skus = take("skus")?;
        let values = take(values_key)?;

        let skus: Vec<Sku> =
            serde_json::from_value(skus).map_err(|e| format!("invalid 'skus': {e}"))?;
        let values: Vec<V> = serde_json::from_value(values)
            .map_err(|e| format!("invalid '{values_key}': {e}"))?;
        Self::zip(skus, values)
    }
}

impl<V> Default for SkuMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(Sku, V)> for SkuMap<V> {
    fn from_iter<I: IntoIterator<Item = (Sku, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (sku, value) in iter {
            map.insert(sku, value);
        }
        map
    }
}

impl<V> IntoIterator for SkuMap<V> {
    type Item = (Sku, V);
    type IntoIter = indexmap::map::IntoIter<Sku, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a SkuMap<V> {
    type Item = (&'a Sku, &'a V);
    type IntoIter = indexmap::map::Iter<'a, Sku, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zip_first_position_last_value() {
        let map = SkuMap::zip(vec![7, 3, 7], vec![10, 20, 99]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.skus().collect::<Vec<_>>(), vec![7, 3]);
        assert_eq!(map.get(7), Some(&99));
        assert_eq!(map.get(3), Some(&20));
    }

    #[test]
    fn test_zip_length_mismatch() {
        let err = SkuMap::zip(vec![1, 2], vec![5]).unwrap_err();
        assert!(err.contains("2 skus but 1 values"));
    }

    #[test]
    fn test_zip_empty() {
        let map: SkuMap<i64> = SkuMap::zip(Vec::new(), Vec::new()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_from_parallel_arrays() {
        let map: SkuMap<i64> =
            SkuMap::from_parallel_arrays(json!({"skus": [1001, 1002], "qtys": [5, 0]}), "qtys")
                .unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(&1001, &5), (&1002, &0)]);
    }

    #[test]
    fn test_from_parallel_arrays_with_info_values() {
        let map: SkuMap<Value> = SkuMap::from_parallel_arrays(
            json!({"skus": [5], "infos": [{"name": "hat"}]}),
            "infos",
        )
        .unwrap();
        assert_eq!(map.get(5), Some(&json!({"name": "hat"})));
    }

    #[test]
    fn test_from_parallel_arrays_rejects_bad_shapes() {
        let err = SkuMap::<i64>::from_parallel_arrays(json!([1, 2]), "qtys").unwrap_err();
        assert!(err.contains("expected an object"));

        let err = SkuMap::<i64>::from_parallel_arrays(json!({"skus": [1]}), "qtys").unwrap_err();
        assert!(err.contains("missing 'qtys'"));

        let err =
            SkuMap::<i64>::from_parallel_arrays(json!({"skus": ["a"], "qtys": [1]}), "qtys")
                .unwrap_err();
        assert!(err.contains("invalid 'skus'"));
    }

    #[test]
    fn test_serializes_as_object() {
        let map: SkuMap<i64> = [(3, 1), (1, 2)].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"3":1,"1":2}"#
        );
    }
}
