use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MultiMap;

/// Serializes a BTreeMap as a list of tuples. Necessary when the keys are structs; see
/// https://github.com/serde-rs/json/issues/402.
pub fn serialize_btreemap<S: Serializer, K: Serialize, V: Serialize>(
    map: &BTreeMap<K, V>,
    s: S,
) -> Result<S::Ok, S::Error> {
    map.iter().collect::<Vec<(_, _)>>().serialize(s)
}

/// Deserializes a BTreeMap from a list of tuples. Necessary when the keys are structs; see
/// https://github.com/serde-rs/json/issues/402.
pub fn deserialize_btreemap<
    'de,
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
>(
    d: D,
) -> Result<BTreeMap<K, V>, D::Error> {
    let vec = <Vec<(K, V)>>::deserialize(d)?;
    let mut map = BTreeMap::new();
    for (k, v) in vec {
        map.insert(k, v);
    }
    Ok(map)
}

/// Serializes a MultiMap as a list of (key, values) tuples.
pub fn serialize_multimap<
    S: Serializer,
    K: Serialize + Ord + PartialEq + Clone,
    V: Serialize + Ord + PartialEq + Clone,
>(
    map: &MultiMap<K, V>,
    s: S,
) -> Result<S::Ok, S::Error> {
    map.map.iter().collect::<Vec<(_, _)>>().serialize(s)
}

/// Deserializes a MultiMap from a list of (key, values) tuples.
pub fn deserialize_multimap<
    'de,
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord + PartialEq + Clone,
    V: Deserialize<'de> + Ord + PartialEq + Clone,
>(
    d: D,
) -> Result<MultiMap<K, V>, D::Error> {
    let vec = <Vec<(K, Vec<V>)>>::deserialize(d)?;
    let mut map = MultiMap::new();
    for (key, values) in vec {
        map.set(key, values.into_iter().collect::<BTreeSet<_>>());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(
            serialize_with = "serialize_btreemap",
            deserialize_with = "deserialize_btreemap"
        )]
        map: BTreeMap<(usize, usize), String>,
        #[serde(
            serialize_with = "serialize_multimap",
            deserialize_with = "deserialize_multimap"
        )]
        multi: MultiMap<(usize, usize), usize>,
    }

    #[test]
    fn struct_keys_survive_json() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "a".to_string());
        let mut multi = MultiMap::new();
        multi.insert((3, 4), 5);
        multi.insert((3, 4), 6);

        let json = serde_json::to_string(&Wrapper { map, multi }).unwrap();
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.map[&(1, 2)], "a");
        assert_eq!(back.multi.get((3, 4)).len(), 2);
    }
}
