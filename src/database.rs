//! Association of close approaches with the NEOs they belong to.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::models::{CloseApproach, LinkedApproach, NearEarthObject};

/// Owns the loaded records and the designation/name lookups between them.
///
/// Built once both loads have completed; immutable afterwards.
pub struct NeoDatabase {
    neos: Vec<NearEarthObject>,
    approaches: Vec<CloseApproach>,
    by_designation: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    /// For each approach, the index of its NEO (if one matched).
    approach_neo: Vec<Option<usize>>,
    /// For each NEO, the indices of its approaches in load order.
    neo_approaches: Vec<Vec<usize>>,
}

impl NeoDatabase {
    pub fn new(neos: Vec<NearEarthObject>, approaches: Vec<CloseApproach>) -> Self {
        let mut by_designation = HashMap::with_capacity(neos.len());
        let mut by_name = HashMap::new();

        for (idx, neo) in neos.iter().enumerate() {
            if by_designation.contains_key(&neo.designation) {
                warn!(designation = %neo.designation, "Duplicate NEO designation, keeping first");
                continue;
            }
            by_designation.insert(neo.designation.clone(), idx);

            if let Some(name) = &neo.name {
                by_name.entry(name.clone()).or_insert(idx);
            }
        }

        let mut neo_approaches = vec![Vec::new(); neos.len()];
        let mut approach_neo = Vec::with_capacity(approaches.len());
        let mut orphans = 0usize;

        for (ca_idx, ca) in approaches.iter().enumerate() {
            let neo_idx = by_designation.get(&ca.designation).copied();
            match neo_idx {
                Some(i) => neo_approaches[i].push(ca_idx),
                None => {
                    orphans += 1;
                    debug!(designation = %ca.designation, "Close approach has no matching NEO");
                }
            }
            approach_neo.push(neo_idx);
        }

        if orphans > 0 {
            warn!(orphans, "Close approaches without a matching NEO were skipped");
        }

        info!(
            neos = neos.len(),
            approaches = approaches.len(),
            linked = approaches.len() - orphans,
            "NEO database built"
        );

        Self {
            neos,
            approaches,
            by_designation,
            by_name,
            approach_neo,
            neo_approaches,
        }
    }

    pub fn get_neo_by_designation(&self, designation: &str) -> Option<&NearEarthObject> {
        self.by_designation.get(designation).map(|&i| &self.neos[i])
    }

    /// Looks up a NEO by its IAU name. An empty name never matches.
    pub fn get_neo_by_name(&self, name: &str) -> Option<&NearEarthObject> {
        if name.is_empty() {
            return None;
        }
        self.by_name.get(name).map(|&i| &self.neos[i])
    }

    /// Close approaches linked to their NEO, in load order. Orphans are skipped.
    pub fn approaches(&self) -> impl Iterator<Item = LinkedApproach<'_>> {
        self.approaches
            .iter()
            .zip(&self.approach_neo)
            .filter_map(|(approach, neo_idx)| {
                neo_idx.map(|i| LinkedApproach {
                    approach,
                    neo: &self.neos[i],
                })
            })
    }

    /// Approaches made by the given NEO.
    pub fn approaches_for(&self, neo: &NearEarthObject) -> Vec<&CloseApproach> {
        self.by_designation
            .get(&neo.designation)
            .map(|&i| {
                self.neo_approaches[i]
                    .iter()
                    .map(|&ca| &self.approaches[ca])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of approaches that could not be linked to a NEO.
    pub fn orphan_count(&self) -> usize {
        self.approach_neo.iter().filter(|n| n.is_none()).count()
    }
}

/// Yields at most `n` items; `None` or `Some(0)` means unlimited.
pub fn limit<I: Iterator>(iter: I, n: Option<usize>) -> impl Iterator<Item = I::Item> {
    let n = match n {
        Some(0) | None => usize::MAX,
        Some(n) => n,
    };
    iter.take(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::cd_to_datetime;

    fn neo(des: &str, name: Option<&str>) -> NearEarthObject {
        NearEarthObject::new(des, name.map(String::from), None, false)
    }

    fn approach(des: &str, cd: &str) -> CloseApproach {
        CloseApproach {
            designation: des.to_string(),
            time: cd_to_datetime(cd).unwrap(),
            distance: 0.1,
            velocity: 10.0,
        }
    }

    fn sample_db() -> NeoDatabase {
        NeoDatabase::new(
            vec![neo("433", Some("Eros")), neo("2020 AB", None)],
            vec![
                approach("433", "1900-Dec-27 01:30"),
                approach("2020 AB", "2020-Jan-01 00:00"),
                approach("999", "2021-Feb-02 02:02"),
                approach("433", "1907-Nov-05 03:31"),
            ],
        )
    }

    #[test]
    fn test_lookup_by_designation_and_name() {
        let db = sample_db();
        assert_eq!(db.get_neo_by_designation("433").unwrap().fullname(), "433 (Eros)");
        assert_eq!(db.get_neo_by_name("Eros").unwrap().designation, "433");
        assert!(db.get_neo_by_designation("eros").is_none());
        assert!(db.get_neo_by_name("").is_none());
    }

    #[test]
    fn test_approaches_are_linked_and_orphans_skipped() {
        let db = sample_db();
        let linked: Vec<_> = db.approaches().collect();

        assert_eq!(linked.len(), 3);
        assert_eq!(db.orphan_count(), 1);
        for pair in &linked {
            assert_eq!(pair.approach.designation, pair.neo.designation);
        }
    }

    #[test]
    fn test_approaches_for_neo_in_load_order() {
        let db = sample_db();
        let eros = db.get_neo_by_designation("433").unwrap();
        let times: Vec<String> = db.approaches_for(eros).iter().map(|ca| ca.time_str()).collect();
        assert_eq!(times, vec!["1900-12-27 01:30", "1907-11-05 03:31"]);
    }

    #[test]
    fn test_duplicate_designation_keeps_first() {
        let db = NeoDatabase::new(
            vec![neo("1", Some("First")), neo("1", Some("Second"))],
            vec![approach("1", "2000-Jan-01 00:00")],
        );
        assert_eq!(db.get_neo_by_designation("1").unwrap().name.as_deref(), Some("First"));
        assert!(db.get_neo_by_name("Second").is_none());
        assert_eq!(db.approaches().count(), 1);
    }

    #[test]
    fn test_limit() {
        assert_eq!(limit(0..10, Some(3)).count(), 3);
        assert_eq!(limit(0..10, Some(0)).count(), 10);
        assert_eq!(limit(0..10, None).count(), 10);
        assert_eq!(limit(0..2, Some(5)).count(), 2);
    }
}
