//! Dot-syntax addressing: `module.submodule.function`.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::constants::{ADDRESS_SEPARATOR, MATCH_ALL_PREFIXES};
use crate::error::{ListError, LookupError};
use crate::function::RegisteredFunction;

/// First `depth` segments of an address; `None` keeps all of them.
pub fn truncate(address: &str, depth: Option<usize>) -> String {
    match depth {
        None => address.to_string(),
        Some(depth) => address
            .split(ADDRESS_SEPARATOR)
            .take(depth)
            .collect::<Vec<_>>()
            .join("."),
    }
}

/// Module path for a unit file given relative to the user root:
/// separators become dots and the extension is dropped.
pub fn module_path_from_file(relative: &Path) -> String {
    let stem = relative.with_extension("");
    stem.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Split an address on its last dot into `(module_path, function_name)`.
pub fn split_address(address: &str) -> Result<(&str, &str), LookupError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(LookupError::EmptyAddress);
    }
    match address.rsplit_once(ADDRESS_SEPARATOR) {
        Some((module, name)) if !module.is_empty() && !name.is_empty() => Ok((module, name)),
        _ => Err(LookupError::NotAnAddress(address.to_string())),
    }
}

/// Every registered function keyed by its full address.
#[derive(Debug, Default, Clone)]
pub struct AddressTree {
    functions: BTreeMap<String, RegisteredFunction>,
}

impl AddressTree {
    /// Later entries for the same address replace earlier ones.
    pub fn build(entries: &[RegisteredFunction]) -> Self {
        let functions = entries
            .iter()
            .map(|entry| (entry.address(), entry.clone()))
            .collect();
        Self { functions }
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&RegisteredFunction> {
        self.functions.get(address)
    }

    /// Sorted full addresses.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Truncated addresses, deduplicated and sorted, optionally filtered by a
    /// single dot-syntax prefix.
    ///
    /// Every prefix segment but the last must match exactly; the last is a
    /// `starts_with` match. Comparison stops at whichever of prefix and
    /// address runs out of segments first.
    pub fn list(&self, prefixes: &[String], depth: Option<usize>) -> Result<Vec<String>, ListError> {
        let prefix = match prefixes {
            [] => None,
            [one] => Some(one.as_str()),
            many => return Err(ListError::MultiplePrefixes(many.to_vec())),
        };

        let mut truncated: Vec<String> = self
            .functions
            .keys()
            .map(|address| truncate(address, depth))
            .collect();
        truncated.sort();
        truncated.dedup();

        let Some(prefix) = prefix else {
            return Ok(truncated);
        };
        if MATCH_ALL_PREFIXES.contains(&prefix) {
            return Ok(truncated);
        }
        Ok(truncated
            .into_iter()
            .filter(|address| matches_prefix(prefix, address))
            .collect())
    }
}

fn matches_prefix(prefix: &str, address: &str) -> bool {
    let pairs: Vec<(&str, &str)> = prefix
        .split(ADDRESS_SEPARATOR)
        .zip(address.split(ADDRESS_SEPARATOR))
        .collect();
    let Some(((last_wanted, last_have), head)) = pairs.split_last() else {
        return false;
    };
    head.iter().all(|(wanted, have)| wanted == have) && last_have.starts_with(last_wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use crate::header::Meta;
    use proptest::prelude::*;

    fn tree(addresses: &[&str]) -> AddressTree {
        let entries: Vec<_> = addresses
            .iter()
            .flat_map(|address| {
                let (module, name) = split_address(address).unwrap();
                Function::new(name, || Ok(())).with(Meta::new()).fold(module)
            })
            .collect();
        AddressTree::build(&entries)
    }

    fn prefixes(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn truncate_depths() {
        assert_eq!(truncate("a.b.c.d", Some(2)), "a.b");
        assert_eq!(truncate("a.b.c.d", None), "a.b.c.d");
        assert_eq!(truncate("a.b", Some(10)), "a.b");
        assert_eq!(truncate("a.b", Some(0)), "");
    }

    #[test]
    fn module_path_strips_extension_and_separators() {
        assert_eq!(module_path_from_file(Path::new("pkg/mod.toml")), "pkg.mod");
        assert_eq!(module_path_from_file(Path::new("top.toml")), "top");
        assert_eq!(
            module_path_from_file(Path::new("./a/b/c.toml")),
            "a.b.c"
        );
    }

    #[test]
    fn split_address_forms() {
        assert_eq!(split_address("pkg.mod.fn").unwrap(), ("pkg.mod", "fn"));
        assert_eq!(split_address(""), Err(LookupError::EmptyAddress));
        assert!(matches!(split_address("lonely"), Err(LookupError::NotAnAddress(_))));
        assert!(matches!(split_address("pkg."), Err(LookupError::NotAnAddress(_))));
    }

    #[test]
    fn list_everything_sorted_and_deduplicated() {
        let t = tree(&["b.x.one", "a.y.two", "a.y.three"]);
        assert_eq!(
            t.list(&[], None).unwrap(),
            vec!["a.y.three", "a.y.two", "b.x.one"]
        );
        assert_eq!(t.list(&[], Some(1)).unwrap(), vec!["a", "b"]);
        assert_eq!(t.list(&[], Some(2)).unwrap(), vec!["a.y", "b.x"]);
    }

    #[test]
    fn list_prefix_completes_last_segment() {
        let t = tree(&[
            "home.lights.on",
            "home.lights.off",
            "home.locks.lock",
            "work.vpn.connect",
        ]);
        assert_eq!(
            t.list(&prefixes(&["home.l"]), Some(2)).unwrap(),
            vec!["home.lights", "home.locks"]
        );
        assert_eq!(
            t.list(&prefixes(&["home.lights.o"]), None).unwrap(),
            vec!["home.lights.off", "home.lights.on"]
        );
        assert_eq!(
            t.list(&prefixes(&["home.lights.of"]), None).unwrap(),
            vec!["home.lights.off"]
        );
    }

    #[test]
    fn list_prefix_requires_exact_leading_segments() {
        let t = tree(&["home.lights.on", "homework.essay.write"]);
        assert_eq!(
            t.list(&prefixes(&["home.lig"]), None).unwrap(),
            vec!["home.lights.on"]
        );
        assert_eq!(
            t.list(&prefixes(&["hom"]), Some(1)).unwrap(),
            vec!["home", "homework"]
        );
        assert!(t.list(&prefixes(&["nothing"]), None).unwrap().is_empty());
    }

    #[test]
    fn list_prefix_longer_than_truncated_address() {
        let t = tree(&["home.lights.on"]);
        assert_eq!(
            t.list(&prefixes(&["home.lights.on"]), Some(2)).unwrap(),
            vec!["home.lights"]
        );
    }

    #[test]
    fn list_quoted_empty_matches_all() {
        let t = tree(&["a.b.c", "d.e.f"]);
        assert_eq!(t.list(&prefixes(&["''"]), None).unwrap().len(), 2);
        assert_eq!(t.list(&prefixes(&["\"\""]), None).unwrap().len(), 2);
    }

    #[test]
    fn list_rejects_multiple_prefixes() {
        let t = tree(&["a.b.c"]);
        assert!(matches!(
            t.list(&prefixes(&["a", "b"]), None),
            Err(ListError::MultiplePrefixes(_))
        ));
    }

    #[test]
    fn build_dedupes_by_address() {
        let entries = Function::new("f", || Ok(()))
            .with(Meta::new())
            .with(Meta::new().title("Again"))
            .fold("m");
        let t = AddressTree::build(&entries);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("m.f").unwrap().header.title, "Again");
    }

    proptest! {
        #[test]
        fn prefix_listing_is_subset_of_full_listing(
            addresses in prop::collection::vec("[a-c]{1,2}\\.[a-c]{1,2}\\.[a-c]{1,3}", 1..12),
            depth in prop::option::of(1usize..4),
            pick in any::<prop::sample::Index>(),
        ) {
            let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
            let t = tree(&refs);
            let all = t.list(&[], depth).unwrap();
            let chosen = pick.get(&all).clone();
            let subset = t.list(&[chosen.clone()], depth).unwrap();
            prop_assert!(subset.contains(&chosen));
            for address in &subset {
                prop_assert!(all.contains(address));
            }
        }
    }
}
