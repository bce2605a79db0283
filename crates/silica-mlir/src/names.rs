//! Fresh-name generation with collision detection.

use std::collections::HashSet;

use crate::error::NameCollision;

/// Produces names unique within one scope (a hardware module, or the
/// translation unit's symbol namespace).
///
/// Anonymous names are decimal counters; forced names are taken verbatim
/// and error if already used.
#[derive(Debug, Default)]
pub struct ScopedNameGenerator {
    used: HashSet<String>,
    next: u64,
}

impl ScopedNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh auto-generated name.
    pub fn fresh(&mut self) -> String {
        loop {
            let name = self.next.to_string();
            self.next += 1;
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }

    /// Takes `name` verbatim; errors if it is already in use.
    pub fn reserve(&mut self, name: &str) -> Result<String, NameCollision> {
        if self.used.insert(name.to_string()) {
            Ok(name.to_string())
        } else {
            Err(NameCollision {
                name: name.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_names_are_sequential() {
        let mut gen = ScopedNameGenerator::new();
        assert_eq!(gen.fresh(), "0");
        assert_eq!(gen.fresh(), "1");
    }

    #[test]
    fn reserved_name_collides() {
        let mut gen = ScopedNameGenerator::new();
        gen.reserve("clk").unwrap();
        assert!(gen.reserve("clk").is_err());
    }

    #[test]
    fn fresh_skips_reserved_numerals() {
        let mut gen = ScopedNameGenerator::new();
        gen.reserve("0").unwrap();
        assert_eq!(gen.fresh(), "1");
    }

    proptest! {
        #[test]
        fn all_generated_names_are_unique(n in 1usize..200) {
            let mut gen = ScopedNameGenerator::new();
            let names: Vec<String> = (0..n).map(|_| gen.fresh()).collect();
            let mut dedup = names.clone();
            dedup.sort();
            dedup.dedup();
            prop_assert_eq!(names.len(), dedup.len());
        }
    }
}
