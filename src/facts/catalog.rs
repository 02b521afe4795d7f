//! Compiled-in fact catalog.

use crate::models::{Category, FactRecord};
use rand::seq::SliceRandom;
use rand::Rng;

const LIFE: &[FactRecord] = &[
    FactRecord {
        fact: "Octopuses have three hearts and blue, copper-based blood.",
        source: "Smithsonian Ocean",
    },
    FactRecord {
        fact: "Tardigrades have survived exposure to the vacuum of open space.",
        source: "European Space Agency",
    },
    FactRecord {
        fact: "Botanically, bananas are berries while strawberries are not.",
        source: "Encyclopaedia Britannica",
    },
    FactRecord {
        fact: "Sea otters hold hands while sleeping so they do not drift apart.",
        source: "Monterey Bay Aquarium",
    },
    FactRecord {
        fact: "Honey sealed in ancient Egyptian tombs has been found still edible.",
        source: "Smithsonian Magazine",
    },
];

const PEOPLE: &[FactRecord] = &[
    FactRecord {
        fact: "Ada Lovelace published the first algorithm intended for a machine in 1843.",
        source: "Encyclopaedia Britannica",
    },
    FactRecord {
        fact: "Grace Hopper's team logged an actual moth found in the Harvard Mark II in 1947.",
        source: "Smithsonian National Museum of American History",
    },
    FactRecord {
        fact: "Margaret Hamilton led the team that wrote the Apollo on-board flight software.",
        source: "NASA",
    },
    FactRecord {
        fact: "Tim Berners-Lee wrote the first web browser and server at CERN in 1990.",
        source: "CERN",
    },
    FactRecord {
        fact: "Linus Torvalds announced Linux as a hobby project on Usenet in August 1991.",
        source: "comp.os.minix archive",
    },
];

const TECH: &[FactRecord] = &[
    FactRecord {
        fact: "Rust 1.0 was released on May 15, 2015.",
        source: "The Rust Blog",
    },
    FactRecord {
        fact: "Git was written by Linus Torvalds in April 2005 to host Linux development.",
        source: "git-scm.com",
    },
    FactRecord {
        fact: "Ray Tomlinson sent the first networked email in 1971 and picked @ as the separator.",
        source: "Raytheon BBN",
    },
    FactRecord {
        fact: "Unix time counts seconds from 00:00:00 UTC on January 1, 1970.",
        source: "POSIX.1",
    },
    FactRecord {
        fact: "The IBM 3380 of 1980 stored 2.5 GB and weighed about 250 kg.",
        source: "IBM Archives",
    },
];

/// All facts for a category.
pub fn facts_for(category: Category) -> &'static [FactRecord] {
    match category {
        Category::Life => LIFE,
        Category::People => PEOPLE,
        Category::Tech => TECH,
    }
}

/// Pick a fact uniformly at random. Repeats across runs are allowed.
pub fn pick<R: Rng + ?Sized>(category: Category, rng: &mut R) -> Option<&'static FactRecord> {
    facts_for(category).choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CYCLE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_every_category_has_facts() {
        for category in CYCLE {
            assert!(!facts_for(category).is_empty(), "{} is empty", category);
        }
    }

    #[test]
    fn test_pick_stays_in_category() {
        let mut rng = StdRng::seed_from_u64(7);
        for category in CYCLE {
            for _ in 0..50 {
                let fact = pick(category, &mut rng).unwrap();
                assert!(facts_for(category).contains(fact));
            }
        }
    }

    #[test]
    fn test_pick_reaches_every_entry() {
        let mut rng = StdRng::seed_from_u64(42);
        for category in CYCLE {
            let seen: HashSet<&str> = (0..500)
                .filter_map(|_| pick(category, &mut rng))
                .map(|f| f.fact)
                .collect();
            assert_eq!(seen.len(), facts_for(category).len());
        }
    }
}
