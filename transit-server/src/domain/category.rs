//! Vehicle category classification for line identifiers.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Express bus lines, matched case-insensitively.
const EXPRESS_LINES: [&str; 5] = ["A", "C", "D", "K", "N"];

/// The vehicle category a line identifier maps to.
///
/// # Examples
///
/// ```
/// use transit_server::domain::{Category, classify};
///
/// assert_eq!(classify("T1"), Category::Tram);
/// assert_eq!(classify("a"), Category::BusExpress);
/// assert_eq!(classify("250"), Category::BusNight);
/// assert_eq!(classify("X"), Category::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Tram,
    TramSpecial,
    TramTemporary,
    Bus,
    BusNight,
    BusSuburban,
    BusTemporary,
    BusZone,
    BusExpress,
    BusSpecial,
    Unknown,
}

/// Which aggregate bucket a category also contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Tram,
    Bus,
}

impl Category {
    /// The bucket holding lines of exactly this category.
    pub fn bucket(self) -> Bucket {
        match self {
            Category::Tram => Bucket::Tram,
            Category::TramSpecial => Bucket::TramSpecial,
            Category::TramTemporary => Bucket::TramTemporary,
            Category::Bus => Bucket::Bus,
            Category::BusNight => Bucket::BusNight,
            Category::BusSuburban => Bucket::BusSuburban,
            Category::BusTemporary => Bucket::BusTemporary,
            Category::BusZone => Bucket::BusZone,
            Category::BusExpress => Bucket::BusExpress,
            Category::BusSpecial => Bucket::BusSpecial,
            Category::Unknown => Bucket::Unknown,
        }
    }

    pub fn family(self) -> Option<Family> {
        match self {
            Category::Tram | Category::TramSpecial | Category::TramTemporary => Some(Family::Tram),
            Category::Bus
            | Category::BusNight
            | Category::BusSuburban
            | Category::BusTemporary
            | Category::BusZone
            | Category::BusExpress
            | Category::BusSpecial => Some(Family::Bus),
            Category::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.bucket().as_str()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw line identifier.
///
/// Rules are evaluated in order and the first match wins. Never fails:
/// anything unrecognised is [`Category::Unknown`].
pub fn classify(line: &str) -> Category {
    if line.starts_with('T') {
        return Category::Tram;
    }

    if EXPRESS_LINES.iter().any(|e| e.eq_ignore_ascii_case(line)) {
        return Category::BusExpress;
    }

    if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) {
        // Digit strings too long for u64 still count as plain buses
        return match line.parse::<u64>() {
            Ok(0..40) => Category::Tram,
            Ok(70..100) => Category::TramTemporary,
            Ok(200..300) => Category::BusNight,
            Ok(600..700) => Category::BusSuburban,
            Ok(700..800) => Category::BusTemporary,
            Ok(900..1000) => Category::BusZone,
            _ => Category::Bus,
        };
    }

    if line.starts_with('B') {
        return Category::BusSpecial;
    }

    Category::Unknown
}

/// Named line lists exposed to clients.
///
/// One bucket per [`Category`] plus the two family aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Tram,
    TramSpecial,
    TramTemporary,
    AllTrams,
    Bus,
    BusNight,
    BusSuburban,
    BusTemporary,
    BusZone,
    BusExpress,
    BusSpecial,
    AllBuses,
    Unknown,
}

impl Bucket {
    /// All buckets in serialization order.
    pub const ALL: [Bucket; 13] = [
        Bucket::Tram,
        Bucket::TramSpecial,
        Bucket::TramTemporary,
        Bucket::AllTrams,
        Bucket::Bus,
        Bucket::BusNight,
        Bucket::BusSuburban,
        Bucket::BusTemporary,
        Bucket::BusZone,
        Bucket::BusExpress,
        Bucket::BusSpecial,
        Bucket::AllBuses,
        Bucket::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Tram => "tram",
            Bucket::TramSpecial => "tramSpecial",
            Bucket::TramTemporary => "tramTemporary",
            Bucket::AllTrams => "allTrams",
            Bucket::Bus => "bus",
            Bucket::BusNight => "busNight",
            Bucket::BusSuburban => "busSuburban",
            Bucket::BusTemporary => "busTemporary",
            Bucket::BusZone => "busZone",
            Bucket::BusExpress => "busExpress",
            Bucket::BusSpecial => "busSpecial",
            Bucket::AllBuses => "allBuses",
            Bucket::Unknown => "unknown",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Error returned when a bucket name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown line category: {0}")]
pub struct UnknownBucket(pub String);

impl FromStr for Bucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownBucket(s.to_string()))
    }
}

/// Line identifiers sorted into category buckets.
///
/// Lines keep their input order within every bucket. Tram-family lines are
/// also listed under `allTrams`, bus-family lines under `allBuses`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedLines {
    buckets: [Vec<String>; 13],
}

impl CategorizedLines {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categorized = Self::default();
        for line in lines {
            categorized.push(line.into());
        }
        categorized
    }

    fn push(&mut self, line: String) {
        let category = classify(&line);
        match category.family() {
            Some(Family::Tram) => self.buckets[Bucket::AllTrams.index()].push(line.clone()),
            Some(Family::Bus) => self.buckets[Bucket::AllBuses.index()].push(line.clone()),
            None => {}
        }
        self.buckets[category.bucket().index()].push(line);
    }

    /// Lines in one bucket.
    pub fn get(&self, bucket: Bucket) -> &[String] {
        &self.buckets[bucket.index()]
    }

    /// Whether the line is a known tram or bus line.
    pub fn contains(&self, line: &str) -> bool {
        self.get(Bucket::AllTrams).iter().any(|l| l == line)
            || self.get(Bucket::AllBuses).iter().any(|l| l == line)
    }

    /// Total number of distinct lines categorized.
    pub fn len(&self) -> usize {
        self.get(Bucket::AllTrams).len()
            + self.get(Bucket::AllBuses).len()
            + self.get(Bucket::Unknown).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for CategorizedLines {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Bucket::ALL.len()))?;
        for bucket in Bucket::ALL {
            map.serialize_entry(bucket.as_str(), self.get(bucket))?;
        }
        map.end()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Classification is deterministic for arbitrary input.
        #[test]
        fn classify_is_deterministic(line in ".*") {
            prop_assert_eq!(classify(&line), classify(&line));
        }

        /// Every categorized line lands in exactly one category bucket.
        #[test]
        fn every_line_in_one_category_bucket(lines in proptest::collection::vec("[0-9A-Z]{0,4}", 0..20)) {
            let categorized = CategorizedLines::from_lines(lines.clone());
            let per_category: usize = Bucket::ALL
                .into_iter()
                .filter(|b| !matches!(b, Bucket::AllTrams | Bucket::AllBuses))
                .map(|b| categorized.get(b).len())
                .sum();
            prop_assert_eq!(per_category, lines.len());
            prop_assert_eq!(categorized.len(), lines.len());
        }

        /// Numbers in [0, 40) are always trams.
        #[test]
        fn low_numbers_are_trams(n in 0u32..40) {
            prop_assert_eq!(classify(&n.to_string()), Category::Tram);
        }

        /// "T"-prefixed identifiers are always trams, whatever follows.
        #[test]
        fn t_prefix_is_tram(rest in ".*") {
            let line = format!("T{rest}");
            prop_assert_eq!(classify(&line), Category::Tram);
        }
    }
}
