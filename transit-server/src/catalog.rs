//! One published feed load.

use chrono::{DateTime, Utc};

use crate::domain::CategorizedLines;
use crate::feed::{FeedError, FeedTables, Snapshot};
use crate::index::VariantIndex;

/// Immutable bundle of everything derived from one feed archive.
///
/// Shared through `Arc`; a reader holding an older catalog keeps a
/// consistent view until it drops it.
#[derive(Debug)]
pub struct Catalog {
    /// Strictly increasing per published load.
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    pub snapshot: Snapshot,
    pub index: VariantIndex,
    pub lines: CategorizedLines,
}

impl Catalog {
    /// Parse an archive and build every derived structure.
    ///
    /// CPU bound; run it on a blocking thread.
    pub fn from_archive(bytes: &[u8], generation: u64) -> Result<Self, FeedError> {
        let tables = FeedTables::from_zip(bytes)?;
        let snapshot = Snapshot::from_tables(tables)?;
        Ok(Self::from_snapshot(snapshot, generation))
    }

    pub fn from_snapshot(snapshot: Snapshot, generation: u64) -> Self {
        let index = VariantIndex::build(&snapshot);
        let lines = CategorizedLines::from_lines(snapshot.line_names());

        Self {
            generation,
            loaded_at: Utc::now(),
            snapshot,
            index,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bucket;
    use crate::feed::test_support::zip_bytes;

    #[test]
    fn builds_from_archive() {
        let bytes = zip_bytes(&[
            ("routes.txt", "route_id,route_short_name\nr1,2\nr2,A\nr3,N\n"),
            ("trips.txt", "route_id,trip_id,shape_id\nr1,t1,s1\n"),
            ("shapes.txt", "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\ns1,51,17,1\n"),
            ("stop_times.txt", "trip_id,stop_id,stop_sequence\nt1,p1,1\n"),
            ("stops.txt", "stop_id,stop_name\np1,Rynek\n"),
        ]);

        let catalog = Catalog::from_archive(&bytes, 7).unwrap();
        assert_eq!(catalog.generation, 7);
        assert_eq!(catalog.index.len(), 1);
        assert_eq!(catalog.lines.get(Bucket::Tram), ["2"]);
        assert_eq!(catalog.lines.get(Bucket::BusExpress), ["A", "N"]);
    }

    #[test]
    fn rejects_bad_archive() {
        assert!(Catalog::from_archive(b"nope", 1).is_err());
    }
}
