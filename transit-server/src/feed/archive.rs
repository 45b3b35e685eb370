//! Zip archive extraction.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::{debug, warn};

use super::error::FeedError;
use super::table::Table;

/// Tables the core needs; a feed missing any of them is rejected.
pub const REQUIRED_TABLES: [&str; 5] = ["routes", "trips", "shapes", "stop_times", "stops"];

/// All `.txt` members of a feed archive, parsed and keyed by file stem.
#[derive(Debug, Default)]
pub struct FeedTables {
    tables: HashMap<String, Table>,
}

impl FeedTables {
    /// Extract and parse every `.txt` member of a zip archive.
    ///
    /// Members are matched by file name regardless of directory, so archives
    /// that wrap the feed in a top-level folder still load. A member that
    /// cannot be parsed is dropped with a warning; it only fails the load if
    /// it is one of [`REQUIRED_TABLES`].
    pub fn from_zip(bytes: &[u8]) -> Result<Self, FeedError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut tables = HashMap::new();
        let mut failures = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let Some(stem) = txt_stem(file.name()) else {
                continue;
            };

            let mut raw = Vec::new();
            file.read_to_end(&mut raw).map_err(|e| FeedError::Parse {
                table: stem.clone(),
                message: e.to_string(),
            })?;
            let text = String::from_utf8_lossy(&raw);

            match Table::parse(&stem, &text) {
                Ok(table) => {
                    debug!(table = %stem, rows = table.len(), "parsed feed table");
                    tables.insert(stem, table);
                }
                Err(e) => {
                    warn!(table = %stem, error = %e, "dropping unreadable feed table");
                    failures.insert(stem, e);
                }
            }
        }

        for required in REQUIRED_TABLES {
            if tables.contains_key(required) {
                continue;
            }
            return Err(failures
                .remove(required)
                .unwrap_or(FeedError::MissingTable(required)));
        }

        Ok(Self { tables })
    }

    /// Build from already-parsed tables.
    pub fn from_tables(tables: impl IntoIterator<Item = (String, Table)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Remove a table, handing over ownership.
    pub fn take(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

/// File stem of a `.txt` member, ignoring any directory prefix.
fn txt_stem(name: &str) -> Option<String> {
    let path = Path::new(name);
    if path.extension()? != "txt" {
        return None;
    }
    Some(path.file_stem()?.to_str()?.to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::zip_bytes;
    use super::*;

    const MINIMAL: [(&str, &str); 5] = [
        ("routes.txt", "route_id,route_short_name\nr1,2\n"),
        ("trips.txt", "route_id,trip_id,shape_id\nr1,t1,s1\n"),
        ("shapes.txt", "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\ns1,51,17,1\n"),
        ("stop_times.txt", "trip_id,stop_id,stop_sequence\nt1,p1,1\n"),
        ("stops.txt", "stop_id,stop_name\np1,Rynek\n"),
    ];

    #[test]
    fn txt_stem_ignores_directories() {
        assert_eq!(txt_stem("routes.txt").as_deref(), Some("routes"));
        assert_eq!(txt_stem("gtfs/stop_times.txt").as_deref(), Some("stop_times"));
        assert_eq!(txt_stem("readme.md"), None);
        assert_eq!(txt_stem("gtfs/"), None);
    }

    #[test]
    fn loads_all_txt_members() {
        let mut members = MINIMAL.to_vec();
        members.push(("agency.txt", "agency_id\nmpk\n"));
        members.push(("LICENSE", "whatever"));

        let tables = FeedTables::from_zip(&zip_bytes(&members)).unwrap();
        let mut names: Vec<_> = tables.names().collect();
        names.sort_unstable();
        assert_eq!(names, ["agency", "routes", "shapes", "stop_times", "stops", "trips"]);
        assert_eq!(tables.get("routes").unwrap().len(), 1);
    }

    #[test]
    fn nested_members_are_found() {
        let members: Vec<_> = MINIMAL
            .iter()
            .map(|(name, body)| (format!("feed/{name}"), *body))
            .collect();
        let members: Vec<(&str, &str)> = members.iter().map(|(n, b)| (n.as_str(), *b)).collect();

        let tables = FeedTables::from_zip(&zip_bytes(&members)).unwrap();
        assert!(tables.get("stop_times").is_some());
    }

    #[test]
    fn missing_required_table() {
        let members: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(name, _)| *name != "shapes.txt")
            .collect();

        let err = FeedTables::from_zip(&zip_bytes(&members)).unwrap_err();
        assert!(matches!(err, FeedError::MissingTable("shapes")));
    }

    #[test]
    fn unreadable_required_table_reports_parse_error() {
        let mut members = MINIMAL.to_vec();
        members[0] = ("routes.txt", "");

        let err = FeedTables::from_zip(&zip_bytes(&members)).unwrap_err();
        assert!(matches!(err, FeedError::Parse { ref table, .. } if table == "routes"));
    }

    #[test]
    fn unreadable_optional_table_is_dropped() {
        let mut members = MINIMAL.to_vec();
        members.push(("calendar.txt", ""));

        let tables = FeedTables::from_zip(&zip_bytes(&members)).unwrap();
        assert!(tables.get("calendar").is_none());
    }

    #[test]
    fn garbage_is_archive_error() {
        let err = FeedTables::from_zip(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, FeedError::Archive(_)));
    }
}
