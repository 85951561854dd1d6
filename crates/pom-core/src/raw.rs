//! Lenient single-document manifest reader.
//!
//! Parses one `project.toml` without walking inheritance, interpolating
//! properties or validating anything. Used only by the fallback path when the
//! primary builder cannot produce a model: syntax errors are the expected
//! state while the user is mid-edit, and everything else is best-effort.

use crate::error::RawParseError;
use crate::project::{BuildSection, Coordinates, Repository};
use std::collections::BTreeMap;
use toml_edit::{DocumentMut, Item, Table};

/// The structurally parsed but unvalidated representation of a single
/// manifest document.
#[derive(Debug, Clone, Default)]
pub struct RawModel {
    pub coordinates: Option<Coordinates>,
    pub parent: Option<Coordinates>,
    pub repositories: Vec<Repository>,
    pub build: Option<BuildSection>,
    pub properties: BTreeMap<String, String>,
}

/// Reads raw models from manifest text.
///
/// Stateless; a single reader is shared by the whole cache.
///
/// # Examples
///
/// ```
/// use pom_core::RawModelReader;
///
/// let reader = RawModelReader::new();
/// let raw = reader
///     .read("[project]\ngroup = \"org.example\"\nname = \"app\"\nversion = \"1.0\"\n")
///     .unwrap();
/// assert_eq!(raw.coordinates.unwrap().name, "app");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RawModelReader;

impl RawModelReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses manifest text into a [`RawModel`].
    ///
    /// Fails only on TOML syntax errors; missing or mistyped entries are
    /// skipped silently.
    pub fn read(&self, text: &str) -> Result<RawModel, RawParseError> {
        let doc: DocumentMut = text.parse().map_err(RawParseError::from_toml)?;

        let coordinates = doc
            .get("project")
            .and_then(Item::as_table)
            .and_then(read_coordinates);
        let parent = doc
            .get("parent")
            .and_then(Item::as_table)
            .and_then(read_coordinates);

        let mut repositories = Vec::new();
        if let Some(array) = doc.get("repositories").and_then(Item::as_array_of_tables) {
            for table in array.iter() {
                if let (Some(id), Some(url)) = (table_str(table, "id"), table_str(table, "url")) {
                    repositories.push(Repository::new(id, url));
                }
            }
        }

        let build = doc.get("build").and_then(Item::as_table).map(read_build);

        let mut properties = BTreeMap::new();
        if let Some(table) = doc.get("properties").and_then(Item::as_table) {
            for (key, item) in table.iter() {
                if let Some(value) = item.as_str() {
                    properties.insert(key.to_string(), value.to_string());
                }
            }
        }

        Ok(RawModel {
            coordinates,
            parent,
            repositories,
            build,
            properties,
        })
    }
}

/// Reads `group`/`name`/`version` from a table; any entry may be missing.
fn read_coordinates(table: &Table) -> Option<Coordinates> {
    let group = table_str(table, "group");
    let name = table_str(table, "name");
    let version = table_str(table, "version");
    if group.is_none() && name.is_none() && version.is_none() {
        return None;
    }
    Some(Coordinates {
        group: group.unwrap_or_default().to_string(),
        name: name.unwrap_or_default().to_string(),
        version: version.unwrap_or_default().to_string(),
    })
}

fn read_build(table: &Table) -> BuildSection {
    let mut plugins = Vec::new();
    if let Some(array) = table.get("plugins").and_then(Item::as_array_of_tables) {
        for plugin in array.iter() {
            if let Some(coords) = read_coordinates(plugin) {
                plugins.push(coords);
            }
        }
    }
    BuildSection {
        directory: table_str(table, "directory").map(String::from),
        final_name: table_str(table, "final-name").map(String::from),
        plugins,
    }
}

fn table_str<'t>(table: &'t Table, key: &str) -> Option<&'t str> {
    table.get(key).and_then(Item::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[project]
group = "org.example"
name = "app"
version = "1.2.3"

[parent]
group = "org.example"
name = "parent"
version = "7"

[properties]
"java.version" = "17"

[[repositories]]
id = "central"
url = "https://repo.example.org/releases"

[[repositories]]
id = "snapshots"
url = "https://repo.example.org/snapshots"

[build]
directory = "target"
final-name = "app-1.2.3"

[[build.plugins]]
group = "org.example.plugins"
name = "compiler"
version = "3.1"
"#;

    #[test]
    fn test_read_full_manifest() {
        let raw = RawModelReader::new().read(MANIFEST).unwrap();
        let coords = raw.coordinates.unwrap();
        assert_eq!(coords.group, "org.example");
        assert_eq!(coords.version, "1.2.3");
        assert_eq!(raw.parent.unwrap().name, "parent");
        assert_eq!(raw.repositories.len(), 2);
        assert_eq!(raw.repositories[0].id, "central");
        assert_eq!(raw.properties.get("java.version").unwrap(), "17");

        let build = raw.build.unwrap();
        assert_eq!(build.directory.as_deref(), Some("target"));
        assert_eq!(build.plugins.len(), 1);
        assert_eq!(build.plugins[0].name, "compiler");
    }

    #[test]
    fn test_read_empty_document() {
        let raw = RawModelReader::new().read("").unwrap();
        assert!(raw.coordinates.is_none());
        assert!(raw.repositories.is_empty());
        assert!(raw.build.is_none());
    }

    #[test]
    fn test_mid_edit_syntax_error() {
        // The shape a document has while the user is typing a new section.
        let err = RawModelReader::new()
            .read("[project]\nname = \"app\"\n[[repos")
            .unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_mistyped_entries_are_skipped() {
        let raw = RawModelReader::new()
            .read("[project]\nname = 42\n\n[[repositories]]\nid = \"central\"\n")
            .unwrap();
        // name is not a string, repository has no url: both dropped.
        assert!(raw.coordinates.is_none());
        assert!(raw.repositories.is_empty());
    }

    #[test]
    fn test_partial_coordinates() {
        let raw = RawModelReader::new()
            .read("[project]\nname = \"app\"\n")
            .unwrap();
        let coords = raw.coordinates.unwrap();
        assert_eq!(coords.name, "app");
        assert_eq!(coords.group, "");
    }
}
