//! Service registry compiler.
//!
//! Reads a `services(5)`-style registry and builds one canonical
//! port-to-name table per transport protocol. A line contributes an entry
//! when it matches
//!
//! ```text
//! <name> <whitespace> <port>/<tcp|udp> [anything]
//! ```
//!
//! after trimming. Blank lines and lines starting with `#` are ignored, and
//! lines that do not match (or whose port does not fit in 16 bits) are
//! skipped. For each (protocol, port) the first name in file order wins.
//!
//! Tables are ordered by ascending port so rendered artifacts diff cleanly
//! when the registry is reshuffled.

mod render;

use crate::error::{Error, Result};
use crate::output::{write_artifacts, Artifact};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, trace};

pub use render::{CppSourceRenderer, JsonRenderer, RenderFormat, ServiceRenderer};

/// Default registry location on Unix systems
pub const DEFAULT_REGISTRY_PATH: &str = "/etc/services";

/// Transport protocol of a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Transmission Control Protocol
    Tcp,
    /// User Datagram Protocol
    Udp,
}

impl Protocol {
    /// Every protocol, in section order
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    /// Returns the lowercase registry spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(format!("unknown protocol: '{}'", s)),
        }
    }
}

/// One service definition parsed from a registry line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Service name
    pub name: String,
    /// Port number
    pub port: u16,
    /// Transport protocol
    pub protocol: Protocol,
}

/// Canonical port-to-name mapping for one protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTable {
    protocol: Protocol,
    entries: BTreeMap<u16, String>,
}

impl ServiceTable {
    /// Creates an empty table
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            entries: BTreeMap::new(),
        }
    }

    /// Protocol of this table
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Records `name` for `port` unless the port already has a name.
    ///
    /// Returns false when the entry was dropped as a duplicate.
    pub fn insert(&mut self, port: u16, name: impl Into<String>) -> bool {
        match self.entries.entry(port) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(name.into());
                true
            }
        }
    }

    /// Canonical name for `port`
    pub fn get(&self, port: u16) -> Option<&str> {
        self.entries.get(&port).map(String::as_str)
    }

    /// Number of ports
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no port is named
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by ascending port
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> + '_ {
        self.entries.iter().map(|(port, name)| (*port, name.as_str()))
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<u16, String> {
        &self.entries
    }
}

/// Line counters collected while parsing a registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read
    pub lines: usize,
    /// Blank and comment lines
    pub ignored: usize,
    /// Lines that did not match the service pattern
    pub unmatched: usize,
    /// Entries dropped because their port was already named
    pub duplicates: usize,
    /// Entries kept
    pub kept: usize,
}

/// The TCP and UDP tables built from one registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDatabase {
    tcp: ServiceTable,
    udp: ServiceTable,
    stats: ParseStats,
}

impl Default for ServiceDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDatabase {
    /// Creates a database with two empty tables
    pub fn new() -> Self {
        Self {
            tcp: ServiceTable::new(Protocol::Tcp),
            udp: ServiceTable::new(Protocol::Udp),
            stats: ParseStats::default(),
        }
    }

    /// Table for `protocol`
    pub fn table(&self, protocol: Protocol) -> &ServiceTable {
        match protocol {
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
        }
    }

    /// The TCP table
    pub fn tcp(&self) -> &ServiceTable {
        &self.tcp
    }

    /// The UDP table
    pub fn udp(&self) -> &ServiceTable {
        &self.udp
    }

    /// Counters from parsing
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Adds an entry with first-seen-wins semantics
    pub fn insert(&mut self, entry: ServiceEntry) -> bool {
        let table = match entry.protocol {
            Protocol::Tcp => &mut self.tcp,
            Protocol::Udp => &mut self.udp,
        };
        let port = entry.port;
        let inserted = table.insert(port, entry.name);
        if inserted {
            self.stats.kept += 1;
        } else {
            trace!("Dropping duplicate {}/{}", port, entry.protocol);
            self.stats.duplicates += 1;
        }
        inserted
    }
}

fn service_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+)\s+(\d+)/(tcp|udp)").expect("service line pattern is valid")
    })
}

/// Parses one trimmed registry line.
///
/// Returns `None` for lines that are not service definitions.
pub fn parse_line(line: &str) -> Option<ServiceEntry> {
    let caps = service_line_regex().captures(line)?;
    let port = caps[2].parse::<u16>().ok()?;
    let protocol = caps[3].parse().ok()?;
    Some(ServiceEntry {
        name: caps[1].to_string(),
        port,
        protocol,
    })
}

/// Builds a [`ServiceDatabase`] from registry text
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryParser;

impl RegistryParser {
    /// Creates a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parses registry text line by line
    pub fn parse_str(&self, text: &str) -> ServiceDatabase {
        let mut db = ServiceDatabase::new();

        for (index, raw) in text.lines().enumerate() {
            db.stats.lines += 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                db.stats.ignored += 1;
                continue;
            }

            match parse_line(line) {
                Some(entry) => {
                    db.insert(entry);
                }
                None => {
                    trace!("Skipping line {}: {}", index + 1, line);
                    db.stats.unmatched += 1;
                }
            }
        }

        debug!(
            "Parsed {} lines: {} kept, {} duplicates, {} unmatched",
            db.stats.lines, db.stats.kept, db.stats.duplicates, db.stats.unmatched
        );
        db
    }

    /// Reads and parses a registry file.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
    /// stray byte only affects its own line.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ServiceDatabase> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::registry_unavailable(path, e))?;
        Ok(self.parse_str(&String::from_utf8_lossy(&bytes)))
    }
}

/// A rendered service database, not yet on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceArtifact {
    /// Rendered document
    pub contents: String,
    /// The tables it was rendered from
    pub database: ServiceDatabase,
}

impl ServiceArtifact {
    /// Writes the document to `path`
    pub fn write_to(&self, path: impl Into<PathBuf>) -> Result<PathBuf> {
        let artifact = Artifact::new(path, self.contents.as_bytes());
        write_artifacts(std::slice::from_ref(&artifact))?;
        Ok(artifact.path)
    }
}

/// Parses a registry and renders it with the configured format
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceCompiler {
    format: RenderFormat,
}

impl ServiceCompiler {
    /// Creates a compiler for `format`
    pub fn new(format: RenderFormat) -> Self {
        Self { format }
    }

    /// Output format
    pub fn format(&self) -> RenderFormat {
        self.format
    }

    /// Compiles the registry at `registry_path`
    pub fn compile(&self, registry_path: impl AsRef<Path>) -> Result<ServiceArtifact> {
        let registry_path = registry_path.as_ref();
        debug!("Reading service registry {}", registry_path.display());
        let database = RegistryParser::new().parse_file(registry_path)?;
        self.compile_database(database)
    }

    /// Renders tables that were already parsed
    pub fn compile_database(&self, database: ServiceDatabase) -> Result<ServiceArtifact> {
        let contents = self.format.renderer().render(&database)?;
        info!(
            "Compiled {} TCP and {} UDP services as {}",
            database.tcp().len(),
            database.udp().len(),
            self.format
        );
        Ok(ServiceArtifact { contents, database })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_first_seen_wins() {
        let db = RegistryParser::new().parse_str("foo 80/tcp\nbar 80/tcp\nbaz 53/udp\n");

        assert_eq!(db.tcp().iter().collect::<Vec<_>>(), vec![(80, "foo")]);
        assert_eq!(db.udp().iter().collect::<Vec<_>>(), vec![(53, "baz")]);
        assert_eq!(db.stats().duplicates, 1);
        assert_eq!(db.stats().kept, 2);
    }

    #[test]
    fn test_comments_and_malformed_lines_skipped() {
        let db = RegistryParser::new().parse_str(
            "# comment 22/tcp\n\
             malformed-no-port/tcp\n\
             \n\
             \x20  # indented comment 23/tcp\n\
             ssh 22/tcp\n",
        );

        assert_eq!(db.tcp().get(22), Some("ssh"));
        assert_eq!(db.tcp().get(23), None);
        assert_eq!(db.tcp().len(), 1);
        assert!(db.udp().is_empty());
        assert_eq!(
            *db.stats(),
            ParseStats {
                lines: 5,
                ignored: 3,
                unmatched: 1,
                duplicates: 0,
                kept: 1,
            }
        );
    }

    #[test]
    fn test_empty_registry() {
        let db = RegistryParser::new().parse_str("");
        assert!(db.tcp().is_empty());
        assert!(db.udp().is_empty());
        assert_eq!(db.table(Protocol::Udp).protocol(), Protocol::Udp);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("http\t\t80/tcp\t\twww www-http\t# WorldWideWeb HTTP"),
            Some(ServiceEntry {
                name: "http".to_string(),
                port: 80,
                protocol: Protocol::Tcp,
            })
        );
        assert_eq!(parse_line("domain 53/udp").map(|e| e.protocol), Some(Protocol::Udp));
        assert_eq!(parse_line("ddp 2/ddp"), None);
        assert_eq!(parse_line("big 70000/tcp"), None);
        assert_eq!(parse_line("noport tcp"), None);
        assert_eq!(parse_line("sctp-only 9/sctp"), None);
    }

    #[test]
    fn test_tables_sorted_by_port() {
        let db = RegistryParser::new().parse_str("https 443/tcp\nftp 21/tcp\nhttp 80/tcp\n");
        let ports: Vec<u16> = db.tcp().iter().map(|(port, _)| port).collect();
        assert_eq!(ports, vec![21, 80, 443]);
    }

    #[test]
    fn test_missing_registry() {
        let dir = TempDir::new().unwrap();
        let err = ServiceCompiler::default()
            .compile(dir.path().join("services"))
            .unwrap_err();
        assert!(matches!(err, Error::RegistryUnavailable { .. }));
    }

    #[test]
    fn test_invalid_utf8_only_affects_its_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services");
        std::fs::write(&path, b"caf\xE9 1/tcp\nssh 22/tcp\n").unwrap();

        let db = RegistryParser::new().parse_file(&path).unwrap();
        assert_eq!(db.tcp().get(22), Some("ssh"));
        assert_eq!(db.tcp().len(), 2);
    }

    #[test]
    fn test_compile_and_write() {
        let dir = TempDir::new().unwrap();
        let registry = dir.path().join("services");
        std::fs::write(&registry, "echo 7/tcp\necho 7/udp\n").unwrap();

        let artifact = ServiceCompiler::new(RenderFormat::Json)
            .compile(&registry)
            .unwrap();
        let written = artifact
            .write_to(dir.path().join("BuiltinProtocolDB.json"))
            .unwrap();

        assert_eq!(std::fs::read_to_string(written).unwrap(), artifact.contents);
        assert_eq!(artifact.database.udp().get(7), Some("echo"));
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("tcp".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert!("TCP".parse::<Protocol>().is_err());
    }
}
