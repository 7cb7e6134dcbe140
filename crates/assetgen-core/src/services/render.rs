//! Output formats for a [`ServiceDatabase`].
//!
//! Both renderers emit the TCP table before the UDP table, each as its own
//! named section, and always emit both sections even when empty.

use super::{Protocol, ServiceDatabase};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write as FmtWrite};

/// Renders a service database into a document.
///
/// Implement this trait to add an output format.
pub trait ServiceRenderer {
    /// Render both tables
    fn render(&self, db: &ServiceDatabase) -> Result<String>;

    /// Conventional file extension of the output
    fn file_extension(&self) -> &'static str;
}

/// Selects a built-in renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderFormat {
    /// C++ source defining two `std::unordered_map` globals
    #[default]
    Cpp,
    /// JSON document with `tcp` and `udp` objects
    Json,
}

impl RenderFormat {
    /// Returns the renderer for this format
    pub fn renderer(self) -> Box<dyn ServiceRenderer> {
        match self {
            RenderFormat::Cpp => Box::new(CppSourceRenderer::default()),
            RenderFormat::Json => Box::new(JsonRenderer),
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFormat::Cpp => f.write_str("cpp"),
            RenderFormat::Json => f.write_str("json"),
        }
    }
}

/// Emits the tables as C++ `std::unordered_map<uint16_t, std::string>` globals
#[derive(Debug, Clone)]
pub struct CppSourceRenderer {
    /// Name of the TCP map
    pub tcp_symbol: String,
    /// Name of the UDP map
    pub udp_symbol: String,
}

impl Default for CppSourceRenderer {
    fn default() -> Self {
        Self {
            tcp_symbol: "GTCPServices".to_string(),
            udp_symbol: "GUDPServices".to_string(),
        }
    }
}

impl CppSourceRenderer {
    fn symbol(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::Tcp => &self.tcp_symbol,
            Protocol::Udp => &self.udp_symbol,
        }
    }

    fn write_source(&self, w: &mut impl FmtWrite, db: &ServiceDatabase) -> fmt::Result {
        writeln!(w, "#include <unordered_map>")?;
        writeln!(w, "#include <string>")?;
        writeln!(w, "#include <cstdint>")?;

        for protocol in Protocol::ALL {
            writeln!(w)?;
            writeln!(
                w,
                "const std::unordered_map<uint16_t, std::string> {} = {{",
                self.symbol(protocol)
            )?;
            for (port, name) in db.table(protocol).iter() {
                writeln!(w, "    {{{}, \"{}\"}},", port, escape_c_string(name))?;
            }
            writeln!(w, "}};")?;
        }

        Ok(())
    }
}

impl ServiceRenderer for CppSourceRenderer {
    fn render(&self, db: &ServiceDatabase) -> Result<String> {
        let mut out = String::new();
        self.write_source(&mut out, db)
            .expect("String write cannot fail");
        Ok(out)
    }

    fn file_extension(&self) -> &'static str {
        "cpp"
    }
}

/// Emits `{"tcp": {"<port>": "<name>"}, "udp": {...}}` with four-space indentation
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonDocument<'a> {
    tcp: &'a BTreeMap<u16, String>,
    udp: &'a BTreeMap<u16, String>,
}

impl ServiceRenderer for JsonRenderer {
    fn render(&self, db: &ServiceDatabase) -> Result<String> {
        let document = JsonDocument {
            tcp: db.tcp().as_map(),
            udp: db.udp().as_map(),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;
        buf.push(b'\n');

        Ok(String::from_utf8(buf).expect("serde_json emits UTF-8"))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

/// Escape a service name for use inside a C string literal
fn escape_c_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '?' => result.push_str("\\?"),
            // \ooo ends after three digits; \x would absorb a following hex digit
            _ if c.is_ascii_control() => {
                result.push_str(&format!("\\{:03o}", c as u8));
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::super::RegistryParser;
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ServiceDatabase {
        RegistryParser::new().parse_str("http 80/tcp\nssh 22/tcp\ndomain 53/udp\nhttp 80/tcp\n")
    }

    #[test]
    fn test_cpp_source() {
        let out = CppSourceRenderer::default().render(&sample()).unwrap();
        assert_eq!(
            out,
            "#include <unordered_map>\n\
             #include <string>\n\
             #include <cstdint>\n\
             \n\
             const std::unordered_map<uint16_t, std::string> GTCPServices = {\n\
             \x20   {22, \"ssh\"},\n\
             \x20   {80, \"http\"},\n\
             };\n\
             \n\
             const std::unordered_map<uint16_t, std::string> GUDPServices = {\n\
             \x20   {53, \"domain\"},\n\
             };\n"
        );
    }

    #[test]
    fn test_json_document() {
        let out = JsonRenderer.render(&sample()).unwrap();
        assert_eq!(
            out,
            r#"{
    "tcp": {
        "22": "ssh",
        "80": "http"
    },
    "udp": {
        "53": "domain"
    }
}
"#
        );
    }

    #[test]
    fn test_json_ports_in_numeric_order() {
        let db = RegistryParser::new().parse_str("a 1000/tcp\nb 22/tcp\nc 3/tcp\n");
        let out = JsonRenderer.render(&db).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["tcp"]["22"], "b");

        let c = out.find("\"3\"").unwrap();
        let b = out.find("\"22\"").unwrap();
        let a = out.find("\"1000\"").unwrap();
        assert!(c < b && b < a);
    }

    #[test]
    fn test_empty_tables_present() {
        let db = ServiceDatabase::new();

        let json: serde_json::Value =
            serde_json::from_str(&JsonRenderer.render(&db).unwrap()).unwrap();
        assert_eq!(json["tcp"], serde_json::json!({}));
        assert_eq!(json["udp"], serde_json::json!({}));

        let cpp = CppSourceRenderer::default().render(&db).unwrap();
        assert!(cpp.contains("GTCPServices = {\n};"));
        assert!(cpp.contains("GUDPServices = {\n};"));
    }

    #[test]
    fn test_escape_c_string() {
        assert_eq!(escape_c_string("plain-name"), "plain-name");
        assert_eq!(escape_c_string("a\"b"), "a\\\"b");
        assert_eq!(escape_c_string("a\\b"), "a\\\\b");
        assert_eq!(escape_c_string("??="), "\\?\\?=");
        assert_eq!(escape_c_string("a\x01b"), "a\\001b");
        assert_eq!(escape_c_string("tab\there"), "tab\\011here");
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(RenderFormat::Json.renderer().file_extension(), "json");
        assert_eq!(RenderFormat::default().to_string(), "cpp");
    }
}
