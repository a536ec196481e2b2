//! `$metadata` (EDMX) document generation.
//!
//! Deterministic and side-effect-free given the same column descriptors. The
//! document is small and has a fixed shape, so it is rendered directly rather
//! than through a DOM builder.

use std::fmt::Write as _;
use std::sync::Arc;

use tablegate_odata::schema::ColumnDescriptor;

/// Render the EDMX metadata document for the given entity sets.
#[must_use]
pub fn metadata_document(
    namespace: &str,
    container: &str,
    entity_sets: &[(String, Arc<[ColumnDescriptor]>)],
) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(
        "<edmx:Edmx xmlns:edmx=\"http://docs.oasis-open.org/odata/ns/edmx\" Version=\"4.0\">\n",
    );
    xml.push_str("  <edmx:DataServices>\n");
    let _ = writeln!(
        xml,
        "    <Schema xmlns=\"http://docs.oasis-open.org/odata/ns/edm\" Namespace=\"{}\">",
        escape(namespace)
    );

    for (name, columns) in entity_sets {
        let _ = writeln!(xml, "      <EntityType Name=\"{}\">", escape(name));
        if let Some(key) = key_column(columns) {
            xml.push_str("        <Key>\n");
            let _ = writeln!(xml, "          <PropertyRef Name=\"{}\"/>", escape(key));
            xml.push_str("        </Key>\n");
        }
        for column in columns.iter() {
            let _ = writeln!(
                xml,
                "        <Property Name=\"{}\" Type=\"{}\" Nullable=\"true\"/>",
                escape(&column.name),
                column.warehouse_type.edm_type()
            );
        }
        xml.push_str("      </EntityType>\n");
    }

    let _ = writeln!(
        xml,
        "      <EntityContainer Name=\"{}\">",
        escape(container)
    );
    for (name, _) in entity_sets {
        let _ = writeln!(
            xml,
            "        <EntitySet Name=\"{}\" EntityType=\"{}.{}\"/>",
            escape(name),
            escape(namespace),
            escape(name)
        );
    }
    xml.push_str("      </EntityContainer>\n");
    xml.push_str("    </Schema>\n");
    xml.push_str("  </edmx:DataServices>\n");
    xml.push_str("</edmx:Edmx>\n");
    xml
}

/// Entity key heuristic: a column named `id`, `key` or `code` if present,
/// otherwise the first column.
fn key_column(columns: &[ColumnDescriptor]) -> Option<&str> {
    columns
        .iter()
        .find(|c| {
            let lower = c.name.to_ascii_lowercase();
            lower == "id" || lower == "key" || lower == "code"
        })
        .or_else(|| columns.first())
        .map(|c| c.name.as_str())
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
