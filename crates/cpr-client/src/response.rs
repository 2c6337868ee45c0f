//! GCTP response document mapping.
//!
//! The registry answers with a nested tabular document:
//!
//! ```text
//! root / Gctp / System / Service / CprData / Rolle / Table / Row* / Field*
//! ```
//!
//! Each `Field` carries its name in `r` and its value in `v`. Rows have no
//! fixed schema, so they are kept as name-to-value maps.

use crate::error::CprError;
use roxmltree::{Document, Node};
use std::collections::HashMap;

/// Parsed GCTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDocument {
    pub system: GctpSystem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GctpSystem {
    pub name: Option<String>,
    pub service: GctpService,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GctpService {
    pub name: Option<String>,
    pub dataset: Dataset,
}

/// The `CprData` section. `role` is the `r` attribute of its `Rolle` child.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub role: Option<String>,
    pub table: Table,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

/// One table row: field name to value.
///
/// Built once at parse time. The first occurrence of a name wins; a field
/// present without a value is kept so it still shadows later duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: HashMap<String, Option<String>>,
}

impl Row {
    /// Value of the named field. Exact, case-sensitive match.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Record a field unless the name is already present.
    pub fn insert_first(&mut self, name: impl Into<String>, value: Option<String>) {
        self.fields.entry(name.into()).or_insert(value);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::default();
        for (name, value) in iter {
            row.insert_first(name, Some(value.into()));
        }
        row
    }
}

impl ResponseDocument {
    /// Parse the raw GCTP XML.
    ///
    /// Errors never include the payload itself, it may contain personal data.
    pub fn parse(raw: &str) -> Result<Self, CprError> {
        let doc = Document::parse(raw)
            .map_err(|e| CprError::MalformedResponse(format!("invalid XML: {}", e)))?;

        let root = doc.root_element();
        if local_name(root) != "root" {
            return Err(CprError::MalformedResponse(format!(
                "unexpected root element <{}>",
                local_name(root)
            )));
        }

        let gctp = require_child(root, "Gctp")?;
        let system = require_child(gctp, "System")?;
        let service = require_child(system, "Service")?;
        let cpr_data = require_child(service, "CprData")?;
        let rolle = require_child(cpr_data, "Rolle")?;
        let table = require_child(rolle, "Table")?;

        let rows = children(table, "Row").map(parse_row).collect();

        Ok(Self {
            system: GctpSystem {
                name: system.attribute("r").map(String::from),
                service: GctpService {
                    name: service.attribute("r").map(String::from),
                    dataset: Dataset {
                        role: rolle.attribute("r").map(String::from),
                        table: Table { rows },
                    },
                },
            },
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.system.service.dataset.table.rows
    }
}

fn parse_row(node: Node<'_, '_>) -> Row {
    let mut row = Row::default();
    for field in children(node, "Field") {
        if let Some(name) = field.attribute("r") {
            row.insert_first(name, field.attribute("v").map(String::from));
        }
    }
    row
}

fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && local_name(*child) == tag)
}

fn require_child<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> Result<Node<'a, 'input>, CprError> {
    children(node, tag).next().ok_or_else(|| {
        CprError::MalformedResponse(format!(
            "missing <{}> under <{}>",
            tag,
            local_name(node)
        ))
    })
}
