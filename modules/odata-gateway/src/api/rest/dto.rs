//! Wire shapes of the OData JSON surface.

use serde::Serialize;
use tablegate_odata::page::Row;

/// OData v4 response envelope for an entity-set query.
#[derive(Debug, Serialize)]
pub struct ODataEnvelope {
    #[serde(rename = "@odata.context")]
    pub context: String,
    pub value: Vec<Row>,
    #[serde(rename = "@odata.count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(rename = "@odata.nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// OData service document: the list of exposed entity sets.
#[derive(Debug, Serialize)]
pub struct ServiceDocument {
    #[serde(rename = "@odata.context")]
    pub context: String,
    pub value: Vec<EntitySetRef>,
}

#[derive(Debug, Serialize)]
pub struct EntitySetRef {
    pub name: String,
    pub kind: &'static str,
    pub url: String,
}

impl ServiceDocument {
    pub fn new(base_url: &str, entity_sets: &[String]) -> Self {
        Self {
            context: format!("{base_url}/odata/$metadata"),
            value: entity_sets
                .iter()
                .map(|name| EntitySetRef {
                    name: name.clone(),
                    kind: "EntitySet",
                    url: name.clone(),
                })
                .collect(),
        }
    }
}
