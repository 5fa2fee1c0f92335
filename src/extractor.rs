use anyhow::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::{Accessor, FieldRule};
use crate::dom::{DomElement, DomPage};

/// One extracted record: every declared field exactly once, in schema order,
/// with absent substructure holding the rule's fallback string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, name: String, value: String) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Extract one record per matching element, in document order. Zero matches
/// is an empty vec, not an error; deduplication belongs to the sink.
pub async fn extract<P: DomPage>(
    page: &P,
    collection_selector: &str,
    rules: &[FieldRule],
) -> Result<Vec<Record>> {
    let elements = page.query_all(collection_selector).await?;
    if elements.is_empty() {
        log::warn!("No elements matched {}", collection_selector);
        return Ok(Vec::new());
    }

    let mut records = Vec::with_capacity(elements.len());
    for element in &elements {
        records.push(map_fields(element, rules).await);
    }

    log::info!("Extracted {} records", records.len());
    Ok(records)
}

/// Map one element into a record. Total: missing substructure, empty text,
/// and backend read errors all degrade to the rule's fallback.
pub async fn map_fields<E: DomElement>(element: &E, rules: &[FieldRule]) -> Record {
    let mut record = Record::with_capacity(rules.len());

    for rule in rules {
        let value = match read_field(element, rule).await {
            Ok(Some(value)) => value,
            Ok(None) => rule.fallback.clone(),
            Err(e) => {
                log::warn!("Failed to read field {}: {}", rule.name, e);
                rule.fallback.clone()
            }
        };
        record.push(rule.name.clone(), value);
    }

    record
}

async fn read_field<E: DomElement>(element: &E, rule: &FieldRule) -> Result<Option<String>> {
    let Some(target) = element.query(&rule.selector).await? else {
        return Ok(None);
    };

    let value = match &rule.accessor {
        Accessor::Text => target
            .text_content()
            .await?
            .map(|text| text.trim().to_string()),
        // Attributes are machine-readable values; no trimming.
        Accessor::Attribute { name } => target.attribute(name).await?,
        Accessor::ResolvedUrl { name } => target.resolved_url(name).await?,
    };

    Ok(value.filter(|v| !v.is_empty()))
}
