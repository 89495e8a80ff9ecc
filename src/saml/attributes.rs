//! Attribute extraction and matching-value resolution.
//!
//! Extraction flattens a validated assertion into an encounter-ordered map
//! of [`AttributeKey`] to value lists; resolution then picks the single
//! value the provider's matching-attribute selector asks for.

use samael::schema::Assertion;
use tracing::warn;

use crate::error::AuthError;
use crate::provider::MATCHING_ATTRIBUTE_NAME_ID;

/// Default attribute name format when the assertion omits one.
pub const NAME_FORMAT_BASIC: &str = "urn:oasis:names:tc:SAML:2.0:attrname-format:basic";

/// Identity of one assertion attribute.
///
/// Two attributes sharing a name stay distinguishable through their format
/// and friendly name; the shape degrades as trailing components are absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Name(String),
    NameFormat { name: String, format: String },
    Full { name: String, format: String, friendly: String },
}

impl AttributeKey {
    /// The attribute name component, whatever the shape.
    pub fn name(&self) -> &str {
        match self {
            AttributeKey::Name(name) => name,
            AttributeKey::NameFormat { name, .. } => name,
            AttributeKey::Full { name, .. } => name,
        }
    }

    fn new(name: String, format: String, friendly: Option<String>) -> Self {
        if format.is_empty() {
            return AttributeKey::Name(name);
        }
        match friendly {
            Some(friendly) => AttributeKey::Full { name, format, friendly },
            None => AttributeKey::NameFormat { name, format },
        }
    }
}

/// Encounter-ordered mapping from attribute key to ordered values.
///
/// Vector-backed so repeated extraction of the same assertion resolves
/// identically; assertions carry few attributes, so linear scans are fine.
#[derive(Debug, Default, Clone)]
pub struct AttributeMap {
    entries: Vec<(AttributeKey, Vec<String>)>,
}

impl AttributeMap {
    pub fn get(&self, key: &AttributeKey) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &[String])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn values_mut(&mut self, key: AttributeKey) -> &mut Vec<String> {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

/// Flatten every attribute statement of a validated assertion.
///
/// Values keep their encounter order. An attribute without a readable name
/// is skipped with a warning; one malformed attribute must not abort an
/// otherwise valid assertion.
pub fn extract_attributes(assertion: &Assertion) -> AttributeMap {
    let mut attrs = AttributeMap::default();

    for statement in assertion.attribute_statements.iter().flatten() {
        for attribute in &statement.attributes {
            let Some(name) = attribute.name.clone() else {
                warn!("skipping assertion attribute without a readable name");
                continue;
            };
            let format = attribute
                .name_format
                .clone()
                .unwrap_or_else(|| NAME_FORMAT_BASIC.to_string());
            let key = AttributeKey::new(name, format, attribute.friendly_name.clone());

            let values = attrs.values_mut(key);
            for value in &attribute.values {
                values.push(value.value.clone().unwrap_or_default());
            }
        }
    }

    attrs
}

/// Resolve the single matching value for a provider's selector.
///
/// The literal selector `subject.nameId` bypasses the attribute map and
/// reads the subject's NameID directly. Any other selector takes the first
/// value of the first key whose name matches, and fails hard when absent —
/// a missing custom attribute never degrades to NameID.
pub fn resolve_matching_value(
    assertion: &Assertion,
    attrs: &AttributeMap,
    selector: &str,
) -> Result<String, AuthError> {
    if selector == MATCHING_ATTRIBUTE_NAME_ID {
        return assertion
            .subject
            .as_ref()
            .and_then(|subject| subject.name_id.as_ref())
            .map(|name_id| name_id.value.clone())
            .ok_or_else(|| AuthError::AttributeNotFound {
                selector: selector.to_string(),
            });
    }

    attrs
        .iter()
        .find(|(key, _)| key.name() == selector)
        .and_then(|(_, values)| values.first().cloned())
        .ok_or_else(|| AuthError::AttributeNotFound {
            selector: selector.to_string(),
        })
}
