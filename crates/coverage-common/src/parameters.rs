//! Parameter metadata: observed properties, categories, units.
//!
//! Parameters describe the data variables carried by a coverage, including
//! their units, observed properties and, for categorical data, the mapping
//! from encoded range values to category identifiers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Internationalized string supporting multiple languages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum I18nString {
    /// Simple string (assumes English).
    Simple(String),
    /// Map of language tags to strings.
    Localized(HashMap<String, String>),
}

impl I18nString {
    /// Create an English-only i18n string.
    pub fn english(s: &str) -> Self {
        let mut map = HashMap::new();
        map.insert("en".to_string(), s.to_string());
        I18nString::Localized(map)
    }

    /// Resolve the text for a language tag, falling back to English and
    /// then to any available language.
    pub fn get(&self, language: &str) -> &str {
        match self {
            I18nString::Simple(s) => s,
            I18nString::Localized(map) => map
                .get(language)
                .or_else(|| map.get("en"))
                .or_else(|| map.values().next())
                .map(|s| s.as_str())
                .unwrap_or(""),
        }
    }

    /// The English text, or any available text.
    pub fn text(&self) -> &str {
        self.get("en")
    }
}

/// One category of a categorical observed property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Category identifier URI.
    pub id: String,

    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<I18nString>,

    /// Description of the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<I18nString>,
}

impl Category {
    /// Create a category with an English label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: Some(I18nString::english(&label.into())),
            description: None,
        }
    }
}

/// The observed property a parameter measures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedProperty {
    /// URI identifier for the property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<I18nString>,

    /// Description of the property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<I18nString>,

    /// Categories for categorical data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

impl ObservedProperty {
    /// Create a new observed property with an English label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: Some(I18nString::english(&label.into())),
            description: None,
            categories: None,
        }
    }

    /// Set the ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the categories.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = Some(categories);
        self
    }
}

/// Unit of measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Unit symbol, e.g. "K".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Scheme URI the symbol belongs to, e.g. UCUM.
    #[serde(rename = "symbolScheme", skip_serializing_if = "Option::is_none")]
    pub symbol_scheme: Option<String>,

    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<I18nString>,
}

/// The UCUM unit-of-measure scheme URI.
pub const UCUM_SCHEME: &str = "http://www.opengis.net/def/uom/UCUM/";

impl Unit {
    /// Create a unit from a bare symbol.
    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            symbol_scheme: None,
            label: None,
        }
    }

    /// Create a unit from a symbol within a scheme.
    pub fn from_scheme_symbol(scheme: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            symbol_scheme: Some(scheme.into()),
            label: None,
        }
    }

    /// Human-readable symbol or label, symbols preferred.
    ///
    /// UCUM symbols get the common display substitutions ("Cel" -> "°C",
    /// the dimensionless "1" -> empty).
    pub fn stringify(&self, language: &str) -> String {
        if let Some(symbol) = &self.symbol {
            if self.symbol_scheme.as_deref() == Some(UCUM_SCHEME) {
                return match symbol.as_str() {
                    "Cel" => "°C".to_string(),
                    "1" => String::new(),
                    _ => symbol.clone(),
                };
            }
            return symbol.clone();
        }
        self.label
            .as_ref()
            .map(|l| l.get(language).to_string())
            .unwrap_or_default()
    }
}

/// A data variable of a coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    /// Unique key within the coverage's parameter set.
    pub key: String,

    /// The observed property.
    #[serde(rename = "observedProperty")]
    pub observed_property: ObservedProperty,

    /// Unit of measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    /// For categorical parameters: category id -> encoded range values.
    #[serde(rename = "categoryEncoding", skip_serializing_if = "Option::is_none")]
    pub category_encoding: Option<HashMap<String, Vec<i64>>>,
}

impl Parameter {
    /// Create a parameter with an English-labelled observed property.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            observed_property: ObservedProperty::new(label),
            unit: None,
            category_encoding: None,
        }
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the observed property.
    pub fn with_observed_property(mut self, observed_property: ObservedProperty) -> Self {
        self.observed_property = observed_property;
        self
    }

    /// Set the category encoding.
    pub fn with_category_encoding(mut self, encoding: HashMap<String, Vec<i64>>) -> Self {
        self.category_encoding = Some(encoding);
        self
    }

    /// The category corresponding to an encoded range value, if any.
    pub fn category_for_value(&self, value: i64) -> Option<&Category> {
        let encoding = self.category_encoding.as_ref()?;
        let categories = self.observed_property.categories.as_ref()?;
        let (category_id, _) = encoding.iter().find(|(_, values)| values.contains(&value))?;
        categories.iter().find(|c| &c.id == category_id)
    }
}

/// An insertion-ordered parameter catalogue keyed by parameter key.
///
/// Order matters: loading all ranges of a coverage preserves the
/// catalogue order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<Parameter>,
}

impl ParameterMap {
    /// Create an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, replacing any existing entry with the same key
    /// in place.
    pub fn insert(&mut self, parameter: Parameter) {
        if let Some(existing) = self.entries.iter_mut().find(|p| p.key == parameter.key) {
            *existing = parameter;
        } else {
            self.entries.push(parameter);
        }
    }

    /// Look up a parameter by key.
    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.entries.iter().find(|p| p.key == key)
    }

    /// Whether a parameter with the given key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Parameter keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|p| &p.key)
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Parameter> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut map = Self::new();
        for parameter in iter {
            map.insert(parameter);
        }
        map
    }
}
