use crate::util::blake3_hex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordering key of the catalog: endpoint name first, then identifier.
/// The derived `Ord` follows field order, which is the order the index keeps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub endpoint: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.id)
    }
}

/// Structural element kinds a predicate can address, with their query
/// abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "prop")]
    Property,
    #[serde(rename = "mlp")]
    MultiLanguageProperty,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "ent")]
    Entity,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "blob")]
    Blob,
    #[serde(rename = "opr")]
    Operation,
    #[serde(rename = "ref")]
    ReferenceElement,
    #[serde(rename = "rel")]
    RelationshipElement,
    #[serde(rename = "rela")]
    AnnotatedRelationshipElement,
    #[serde(rename = "sm")]
    Submodel,
    #[serde(rename = "smc")]
    SubmodelElementCollection,
    #[serde(rename = "sml")]
    SubmodelElementList,
}

impl ElementKind {
    pub const ALL: [ElementKind; 13] = [
        ElementKind::Property,
        ElementKind::MultiLanguageProperty,
        ElementKind::Range,
        ElementKind::Entity,
        ElementKind::File,
        ElementKind::Blob,
        ElementKind::Operation,
        ElementKind::ReferenceElement,
        ElementKind::RelationshipElement,
        ElementKind::AnnotatedRelationshipElement,
        ElementKind::Submodel,
        ElementKind::SubmodelElementCollection,
        ElementKind::SubmodelElementList,
    ];

    pub fn abbreviation(&self) -> &'static str {
        match self {
            ElementKind::Property => "prop",
            ElementKind::MultiLanguageProperty => "mlp",
            ElementKind::Range => "range",
            ElementKind::Entity => "ent",
            ElementKind::File => "file",
            ElementKind::Blob => "blob",
            ElementKind::Operation => "opr",
            ElementKind::ReferenceElement => "ref",
            ElementKind::RelationshipElement => "rel",
            ElementKind::AnnotatedRelationshipElement => "rela",
            ElementKind::Submodel => "sm",
            ElementKind::SubmodelElementCollection => "smc",
            ElementKind::SubmodelElementList => "sml",
        }
    }

    /// Case-insensitive lookup of a query abbreviation.
    pub fn from_abbreviation(abbreviation: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.abbreviation().eq_ignore_ascii_case(abbreviation))
    }
}

/// XML schema value types used by properties and ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "xs:string")]
    String,
    #[serde(rename = "xs:anyURI")]
    AnyUri,
    #[serde(rename = "xs:boolean")]
    Boolean,
    #[serde(rename = "xs:decimal")]
    Decimal,
    #[serde(rename = "xs:double")]
    Double,
    #[serde(rename = "xs:float")]
    Float,
    #[serde(rename = "xs:int")]
    Int,
    #[serde(rename = "xs:short")]
    Short,
    #[serde(rename = "xs:byte")]
    Byte,
    #[serde(rename = "xs:unsignedInt")]
    UnsignedInt,
    #[serde(rename = "xs:unsignedShort")]
    UnsignedShort,
    #[serde(rename = "xs:unsignedByte")]
    UnsignedByte,
    #[serde(rename = "xs:integer")]
    Integer,
    #[serde(rename = "xs:long")]
    Long,
    #[serde(rename = "xs:unsignedLong")]
    UnsignedLong,
    #[serde(rename = "xs:nonNegativeInteger")]
    NonNegativeInteger,
    #[serde(rename = "xs:positiveInteger")]
    PositiveInteger,
    #[serde(rename = "xs:nonPositiveInteger")]
    NonPositiveInteger,
    #[serde(rename = "xs:negativeInteger")]
    NegativeInteger,
    #[serde(rename = "xs:date")]
    Date,
    #[serde(rename = "xs:dateTime")]
    DateTime,
    #[serde(other)]
    Other,
}

/// How a stored value of a given type is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Text,
    Boolean,
    Number,
    BigInt,
    Date,
}

impl ValueType {
    pub fn class(&self) -> ValueClass {
        match self {
            ValueType::String | ValueType::AnyUri | ValueType::Other => ValueClass::Text,
            ValueType::Boolean => ValueClass::Boolean,
            ValueType::Decimal
            | ValueType::Double
            | ValueType::Float
            | ValueType::Int
            | ValueType::Short
            | ValueType::Byte
            | ValueType::UnsignedInt
            | ValueType::UnsignedShort
            | ValueType::UnsignedByte => ValueClass::Number,
            ValueType::Integer
            | ValueType::Long
            | ValueType::UnsignedLong
            | ValueType::NonNegativeInteger
            | ValueType::PositiveInteger
            | ValueType::NonPositiveInteger
            | ValueType::NegativeInteger => ValueClass::BigInt,
            ValueType::Date | ValueType::DateTime => ValueClass::Date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "type")]
    pub key_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Reference {
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl Reference {
    fn render(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.value.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// A node of a shell's element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType", rename_all_fields = "camelCase")]
pub enum Element {
    Property {
        id_short: String,
        #[serde(default)]
        value_type: Option<ValueType>,
        #[serde(default)]
        value: Option<String>,
    },
    MultiLanguageProperty {
        id_short: String,
        #[serde(default)]
        value: Vec<LangString>,
    },
    Range {
        id_short: String,
        #[serde(default)]
        value_type: Option<ValueType>,
        #[serde(default)]
        min: Option<String>,
        #[serde(default)]
        max: Option<String>,
    },
    Entity {
        id_short: String,
        #[serde(default)]
        global_asset_id: Option<String>,
        #[serde(default)]
        statements: Vec<Element>,
    },
    File {
        id_short: String,
        #[serde(default)]
        content_type: Option<String>,
        #[serde(default)]
        value: Option<String>,
    },
    Blob {
        id_short: String,
        #[serde(default)]
        content_type: Option<String>,
    },
    Operation {
        id_short: String,
    },
    ReferenceElement {
        id_short: String,
        #[serde(default)]
        value: Option<Reference>,
    },
    RelationshipElement {
        id_short: String,
        #[serde(default)]
        first: Option<Reference>,
        #[serde(default)]
        second: Option<Reference>,
    },
    AnnotatedRelationshipElement {
        id_short: String,
        #[serde(default)]
        first: Option<Reference>,
        #[serde(default)]
        second: Option<Reference>,
        #[serde(default)]
        annotations: Vec<Element>,
    },
    Submodel {
        id_short: String,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        submodel_elements: Vec<Element>,
    },
    SubmodelElementCollection {
        id_short: String,
        #[serde(default)]
        value: Vec<Element>,
    },
    SubmodelElementList {
        id_short: String,
        #[serde(default)]
        value: Vec<Element>,
    },
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Property { .. } => ElementKind::Property,
            Element::MultiLanguageProperty { .. } => ElementKind::MultiLanguageProperty,
            Element::Range { .. } => ElementKind::Range,
            Element::Entity { .. } => ElementKind::Entity,
            Element::File { .. } => ElementKind::File,
            Element::Blob { .. } => ElementKind::Blob,
            Element::Operation { .. } => ElementKind::Operation,
            Element::ReferenceElement { .. } => ElementKind::ReferenceElement,
            Element::RelationshipElement { .. } => ElementKind::RelationshipElement,
            Element::AnnotatedRelationshipElement { .. } => {
                ElementKind::AnnotatedRelationshipElement
            }
            Element::Submodel { .. } => ElementKind::Submodel,
            Element::SubmodelElementCollection { .. } => ElementKind::SubmodelElementCollection,
            Element::SubmodelElementList { .. } => ElementKind::SubmodelElementList,
        }
    }

    pub fn id_short(&self) -> &str {
        match self {
            Element::Property { id_short, .. }
            | Element::MultiLanguageProperty { id_short, .. }
            | Element::Range { id_short, .. }
            | Element::Entity { id_short, .. }
            | Element::File { id_short, .. }
            | Element::Blob { id_short, .. }
            | Element::Operation { id_short }
            | Element::ReferenceElement { id_short, .. }
            | Element::RelationshipElement { id_short, .. }
            | Element::AnnotatedRelationshipElement { id_short, .. }
            | Element::Submodel { id_short, .. }
            | Element::SubmodelElementCollection { id_short, .. }
            | Element::SubmodelElementList { id_short, .. } => id_short,
        }
    }

    pub fn children(&self) -> &[Element] {
        match self {
            Element::Entity { statements, .. } => statements,
            Element::AnnotatedRelationshipElement { annotations, .. } => annotations,
            Element::Submodel {
                submodel_elements, ..
            } => submodel_elements,
            Element::SubmodelElementCollection { value, .. }
            | Element::SubmodelElementList { value, .. } => value,
            Element::Property { .. }
            | Element::MultiLanguageProperty { .. }
            | Element::Range { .. }
            | Element::File { .. }
            | Element::Blob { .. }
            | Element::Operation { .. }
            | Element::ReferenceElement { .. }
            | Element::RelationshipElement { .. } => &[],
        }
    }

    /// The matchable scalar of this element and its declared type.
    fn scalar(&self) -> (Option<String>, Option<ValueType>) {
        match self {
            Element::Property {
                value, value_type, ..
            } => (value.clone(), *value_type),
            Element::MultiLanguageProperty { value, .. } if !value.is_empty() => {
                let text = value
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                (Some(text), Some(ValueType::String))
            }
            Element::Range { min, value_type, .. } => (min.clone(), *value_type),
            Element::Entity {
                global_asset_id, ..
            } => (global_asset_id.clone(), Some(ValueType::String)),
            Element::File { value, .. } => (value.clone(), Some(ValueType::String)),
            Element::ReferenceElement { value: Some(r), .. } => {
                (Some(r.render()), Some(ValueType::String))
            }
            _ => (None, None),
        }
    }
}

/// Flattened projection of one element, the unit structural predicates
/// are matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub document: DocumentKey,
    pub kind: ElementKind,
    pub id_short: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_type: Option<ValueType>,
}

/// A digital-twin shell as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(flatten)]
    pub key: DocumentKey,
    pub id_short: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub submodels: Vec<Element>,
}

impl Document {
    /// Depth-first walk emitting one record per element, including
    /// elements without a scalar so that name-only predicates can match.
    pub fn element_records(&self) -> Vec<ElementRecord> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.submodels.iter().rev().collect();
        while let Some(element) = stack.pop() {
            let (value, value_type) = element.scalar();
            out.push(ElementRecord {
                document: self.key.clone(),
                kind: element.kind(),
                id_short: element.id_short().to_string(),
                value,
                value_type,
            });
            stack.extend(element.children().iter().rev());
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(flatten)]
    pub document: Document,
    pub revision: String,
    pub modified: DateTime<Utc>,
}

impl StoredDocument {
    pub fn new(document: Document) -> Self {
        let revision = blake3_hex(
            serde_json::to_string(&document)
                .unwrap_or_default()
                .as_bytes(),
        );
        Self {
            document,
            revision,
            modified: Utc::now(),
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.document.key
    }
}
