//! The field declaration value type and its canonical text

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::value::Value;

/// Attribute name -> value. Keys iterate in lexicographic order, which is
/// also the order the canonical text renders them in.
pub type Attributes = BTreeMap<String, Value>;

/// A declaration-only modifier with no schema representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specifier {
    Indexed,
    Unique,
    Required,
}

impl Specifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specifier::Indexed => "indexed",
            Specifier::Unique => "unique",
            Specifier::Required => "required",
        }
    }
}

impl FromStr for Specifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indexed" => Ok(Specifier::Indexed),
            "unique" => Ok(Specifier::Unique),
            "required" => Ok(Specifier::Required),
            other => Err(Error::declaration(
                other,
                "expected one of :indexed, :unique, :required",
            )),
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.as_str())
    }
}

/// One member of a `FieldDeclaration` to overwrite with [`FieldDeclaration::replace`].
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    Name(String),
    Type(String),
    Specifiers(Vec<Specifier>),
    Attributes(Attributes),
}

/// A declared field: `name :type, specifier..., :attr=>value...`.
///
/// Equality is structural over all four members. Specifiers keep their
/// declaration order but never repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub name: String,
    pub type_name: String,
    pub specifiers: Vec<Specifier>,
    pub attributes: Attributes,
}

impl FieldDeclaration {
    /// A declaration with no specifiers and no attributes.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            specifiers: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Build a declaration from its parts.
    ///
    /// This does not consult any registry; see `Registry::declare` for the
    /// validated path that runs hooks and drops default-valued attributes.
    pub fn declare<I, K, V>(
        name: impl Into<String>,
        type_name: impl Into<String>,
        specifiers: impl IntoIterator<Item = Specifier>,
        attributes: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut declaration = Self::new(name, type_name);
        for specifier in specifiers {
            declaration.push_specifier(specifier);
        }
        declaration.merge_attributes(attributes);
        declaration
    }

    /// Builder form of [`push_specifier`](Self::push_specifier).
    pub fn with_specifier(mut self, specifier: Specifier) -> Self {
        self.push_specifier(specifier);
        self
    }

    /// Builder form of a single-attribute merge.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append a specifier unless it is already present.
    pub fn push_specifier(&mut self, specifier: Specifier) -> &mut Self {
        if !self.specifiers.contains(&specifier) {
            self.specifiers.push(specifier);
        }
        self
    }

    /// Overwrite whole members.
    pub fn replace(&mut self, replacements: impl IntoIterator<Item = Replacement>) -> &mut Self {
        for replacement in replacements {
            match replacement {
                Replacement::Name(name) => self.name = name,
                Replacement::Type(type_name) => self.type_name = type_name,
                Replacement::Specifiers(specifiers) => {
                    self.specifiers.clear();
                    for specifier in specifiers {
                        self.push_specifier(specifier);
                    }
                }
                Replacement::Attributes(attributes) => self.attributes = attributes,
            }
        }
        self
    }

    /// Insert or overwrite attributes.
    pub fn merge_attributes<I, K, V>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Drop the named attributes; missing names are ignored.
    pub fn remove_attributes<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        for name in names {
            self.attributes.remove(name.as_ref());
        }
        self
    }

    /// Canonical declaration text, as written into a field block.
    pub fn to_canonical_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :{}", self.name, self.type_name)?;
        for specifier in &self.specifiers {
            write!(f, ", {specifier}")?;
        }
        for (key, value) in &self.attributes {
            write!(f, ", :{key}=>{value}")?;
        }
        Ok(())
    }
}
