//! The parts of a schema rank profiles depend on: fields with their
//! attributes, imported fields, schema inheritance and expression files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rankdef_core::TensorType;

use crate::reference::Reference;
use crate::reference::feature_names::as_attribute_feature;
use crate::{Error, Result};

pub const EXPRESSION_FILE_SUFFIX: &str = ".expression";

/// An in-memory attribute of a field. Usually shares the field's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub tensor_type: TensorType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, tensor_type: TensorType) -> Self {
        Self {
            name: name.into(),
            tensor_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub tensor_type: TensorType,
    pub attributes: Vec<Attribute>,
    pub indexed: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, tensor_type: TensorType) -> Self {
        Self {
            name: name.into(),
            tensor_type,
            attributes: Vec::new(),
            indexed: false,
        }
    }

    /// Add an attribute named like the field.
    pub fn with_attribute(mut self) -> Self {
        self.attributes
            .push(Attribute::new(self.name.clone(), self.tensor_type.clone()));
        self
    }

    pub fn with_named_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes
            .push(Attribute::new(name, self.tensor_type.clone()));
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// A field imported from a referenced document through a reference field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedField {
    pub name: String,
    pub reference_field: String,
    pub target: Attribute,
}

impl ImportedField {
    pub fn new(
        name: impl Into<String>,
        reference_field: impl Into<String>,
        target: Attribute,
    ) -> Self {
        Self {
            name: name.into(),
            reference_field: reference_field.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    inherited: Vec<String>,
    fields: IndexMap<String, Field>,
    imported_fields: IndexMap<String, ImportedField>,
    expression_dir: Option<PathBuf>,
    expression_sources: HashMap<String, String>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn inheriting(mut self, parent: impl Into<String>) -> Self {
        self.inherited.push(parent.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_imported_field(mut self, field: ImportedField) -> Self {
        self.imported_fields.insert(field.name.clone(), field);
        self
    }

    /// Directory expression files are read from.
    pub fn with_expression_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.expression_dir = Some(dir.into());
        self
    }

    /// Provide the content of an expression file without touching the disk.
    pub fn add_expression_source(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.expression_sources
            .insert(with_expression_suffix(&name.into()), text.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schemas this one inherits, by name.
    pub fn inherited(&self) -> &[String] {
        &self.inherited
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn imported_fields(&self) -> impl Iterator<Item = &ImportedField> {
        self.imported_fields.values()
    }

    /// `attribute(name)` types for every attribute and imported field. An
    /// attribute named differently from its field is also reachable under
    /// the field's name.
    pub fn attribute_types(&self) -> IndexMap<Reference, TensorType> {
        let mut types = IndexMap::new();
        for field in self.fields.values() {
            for attribute in &field.attributes {
                types.insert(
                    as_attribute_feature(&attribute.name),
                    attribute.tensor_type.clone(),
                );
                if attribute.name != field.name {
                    types.insert(
                        as_attribute_feature(&field.name),
                        attribute.tensor_type.clone(),
                    );
                }
            }
        }
        for imported in self.imported_fields.values() {
            types.insert(
                as_attribute_feature(&imported.name),
                imported.target.tensor_type.clone(),
            );
        }
        types
    }

    /// Read `name` (with or without the `.expression` suffix) from this
    /// schema's expression sources, then from its expression directory.
    /// The name must denote a file directly inside that directory.
    pub fn read_expression_file(&self, name: &str) -> Result<String> {
        if name.is_empty()
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
            || Path::new(name).is_absolute()
        {
            return Err(Error::IllegalPath(name.to_owned()));
        }
        let file_name = with_expression_suffix(name);
        if let Some(text) = self.expression_sources.get(&file_name) {
            return Ok(text.clone());
        }
        let path = match &self.expression_dir {
            Some(dir) => dir.join(&file_name),
            None => PathBuf::from(&file_name),
        };
        std::fs::read_to_string(&path).map_err(|e| Error::Io {
            path,
            message: e.to_string(),
        })
    }
}

fn with_expression_suffix(name: &str) -> String {
    if name.ends_with(EXPRESSION_FILE_SUFFIX) {
        name.to_owned()
    } else {
        format!("{name}{EXPRESSION_FILE_SUFFIX}")
    }
}
