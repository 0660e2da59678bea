use super::{Field, Inheritance, Localize};

/// A model declaration, before ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Name of the model
    pub name: String,

    /// Fields declared by the model itself
    pub fields: Vec<Field>,

    /// If set, the model's table. Defaults to the pluralized snake case name.
    pub table_name: Option<String>,

    /// Structural parent
    pub inherits: Option<Parent>,

    /// Localization directive
    pub localize: Option<Localize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parent {
    /// Name of the parent model
    pub name: String,

    pub strategy: Inheritance,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
            table_name: None,
            inherits: None,
            localize: None,
        }
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn inherits(mut self, parent: impl Into<String>, strategy: Inheritance) -> Self {
        self.inherits = Some(Parent {
            name: parent.into(),
            strategy,
        });
        self
    }

    /// Gives the listed fields per-locale copies.
    pub fn localized(mut self, localize: Localize) -> Self {
        self.localize = Some(localize);
        self
    }

    /// Find a field by name
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}
