use super::FieldId;

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    /// Fields composing the primary key
    pub fields: Vec<FieldId>,
}
