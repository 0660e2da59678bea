use super::ModelId;

/// How a model's records are laid out relative to its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inheritance {
    /// The child's fields are stored as extra columns of the parent's table.
    Single,

    /// The child gets its own table, keyed by a foreign key into the parent's
    /// table.
    Multi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inherits {
    /// The structural parent
    pub parent: ModelId,

    pub strategy: Inheritance,
}

impl Inheritance {
    pub fn is_single(self) -> bool {
        matches!(self, Self::Single)
    }

    pub fn is_multi(self) -> bool {
        matches!(self, Self::Multi)
    }
}
