//! Table mapping declarations
//!
//! Entities declare their foreign keys, indexes and relationships as static
//! data. The migration under `blog-db/migrations` is the physical schema;
//! these declarations are what the code expects that schema to contain.

use blog_core::traits::Entity;

/// A secondary index on one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl IndexDef {
    /// `CREATE [UNIQUE] INDEX` statement for this index
    pub fn create_sql(&self) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            self.table,
            self.columns.join(", ")
        )
    }

    /// Whether the index can serve an equality filter on `column`
    pub fn leads_with(&self, column: &str) -> bool {
        self.columns.first() == Some(&column)
    }
}

/// Owning side of a relationship: `table.column REFERENCES target(target_column)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// This entity holds the foreign key
    ManyToOne,
    /// Inverse side; the target table holds the foreign key
    OneToMany,
}

/// A navigable relationship between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub kind: RelationKind,
    pub target_table: &'static str,
    /// Foreign key column, on whichever side owns it
    pub join_column: &'static str,
}

/// Entities with a declared table mapping
pub trait Mapped: Entity {
    const FOREIGN_KEYS: &'static [ForeignKey];
    const INDEXES: &'static [IndexDef];
    const RELATIONS: &'static [Relation];
}
