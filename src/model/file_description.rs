//! Metadata harvested from a DSL file

/// Author, date and free-text description of one DSL source file.
#[derive(Debug, Default, Clone)]
pub struct FileDescription {
    pub file_name: String,
    pub author: String,
    pub date: String,
    pub description: String,
}
