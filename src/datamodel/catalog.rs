//! Table catalog for the research datamodel
//!
//! The declared tables of the project store. Links to `users` are ownership
//! metadata and carry weight 0 so path search never routes through them;
//! links to `projects` are heavy because nearly every table hangs off the
//! project hub.

use super::descriptor::TableDescriptor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read datamodel catalog: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse datamodel catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

pub const USERS: &str = "users";
pub const PROJECTS: &str = "projects";
pub const PARTITIONS: &str = "partitions";

const OWNER_WEIGHT: u32 = 0;
const PROJECT_WEIGHT: u32 = 100;

/// Tables of the research project store, in declaration order
pub fn research_catalog() -> Vec<TableDescriptor> {
    vec![
        TableDescriptor::new(USERS, 1, &["user_id"])
            .columns(&["user_id", "email", "fname", "lname", "active"]),
        TableDescriptor::new(PROJECTS, 2, &["project_id"])
            .columns(&["project_id", "user_id", "name", "description", "published", "created_on"])
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("project_members", 3, &["link_id"])
            .columns(&["link_id", "project_id", "user_id", "role"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("project_documents", 4, &["document_id"])
            .columns(&["document_id", "project_id", "user_id", "title", "uploaded_on"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new(PARTITIONS, 5, &["partition_id"])
            .columns(&["partition_id", "project_id", "user_id", "name", "description"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("taxa", 6, &["taxon_id"])
            .columns(&[
                "taxon_id",
                "project_id",
                "user_id",
                "genus",
                "specific_epithet",
                "is_extinct",
                "notes",
            ])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("specimens", 7, &["specimen_id"])
            .columns(&["specimen_id", "project_id", "user_id", "institution_code", "catalog_number"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("media_views", 8, &["view_id"])
            .columns(&["view_id", "project_id", "user_id", "name"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("media_files", 9, &["media_id"])
            .columns(&["media_id", "project_id", "user_id", "specimen_id", "view_id", "media", "notes"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT)
            .references("specimen_id", "specimens")
            .references("view_id", "media_views"),
        TableDescriptor::new("characters", 10, &["character_id"])
            .columns(&["character_id", "project_id", "user_id", "name", "description", "ordering", "type"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("character_states", 11, &["state_id"])
            .columns(&["state_id", "character_id", "user_id", "num", "name"])
            .references("character_id", "characters")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("character_rules", 12, &["rule_id"])
            .columns(&[
                "rule_id",
                "character_id",
                "state_id",
                "action_character_id",
                "action_state_id",
                "user_id",
                "action",
            ])
            .references("character_id", "characters")
            .references("state_id", "character_states")
            .references("action_character_id", "characters")
            .references("action_state_id", "character_states")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("matrices", 13, &["matrix_id"])
            .columns(&["matrix_id", "project_id", "user_id", "title", "type"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("matrix_taxa_order", 14, &["order_id"])
            .columns(&["order_id", "matrix_id", "taxon_id", "user_id", "position", "notes"])
            .references("matrix_id", "matrices")
            .references("taxon_id", "taxa")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("matrix_character_order", 15, &["order_id"])
            .columns(&["order_id", "matrix_id", "character_id", "user_id", "position"])
            .references("matrix_id", "matrices")
            .references("character_id", "characters")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("cells", 16, &["cell_id"])
            .columns(&[
                "cell_id",
                "matrix_id",
                "taxon_id",
                "character_id",
                "state_id",
                "user_id",
                "is_npa",
                "is_uncertain",
            ])
            .references("matrix_id", "matrices")
            .references("taxon_id", "taxa")
            .references("character_id", "characters")
            .references("state_id", "character_states")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("cell_notes", 17, &["note_id"])
            .columns(&["note_id", "matrix_id", "taxon_id", "character_id", "user_id", "notes"])
            .references("matrix_id", "matrices")
            .references("taxon_id", "taxa")
            .references("character_id", "characters")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("cells_x_media", 18, &["link_id"])
            .columns(&["link_id", "matrix_id", "taxon_id", "character_id", "media_id", "user_id"])
            .references("matrix_id", "matrices")
            .references("taxon_id", "taxa")
            .references("character_id", "characters")
            .references("media_id", "media_files")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("taxa_x_partitions", 19, &["link_id"])
            .columns(&["link_id", "taxon_id", "partition_id", "user_id"])
            .references("taxon_id", "taxa")
            .references("partition_id", PARTITIONS)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("characters_x_partitions", 20, &["link_id"])
            .columns(&["link_id", "character_id", "partition_id", "user_id"])
            .references("character_id", "characters")
            .references("partition_id", PARTITIONS)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("taxa_x_media", 21, &["link_id"])
            .columns(&["link_id", "taxon_id", "media_id", "user_id"])
            .references("taxon_id", "taxa")
            .references("media_id", "media_files")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("taxa_x_specimens", 22, &["link_id"])
            .columns(&["link_id", "taxon_id", "specimen_id", "user_id"])
            .references("taxon_id", "taxa")
            .references("specimen_id", "specimens")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("characters_x_media", 23, &["link_id"])
            .columns(&["link_id", "character_id", "state_id", "media_id", "user_id"])
            .references("character_id", "characters")
            .references("state_id", "character_states")
            .references("media_id", "media_files")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("bibliographic_references", 24, &["reference_id"])
            .columns(&["reference_id", "project_id", "user_id", "article_title", "journal_title", "pubyear"])
            .references_weighted("project_id", PROJECTS, PROJECT_WEIGHT)
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("taxa_x_bibliographic_references", 25, &["link_id"])
            .columns(&["link_id", "taxon_id", "reference_id", "user_id", "pp"])
            .references("taxon_id", "taxa")
            .references("reference_id", "bibliographic_references")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
        TableDescriptor::new("matrix_file_uploads", 26, &["upload_id"])
            .columns(&["upload_id", "matrix_id", "user_id", "upload", "uploaded_on"])
            .references("matrix_id", "matrices")
            .references_weighted("user_id", USERS, OWNER_WEIGHT),
    ]
}

/// Load a catalog from a JSON array of descriptors
pub fn load_from_path(path: &Path) -> Result<Vec<TableDescriptor>, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    let descriptors = serde_json::from_str(&raw)?;
    Ok(descriptors)
}
