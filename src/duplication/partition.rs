//! Duplication of one partition into a project
//!
//! A partition is a named subset of a project's taxa and characters. Copying
//! it means copying those rows and everything hanging off them (cells,
//! notes, media links, orderings) while leaving the project, its members,
//! and user accounts untouched.

use super::{
    partition_policy, DependencyScanner, DuplicationPolicy, ScanPlan, TableStatement,
};
use crate::datamodel::catalog::PARTITIONS;
use crate::datamodel::{Datamodel, DatamodelError};

pub struct PartitionModelDuplicator<'a> {
    datamodel: &'a Datamodel,
    policy: DuplicationPolicy,
}

impl<'a> PartitionModelDuplicator<'a> {
    pub fn new(datamodel: &'a Datamodel) -> Self {
        Self {
            datamodel,
            policy: partition_policy(),
        }
    }

    pub fn policy(&self) -> &DuplicationPolicy {
        &self.policy
    }

    /// Every table copied along with `partition_id`, and how to fetch its rows
    pub fn plan(&self, partition_id: i64) -> Result<ScanPlan, DatamodelError> {
        DependencyScanner::new(self.datamodel, &self.policy).scan(PARTITIONS, partition_id)
    }

    pub fn statement_for(
        &self,
        partition_id: i64,
        table: &str,
    ) -> Result<TableStatement, DatamodelError> {
        DependencyScanner::new(self.datamodel, &self.policy).statement_for(
            PARTITIONS,
            partition_id,
            table,
        )
    }
}
