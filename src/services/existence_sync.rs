//! Existence sync: before a transaction references product variants,
//! locations, or staff members by foreign key, verify the local mirror
//! rows exist. The three lookups fan out concurrently; any missing
//! reference aborts the whole request.

use futures::try_join;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    entities::{locations, product_variants, staff_members},
    errors::ServiceError,
};

#[derive(Clone)]
pub struct ExistenceSyncService {
    db: Arc<DatabaseConnection>,
}

impl ExistenceSyncService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Verifies every referenced id has a mirror row. Missing references
    /// are batched into one error.
    #[instrument(skip(self))]
    pub async fn sync_references(
        &self,
        product_variant_ids: &[i64],
        location_ids: &[i64],
        staff_member_ids: &[i64],
    ) -> Result<(), ServiceError> {
        let (missing_variants, missing_locations, missing_staff) = try_join!(
            self.missing_product_variants(product_variant_ids),
            self.missing_locations(location_ids),
            self.missing_staff_members(staff_member_ids),
        )?;

        let mut problems = Vec::new();
        if !missing_variants.is_empty() {
            problems.push(format!("unknown product variants: {:?}", missing_variants));
        }
        if !missing_locations.is_empty() {
            problems.push(format!("unknown locations: {:?}", missing_locations));
        }
        if !missing_staff.is_empty() {
            problems.push(format!("unknown staff members: {:?}", missing_staff));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ValidationError(problems.join("; ")))
        }
    }

    async fn missing_product_variants(&self, ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: HashSet<i64> = product_variants::Entity::find()
            .filter(product_variants::Column::Id.is_in(ids.to_vec()))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|v| v.id)
            .collect();
        Ok(missing(ids, &found))
    }

    async fn missing_locations(&self, ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: HashSet<i64> = locations::Entity::find()
            .filter(locations::Column::Id.is_in(ids.to_vec()))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|l| l.id)
            .collect();
        Ok(missing(ids, &found))
    }

    async fn missing_staff_members(&self, ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: HashSet<i64> = staff_members::Entity::find()
            .filter(staff_members::Column::Id.is_in(ids.to_vec()))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        Ok(missing(ids, &found))
    }
}

fn missing(wanted: &[i64], found: &HashSet<i64>) -> Vec<i64> {
    let mut missing: Vec<i64> = wanted
        .iter()
        .copied()
        .collect::<HashSet<i64>>()
        .into_iter()
        .filter(|id| !found.contains(id))
        .collect();
    missing.sort_unstable();
    missing
}
