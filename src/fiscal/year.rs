//! Fiscal year lifecycle

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::traits::{AuditEvent, AuditSink, FiscalStorage, NoopAuditSink};
use crate::types::{Caller, CoreError, CoreResult, FiscalYear};

/// Manager for opening and inspecting fiscal years
pub struct FiscalYearManager<S: FiscalStorage> {
    storage: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: FiscalStorage> FiscalYearManager<S> {
    /// Create a new fiscal year manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Create a new fiscal year manager with an audit sink
    pub fn with_audit(storage: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { storage, audit }
    }

    /// Open a fiscal year for a project. Storage rejects a second active
    /// year or a duplicate year label with a conflict.
    pub async fn open_fiscal_year(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        year: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CoreResult<FiscalYear> {
        caller.require_privileged()?;

        if start_date >= end_date {
            return Err(CoreError::Validation(format!(
                "Fiscal year must start before it ends, got {} to {}",
                start_date, end_date
            )));
        }

        let fiscal_year = FiscalYear::open(project_id, year, start_date, end_date);
        self.storage.insert_fiscal_year(&fiscal_year).await?;

        tracing::info!(%project_id, year, "fiscal year opened");
        self.audit
            .record(AuditEvent::new(
                caller.id,
                project_id,
                "open_fiscal_year",
                year.to_string(),
            ))
            .await;

        Ok(fiscal_year)
    }

    /// The project's single active fiscal year, if any
    pub async fn active_fiscal_year(&self, project_id: Uuid) -> CoreResult<Option<FiscalYear>> {
        self.storage.active_fiscal_year(project_id).await
    }

    /// The fiscal year covering a date, if any
    pub async fn fiscal_year_covering(
        &self,
        project_id: Uuid,
        date: NaiveDate,
    ) -> CoreResult<Option<FiscalYear>> {
        self.storage.fiscal_year_covering(project_id, date).await
    }

    /// Get a fiscal year by ID
    pub async fn get_fiscal_year(&self, fiscal_year_id: Uuid) -> CoreResult<Option<FiscalYear>> {
        self.storage.get_fiscal_year(fiscal_year_id).await
    }

    /// List all fiscal years of a project, newest first
    pub async fn list_fiscal_years(&self, project_id: Uuid) -> CoreResult<Vec<FiscalYear>> {
        self.storage.list_fiscal_years(project_id).await
    }
}
