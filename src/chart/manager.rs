//! Chart of accounts management: node lifecycle, reactivation, seeding

use std::sync::Arc;
use uuid::Uuid;

use crate::chart::code::HierarchyLevel;
use crate::chart::index::ChartIndex;
use crate::chart::node::{
    plan_create, AccountClass, AccountDetail, AccountGroup, AccountSubClass, CreatePlan,
};
use crate::traits::{AuditEvent, AuditSink, ChartStorage, NoopAuditSink};
use crate::types::{Caller, ClassNature, CoreError, CoreResult};
use crate::utils::validation::validate_name;

/// Partial update for groups, subclasses, and details.
///
/// Codes are identity and never change after creation; reorganizing means
/// deactivating and creating anew.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
}

/// Partial update for classes, which also carry a nature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub nature: Option<ClassNature>,
}

/// Manager for the four-level account hierarchy
pub struct ChartManager<S: ChartStorage> {
    storage: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: ChartStorage> ChartManager<S> {
    /// Create a new chart manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Create a new chart manager with an audit sink
    pub fn with_audit(storage: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { storage, audit }
    }

    /// Create a group, reviving an inactive holder of the code when one
    /// exists
    pub async fn create_group(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        code: &str,
        name: &str,
    ) -> CoreResult<AccountGroup> {
        caller.require_privileged()?;
        HierarchyLevel::Group.validate_code(code)?;
        validate_name(name)?;

        let siblings: Vec<_> = self
            .storage
            .list_groups(project_id)
            .await?
            .iter()
            .map(AccountGroup::sibling_view)
            .collect();

        match plan_create(HierarchyLevel::Group, code, &siblings)? {
            CreatePlan::Reactivate { id } => {
                let mut group = self
                    .storage
                    .get_group(id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("group", id))?;
                group.is_active = true;
                group.name = name.to_string();
                group.updated_at = chrono::Utc::now().naive_utc();
                self.storage.update_group(&group).await?;

                tracing::debug!(code, name, "group reactivated");
                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        project_id,
                        "reactivate_group",
                        code,
                    ))
                    .await;
                Ok(group)
            }
            CreatePlan::Insert { sort_order } => {
                let group =
                    AccountGroup::new(project_id, code.to_string(), name.to_string(), sort_order);
                self.storage.insert_group(&group).await?;

                self.audit
                    .record(AuditEvent::new(caller.id, project_id, "create_group", code))
                    .await;
                Ok(group)
            }
        }
    }

    /// Create a class under an active group
    pub async fn create_class(
        &mut self,
        caller: &Caller,
        group_id: Uuid,
        code: &str,
        name: &str,
        nature: ClassNature,
    ) -> CoreResult<AccountClass> {
        caller.require_privileged()?;
        HierarchyLevel::Class.validate_code(code)?;
        validate_name(name)?;

        let group = self
            .storage
            .get_group(group_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| CoreError::not_found("group", group_id))?;

        let siblings: Vec<_> = self
            .storage
            .list_classes(group_id)
            .await?
            .iter()
            .map(AccountClass::sibling_view)
            .collect();

        match plan_create(HierarchyLevel::Class, code, &siblings)? {
            CreatePlan::Reactivate { id } => {
                let mut class = self
                    .storage
                    .get_class(id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("class", id))?;
                class.is_active = true;
                class.name = name.to_string();
                class.nature = nature;
                class.updated_at = chrono::Utc::now().naive_utc();
                self.storage.update_class(&class).await?;

                tracing::debug!(code, name, "class reactivated");
                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        group.project_id,
                        "reactivate_class",
                        code,
                    ))
                    .await;
                Ok(class)
            }
            CreatePlan::Insert { sort_order } => {
                let class = AccountClass::new(
                    group.project_id,
                    group_id,
                    code.to_string(),
                    name.to_string(),
                    nature,
                    sort_order,
                );
                self.storage.insert_class(&class).await?;

                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        group.project_id,
                        "create_class",
                        code,
                    ))
                    .await;
                Ok(class)
            }
        }
    }

    /// Create a subclass under an active class
    pub async fn create_subclass(
        &mut self,
        caller: &Caller,
        class_id: Uuid,
        code: &str,
        name: &str,
    ) -> CoreResult<AccountSubClass> {
        caller.require_privileged()?;
        HierarchyLevel::SubClass.validate_code(code)?;
        validate_name(name)?;

        let class = self
            .storage
            .get_class(class_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| CoreError::not_found("class", class_id))?;

        let siblings: Vec<_> = self
            .storage
            .list_subclasses(class_id)
            .await?
            .iter()
            .map(AccountSubClass::sibling_view)
            .collect();

        match plan_create(HierarchyLevel::SubClass, code, &siblings)? {
            CreatePlan::Reactivate { id } => {
                let mut subclass = self
                    .storage
                    .get_subclass(id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("subclass", id))?;
                subclass.is_active = true;
                subclass.name = name.to_string();
                subclass.updated_at = chrono::Utc::now().naive_utc();
                self.storage.update_subclass(&subclass).await?;

                tracing::debug!(code, name, "subclass reactivated");
                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        class.project_id,
                        "reactivate_subclass",
                        code,
                    ))
                    .await;
                Ok(subclass)
            }
            CreatePlan::Insert { sort_order } => {
                let subclass = AccountSubClass::new(
                    class.project_id,
                    class_id,
                    code.to_string(),
                    name.to_string(),
                    sort_order,
                );
                self.storage.insert_subclass(&subclass).await?;

                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        class.project_id,
                        "create_subclass",
                        code,
                    ))
                    .await;
                Ok(subclass)
            }
        }
    }

    /// Create a detail under an active subclass
    pub async fn create_detail(
        &mut self,
        caller: &Caller,
        subclass_id: Uuid,
        code: &str,
        name: &str,
    ) -> CoreResult<AccountDetail> {
        caller.require_privileged()?;
        HierarchyLevel::Detail.validate_code(code)?;
        validate_name(name)?;

        let subclass = self
            .storage
            .get_subclass(subclass_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| CoreError::not_found("subclass", subclass_id))?;

        let siblings: Vec<_> = self
            .storage
            .list_details(subclass_id)
            .await?
            .iter()
            .map(AccountDetail::sibling_view)
            .collect();

        match plan_create(HierarchyLevel::Detail, code, &siblings)? {
            CreatePlan::Reactivate { id } => {
                let mut detail = self
                    .storage
                    .get_detail(id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("detail", id))?;
                detail.is_active = true;
                detail.name = name.to_string();
                detail.updated_at = chrono::Utc::now().naive_utc();
                self.storage.update_detail(&detail).await?;

                tracing::debug!(code, name, "detail reactivated");
                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        subclass.project_id,
                        "reactivate_detail",
                        code,
                    ))
                    .await;
                Ok(detail)
            }
            CreatePlan::Insert { sort_order } => {
                let detail = AccountDetail::new(
                    subclass.project_id,
                    subclass_id,
                    code.to_string(),
                    name.to_string(),
                    sort_order,
                );
                self.storage.insert_detail(&detail).await?;

                self.audit
                    .record(AuditEvent::new(
                        caller.id,
                        subclass.project_id,
                        "create_detail",
                        code,
                    ))
                    .await;
                Ok(detail)
            }
        }
    }

    /// Rename or reorder a group
    pub async fn update_group(
        &mut self,
        caller: &Caller,
        group_id: Uuid,
        patch: NodePatch,
    ) -> CoreResult<AccountGroup> {
        caller.require_privileged()?;

        let mut group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| CoreError::not_found("group", group_id))?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            group.name = name;
        }
        if let Some(sort_order) = patch.sort_order {
            group.sort_order = sort_order;
        }
        group.updated_at = chrono::Utc::now().naive_utc();

        self.storage.update_group(&group).await?;
        Ok(group)
    }

    /// Rename, reorder, or renature a class
    pub async fn update_class(
        &mut self,
        caller: &Caller,
        class_id: Uuid,
        patch: ClassPatch,
    ) -> CoreResult<AccountClass> {
        caller.require_privileged()?;

        let mut class = self
            .storage
            .get_class(class_id)
            .await?
            .ok_or_else(|| CoreError::not_found("class", class_id))?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            class.name = name;
        }
        if let Some(sort_order) = patch.sort_order {
            class.sort_order = sort_order;
        }
        if let Some(nature) = patch.nature {
            class.nature = nature;
        }
        class.updated_at = chrono::Utc::now().naive_utc();

        self.storage.update_class(&class).await?;
        Ok(class)
    }

    /// Rename or reorder a subclass
    pub async fn update_subclass(
        &mut self,
        caller: &Caller,
        subclass_id: Uuid,
        patch: NodePatch,
    ) -> CoreResult<AccountSubClass> {
        caller.require_privileged()?;

        let mut subclass = self
            .storage
            .get_subclass(subclass_id)
            .await?
            .ok_or_else(|| CoreError::not_found("subclass", subclass_id))?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            subclass.name = name;
        }
        if let Some(sort_order) = patch.sort_order {
            subclass.sort_order = sort_order;
        }
        subclass.updated_at = chrono::Utc::now().naive_utc();

        self.storage.update_subclass(&subclass).await?;
        Ok(subclass)
    }

    /// Rename or reorder a detail
    pub async fn update_detail(
        &mut self,
        caller: &Caller,
        detail_id: Uuid,
        patch: NodePatch,
    ) -> CoreResult<AccountDetail> {
        caller.require_privileged()?;

        let mut detail = self
            .storage
            .get_detail(detail_id)
            .await?
            .ok_or_else(|| CoreError::not_found("detail", detail_id))?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            detail.name = name;
        }
        if let Some(sort_order) = patch.sort_order {
            detail.sort_order = sort_order;
        }
        detail.updated_at = chrono::Utc::now().naive_utc();

        self.storage.update_detail(&detail).await?;
        Ok(detail)
    }

    /// Soft-delete a group. Protected groups refuse; the code becomes
    /// available for reuse by a later create, which revives this record.
    /// Children keep their rows but stop resolving while the branch is
    /// inactive.
    pub async fn deactivate_group(&mut self, caller: &Caller, group_id: Uuid) -> CoreResult<()> {
        caller.require_privileged()?;

        let mut group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| CoreError::not_found("group", group_id))?;

        if group.is_protected {
            return Err(CoreError::Protected(group.name));
        }
        if !group.is_active {
            return Ok(());
        }

        group.is_active = false;
        group.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_group(&group).await?;

        tracing::debug!(code = %group.code, "group deactivated");
        self.audit
            .record(AuditEvent::new(
                caller.id,
                group.project_id,
                "deactivate_group",
                group.code,
            ))
            .await;
        Ok(())
    }

    /// Soft-delete a class
    pub async fn deactivate_class(&mut self, caller: &Caller, class_id: Uuid) -> CoreResult<()> {
        caller.require_privileged()?;

        let mut class = self
            .storage
            .get_class(class_id)
            .await?
            .ok_or_else(|| CoreError::not_found("class", class_id))?;

        if !class.is_active {
            return Ok(());
        }

        class.is_active = false;
        class.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_class(&class).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                class.project_id,
                "deactivate_class",
                class.code,
            ))
            .await;
        Ok(())
    }

    /// Soft-delete a subclass
    pub async fn deactivate_subclass(
        &mut self,
        caller: &Caller,
        subclass_id: Uuid,
    ) -> CoreResult<()> {
        caller.require_privileged()?;

        let mut subclass = self
            .storage
            .get_subclass(subclass_id)
            .await?
            .ok_or_else(|| CoreError::not_found("subclass", subclass_id))?;

        if !subclass.is_active {
            return Ok(());
        }

        subclass.is_active = false;
        subclass.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_subclass(&subclass).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                subclass.project_id,
                "deactivate_subclass",
                subclass.code,
            ))
            .await;
        Ok(())
    }

    /// Soft-delete a detail
    pub async fn deactivate_detail(&mut self, caller: &Caller, detail_id: Uuid) -> CoreResult<()> {
        caller.require_privileged()?;

        let mut detail = self
            .storage
            .get_detail(detail_id)
            .await?
            .ok_or_else(|| CoreError::not_found("detail", detail_id))?;

        if !detail.is_active {
            return Ok(());
        }

        detail.is_active = false;
        detail.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_detail(&detail).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                detail.project_id,
                "deactivate_detail",
                detail.code,
            ))
            .await;
        Ok(())
    }

    /// Mark a group as a protected default, shielding it from deactivation
    pub async fn protect_group(
        &mut self,
        caller: &Caller,
        group_id: Uuid,
    ) -> CoreResult<AccountGroup> {
        caller.require_privileged()?;

        let mut group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| CoreError::not_found("group", group_id))?;

        group.is_default = true;
        group.is_protected = true;
        group.updated_at = chrono::Utc::now().naive_utc();

        self.storage.update_group(&group).await?;
        Ok(group)
    }

    /// Get a group by ID
    pub async fn get_group(&self, group_id: Uuid) -> CoreResult<Option<AccountGroup>> {
        self.storage.get_group(group_id).await
    }

    /// Get a class by ID
    pub async fn get_class(&self, class_id: Uuid) -> CoreResult<Option<AccountClass>> {
        self.storage.get_class(class_id).await
    }

    /// Get a subclass by ID
    pub async fn get_subclass(&self, subclass_id: Uuid) -> CoreResult<Option<AccountSubClass>> {
        self.storage.get_subclass(subclass_id).await
    }

    /// Get a detail by ID
    pub async fn get_detail(&self, detail_id: Uuid) -> CoreResult<Option<AccountDetail>> {
        self.storage.get_detail(detail_id).await
    }

    /// List all groups of a project, including inactive ones
    pub async fn list_groups(&self, project_id: Uuid) -> CoreResult<Vec<AccountGroup>> {
        self.storage.list_groups(project_id).await
    }

    /// List all classes under a group, including inactive ones
    pub async fn list_classes(&self, group_id: Uuid) -> CoreResult<Vec<AccountClass>> {
        self.storage.list_classes(group_id).await
    }

    /// List all subclasses under a class, including inactive ones
    pub async fn list_subclasses(&self, class_id: Uuid) -> CoreResult<Vec<AccountSubClass>> {
        self.storage.list_subclasses(class_id).await
    }

    /// List all details under a subclass, including inactive ones
    pub async fn list_details(&self, subclass_id: Uuid) -> CoreResult<Vec<AccountDetail>> {
        self.storage.list_details(subclass_id).await
    }

    /// Build the resolution index over the project's active chart
    pub async fn index(&self, project_id: Uuid) -> CoreResult<ChartIndex> {
        ChartIndex::load(&self.storage, project_id).await
    }
}

/// Seeding of the standard construction-project chart
pub mod seed {
    use super::*;
    use crate::types::AccountType;
    use std::collections::HashMap;

    /// Handles to the nodes the standard chart creates
    #[derive(Debug, Clone, Default)]
    pub struct StandardChart {
        /// Seeded groups keyed by their one-digit code
        pub groups: HashMap<String, AccountGroup>,
        /// Seeded leaf details keyed by a stable English slug
        pub details: HashMap<String, AccountDetail>,
    }

    /// Account type conventionally attached to a default group code.
    /// User-defined groups (6-9) carry no convention.
    pub fn default_group_account_type(group_code: &str) -> Option<AccountType> {
        match group_code {
            "1" => Some(AccountType::Asset),
            "2" => Some(AccountType::Liability),
            "3" => Some(AccountType::Equity),
            "4" => Some(AccountType::Income),
            "5" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Seed the five protected default groups with a starter hierarchy
    /// underneath: cash and fixed assets, payables, capital, member
    /// income, and construction expenses.
    pub async fn seed_standard_chart<S: ChartStorage>(
        manager: &mut ChartManager<S>,
        caller: &Caller,
        project_id: Uuid,
    ) -> CoreResult<StandardChart> {
        let groups_spec = [
            ("1", "دارایی‌ها"),
            ("2", "بدهی‌ها"),
            ("3", "حقوق صاحبان سهام"),
            ("4", "درآمدها"),
            ("5", "هزینه‌ها"),
        ];

        let classes_spec = [
            ("1", "1", "دارایی‌های جاری", ClassNature::Debit),
            ("1", "2", "دارایی‌های غیر جاری", ClassNature::Debit),
            ("2", "1", "بدهی‌های جاری", ClassNature::Credit),
            ("3", "1", "سرمایه", ClassNature::Credit),
            ("4", "1", "درآمدهای عملیاتی", ClassNature::Credit),
            ("5", "1", "هزینه‌های عملیاتی", ClassNature::Debit),
        ];

        let subclasses_spec = [
            ("1", "1", "01", "موجودی نقد"),
            ("1", "2", "01", "دارایی‌های ثابت"),
            ("2", "1", "01", "حساب‌های پرداختنی"),
            ("3", "1", "01", "سرمایه اعضا"),
            ("4", "1", "01", "آورده اعضا"),
            ("5", "1", "01", "هزینه‌های ساخت"),
        ];

        let details_spec = [
            ("1", "1", "01", "01", "صندوق", "cash"),
            ("1", "1", "01", "02", "بانک", "bank"),
            ("1", "2", "01", "01", "زمین", "land"),
            ("1", "2", "01", "02", "ساختمان", "building"),
            ("2", "1", "01", "01", "پیمانکاران", "contractors_payable"),
            ("3", "1", "01", "01", "سرمایه", "capital"),
            ("4", "1", "01", "01", "اقساط اعضا", "member_installments"),
            ("5", "1", "01", "01", "مصالح", "materials"),
            ("5", "1", "01", "02", "دستمزد", "wages"),
        ];

        let mut chart = StandardChart::default();
        let mut group_ids: HashMap<&str, Uuid> = HashMap::new();
        let mut class_ids: HashMap<(&str, &str), Uuid> = HashMap::new();
        let mut subclass_ids: HashMap<(&str, &str, &str), Uuid> = HashMap::new();

        for (code, name) in groups_spec {
            let group = manager.create_group(caller, project_id, code, name).await?;
            let group = manager.protect_group(caller, group.id).await?;
            group_ids.insert(code, group.id);
            chart.groups.insert(code.to_string(), group);
        }

        for (group_code, code, name, nature) in classes_spec {
            let group_id = group_ids[group_code];
            let class = manager
                .create_class(caller, group_id, code, name, nature)
                .await?;
            class_ids.insert((group_code, code), class.id);
        }

        for (group_code, class_code, code, name) in subclasses_spec {
            let class_id = class_ids[&(group_code, class_code)];
            let subclass = manager.create_subclass(caller, class_id, code, name).await?;
            subclass_ids.insert((group_code, class_code, code), subclass.id);
        }

        for (group_code, class_code, subclass_code, code, name, slug) in details_spec {
            let subclass_id = subclass_ids[&(group_code, class_code, subclass_code)];
            let detail = manager.create_detail(caller, subclass_id, code, name).await?;
            chart.details.insert(slug.to_string(), detail);
        }

        tracing::info!(%project_id, details = chart.details.len(), "standard chart seeded");
        Ok(chart)
    }
}
