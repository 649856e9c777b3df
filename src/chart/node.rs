//! Node types of the four-level account hierarchy

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chart::code::HierarchyLevel;
use crate::types::{ClassNature, CoreError, CoreResult};

/// Top level of the chart: an account group with a one-digit code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountGroup {
    pub id: Uuid,
    pub project_id: Uuid,
    /// One digit, 1-9
    pub code: String,
    pub name: String,
    /// Part of the seeded standard chart
    pub is_default: bool,
    /// Protected groups reject deactivation
    pub is_protected: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AccountGroup {
    pub fn new(project_id: Uuid, code: String, name: String, sort_order: i32) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            project_id,
            code,
            name,
            is_default: false,
            is_protected: false,
            is_active: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sibling_view(&self) -> SiblingView {
        SiblingView {
            id: self.id,
            code: self.code.clone(),
            is_active: self.is_active,
            sort_order: self.sort_order,
        }
    }
}

/// Second level: an account class with a one-digit code and a declared
/// nature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountClass {
    pub id: Uuid,
    pub project_id: Uuid,
    pub group_id: Uuid,
    /// One digit, 1-9, unique among active siblings under the group
    pub code: String,
    pub name: String,
    /// Normal balance side of accounts filed under this class
    pub nature: ClassNature,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AccountClass {
    pub fn new(
        project_id: Uuid,
        group_id: Uuid,
        code: String,
        name: String,
        nature: ClassNature,
        sort_order: i32,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            project_id,
            group_id,
            code,
            name,
            nature,
            is_active: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sibling_view(&self) -> SiblingView {
        SiblingView {
            id: self.id,
            code: self.code.clone(),
            is_active: self.is_active,
            sort_order: self.sort_order,
        }
    }
}

/// Third level: a subclass with a two-digit code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSubClass {
    pub id: Uuid,
    pub project_id: Uuid,
    pub class_id: Uuid,
    /// Two digits, 01-99, unique among active siblings under the class
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AccountSubClass {
    pub fn new(
        project_id: Uuid,
        class_id: Uuid,
        code: String,
        name: String,
        sort_order: i32,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            project_id,
            class_id,
            code,
            name,
            is_active: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sibling_view(&self) -> SiblingView {
        SiblingView {
            id: self.id,
            code: self.code.clone(),
            is_active: self.is_active,
            sort_order: self.sort_order,
        }
    }
}

/// Leaf level: a detail with a two-digit code. Details are the only nodes
/// ledger accounts can link to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub id: Uuid,
    pub project_id: Uuid,
    pub subclass_id: Uuid,
    /// Two digits, 01-99, unique among active siblings under the subclass
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AccountDetail {
    pub fn new(
        project_id: Uuid,
        subclass_id: Uuid,
        code: String,
        name: String,
        sort_order: i32,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            project_id,
            subclass_id,
            code,
            name,
            is_active: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sibling_view(&self) -> SiblingView {
        SiblingView {
            id: self.id,
            code: self.code.clone(),
            is_active: self.is_active,
            sort_order: self.sort_order,
        }
    }
}

/// What a sibling looks like to the create planner
#[derive(Debug, Clone, PartialEq)]
pub struct SiblingView {
    pub id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub sort_order: i32,
}

/// Outcome of planning a node creation against its siblings
#[derive(Debug, Clone, PartialEq)]
pub enum CreatePlan {
    /// An inactive sibling already owns the code; revive it in place,
    /// keeping its identity so attached history stays reachable
    Reactivate { id: Uuid },
    /// No sibling owns the code; insert fresh after the last sibling
    Insert { sort_order: i32 },
}

/// Decide how a create call lands among existing siblings.
///
/// An active sibling with the same code is a conflict. An inactive one is
/// revived instead of duplicated; if several inactive siblings share the
/// code, the last-positioned one wins. Otherwise the new node is appended.
pub fn plan_create(
    level: HierarchyLevel,
    code: &str,
    siblings: &[SiblingView],
) -> CoreResult<CreatePlan> {
    if siblings.iter().any(|s| s.is_active && s.code == code) {
        return Err(CoreError::Conflict {
            code: code.to_string(),
            scope: level.label().to_string(),
        });
    }

    if let Some(dormant) = siblings
        .iter()
        .filter(|s| !s.is_active && s.code == code)
        .max_by_key(|s| s.sort_order)
    {
        return Ok(CreatePlan::Reactivate { id: dormant.id });
    }

    let next = siblings.iter().map(|s| s.sort_order).max().unwrap_or(0) + 1;
    Ok(CreatePlan::Insert { sort_order: next })
}
