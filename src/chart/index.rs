//! In-memory resolution index over the active hierarchy

use std::collections::HashMap;
use uuid::Uuid;

use crate::chart::code::compose_full_code;
use crate::chart::node::{AccountClass, AccountDetail, AccountGroup, AccountSubClass};
use crate::traits::ChartStorage;
use crate::types::CoreResult;

/// Snapshot of the active chart nodes of one project, with full-code
/// resolution precomputed.
///
/// Rebuilt from storage after a chart mutation rather than maintained
/// incrementally; lookups then run entirely in memory. Children of
/// inactive ancestors are never loaded, so a deactivated branch drops out
/// of resolution wholesale.
#[derive(Debug, Clone, Default)]
pub struct ChartIndex {
    groups: HashMap<Uuid, AccountGroup>,
    classes: HashMap<Uuid, AccountClass>,
    subclasses: HashMap<Uuid, AccountSubClass>,
    details: HashMap<Uuid, AccountDetail>,
    details_by_code: HashMap<String, Uuid>,
    codes_by_detail: HashMap<Uuid, String>,
}

impl ChartIndex {
    /// Walk the active chart of a project out of storage
    pub async fn load<S: ChartStorage>(storage: &S, project_id: Uuid) -> CoreResult<Self> {
        let mut index = Self::default();

        for group in storage.list_groups(project_id).await? {
            if !group.is_active {
                continue;
            }
            for class in storage.list_classes(group.id).await? {
                if !class.is_active {
                    continue;
                }
                for subclass in storage.list_subclasses(class.id).await? {
                    if !subclass.is_active {
                        continue;
                    }
                    for detail in storage.list_details(subclass.id).await? {
                        if !detail.is_active {
                            continue;
                        }
                        let full_code = compose_full_code(
                            &group.code,
                            &class.code,
                            &subclass.code,
                            &detail.code,
                        );
                        index.details_by_code.insert(full_code.clone(), detail.id);
                        index.codes_by_detail.insert(detail.id, full_code);
                        index.details.insert(detail.id, detail);
                    }
                    index.subclasses.insert(subclass.id, subclass);
                }
                index.classes.insert(class.id, class);
            }
            index.groups.insert(group.id, group);
        }

        Ok(index)
    }

    pub fn group(&self, group_id: Uuid) -> Option<&AccountGroup> {
        self.groups.get(&group_id)
    }

    pub fn class(&self, class_id: Uuid) -> Option<&AccountClass> {
        self.classes.get(&class_id)
    }

    pub fn subclass(&self, subclass_id: Uuid) -> Option<&AccountSubClass> {
        self.subclasses.get(&subclass_id)
    }

    pub fn detail(&self, detail_id: Uuid) -> Option<&AccountDetail> {
        self.details.get(&detail_id)
    }

    /// Resolve a 6-digit full code to its active detail
    pub fn detail_by_full_code(&self, full_code: &str) -> Option<&AccountDetail> {
        self.details_by_code
            .get(full_code)
            .and_then(|id| self.details.get(id))
    }

    /// The composed full code of an active detail
    pub fn full_code_of_detail(&self, detail_id: Uuid) -> Option<&str> {
        self.codes_by_detail.get(&detail_id).map(String::as_str)
    }

    /// Walk a detail up to its class
    pub fn class_of_detail(&self, detail_id: Uuid) -> Option<&AccountClass> {
        let detail = self.details.get(&detail_id)?;
        let subclass = self.subclasses.get(&detail.subclass_id)?;
        self.classes.get(&subclass.class_id)
    }

    /// Walk a detail up to its group
    pub fn group_of_detail(&self, detail_id: Uuid) -> Option<&AccountGroup> {
        let class = self.class_of_detail(detail_id)?;
        self.groups.get(&class.group_id)
    }

    /// Number of resolvable details
    pub fn detail_count(&self) -> usize {
        self.details.len()
    }
}
