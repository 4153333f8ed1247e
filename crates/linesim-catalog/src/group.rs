//! Grouping scenarios by category for display.

use std::sync::Arc;

use linesim_core::Scenario;

/// Scenarios sharing one category, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    /// Category name; blank categories are reported as "未分類".
    pub name: String,
    /// Members in catalog order.
    pub scenarios: Vec<Arc<Scenario>>,
}

/// Group scenarios by effective category.
///
/// Groups appear in the order their category is first seen.
pub fn group_by_category(scenarios: &[Arc<Scenario>]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for scenario in scenarios {
        let name = scenario.effective_category();
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.scenarios.push(Arc::clone(scenario)),
            None => groups.push(CategoryGroup {
                name: name.to_string(),
                scenarios: vec![Arc::clone(scenario)],
            }),
        }
    }
    groups
}
