// src/registry/group_map.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::registry::descriptor::MethodDescriptor;
use crate::types::MethodKind;

/// Group name -> ordered before-group and after-group methods.
///
/// A method declaring several groups is listed under each of them.
#[derive(Debug, Default, Clone)]
pub struct GroupMethodMap {
    before: BTreeMap<String, Vec<Arc<MethodDescriptor>>>,
    after: BTreeMap<String, Vec<Arc<MethodDescriptor>>>,
}

impl GroupMethodMap {
    /// Build the map from group-configuration methods in class order.
    /// Methods of any other kind are ignored.
    pub fn build<'a>(methods: impl IntoIterator<Item = &'a Arc<MethodDescriptor>>) -> Self {
        let mut map = Self::default();
        for method in methods {
            let target = match method.kind() {
                MethodKind::BeforeGroup => &mut map.before,
                MethodKind::AfterGroup => &mut map.after,
                _ => continue,
            };
            for group in method.groups() {
                let list = target.entry(group.clone()).or_default();
                if !list.iter().any(|m| Arc::ptr_eq(m, method)) {
                    list.push(Arc::clone(method));
                }
            }
        }
        map
    }

    pub fn before_group(&self, group: &str) -> &[Arc<MethodDescriptor>] {
        self.before.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn after_group(&self, group: &str) -> &[Arc<MethodDescriptor>] {
        self.after.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every group that has at least one before- or after-group method.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self
            .before
            .keys()
            .chain(self.after.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_group_methods_are_listed_under_each_group() {
        let setup = Arc::new(
            MethodDescriptor::new("A", "setUp", MethodKind::BeforeGroup).with_groups(["db", "web"]),
        );
        let teardown = Arc::new(
            MethodDescriptor::new("A", "tearDown", MethodKind::AfterGroup).with_groups(["db"]),
        );
        let test = Arc::new(MethodDescriptor::test("A", "t").with_groups(["db"]));

        let map = GroupMethodMap::build([&setup, &teardown, &test]);

        assert_eq!(map.before_group("db").len(), 1);
        assert_eq!(map.before_group("web").len(), 1);
        assert_eq!(map.after_group("db").len(), 1);
        assert!(map.after_group("web").is_empty());
        assert_eq!(map.groups().collect::<Vec<_>>(), vec!["db", "web"]);
    }
}
