//! Reconciled plugin catalog.

use std::collections::HashMap;

use serde::Serialize;

use crate::descriptor::{PluginDescriptor, normalize_namespace};
use crate::scanner::ScanConflict;

/// Discovered plugins keyed by namespace, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    plugins: Vec<PluginDescriptor>,
    #[serde(skip)]
    by_namespace: HashMap<String, usize>,
    conflicts: Vec<ScanConflict>,
}

impl Catalog {
    /// Build a catalog from scanned descriptors.
    ///
    /// Descriptors must have unique namespaces; the scanner guarantees it.
    pub fn new(plugins: Vec<PluginDescriptor>, conflicts: Vec<ScanConflict>) -> Self {
        let by_namespace = plugins
            .iter()
            .enumerate()
            .map(|(i, p)| (p.normalized_namespace(), i))
            .collect();
        Self {
            plugins,
            by_namespace,
            conflicts,
        }
    }

    /// Look up by namespace. A trailing separator is optional.
    pub fn get(&self, namespace: &str) -> Option<&PluginDescriptor> {
        self.by_namespace
            .get(&normalize_namespace(namespace))
            .and_then(|&i| self.plugins.get(i))
    }

    /// Look up by alias.
    pub fn find_by_alias(&self, alias: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.alias == alias)
    }

    /// Mutable lookup by alias.
    pub fn find_by_alias_mut(&mut self, alias: &str) -> Option<&mut PluginDescriptor> {
        self.plugins.iter_mut().find(|p| p.alias == alias)
    }

    /// Plugins in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter()
    }

    /// Plugins in scan order.
    pub fn plugins(&self) -> &[PluginDescriptor] {
        &self.plugins
    }

    /// Namespaces in scan order, as declared by their manifests.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.namespace.as_str())
    }

    /// Directories skipped during the scan.
    pub fn conflicts(&self) -> &[ScanConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a PluginDescriptor;
    type IntoIter = std::slice::Iter<'a, PluginDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModuleManifest;

    fn descriptor(alias: &str, namespace: &str) -> PluginDescriptor {
        let manifest = ModuleManifest::parse(&format!(
            r#"{{"alias":"{alias}","namespace":"{}"}}"#,
            namespace.replace('\\', "\\\\")
        ))
        .unwrap();
        PluginDescriptor::from_manifest(manifest, format!("plugins/{alias}/module.json"))
    }

    #[test]
    fn test_lookup_by_namespace_and_alias() {
        let catalog = Catalog::new(
            vec![descriptor("seo", "Acme\\Seo"), descriptor("blog", "Acme\\Blog\\")],
            Vec::new(),
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("Acme\\Seo").unwrap().alias, "seo");
        assert_eq!(catalog.get("Acme\\Seo\\").unwrap().alias, "seo");
        assert_eq!(catalog.get("Acme\\Blog").unwrap().alias, "blog");
        assert!(catalog.get("Acme\\Shop").is_none());

        assert_eq!(catalog.find_by_alias("blog").unwrap().namespace, "Acme\\Blog\\");
        assert!(catalog.find_by_alias("shop").is_none());

        let order: Vec<_> = catalog.namespaces().collect();
        assert_eq!(order, vec!["Acme\\Seo", "Acme\\Blog\\"]);
    }

    #[test]
    fn test_mutation_by_alias() {
        let mut catalog = Catalog::new(vec![descriptor("seo", "Acme\\Seo")], Vec::new());
        catalog.find_by_alias_mut("seo").unwrap().enabled = true;
        assert!(catalog.get("Acme\\Seo").unwrap().enabled);
    }
}
