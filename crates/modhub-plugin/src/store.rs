//! Plugin state store.
//!
//! Owns the reconciled [`Catalog`]: the filesystem scan merged with the
//! persisted flags. The catalog is built on first access, mutated in place
//! by [`PluginStore::save`], and rebuilt only by [`PluginStore::refresh`].
//!
//! Persistence is optional. Without a ready repository every plugin shows
//! its default state and writes report `false` instead of failing, so the
//! store works before the database exists.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use modhub_core::config::PluginConfig;
use modhub_core::error::AppError;
use modhub_core::events::{DomainEvent, PluginEvent};
use modhub_core::result::AppResult;
use modhub_database::PluginRepository;
use modhub_entity::plugin::{CreatePlugin, PluginRecord, UpdatePlugin};

use crate::autoload::{AutoloadChange, AutoloadManifest};
use crate::catalog::Catalog;
use crate::descriptor::PluginDescriptor;
use crate::hooks::EventDispatcher;
use crate::scanner::PluginScanner;

/// Target of a [`PluginStore::save`].
#[derive(Debug, Clone, Copy)]
pub enum PluginRef<'a> {
    /// Resolved through the catalog.
    Alias(&'a str),
    /// Already resolved.
    Descriptor(&'a PluginDescriptor),
}

impl<'a> From<&'a str> for PluginRef<'a> {
    fn from(alias: &'a str) -> Self {
        Self::Alias(alias)
    }
}

impl<'a> From<&'a PluginDescriptor> for PluginRef<'a> {
    fn from(descriptor: &'a PluginDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// Reconciled plugin catalog with persistence and autoload side effects.
#[derive(Debug)]
pub struct PluginStore {
    scanner: PluginScanner,
    autoload: AutoloadManifest,
    repository: Option<Arc<dyn PluginRepository>>,
    dispatcher: Arc<EventDispatcher>,
    catalog: Option<Catalog>,
    backend_ready: bool,
}

impl PluginStore {
    /// Store with no catalog yet; the first read reconciles.
    pub fn new(
        scanner: PluginScanner,
        autoload: AutoloadManifest,
        repository: Option<Arc<dyn PluginRepository>>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            scanner,
            autoload,
            repository,
            dispatcher,
            catalog: None,
            backend_ready: false,
        }
    }

    /// Build a store from the `[plugins]` configuration section.
    pub fn from_config(
        config: &PluginConfig,
        repository: Option<Arc<dyn PluginRepository>>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self::new(
            PluginScanner::new(config.plugins_root(), config.manifest_file.clone()),
            AutoloadManifest::from_config(config),
            repository,
            dispatcher,
        )
    }

    /// The reconciled catalog, built on first call.
    pub async fn get_all(&mut self) -> AppResult<&Catalog> {
        if self.catalog.is_none() {
            let catalog = self.reconcile().await?;
            self.catalog = Some(catalog);
        }
        Ok(self.catalog.get_or_insert_with(Catalog::default))
    }

    /// Drop the cached catalog and reconcile again.
    pub async fn refresh(&mut self) -> AppResult<&Catalog> {
        self.invalidate();
        self.get_all().await
    }

    /// Drop the cached catalog; the next access reconciles.
    pub fn invalidate(&mut self) {
        self.catalog = None;
    }

    /// Whether the last reconcile had a ready persistence backend.
    pub fn is_backend_ready(&self) -> bool {
        self.backend_ready
    }

    /// The manifest rewritten on enable/disable.
    pub fn autoload(&self) -> &AutoloadManifest {
        &self.autoload
    }

    /// Dispatcher receiving plugin lifecycle events.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Linear search of the catalog by alias.
    pub async fn find_by_alias(&mut self, alias: &str) -> AppResult<Option<PluginDescriptor>> {
        Ok(self.get_all().await?.find_by_alias(alias).cloned())
    }

    /// Whether the plugin is enabled. Unknown aliases are not.
    pub async fn is_activated(&mut self, alias: &str) -> AppResult<bool> {
        Ok(self
            .get_all()
            .await?
            .find_by_alias(alias)
            .is_some_and(|p| p.enabled))
    }

    /// Whether the plugin is installed. Unknown aliases are not.
    pub async fn is_installed(&mut self, alias: &str) -> AppResult<bool> {
        Ok(self
            .get_all()
            .await?
            .find_by_alias(alias)
            .is_some_and(|p| p.installed))
    }

    /// Persist a partial update of a plugin's flags.
    ///
    /// Returns `Ok(false)` when the plugin is unknown or no backend is
    /// ready. Backend errors propagate.
    pub async fn save<'a>(
        &mut self,
        target: impl Into<PluginRef<'a>>,
        update: &UpdatePlugin,
    ) -> AppResult<bool> {
        let descriptor = match target.into() {
            PluginRef::Alias(alias) => self.find_by_alias(alias).await?,
            PluginRef::Descriptor(descriptor) => {
                self.get_all().await?;
                Some(descriptor.clone())
            }
        };
        let Some(descriptor) = descriptor else {
            debug!("Save target does not resolve to a plugin");
            return Ok(false);
        };

        let Some(repository) = self.ready_repository() else {
            warn!(alias = %descriptor.alias, "No plugin state backend, update not persisted");
            return Ok(false);
        };

        let record = repository
            .create_or_update(descriptor.id, &descriptor.alias, update)
            .await?;

        if let Some(entry) = self
            .catalog
            .as_mut()
            .and_then(|c| c.find_by_alias_mut(&record.alias))
        {
            entry.merge_record(&record);
        }

        debug!(alias = %record.alias, id = %record.id, "Plugin state saved");
        Ok(true)
    }

    /// Enable a plugin and register its autoload entry.
    pub async fn enable(&mut self, alias: &str) -> AppResult<AutoloadChange> {
        self.set_enabled(alias, true).await
    }

    /// Disable a plugin and remove its autoload entry.
    pub async fn disable(&mut self, alias: &str) -> AppResult<AutoloadChange> {
        self.set_enabled(alias, false).await
    }

    /// Record a successful install. Returns whether it was persisted.
    pub async fn mark_installed(&mut self, alias: &str, version: Option<String>) -> AppResult<bool> {
        let saved = self
            .save(alias, &UpdatePlugin::installed(version.clone()))
            .await?;
        self.dispatcher
            .fire_and_forget(&DomainEvent::from(PluginEvent::PluginInstalled {
                alias: alias.to_string(),
                version,
            }))
            .await;
        Ok(saved)
    }

    /// Record a successful uninstall. Returns whether it was persisted.
    pub async fn mark_uninstalled(&mut self, alias: &str) -> AppResult<bool> {
        let saved = self.save(alias, &UpdatePlugin::uninstalled()).await?;
        self.dispatcher
            .fire_and_forget(&DomainEvent::from(PluginEvent::PluginUninstalled {
                alias: alias.to_string(),
            }))
            .await;
        Ok(saved)
    }

    async fn set_enabled(&mut self, alias: &str, enabled: bool) -> AppResult<AutoloadChange> {
        let descriptor = self
            .find_by_alias(alias)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plugin not found: {alias}")))?;

        if !self.save(&descriptor, &UpdatePlugin::enabled(enabled)).await? {
            return Err(AppError::service_unavailable(format!(
                "Could not persist state of plugin '{alias}'"
            )));
        }

        let event = if enabled {
            PluginEvent::PluginEnabled {
                alias: descriptor.alias.clone(),
            }
        } else {
            PluginEvent::PluginDisabled {
                alias: descriptor.alias.clone(),
            }
        };
        self.dispatcher
            .fire_and_forget(&DomainEvent::from(event))
            .await;

        let change = self.autoload.rewrite(&descriptor, !enabled).await?;
        info!(alias = %descriptor.alias, enabled, "Plugin state changed");
        Ok(change)
    }

    fn ready_repository(&self) -> Option<Arc<dyn PluginRepository>> {
        if !self.backend_ready {
            return None;
        }
        self.repository.as_ref().map(Arc::clone)
    }

    async fn reconcile(&mut self) -> AppResult<Catalog> {
        let records = self.load_records().await;
        self.backend_ready = records.is_some();

        let report = self.scanner.scan().await?;
        let mut records = records.unwrap_or_default();
        let mut descriptors = report.descriptors;

        for descriptor in &mut descriptors {
            if let Some(record) = records.get(&descriptor.alias) {
                descriptor.merge_record(record);
                continue;
            }

            let Some(repository) = self.ready_repository() else {
                continue;
            };
            match repository
                .create(&CreatePlugin::discovered(descriptor.alias.clone()))
                .await
            {
                Ok(record) => {
                    descriptor.merge_record(&record);
                    records.insert(record.alias.clone(), record);
                }
                Err(e) => {
                    warn!(alias = %descriptor.alias, error = %e, "Failed to create plugin record");
                }
            }
        }

        info!(
            plugins = descriptors.len(),
            conflicts = report.conflicts.len(),
            persisted = self.backend_ready,
            "Plugin catalog reconciled"
        );
        Ok(Catalog::new(descriptors, report.conflicts))
    }

    /// Persisted records by alias, or `None` when the backend is not usable.
    async fn load_records(&self) -> Option<HashMap<String, PluginRecord>> {
        let repository = self.repository.as_ref()?;

        if !repository.is_ready().await {
            warn!("Plugin state backend not ready, using default plugin state");
            return None;
        }

        match repository.find_all().await {
            Ok(records) => Some(records.into_iter().map(|r| (r.alias.clone(), r)).collect()),
            Err(e) => {
                warn!(error = %e, "Failed to load plugin records, using default plugin state");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use async_trait::async_trait;
    use modhub_core::error::ErrorKind;
    use modhub_database::MemoryPluginRepository;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    use crate::hooks::{ListenerRegistry, PluginEventListener};

    #[derive(Debug, Default)]
    struct EventLog(Mutex<Vec<String>>);

    #[async_trait]
    impl PluginEventListener for EventLog {
        async fn handle(&self, event: &DomainEvent) -> AppResult<()> {
            self.0.lock().await.push(event.name().to_string());
            Ok(())
        }

        fn listener_id(&self) -> &str {
            "event-log"
        }
    }

    struct Fixture {
        tmp: TempDir,
        repo: Arc<MemoryPluginRepository>,
        events: Arc<EventLog>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            std::fs::write(
                tmp.path().join("composer.json"),
                "{\n    \"name\": \"acme/app\",\n    \"autoload\": {\n        \"psr-4\": {\n            \"App\\\\\": \"app/\"\n        }\n    }\n}\n",
            )
            .unwrap();
            Self {
                tmp,
                repo: Arc::new(MemoryPluginRepository::new()),
                events: Arc::new(EventLog::default()),
            }
        }

        fn root(&self) -> &Path {
            self.tmp.path()
        }

        fn add_plugin(&self, dir: &str, manifest: Value) {
            let path = self.root().join("plugins").join(dir);
            std::fs::create_dir_all(&path).unwrap();
            std::fs::write(path.join("module.json"), manifest.to_string()).unwrap();
        }

        async fn store(&self, with_repo: bool) -> PluginStore {
            let registry = Arc::new(ListenerRegistry::new());
            registry.register(self.events.clone()).await;
            let repository: Option<Arc<dyn PluginRepository>> = if with_repo {
                Some(self.repo.clone())
            } else {
                None
            };
            PluginStore::new(
                PluginScanner::new(self.root().join("plugins"), "module.json"),
                AutoloadManifest::new(self.root().join("composer.json"), self.root()),
                repository,
                Arc::new(EventDispatcher::new(registry)),
            )
        }

        fn composer(&self) -> Value {
            serde_json::from_str(&self.composer_text()).unwrap()
        }

        fn composer_text(&self) -> String {
            std::fs::read_to_string(self.root().join("composer.json")).unwrap()
        }
    }

    #[tokio::test]
    async fn test_reconcile_creates_records_and_is_idempotent() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        fx.add_plugin("blog", json!({"alias": "blog", "namespace": "Acme\\Blog\\", "version": "1.2.0"}));

        let mut store = fx.store(true).await;
        let first = store.get_all().await.unwrap().clone();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|p| p.id.is_some() && !p.enabled && !p.installed));
        assert_eq!(first.get("Acme\\Seo\\").unwrap().alias, "seo");
        assert_eq!(fx.repo.len().await, 2);

        let second = store.refresh().await.unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(fx.repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_reconcile_merges_persisted_flags() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        let record = fx
            .repo
            .create(&CreatePlugin::from_update("seo", &UpdatePlugin::installed(Some("2.0".into()))))
            .await
            .unwrap();

        let mut store = fx.store(true).await;
        let seo = store.find_by_alias("seo").await.unwrap().unwrap();
        assert_eq!(seo.id, Some(record.id));
        assert!(seo.installed);
        assert_eq!(seo.installed_version.as_deref(), Some("2.0"));
        assert!(store.is_installed("seo").await.unwrap());
        assert!(!store.is_activated("seo").await.unwrap());
        assert!(!store.is_installed("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_enable_and_disable_rewrite_autoload() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        let mut store = fx.store(true).await;

        let change = store.enable("seo").await.unwrap();
        assert!(change.is_changed());
        assert!(store.is_activated("seo").await.unwrap());
        assert_eq!(
            fx.composer()["autoload"]["psr-4"]["Acme\\Seo\\"],
            json!("plugins/seo/src")
        );
        assert!(fx.repo.find_by_alias("seo").await.unwrap().unwrap().enabled);

        store.disable("seo").await.unwrap();
        assert!(!store.is_activated("seo").await.unwrap());
        assert_eq!(fx.composer()["autoload"]["psr-4"], json!({"App\\": "app/"}));

        assert_eq!(
            *fx.events.0.lock().await,
            vec!["plugin.enabled", "plugin.disabled"]
        );
    }

    #[tokio::test]
    async fn test_enable_classmap_twice_has_no_duplicates() {
        let fx = Fixture::new();
        fx.add_plugin(
            "legacy",
            json!({"alias": "legacy", "namespace": "Acme\\Legacy", "autoload": "classmap"}),
        );
        let mut store = fx.store(true).await;

        store.enable("legacy").await.unwrap();
        assert_eq!(store.enable("legacy").await.unwrap(), AutoloadChange::Unchanged);
        assert_eq!(
            fx.composer()["autoload"]["classmap"],
            json!(["plugins/legacy/src"])
        );
    }

    #[tokio::test]
    async fn test_enable_unknown_alias_leaves_manifest_untouched() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        let before = fx.composer_text();
        let mut store = fx.store(true).await;

        let err = store.enable("nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Plugin not found: nope");
        assert_eq!(fx.composer_text(), before);
        assert!(fx.events.0.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_without_backend() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        fx.repo.set_ready(false);
        let before = fx.composer_text();

        let mut store = fx.store(true).await;
        let catalog = store.get_all().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.iter().all(|p| p.id.is_none() && !p.enabled));
        assert!(!store.is_backend_ready());

        assert!(!store.save("seo", &UpdatePlugin::enabled(true)).await.unwrap());
        let err = store.enable("seo").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert_eq!(fx.composer_text(), before);
        assert!(fx.repo.is_empty().await);

        let mut bare = fx.store(false).await;
        assert_eq!(bare.get_all().await.unwrap().len(), 1);
        assert!(!bare.save("seo", &UpdatePlugin::enabled(true)).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_creation_failure_leaves_descriptor_without_id() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        fx.repo.set_read_only(true);

        let mut store = fx.store(true).await;
        let seo = store.find_by_alias("seo").await.unwrap().unwrap();
        assert!(seo.id.is_none());
        assert!(store.is_backend_ready());
    }

    #[tokio::test]
    async fn test_save_unknown_target_is_soft_failure() {
        let fx = Fixture::new();
        let mut store = fx.store(true).await;
        assert!(!store.save("ghost", &UpdatePlugin::enabled(true)).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_by_descriptor_keeps_alias() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        let mut store = fx.store(true).await;

        let mut seo = store.find_by_alias("seo").await.unwrap().unwrap();
        seo.enabled = true;
        assert!(store.save(&seo, &UpdatePlugin::enabled(true)).await.unwrap());
        assert!(store.is_activated("seo").await.unwrap());
        assert_eq!(fx.repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_mark_installed_and_uninstalled() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        let mut store = fx.store(true).await;

        assert!(store.mark_installed("seo", Some("1.0.0".into())).await.unwrap());
        let seo = store.find_by_alias("seo").await.unwrap().unwrap();
        assert!(seo.installed);
        assert_eq!(seo.installed_version.as_deref(), Some("1.0.0"));

        assert!(store.mark_uninstalled("seo").await.unwrap());
        let seo = store.find_by_alias("seo").await.unwrap().unwrap();
        assert!(!seo.installed);
        assert_eq!(seo.installed_version, None);

        assert_eq!(
            *fx.events.0.lock().await,
            vec!["plugin.installed", "plugin.uninstalled"]
        );
    }

    #[tokio::test]
    async fn test_new_directory_visible_only_after_refresh() {
        let fx = Fixture::new();
        fx.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
        let mut store = fx.store(true).await;
        assert_eq!(store.get_all().await.unwrap().len(), 1);

        fx.add_plugin("blog", json!({"alias": "blog", "namespace": "Acme\\Blog"}));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
        assert_eq!(store.refresh().await.unwrap().len(), 2);
    }
}
