// Plugin install coordinator: one task per plugin under a concurrency cap

use crate::cache::Cache;
use crate::checksum::HashAlgorithm;
use crate::download;
use crate::install::local_digest;
use crate::manifest::{self, PluginSpec, Source};
use crate::sources::{Artifact, NO_CHECKSUM, SourceRegistry};
use anyhow::Context;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};

/// Capacity of the progress channel. Events beyond it are dropped.
const PROGRESS_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Waiting,
    Preparing,
    Downloading,
    Checked,
    Installed,
    Failed,
}

impl UnitStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnitStatus::Checked | UnitStatus::Installed | UnitStatus::Failed
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitStatus::Waiting => "waiting",
            UnitStatus::Preparing => "preparing",
            UnitStatus::Downloading => "downloading",
            UnitStatus::Checked => "checked",
            UnitStatus::Installed => "installed",
            UnitStatus::Failed => "failed",
        }
    }
}

/// In-flight update from a unit. Delivery is best effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Status(usize, UnitStatus),
    Bytes(usize, u64, u64),
}

/// Terminal report from a unit. Exactly one per unit, never dropped.
#[derive(Debug)]
struct UnitResult {
    index: usize,
    status: UnitStatus,
    error: Option<String>,
}

/// Display state of one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitState {
    pub resource: String,
    pub source: Source,
    pub status: UnitStatus,
    pub downloaded: u64,
    pub total: Option<u64>,
    pub error: Option<String>,
}

/// View-model of a running install, owned by the supervisor loop.
#[derive(Debug, Clone)]
pub struct InstallView {
    pub units: Vec<UnitState>,
}

impl InstallView {
    pub fn new(plugins: &[PluginSpec]) -> Self {
        let units = plugins
            .iter()
            .map(|spec| UnitState {
                resource: spec.resource.clone(),
                source: spec.source,
                status: UnitStatus::Waiting,
                downloaded: 0,
                total: None,
                error: None,
            })
            .collect();
        Self { units }
    }

    /// Apply a progress event, returning the index of the unit it changed.
    /// Events that arrive after a unit settled are ignored.
    pub fn apply(&mut self, event: Progress) -> Option<usize> {
        let index = match event {
            Progress::Status(index, _) | Progress::Bytes(index, _, _) => index,
        };
        let unit = self.units.get_mut(index)?;
        if unit.status.is_terminal() {
            return None;
        }

        match event {
            Progress::Status(_, status) => unit.status = status,
            Progress::Bytes(_, downloaded, total) => {
                unit.status = UnitStatus::Downloading;
                unit.downloaded = downloaded;
                unit.total = Some(total);
            }
        }
        Some(index)
    }

    /// Record a unit's terminal state.
    pub fn settle(&mut self, index: usize, status: UnitStatus, error: Option<String>) {
        if let Some(unit) = self.units.get_mut(index) {
            unit.status = status;
            unit.error = error;
        }
    }

    #[cfg(test)]
    fn is_settled(&self) -> bool {
        self.units.iter().all(|u| u.status.is_terminal())
    }

    fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }
}

/// Consumer of view-model changes. Only the supervisor calls it.
pub trait Renderer: Send {
    fn draw(&mut self, index: usize, unit: &UnitState);

    fn finish(&mut self, _view: &InstallView) {}
}

/// Renderer that draws nothing.
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn draw(&mut self, _index: usize, _unit: &UnitState) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub resource: String,
    pub message: String,
}

/// Aggregate result of a plugin install run.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub installed: usize,
    pub checked: usize,
    pub removed: usize,
    pub failures: Vec<Failure>,
    pub units: Vec<UnitState>,
}

impl InstallOutcome {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn status_of(&self, resource: &str) -> Option<UnitStatus> {
        self.units
            .iter()
            .find(|u| u.resource == resource)
            .map(|u| u.status)
    }

    /// Turn per-plugin failures into one overall error.
    pub fn into_result(self) -> anyhow::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            anyhow::bail!("{} plugin(s) failed to install", self.failed())
        }
    }
}

pub struct PluginInstaller {
    registry: Arc<SourceRegistry>,
    cache: Arc<Cache>,
    plugins_dir: PathBuf,
    concurrency: usize,
}

impl PluginInstaller {
    pub fn new(registry: Arc<SourceRegistry>, cache: Arc<Cache>, plugins_dir: PathBuf) -> Self {
        Self {
            registry,
            cache,
            plugins_dir,
            concurrency: crate::constants::DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Install every configured plugin, then remove files no plugin owns.
    ///
    /// A failing plugin never stops its siblings; failures are collected in
    /// the outcome. The returned error is reserved for conditions that stop
    /// the whole run (invalid plugin list, unusable plugins directory,
    /// interrupt).
    pub async fn install(
        &self,
        plugins: &[PluginSpec],
        renderer: &mut dyn Renderer,
    ) -> anyhow::Result<InstallOutcome> {
        manifest::validate_plugins(plugins)?;
        tokio::fs::create_dir_all(&self.plugins_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.plugins_dir.display()))?;

        let mut view = InstallView::new(plugins);
        for (index, unit) in view.units.iter().enumerate() {
            renderer.draw(index, unit);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<UnitResult>();
        let (progress_tx, mut progress_rx) = mpsc::channel::<Progress>(PROGRESS_BUFFER);

        let mut handles = Vec::with_capacity(plugins.len());
        for (index, spec) in plugins.iter().cloned().enumerate() {
            let unit = Unit {
                index,
                dest: self.plugins_dir.join(spec.file_name()),
                spec,
                registry: self.registry.clone(),
                cache: self.cache.clone(),
                progress: progress_tx.clone(),
            };
            let semaphore = semaphore.clone();
            let result_tx = result_tx.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let (status, error) = match unit.run().await {
                    Ok(status) => (status, None),
                    Err(e) => (UnitStatus::Failed, Some(format!("{:#}", e))),
                };
                let _ = result_tx.send(UnitResult {
                    index: unit.index,
                    status,
                    error,
                });
            }));
        }
        // The result channel closes once the last unit has reported
        drop(result_tx);
        drop(progress_tx);

        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(interrupt);
        let mut progress_open = true;

        loop {
            // A unit's progress is queued before its result, so draining
            // progress first keeps each unit's transitions in order
            tokio::select! {
                biased;
                event = progress_rx.recv(), if progress_open => match event {
                    Some(event) => {
                        if let Some(index) = view.apply(event) {
                            renderer.draw(index, &view.units[index]);
                        }
                    }
                    None => progress_open = false,
                },
                result = result_rx.recv() => match result {
                    Some(result) => {
                        view.settle(result.index, result.status, result.error);
                        renderer.draw(result.index, &view.units[result.index]);
                    }
                    None => break,
                },
                _ = &mut interrupt => {
                    for handle in &handles {
                        handle.abort();
                    }
                    renderer.finish(&view);
                    anyhow::bail!("Install interrupted");
                }
            }
        }

        // Every writer has exited before the directory is reconciled
        for (index, joined) in futures::future::join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                log::debug!("Install task {} ended abnormally: {}", index, e);
            }
        }
        for index in 0..view.units.len() {
            if !view.units[index].status.is_terminal() {
                view.settle(
                    index,
                    UnitStatus::Failed,
                    Some("install task ended unexpectedly".to_string()),
                );
                renderer.draw(index, &view.units[index]);
            }
        }
        renderer.finish(&view);

        let expected: HashSet<String> = plugins.iter().map(|p| p.file_name()).collect();
        let removed = remove_unmanaged(&self.plugins_dir, &expected);

        let failures = view
            .units
            .iter()
            .filter(|u| u.status == UnitStatus::Failed)
            .map(|u| Failure {
                resource: u.resource.clone(),
                message: u.error.clone().unwrap_or_default(),
            })
            .collect();

        Ok(InstallOutcome {
            installed: view.count(UnitStatus::Installed),
            checked: view.count(UnitStatus::Checked),
            removed,
            failures,
            units: view.units,
        })
    }
}

/// Everything one task needs to bring one plugin up to date.
struct Unit {
    index: usize,
    spec: PluginSpec,
    dest: PathBuf,
    registry: Arc<SourceRegistry>,
    cache: Arc<Cache>,
    progress: mpsc::Sender<Progress>,
}

impl Unit {
    fn report(&self, status: UnitStatus) {
        let _ = self.progress.try_send(Progress::Status(self.index, status));
    }

    async fn run(&self) -> anyhow::Result<UnitStatus> {
        self.report(UnitStatus::Preparing);

        let source = self.registry.get_or_error(self.spec.source)?.clone();
        let artifact = source.resolve(&self.spec).await?;
        log::debug!(
            "Resolved {} {} to {}",
            self.spec.resource,
            artifact.version.as_deref().unwrap_or("-"),
            artifact.url
        );

        if artifact.checksum != NO_CHECKSUM {
            if let Some(digest) = self.local_digest(artifact.algorithm).await {
                if artifact.matches(&digest) {
                    return Ok(UnitStatus::Checked);
                }
            }
        }

        self.report(UnitStatus::Downloading);
        let progress = self.progress.clone();
        let index = self.index;
        download::download_with_progress(&artifact.url, &self.dest, move |downloaded, total| {
            let _ = progress.try_send(Progress::Bytes(index, downloaded, total));
        })
        .await?;

        self.verify_download(&artifact).await?;
        Ok(UnitStatus::Installed)
    }

    async fn local_digest(&self, algorithm: HashAlgorithm) -> Option<String> {
        local_digest(self.cache.clone(), self.dest.clone(), algorithm).await
    }

    async fn verify_download(&self, artifact: &Artifact) -> anyhow::Result<()> {
        if artifact.checksum == NO_CHECKSUM {
            return Ok(());
        }
        let digest = self
            .local_digest(artifact.algorithm)
            .await
            .with_context(|| format!("Failed to hash {}", self.dest.display()))?;
        if !artifact.matches(&digest) {
            anyhow::bail!(
                "checksum mismatch for {}: expected {}:{}, got {}:{}",
                artifact.url,
                artifact.algorithm.prefix(),
                artifact.checksum,
                artifact.algorithm.prefix(),
                digest
            );
        }
        Ok(())
    }
}

/// Delete files in `plugins_dir` that no configured plugin owns.
/// Failures are logged and skipped. Returns the number of files removed.
pub fn remove_unmanaged(plugins_dir: &Path, expected: &HashSet<String>) -> usize {
    let entries = match fs::read_dir(plugins_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to list {}: {}", plugins_dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if expected.contains(filename) {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Removed unmanaged file {}", filename);
                removed += 1;
            }
            Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn specs() -> Vec<PluginSpec> {
        vec![
            PluginSpec::new(Source::Modrinth, "chunky"),
            PluginSpec::new(Source::Hangar, "ViaVersion"),
        ]
    }

    #[test]
    fn test_view_starts_waiting() {
        let view = InstallView::new(&specs());
        assert_eq!(view.units.len(), 2);
        assert!(view.units.iter().all(|u| u.status == UnitStatus::Waiting));
        assert!(!view.is_settled());
    }

    #[test]
    fn test_bytes_switch_to_downloading() {
        let mut view = InstallView::new(&specs());
        assert_eq!(view.apply(Progress::Bytes(1, 10, 100)), Some(1));
        let unit = &view.units[1];
        assert_eq!(unit.status, UnitStatus::Downloading);
        assert_eq!((unit.downloaded, unit.total), (10, Some(100)));
    }

    #[test]
    fn test_late_progress_is_ignored() {
        let mut view = InstallView::new(&specs());
        view.settle(0, UnitStatus::Installed, None);
        assert_eq!(view.apply(Progress::Status(0, UnitStatus::Downloading)), None);
        assert_eq!(view.apply(Progress::Bytes(0, 5, 10)), None);
        assert_eq!(view.units[0].status, UnitStatus::Installed);
    }

    #[test]
    fn test_out_of_range_event() {
        let mut view = InstallView::new(&specs());
        assert_eq!(view.apply(Progress::Status(9, UnitStatus::Preparing)), None);
    }

    #[test]
    fn test_settled_when_all_terminal() {
        let mut view = InstallView::new(&specs());
        view.settle(1, UnitStatus::Failed, Some("boom".into()));
        assert!(!view.is_settled());
        view.settle(0, UnitStatus::Checked, None);
        assert!(view.is_settled());
        assert_eq!(view.count(UnitStatus::Failed), 1);
    }

    #[test]
    fn test_outcome_into_result() {
        let outcome = InstallOutcome {
            installed: 1,
            checked: 0,
            removed: 0,
            failures: vec![Failure {
                resource: "x".into(),
                message: "nope".into(),
            }],
            units: Vec::new(),
        };
        assert!(!outcome.is_success());
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 plugin(s) failed to install");
    }

    #[test]
    fn test_remove_unmanaged() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("chunky.jar"), b"a").unwrap();
        fs::write(dir.join("old.jar"), b"b").unwrap();
        fs::write(dir.join("notes.txt"), b"c").unwrap();
        fs::create_dir(dir.join("chunky")).unwrap();

        let expected: HashSet<String> = ["chunky.jar".to_string()].into_iter().collect();
        assert_eq!(remove_unmanaged(dir, &expected), 2);

        assert!(dir.join("chunky.jar").exists());
        assert!(!dir.join("old.jar").exists());
        assert!(!dir.join("notes.txt").exists());
        // Plugin data directories are left alone
        assert!(dir.join("chunky").is_dir());
    }

    #[test]
    fn test_remove_unmanaged_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert_eq!(remove_unmanaged(&temp.path().join("nope"), &HashSet::new()), 0);
    }

    #[tokio::test]
    async fn test_unknown_custom_url_fails_in_isolation() {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(Cache::disabled());
        let registry = Arc::new(SourceRegistry::new(cache.clone()));
        let installer = PluginInstaller::new(registry, cache, temp.path().join("plugins"))
            .with_concurrency(2);

        // Neither plugin can resolve without the network or a URL
        let plugins = vec![
            PluginSpec::new(Source::Custom, "a"),
            PluginSpec::new(Source::Custom, "b"),
        ];
        let outcome = installer.install(&plugins, &mut NoopRenderer).await.unwrap();
        assert_eq!(outcome.failed(), 2);
        assert_eq!(outcome.installed, 0);
        assert_eq!(outcome.status_of("a"), Some(UnitStatus::Failed));
    }

    #[tokio::test]
    async fn test_duplicate_plugins_are_refused_before_any_write() {
        let temp = TempDir::new().unwrap();
        let plugins_dir = temp.path().join("plugins");
        let cache = Arc::new(Cache::disabled());
        let registry = Arc::new(SourceRegistry::new(cache.clone()));
        let installer = PluginInstaller::new(registry, cache, plugins_dir.clone());

        let plugins = vec![
            PluginSpec::new(Source::Modrinth, "chunky").with_version("1.4.15"),
            PluginSpec::new(Source::Modrinth, "chunky").with_version("1.4.16"),
        ];
        let err = installer.install(&plugins, &mut NoopRenderer).await.unwrap_err();
        assert!(err.to_string().contains("more than once: chunky"), "{}", err);
        assert!(!plugins_dir.exists());
    }

    #[tokio::test]
    async fn test_escaping_plugin_name_is_refused() {
        let temp = TempDir::new().unwrap();
        let plugins_dir = temp.path().join("server").join("plugins");
        let cache = Arc::new(Cache::disabled());
        let registry = Arc::new(SourceRegistry::new(cache.clone()));
        let installer = PluginInstaller::new(registry, cache, plugins_dir);

        let plugins = vec![
            PluginSpec::new(Source::Custom, "../../escaped")
                .with_download_url("http://127.0.0.1:1/escaped.jar"),
        ];
        let err = installer.install(&plugins, &mut NoopRenderer).await.unwrap_err();
        assert!(err.to_string().contains("invalid plugin name"), "{}", err);
        assert!(!temp.path().join("escaped.jar").exists());
    }

    #[tokio::test]
    async fn test_empty_plugin_list() {
        let temp = TempDir::new().unwrap();
        let plugins_dir = temp.path().join("plugins");
        fs::create_dir_all(&plugins_dir).unwrap();
        fs::write(plugins_dir.join("stale.jar"), b"x").unwrap();

        let cache = Arc::new(Cache::disabled());
        let registry = Arc::new(SourceRegistry::new(cache.clone()));
        let installer = PluginInstaller::new(registry, cache, plugins_dir.clone());

        let outcome = installer.install(&[], &mut NoopRenderer).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.removed, 1);
        assert!(!plugins_dir.join("stale.jar").exists());
    }
}
