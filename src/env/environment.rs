//! One interpreter installation and its installed-package set

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ErrorHook;
use crate::cache::MetadataCache;
use crate::env::error::EnvError;
use crate::env::lister::PackageLister;
use crate::pkg::{PackageSet, ResolveOptions};
use crate::registry::MetadataSource;

/// A package set scoped to one interpreter, labeled by an alias.
///
/// Identity is the interpreter path, compared case-insensitively; the
/// alias is only a display label.
#[derive(Debug)]
pub struct Environment {
    interpreter: PathBuf,
    alias: String,
    packages: PackageSet,
}

impl Environment {
    /// Lists the interpreter's installed packages and resolves their
    /// metadata against the shared cache.
    ///
    /// The alias defaults to the interpreter's reported version string.
    /// Fails with [`EnvError::Unavailable`] when the listing comes back
    /// empty; an environment whose packages merely failed enrichment is
    /// tolerated.
    pub async fn discover(
        interpreter: impl Into<PathBuf>,
        alias: Option<String>,
        lister: &dyn PackageLister,
        cache: &mut MetadataCache,
        source: &dyn MetadataSource,
        opts: &ResolveOptions,
        on_error: Option<&ErrorHook>,
    ) -> Result<Self, EnvError> {
        let interpreter = interpreter.into();
        let pairs = lister.list_installed(&interpreter).await?;
        if pairs.is_empty() {
            return Err(EnvError::Unavailable { interpreter });
        }

        let alias = match alias.filter(|a| !a.is_empty()) {
            Some(a) => a,
            None => match lister.interpreter_version(&interpreter).await {
                Ok(v) => v,
                Err(_) => interpreter.display().to_string(),
            },
        };
        debug!(
            "Environment {:?} ({}) lists {} packages",
            interpreter,
            alias,
            pairs.len()
        );

        let packages = PackageSet::resolve_pairs(&pairs, cache, source, opts, on_error).await;
        Ok(Self {
            interpreter,
            alias,
            packages,
        })
    }

    /// Assembles an environment from already-resolved parts.
    pub(crate) fn from_parts(interpreter: PathBuf, alias: String, packages: PackageSet) -> Self {
        Self {
            interpreter,
            alias,
            packages,
        }
    }

    /// Re-lists installed packages and rebuilds the package set. The one
    /// permitted mutation after construction.
    pub async fn refresh(
        &mut self,
        lister: &dyn PackageLister,
        cache: &mut MetadataCache,
        source: &dyn MetadataSource,
        opts: &ResolveOptions,
        on_error: Option<&ErrorHook>,
    ) -> Result<(), EnvError> {
        let pairs = lister.list_installed(&self.interpreter).await?;
        if pairs.is_empty() {
            return Err(EnvError::Unavailable {
                interpreter: self.interpreter.clone(),
            });
        }
        self.packages = PackageSet::resolve_pairs(&pairs, cache, source, opts, on_error).await;
        Ok(())
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn packages(&self) -> &PackageSet {
        &self.packages
    }

    fn identity(&self) -> String {
        self.interpreter.to_string_lossy().to_lowercase()
    }

    /// De-duplication key when multiple configured targets resolve to the
    /// same interpreter.
    pub fn same_interpreter(&self, other: &Environment) -> bool {
        self.identity() == other.identity()
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.same_interpreter(other)
    }
}

impl Eq for Environment {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::MetadataBundle;
    use crate::registry::FetchError;

    struct StubSource;

    #[async_trait::async_trait]
    impl crate::registry::MetadataSource for StubSource {
        async fn fetch(&self, package_name: &str) -> Result<MetadataBundle, FetchError> {
            Ok(MetadataBundle {
                name: package_name.to_string(),
                latest: "9.9".into(),
                homepage: format!("https://pypi.org/project/{package_name}/"),
                ..Default::default()
            })
        }
    }

    struct StubLister {
        pairs: Vec<(String, String)>,
    }

    #[async_trait::async_trait]
    impl PackageLister for StubLister {
        async fn list_installed(
            &self,
            _interpreter: &Path,
        ) -> Result<Vec<(String, String)>, EnvError> {
            Ok(self.pairs.clone())
        }

        async fn interpreter_version(&self, _interpreter: &Path) -> Result<String, EnvError> {
            Ok("3.12.1".to_string())
        }
    }

    fn temp_cache(dir: &tempfile::TempDir) -> MetadataCache {
        MetadataCache::load(dir.path().join("pypkg.json")).unwrap()
    }

    #[tokio::test]
    async fn discover_lists_resolves_and_defaults_the_alias() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = temp_cache(&dir);
        let lister = StubLister {
            pairs: vec![("Requests".to_string(), "2.30".to_string())],
        };

        let env = Environment::discover(
            "/usr/bin/python3",
            None,
            &lister,
            &mut cache,
            &StubSource,
            &ResolveOptions::default(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(env.alias(), "3.12.1");
        let record = env.packages().get_named("requests").unwrap();
        assert_eq!(record.version(), "2.30");
        assert_eq!(record.metadata().unwrap().latest, "9.9");
        assert!(record.is_outdated());
    }

    #[tokio::test]
    async fn discover_fails_on_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = temp_cache(&dir);
        let lister = StubLister { pairs: vec![] };

        let err = Environment::discover(
            "/usr/bin/python3",
            Some("label".into()),
            &lister,
            &mut cache,
            &StubSource,
            &ResolveOptions::default(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EnvError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn refresh_rebuilds_the_package_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = temp_cache(&dir);
        let mut env = Environment::from_parts(
            PathBuf::from("/usr/bin/python3"),
            "3.12.1".into(),
            PackageSet::new(),
        );

        let lister = StubLister {
            pairs: vec![("numpy".to_string(), "2.1.0".to_string())],
        };
        env.refresh(
            &lister,
            &mut cache,
            &StubSource,
            &ResolveOptions::default(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(env.packages().len(), 1);
        assert!(env.packages().get_named("numpy").is_some());
    }

    #[test]
    fn equality_is_case_insensitive_on_interpreter_path() {
        let a = Environment::from_parts(
            PathBuf::from("C:/Progs/WPy64/python.exe"),
            "3.10.0".into(),
            PackageSet::new(),
        );
        let b = Environment::from_parts(
            PathBuf::from("c:/progs/wpy64/PYTHON.EXE"),
            "other-alias".into(),
            PackageSet::new(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn different_interpreters_are_distinct() {
        let a = Environment::from_parts(PathBuf::from("/usr/bin/python3"), "a".into(), PackageSet::new());
        let b = Environment::from_parts(PathBuf::from("/usr/local/bin/python3"), "a".into(), PackageSet::new());
        assert_ne!(a, b);
    }
}
