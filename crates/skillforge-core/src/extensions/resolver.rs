//! Extension source resolution and staging.
//!
//! Turns a source string into a validated package without touching any
//! project state. Remote sources are staged into a private temporary
//! directory owned by the returned [`ResolvedExtension`]; dropping it
//! deletes the staging area, so cleanup happens on every exit path.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use thiserror::Error;

use super::manifest::{ExtensionManifest, ManifestError};

/// Resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest error.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// External fetch tool failed.
    #[error("failed to fetch \"{src}\": {message}")]
    Fetch { src: String, message: String },

    /// Local source path does not exist.
    #[error("source path not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Classification of an extension source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A filesystem path (`./`, `../`, or absolute).
    LocalPath,

    /// A version-control URL to clone.
    GitUrl,

    /// A registry package name to fetch and unpack.
    Registry,
}

/// Classifies a source string. Local path patterns win, then
/// version-control patterns; everything else is a registry name.
pub fn classify_source(source: &str) -> SourceKind {
    if source.starts_with("./")
        || source.starts_with("../")
        || Path::new(source).is_absolute()
    {
        return SourceKind::LocalPath;
    }
    if source.starts_with("git+")
        || source.starts_with("git://")
        || source.ends_with(".git")
        || source.contains("github.com/")
        || source.contains("gitlab.com/")
    {
        return SourceKind::GitUrl;
    }
    SourceKind::Registry
}

/// Fetches remote packages into a staging directory.
///
/// Implemented by shelling out to the version-control and registry tools;
/// tests substitute their own implementation.
pub trait PackageFetcher {
    /// Clones a repository into `dest`.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Fetches and unpacks a registry package under `dest`, returning the
    /// directory holding the package root.
    fn fetch_package(&self, package: &str, dest: &Path) -> Result<PathBuf>;
}

/// Fetcher spawning `git` and `npm`/`tar` as child processes.
///
/// Calls block until the tool exits; there is no timeout.
pub struct CommandFetcher;

impl CommandFetcher {
    fn run(source: &str, command: &mut Command) -> Result<()> {
        let output = command.output().map_err(|e| ResolveError::Fetch {
            src: source.to_string(),
            message: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(ResolveError::Fetch {
                src: source.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl PackageFetcher for CommandFetcher {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        Self::run(
            url,
            Command::new("git").args(["clone", "--depth", "1", url]).arg(dest),
        )
    }

    fn fetch_package(&self, package: &str, dest: &Path) -> Result<PathBuf> {
        Self::run(
            package,
            Command::new("npm").args(["pack", package, "--pack-destination"]).arg(dest),
        )?;

        let tarball = std::fs::read_dir(dest)?
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .find(|p| p.extension().is_some_and(|ext| ext == "tgz"))
            .ok_or_else(|| ResolveError::Fetch {
                src: package.to_string(),
                message: "registry fetch produced no package archive".to_string(),
            })?;

        let extract_dir = dest.join("extracted");
        std::fs::create_dir_all(&extract_dir)?;
        Self::run(
            package,
            Command::new("tar").arg("-xzf").arg(&tarball).arg("-C").arg(&extract_dir),
        )?;

        // Registry tarballs unpack their contents under package/.
        Ok(extract_dir.join("package"))
    }
}

/// A validated package plus the staging area that holds it.
///
/// The staging directory (when the source was remote) lives exactly as
/// long as this value; the install attempt that created it must keep it
/// alive until commit has copied the tree out.
pub struct ResolvedExtension {
    manifest: ExtensionManifest,
    root: PathBuf,
    staging: Option<TempDir>,
}

impl ResolvedExtension {
    /// The validated manifest.
    pub fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    /// Root directory of the package contents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the package lives in a private staging area.
    pub fn is_staged(&self) -> bool {
        self.staging.is_some()
    }
}

/// Resolves a source string into a staged, validated package.
///
/// Fails closed: any fetch or validation failure tears down the staging
/// area before returning.
pub fn resolve(source: &str, fetcher: &dyn PackageFetcher) -> Result<ResolvedExtension> {
    match classify_source(source) {
        SourceKind::LocalPath => {
            let root = std::fs::canonicalize(source)
                .map_err(|_| ResolveError::SourceNotFound(PathBuf::from(source)))?;
            let manifest = ExtensionManifest::load(&root)?;
            Ok(ResolvedExtension { manifest, root, staging: None })
        }
        SourceKind::GitUrl => {
            let staging = TempDir::new()?;
            let url = source.strip_prefix("git+").unwrap_or(source);
            fetcher.clone_repo(url, staging.path())?;
            let manifest = ExtensionManifest::load(staging.path())?;
            let root = staging.path().to_path_buf();
            Ok(ResolvedExtension { manifest, root, staging: Some(staging) })
        }
        SourceKind::Registry => {
            let staging = TempDir::new()?;
            let root = fetcher.fetch_package(source, staging.path())?;
            let manifest = ExtensionManifest::load(&root)?;
            Ok(ResolvedExtension { manifest, root, staging: Some(staging) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::manifest::MANIFEST_FILE;
    use tempfile::TempDir;

    /// Fetcher that materializes a fixed package tree instead of spawning
    /// external tools.
    pub(crate) struct FakeFetcher {
        pub manifest_json: Option<String>,
        pub fail: bool,
    }

    impl FakeFetcher {
        fn materialize(&self, dir: &Path) -> Result<()> {
            if self.fail {
                return Err(ResolveError::Fetch {
                    src: "fake".to_string(),
                    message: "simulated fetch failure".to_string(),
                });
            }
            if let Some(json) = &self.manifest_json {
                std::fs::write(dir.join(MANIFEST_FILE), json)?;
            }
            std::fs::create_dir_all(dir.join(".git"))?;
            std::fs::write(dir.join(".git").join("HEAD"), "ref: main\n")?;
            Ok(())
        }
    }

    impl PackageFetcher for FakeFetcher {
        fn clone_repo(&self, _url: &str, dest: &Path) -> Result<()> {
            self.materialize(dest)
        }

        fn fetch_package(&self, _package: &str, dest: &Path) -> Result<PathBuf> {
            let root = dest.join("extracted").join("package");
            std::fs::create_dir_all(&root)?;
            self.materialize(&root)?;
            Ok(root)
        }
    }

    const GOOD_MANIFEST: &str = r#"{"name": "acme", "version": "1.0.0"}"#;

    #[test]
    fn test_classify_source() {
        assert_eq!(classify_source("./pkg"), SourceKind::LocalPath);
        assert_eq!(classify_source("../pkg"), SourceKind::LocalPath);
        assert_eq!(classify_source("/abs/pkg"), SourceKind::LocalPath);
        assert_eq!(classify_source("git+https://host/x"), SourceKind::GitUrl);
        assert_eq!(classify_source("https://github.com/a/b"), SourceKind::GitUrl);
        assert_eq!(classify_source("https://host/x.git"), SourceKind::GitUrl);
        assert_eq!(classify_source("@scope/pkg"), SourceKind::Registry);
        assert_eq!(classify_source("plain-name"), SourceKind::Registry);
    }

    #[test]
    fn test_resolve_local_source() {
        let pkg = TempDir::new().unwrap();
        std::fs::write(pkg.path().join(MANIFEST_FILE), GOOD_MANIFEST).unwrap();

        let fetcher = FakeFetcher { manifest_json: None, fail: true };
        let resolved = resolve(pkg.path().to_str().unwrap(), &fetcher).unwrap();
        assert_eq!(resolved.manifest().name, "acme");
        assert!(!resolved.is_staged());
    }

    #[test]
    fn test_resolve_local_missing_manifest() {
        let pkg = TempDir::new().unwrap();
        let fetcher = FakeFetcher { manifest_json: None, fail: true };
        let result = resolve(pkg.path().to_str().unwrap(), &fetcher);
        assert!(matches!(result, Err(ResolveError::Manifest(ManifestError::NotFound(_)))));
    }

    #[test]
    fn test_resolve_git_source_staged_and_cleaned() {
        let fetcher =
            FakeFetcher { manifest_json: Some(GOOD_MANIFEST.to_string()), fail: false };
        let staged_root;
        {
            let resolved = resolve("git+https://host/acme.git", &fetcher).unwrap();
            assert!(resolved.is_staged());
            assert!(resolved.root().join(MANIFEST_FILE).is_file());
            staged_root = resolved.root().to_path_buf();
        }
        // Dropping the resolution released the staging area.
        assert!(!staged_root.exists());
    }

    #[test]
    fn test_resolve_fetch_failure_cleans_staging() {
        let fetcher = FakeFetcher { manifest_json: None, fail: true };
        let result = resolve("git://host/acme", &fetcher);
        assert!(matches!(result, Err(ResolveError::Fetch { .. })));
    }

    #[test]
    fn test_resolve_registry_package_root() {
        let fetcher =
            FakeFetcher { manifest_json: Some(GOOD_MANIFEST.to_string()), fail: false };
        let resolved = resolve("acme", &fetcher).unwrap();
        assert!(resolved.root().ends_with("extracted/package"));
        assert_eq!(resolved.manifest().version, "1.0.0");
    }

    #[test]
    fn test_resolve_invalid_manifest_fails_closed() {
        let fetcher = FakeFetcher {
            manifest_json: Some(
                r#"{"name": "../escape", "version": "1.0.0"}"#.to_string(),
            ),
            fail: false,
        };
        let result = resolve("git://host/acme", &fetcher);
        assert!(matches!(result, Err(ResolveError::Manifest(ManifestError::UnsafeName(_)))));
    }
}
