use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use sha2::{Digest, Sha256};

/// Environment variable overriding the root of the local artifact cache.
pub const HOME_ENV: &str = "SPENDSORT_HOME";

/// The files the classifier needs at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Frozen encoder exported to ONNX
    Encoder,
    /// Pretrained WordPiece tokenizer definition
    Tokenizer,
    /// Linear classification head weights
    Head,
    /// Category name to class index mapping
    LabelMap,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Encoder,
        ArtifactKind::Tokenizer,
        ArtifactKind::Head,
        ArtifactKind::LabelMap,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Encoder => "encoder.onnx",
            Self::Tokenizer => "tokenizer.json",
            Self::Head => "classifier_head.json",
            Self::LabelMap => "label_map.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter()
            .copied()
            .find(|kind| kind.file_name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.file_name()).collect();
                format!("unknown artifact '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact '{0}' is missing and no remote location is configured")]
    NoRemote(ArtifactKind),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {artifact}")]
    HashMismatch {
        artifact: ArtifactKind,
        expected: String,
        actual: String,
    },
}

/// Where missing artifacts are fetched from and, optionally, the SHA-256 each must match.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSource {
    pub base_url: Option<String>,
    pub sha256: HashMap<ArtifactKind, String>,
}

impl ArtifactSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            sha256: HashMap::new(),
        }
    }

    pub fn with_sha256(mut self, kind: ArtifactKind, hash: impl Into<String>) -> Self {
        self.sha256.insert(kind, hash.into().to_lowercase());
        self
    }

    fn url_for(&self, kind: ArtifactKind) -> Option<String> {
        self.base_url.as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), kind.file_name()))
    }
}

/// Parses a `file=sha256` pin such as `encoder.onnx=3f1e...`.
pub fn parse_pin(s: &str) -> Result<(ArtifactKind, String), String> {
    let (name, hash) = s.split_once('=')
        .ok_or_else(|| format!("expected <file>=<sha256>, got '{}'", s))?;
    let kind = name.trim().parse::<ArtifactKind>()?;
    let hash = hash.trim();
    if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("'{}' is not a hex SHA-256 digest", hash));
    }
    Ok((kind, hash.to_lowercase()))
}

/// Keeps the local artifacts directory populated.
#[derive(Clone)]
pub struct ArtifactManager {
    artifacts_dir: PathBuf,
    source: ArtifactSource,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactManager {
    /// Creates an ArtifactManager rooted at the default artifacts directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(HOME_ENV) {
            return PathBuf::from(path).join("artifacts");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("spendsort").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("spendsort").join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("spendsort").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self {
            artifacts_dir,
            source: ArtifactSource::default(),
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_source(mut self, source: ArtifactSource) -> Self {
        self.source = source;
        self
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.artifacts_dir.join(kind.file_name())
    }

    /// Artifacts not present on disk.
    pub fn missing(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL.iter()
            .copied()
            .filter(|&kind| !self.path(kind).exists())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("{:?}: {} bytes, sha256 {}", path, bytes.len(), hash);
        Ok(hash == expected_hash)
    }

    /// Checks one artifact on disk. Artifacts without a pinned hash only need to exist.
    pub fn verify(&self, kind: ArtifactKind) -> Result<bool, ArtifactError> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(false);
        }
        match self.source.sha256.get(&kind) {
            Some(expected) => self.verify_file(&path, expected),
            None => Ok(true),
        }
    }

    /// Makes sure every artifact is present locally, downloading the ones that are missing
    /// or fail verification. Any failure leaves the failed artifact absent, except a local
    /// file that fails its pin while no remote is configured, which is kept.
    pub async fn ensure_present(&self) -> Result<(), ArtifactError> {
        let _lock = self.download_lock.lock().await;

        for kind in ArtifactKind::ALL {
            let path = self.path(kind);
            if tokio::fs::try_exists(&path).await? {
                if self.matches_pin(kind, &path).await? {
                    log::info!("{} present at {:?}", kind, path);
                    continue;
                }
                if self.source.url_for(kind).is_none() {
                    log::error!("{} at {:?} does not match its pinned hash", kind, path);
                    return Err(ArtifactError::HashMismatch {
                        artifact: kind,
                        expected: self.source.sha256.get(&kind).cloned().unwrap_or_default(),
                        actual: sha256_hex(&tokio::fs::read(&path).await?),
                    });
                }
                log::warn!("{} failed verification, downloading again", kind);
                tokio::fs::remove_file(&path).await?;
            } else {
                log::info!("{} not found at {:?}", kind, path);
            }

            if let Err(e) = self.download_and_verify(kind, &path).await {
                log::error!("Failed to fetch {}: {}", kind, e);
                return Err(e);
            }
        }

        log::info!("All artifacts ready in {:?}", self.artifacts_dir);
        Ok(())
    }

    async fn matches_pin(&self, kind: ArtifactKind, path: &Path) -> Result<bool, ArtifactError> {
        match self.source.sha256.get(&kind) {
            Some(expected) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(&sha256_hex(&bytes) == expected)
            }
            None => Ok(true),
        }
    }

    async fn download_and_verify(&self, kind: ArtifactKind, path: &Path) -> Result<(), ArtifactError> {
        let url = self.source.url_for(kind).ok_or(ArtifactError::NoRemote(kind))?;

        log::info!("Downloading {} from {}", kind, url);
        let response = reqwest::get(&url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = self.source.sha256.get(&kind) {
            let actual = sha256_hex(&bytes);
            if &actual != expected {
                return Err(ArtifactError::HashMismatch {
                    artifact: kind,
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let partial = path.with_file_name(format!("{}.part", kind.file_name()));
        persist(&partial, path, &bytes).await?;

        log::info!("{} downloaded and verified", kind);
        Ok(())
    }

    /// Deletes every local artifact so the next `ensure_present` fetches fresh copies.
    pub fn remove_downloads(&self) -> Result<(), ArtifactError> {
        for kind in ArtifactKind::ALL {
            let path = self.path(kind);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Writes `bytes` to `partial` and renames it onto `path`. On failure neither file is left behind.
async fn persist(partial: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let result = match tokio::fs::write(partial, bytes).await {
        Ok(()) => tokio::fs::rename(partial, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(partial).await;
    }
    result
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
