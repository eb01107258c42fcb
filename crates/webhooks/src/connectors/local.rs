//! Local now-playing artifact writer.
//!
//! Writes `<short_name>.json` with the full snapshot and, when the snapshot
//! names a current song, `<short_name>.txt` with its display text.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::ConnectorError;
use crate::events::Envelope;
use crate::station::WebhookConfig;

use super::Connector;

/// JSON pointer to the current song's display text in a now-playing snapshot.
const SONG_TEXT_POINTER: &str = "/now_playing/song/text";

/// Connector that keeps on-disk now-playing artifacts up to date.
pub struct LocalConnector {
    dir: PathBuf,
}

impl LocalConnector {
    /// Create a connector writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `contents` to a fresh temp file in `dir`, then move it over `path`.
    ///
    /// Every call gets its own temp file, so concurrent dispatches for the
    /// same station never observe each other's partial writes.
    async fn write_atomic(
        dir: &Path,
        path: PathBuf,
        contents: Vec<u8>,
    ) -> Result<(), ConnectorError> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<(), ConnectorError> {
            let mut tmp = tempfile::Builder::new()
                .prefix(".np-")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&contents)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tmp.as_file()
                    .set_permissions(std::fs::Permissions::from_mode(0o644))?;
            }
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| ConnectorError::Other(format!("Artifact writer task failed: {e}")))?
    }
}

/// Check that `short_name` names a single file inside the artifact directory.
fn artifact_stem(short_name: &str) -> Result<&str, ConnectorError> {
    let mut components = Path::new(short_name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if single_normal && !short_name.contains(['/', '\\']) {
        Ok(short_name)
    } else {
        Err(ConnectorError::Other(format!(
            "Invalid station short name \"{short_name}\" for a local artifact"
        )))
    }
}

#[async_trait]
impl Connector for LocalConnector {
    // Always fires; the local artifact does not depend on triggers.
    fn should_dispatch(&self, _envelope: &Envelope, _webhook: &WebhookConfig) -> bool {
        true
    }

    async fn dispatch(
        &self,
        envelope: &Envelope,
        _webhook: &WebhookConfig,
    ) -> Result<(), ConnectorError> {
        let station = envelope.station();
        if station.short_name.is_empty() {
            return Err(ConnectorError::Other(format!(
                "Station {} has no short name",
                station.id
            )));
        }
        let stem = artifact_stem(&station.short_name)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let json_path = self.dir.join(format!("{stem}.json"));
        let body = serde_json::to_vec_pretty(envelope.now_playing())?;
        Self::write_atomic(&self.dir, json_path.clone(), body).await?;

        if let Some(text) = envelope
            .now_playing()
            .pointer(SONG_TEXT_POINTER)
            .and_then(Value::as_str)
        {
            let txt_path = self.dir.join(format!("{stem}.txt"));
            Self::write_atomic(&self.dir, txt_path, text.as_bytes().to_vec()).await?;
        }

        debug!(
            station_id = %station.id,
            path = %json_path.display(),
            "Local now-playing artifact updated"
        );

        Ok(())
    }
}
