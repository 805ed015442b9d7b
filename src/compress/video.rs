use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use std::process::Stdio;
use tokio::process::Command;

/// Transcode a video to a constrained web-friendly profile: H.264 at constant
/// quality, bounded encode preset, fixed-bitrate AAC audio, moov atom up
/// front for progressive playback.
///
/// ffmpeg works on files, so the buffer passes through two scratch files.
/// Both are `NamedTempFile`s whose drop removes them on every exit path —
/// success, transform error, or panic unwind.
pub(super) async fn transcode(data: Bytes, ffmpeg_path: &str) -> Result<Bytes> {
    let input = tempfile::NamedTempFile::new().context("Failed to create scratch input file")?;
    let output = tempfile::Builder::new()
        .suffix(".mp4")
        .tempfile()
        .context("Failed to create scratch output file")?;

    tokio::fs::write(input.path(), &data).await?;

    let result = Command::new(ffmpeg_path)
        .arg("-i")
        .arg(input.path())
        .args([
            "-c:v",
            "libx264",
            "-crf",
            "28",
            "-preset",
            "faster",
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
            "-y",
        ])
        .arg(output.path())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("Failed to execute ffmpeg")?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(anyhow!("ffmpeg transcode failed: {stderr}"));
    }

    let transcoded = tokio::fs::read(output.path()).await?;
    Ok(Bytes::from(transcoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_ffmpeg_is_an_error_not_a_panic() {
        let result = transcode(Bytes::from_static(b"fake video"), "/nonexistent/ffmpeg").await;
        assert!(result.is_err());
    }
}
