//! Best-effort media compression.
//!
//! Transforms are side-effect-free and run concurrently across a batch; the
//! returned buffers keep their submission order so display-order assignment
//! downstream matches caller intent. A failed transform is never fatal: the
//! original bytes are stored instead.

mod image;
mod video;

pub use image::plan_for_width;

use crate::catalog::models::ContentCategory;
use crate::intake::UploadedFile;

/// Compress every file in a batch concurrently. Output order equals input
/// order regardless of completion order.
pub async fn compress_batch(files: Vec<UploadedFile>, ffmpeg_path: &str) -> Vec<UploadedFile> {
    futures::future::join_all(
        files
            .into_iter()
            .map(|file| compress_one(file, ffmpeg_path)),
    )
    .await
}

async fn compress_one(mut file: UploadedFile, ffmpeg_path: &str) -> UploadedFile {
    let original_size = file.data.len();
    let result = match file.category {
        ContentCategory::Image => image::compress(file.data.clone()).await,
        ContentCategory::Video => video::transcode(file.data.clone(), ffmpeg_path).await,
        _ => return file,
    };

    match result {
        Ok(compressed) => {
            tracing::debug!(
                file = %file.file_name,
                before = original_size,
                after = compressed.len(),
                "Compressed media"
            );
            file.data = compressed;
        }
        Err(e) => {
            tracing::warn!(
                file = %file.file_name,
                error = %e,
                "Compression failed, storing original bytes"
            );
        }
    }

    file
}
