//! Writing Liquid template blocks and copying their assets.

use std::path::{Path, PathBuf};

use vite_ssg_core::{compose, ExtractionMode, TemplateBlock};

use crate::error::{BuildError, Result};

/// Inputs for one `.liquid` block.
#[derive(Debug, Clone)]
pub struct BlockRequest<'a> {
    pub root: &'a Path,
    pub out_dir: &'a Path,
    pub page: &'a str,
    /// Skeleton path, root-relative unless absolute.
    pub template_file: &'a str,
    /// Document the tags are taken from.
    pub html: &'a str,
    /// Rendered application markup.
    pub markup: &'a str,
    pub container_id: &'a str,
    pub extras: Option<&'a str>,
    pub copy_filter: Option<&'a [String]>,
    /// Theme directory receiving `assets/` and `sections/`.
    pub copy_target: Option<&'a str>,
}

/// A written block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBlock {
    pub path: PathBuf,
    pub block: TemplateBlock,
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Compose `<page>.liquid` next to the page and copy it with its assets.
pub async fn write_block(request: &BlockRequest<'_>) -> Result<WrittenBlock> {
    let skeleton_path = resolve(request.root, request.template_file);
    let skeleton = tokio::fs::read_to_string(&skeleton_path)
        .await
        .map_err(|e| BuildError::io(&skeleton_path, e))?;

    let mode = ExtractionMode::from_filter(request.copy_filter);
    let block = compose(
        request.html,
        request.markup,
        &skeleton,
        request.container_id,
        request.extras,
        &mode,
    );

    let path = request.out_dir.join(format!("{}.liquid", request.page));
    write_file(&path, &block.fragment).await?;
    tracing::debug!(page = request.page, path = %path.display(), files = block.referenced_files.len(), "wrote liquid block");

    if let Some(target) = request.copy_target {
        copy_to_target(&block, &path, request.out_dir, &resolve(request.root, target)).await?;
    }

    Ok(WrittenBlock { path, block })
}

/// Copy referenced assets to `<target>/assets/` and the block to `<target>/sections/`.
pub async fn copy_to_target(
    block: &TemplateBlock,
    block_path: &Path,
    out_dir: &Path,
    target: &Path,
) -> Result<()> {
    let assets = target.join("assets");
    for file in block.all_files() {
        match locate_asset(out_dir, file).await {
            Some(source) => copy_file(&source, &assets.join(file)).await?,
            None => tracing::warn!(file, out_dir = %out_dir.display(), "referenced asset not found in output directory"),
        }
    }

    if let Some(name) = block_path.file_name() {
        copy_file(block_path, &target.join("sections").join(name)).await?;
    }
    Ok(())
}

/// Assets land under `assets/` by default; the output root is tried second.
async fn locate_asset(out_dir: &Path, file: &str) -> Option<PathBuf> {
    for candidate in [out_dir.join("assets").join(file), out_dir.join(file)] {
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(dir) = to.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| BuildError::io(dir, e))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| BuildError::io(from, e))?;
    Ok(())
}

/// Write `content`, creating parent directories.
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| BuildError::io(dir, e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| BuildError::io(path, e))
}
