//! Input discovery and decoding.
//!
//! Inputs come either as an explicit path list (loaded as given, in order)
//! or as a directory walk: supported image files in sorted order, optionally
//! recursing into subdirectories up to a fixed depth. Files with unsupported
//! extensions are collected rather than silently dropped so the caller can
//! warn about them.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use indicatif::ProgressBar;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::MergeError;
use crate::layout::Size;

/// Input formats the decoder accepts, by extension (case-insensitive).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "tiff"];

/// Directory recursion stops below this depth.
const MAX_RECURSION_DEPTH: usize = 10;

/// Discovered inputs: decodable files in walk order, plus skipped files.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub ignored: Vec<PathBuf>,
}

/// Whether `path` has a supported input extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}

/// Walk `dir` for image files.
///
/// Entries are visited in sorted order so the resulting layout is
/// deterministic across platforms. Symlinked directories are not followed.
pub fn discover(dir: &Path, recursive: bool) -> Result<Discovery, MergeError> {
    if !dir.is_dir() {
        return Err(MergeError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let mut found = Discovery::default();
    walk(dir, recursive, 0, &mut found)?;
    debug!(
        files = found.files.len(),
        ignored = found.ignored.len(),
        "directory walk finished"
    );
    Ok(found)
}

fn walk(dir: &Path, recursive: bool, depth: usize, out: &mut Discovery) -> io::Result<()> {
    if depth >= MAX_RECURSION_DEPTH {
        return Ok(());
    }

    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        // file_type() does not traverse symlinks, so linked dirs are skipped.
        let file_type = entry.file_type()?;
        if file_type.is_file() {
            if is_supported(&path) {
                out.files.push(path);
            } else {
                out.ignored.push(path);
            }
        } else if recursive && file_type.is_dir() {
            walk(&path, recursive, depth + 1, out)?;
        }
    }
    Ok(())
}

/// Decode every path, in order. The first failure aborts the load.
pub fn load(paths: &[PathBuf], progress: Option<&ProgressBar>) -> Result<Vec<DynamicImage>, MergeError> {
    paths
        .iter()
        .map(|path| {
            let img = image::open(path).map_err(|source| MergeError::Decode {
                path: path.clone(),
                source,
            })?;
            if let Some(pb) = progress {
                pb.inc(1);
            }
            Ok(img)
        })
        .collect()
}

/// Dimensions of every decoded image, in order.
pub fn dimensions(images: &[DynamicImage]) -> Vec<Size> {
    images
        .iter()
        .map(|img| Size::new(img.width(), img.height()))
        .collect()
}

/// Shuffle paths and images with a single permutation, keeping pairs
/// aligned.
pub fn shuffle_together(
    paths: Vec<PathBuf>,
    images: Vec<DynamicImage>,
) -> (Vec<PathBuf>, Vec<DynamicImage>) {
    let mut pairs: Vec<(PathBuf, DynamicImage)> = paths.into_iter().zip(images).collect();
    pairs.shuffle(&mut rand::rng());
    pairs.into_iter().unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn touch(path: &Path) {
        fs::write(path, b"not really an image").unwrap();
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbaImage::from_pixel(w, h, image::Rgba([1, 2, 3, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_supported(Path::new("a.png")));
        assert!(is_supported(Path::new("b.JPG")));
        assert!(is_supported(Path::new("c.TiFf")));
        assert!(!is_supported(Path::new("d.svg")));
        assert!(!is_supported(Path::new("e.webp")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn discover_splits_supported_from_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 2, 2);
        write_png(&dir.path().join("a.png"), 2, 2);
        touch(&dir.path().join("notes.txt"));

        let found = discover(dir.path(), false).unwrap();
        let names: Vec<_> = found
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        // Sorted, deterministic order.
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(found.ignored.len(), 1);
    }

    #[test]
    fn discover_recurses_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write_png(&dir.path().join("top.png"), 2, 2);
        write_png(&sub.join("nested.png"), 2, 2);

        let flat = discover(dir.path(), false).unwrap();
        assert_eq!(flat.files.len(), 1);

        let deep = discover(dir.path(), true).unwrap();
        assert_eq!(deep.files.len(), 2);
    }

    #[test]
    fn discover_rejects_non_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.png");
        write_png(&file, 2, 2);
        assert!(matches!(
            discover(&file, false),
            Err(MergeError::NotADirectory { .. })
        ));
    }

    #[test]
    fn load_decodes_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        write_png(&first, 3, 1);
        write_png(&second, 1, 3);

        let images = load(&[second.clone(), first.clone()], None).unwrap();
        assert_eq!(dimensions(&images), vec![Size::new(1, 3), Size::new(3, 1)]);
    }

    #[test]
    fn load_fails_on_undecodable_input() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.png");
        touch(&bogus);
        assert!(matches!(
            load(&[bogus], None),
            Err(MergeError::Decode { .. })
        ));
    }

    #[test]
    fn shuffle_keeps_pairs_aligned() {
        let paths: Vec<PathBuf> = (0..16).map(|i| PathBuf::from(format!("{i}.png"))).collect();
        let images: Vec<DynamicImage> = (0..16)
            .map(|i| DynamicImage::ImageRgba8(RgbaImage::new(i + 1, 1)))
            .collect();

        let (shuffled_paths, shuffled_images) = shuffle_together(paths, images);
        assert_eq!(shuffled_paths.len(), 16);
        for (path, img) in shuffled_paths.iter().zip(&shuffled_images) {
            let i: u32 = path
                .file_stem()
                .unwrap()
                .to_str()
                .unwrap()
                .parse()
                .unwrap();
            // The image that started at index i is i+1 pixels wide.
            assert_eq!(img.width(), i + 1);
        }
    }
}
