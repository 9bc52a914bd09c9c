use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tracing::{debug, info};

use super::{PageError, PageSource, RenderedPage};

const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff", "gif"];

/// A folder of page images, one file per page, ordered by file name with
/// digit runs compared numerically (`page2` before `page10`).
#[derive(Debug, Clone)]
pub struct ImageDirectory {
    pages: Vec<PathBuf>,
}

impl ImageDirectory {
    pub fn open(root: &Path) -> Result<Self, PageError> {
        let entries = std::fs::read_dir(root).map_err(|source| PageError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut pages: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_page_image(path))
            .collect();
        if pages.is_empty() {
            return Err(PageError::Empty(root.to_path_buf()));
        }
        pages.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));

        info!("Opened {} pages from {:?}", pages.len(), root);
        Ok(Self { pages })
    }

    fn page_path(&self, page_number: u32) -> Result<&PathBuf, PageError> {
        let index = page_number.checked_sub(1).map(|i| i as usize);
        index
            .and_then(|i| self.pages.get(i))
            .ok_or(PageError::OutOfRange {
                page: page_number,
                count: self.page_count(),
            })
    }
}

impl PageSource for ImageDirectory {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn render_page(&self, page_number: u32, width_px: u32) -> Result<RenderedPage, PageError> {
        let path = self.page_path(page_number)?;
        let mut image = image::open(path).map_err(|source| PageError::Decode {
            path: path.clone(),
            source,
        })?;

        if width_px > 0 && width_px != image.width() {
            debug!(
                "Scaling page {} from {} to {} px wide",
                page_number,
                image.width(),
                width_px
            );
            image = image.resize(width_px, u32::MAX, FilterType::Triangle);
        }

        let rgba = image.to_rgba8();
        Ok(RenderedPage {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    fn page_label(&self, page_number: u32) -> Option<String> {
        self.page_path(page_number).ok().map(|p| file_name(p))
    }
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compare strings treating runs of ASCII digits as numbers.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let order = left
                    .len()
                    .cmp(&right.len())
                    .then_with(|| left.cmp(&right));
                if order != Ordering::Equal {
                    return order;
                }
            }
            (Some(x), Some(y)) => {
                let order = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if order != Ordering::Equal {
                    return order;
                }
                a.next();
                b.next();
            }
        }
    }
}

/// Consume a digit run, without leading zeros.
fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(|c| c.is_ascii_digit()) {
        digits.push(c);
        chars.next();
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pidmark-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_page(dir: &Path, name: &str, width: u32, height: u32) {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
        image.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_natural_order() {
        let mut names = vec!["page10.png", "page2.png", "Page1.png", "page02b.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["Page1.png", "page2.png", "page02b.png", "page10.png"]);
    }

    #[test]
    fn test_open_filters_and_orders_pages() {
        let dir = scratch_dir("order");
        write_page(&dir, "sheet10.png", 4, 2);
        write_page(&dir, "sheet2.png", 4, 2);
        std::fs::write(dir.join("notes.txt"), "not a page").unwrap();

        let pages = ImageDirectory::open(&dir).unwrap();
        assert_eq!(pages.page_count(), 2);
        assert_eq!(pages.page_label(1).as_deref(), Some("sheet2.png"));
        assert_eq!(pages.page_label(2).as_deref(), Some("sheet10.png"));
        assert!(pages.page_label(3).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_render_scales_to_width() {
        let dir = scratch_dir("render");
        write_page(&dir, "p1.png", 40, 20);

        let pages = ImageDirectory::open(&dir).unwrap();
        let page = pages.render_page(1, 20).unwrap();
        assert_eq!((page.width, page.height), (20, 10));
        assert_eq!(page.rgba.len(), 20 * 10 * 4);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_out_of_range_and_empty() {
        let dir = scratch_dir("empty");
        assert!(matches!(ImageDirectory::open(&dir), Err(PageError::Empty(_))));

        write_page(&dir, "p1.png", 2, 2);
        let pages = ImageDirectory::open(&dir).unwrap();
        assert!(matches!(
            pages.render_page(0, 10),
            Err(PageError::OutOfRange { page: 0, count: 1 })
        ));
        assert!(matches!(
            pages.render_page(2, 10),
            Err(PageError::OutOfRange { page: 2, count: 1 })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
