use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, RgbImage};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::recipe::Recipe;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const MAX_WIDTH: u32 = 1200;
const JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image could not be processed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Image task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Local>,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedKind {
    Base64,
    File,
}

/// An image stored inside `recipes.json` instead of as a site asset.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedImage {
    pub recipe: String,
    pub title: String,
    pub kind: EmbeddedKind,
    pub filename: Option<String>,
    /// Estimated decoded size for base64 data, 0 for file references.
    pub size: usize,
    pub date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageLibrary {
    public_dir: PathBuf,
    assets_dir: PathBuf,
}

impl ImageLibrary {
    /// Images live in `public/recipe-images` and `src/assets` of the site.
    pub fn new(site_root: &Path) -> Self {
        Self {
            public_dir: site_root.join("public").join("recipe-images"),
            assets_dir: site_root.join("src").join("assets"),
        }
    }

    /// All images of both folders, newest first.
    pub async fn list(&self) -> Result<Vec<ImageInfo>, ImageError> {
        let mut images = Vec::new();
        scan(&self.public_dir, "public/recipe-images", "/recipe-images", &mut images).await?;
        scan(&self.assets_dir, "src/assets", "/assets", &mut images).await?;
        images.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(images)
    }

    pub fn embedded_images(recipes: &[Recipe]) -> Vec<EmbeddedImage> {
        recipes
            .iter()
            .filter(|r| !r.image.is_empty())
            .filter_map(|recipe| {
                let (kind, filename, size) = if recipe.image.starts_with("data:image") {
                    (EmbeddedKind::Base64, None, recipe.image.len() * 3 / 4)
                } else if !recipe.image.starts_with("http") {
                    (EmbeddedKind::File, Some(recipe.image.clone()), 0)
                } else {
                    return None;
                };
                let slug = recipe
                    .extra
                    .get("slug")
                    .and_then(|s| s.as_str())
                    .unwrap_or(&recipe.title)
                    .to_string();
                Some(EmbeddedImage {
                    recipe: slug,
                    title: recipe.title.clone(),
                    kind,
                    filename,
                    size,
                    date: recipe.updated_at.clone().or_else(|| recipe.created_at.clone()),
                })
            })
            .collect()
    }

    /// Stores an uploaded image as `<slug>_<timestamp>.jpg` and returns the
    /// file name.
    pub async fn save_upload(&self, bytes: Vec<u8>, slug: &str) -> Result<String, ImageError> {
        let encoded = tokio::task::spawn_blocking(move || prepare_upload(&bytes))
            .await
            .map_err(|e| ImageError::Task(e.to_string()))??;

        tokio::fs::create_dir_all(&self.public_dir).await?;
        let filename = format!("{}_{}.jpg", slug, Local::now().format("%Y%m%d_%H%M%S"));
        tokio::fs::write(self.public_dir.join(&filename), encoded).await?;
        info!("Saved recipe image {}", filename);
        Ok(filename)
    }
}

pub fn image_url(filename: &str) -> String {
    if filename.is_empty() {
        String::new()
    } else {
        format!("/recipe-images/{}", filename)
    }
}

async fn scan(dir: &Path, source: &str, url_prefix: &str, out: &mut Vec<ImageInfo>) -> Result<(), ImageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let filename = entry.file_name().to_string_lossy().to_string();
        let is_image = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()));
        if !is_image {
            continue;
        }
        let metadata = entry.metadata().await?;
        let modified = metadata
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        out.push(ImageInfo {
            url: format!("{}/{}", url_prefix, filename),
            path: entry.path(),
            filename,
            size: metadata.len(),
            modified,
            source: source.to_string(),
        });
    }
    Ok(())
}

/// Decodes, flattens transparency onto white, limits the width and
/// re-encodes as JPEG.
pub fn prepare_upload(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let image = image::load_from_memory(bytes)?;
    let mut rgb = flatten_on_white(&image);

    if rgb.width() > MAX_WIDTH {
        let height = (rgb.height() as f64 * MAX_WIDTH as f64 / rgb.width() as f64) as u32;
        rgb = image::imageops::resize(&rgb, MAX_WIDTH, height.max(1), FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(out)
}

fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageOutputFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_prepare_upload_resizes_and_flattens() {
        let encoded = prepare_upload(&png(2400, 600, Rgba([0, 0, 0, 0]))).unwrap();
        let decoded = image::load_from_memory(&encoded).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (1200, 300));
        // fully transparent turns white
        assert!(decoded.get_pixel(10, 10).0.iter().all(|&c| c > 245));
    }

    #[test]
    fn test_prepare_upload_rejects_garbage() {
        assert!(matches!(prepare_upload(b"not an image"), Err(ImageError::Image(_))));
    }

    #[test]
    fn test_embedded_images() {
        let recipes = vec![
            Recipe { title: "A".into(), image: "data:image/png;base64,AAAA".into(), ..Default::default() },
            Recipe { title: "B".into(), image: "b.jpg".into(), ..Default::default() },
            Recipe { title: "C".into(), image: "https://cdn/x.jpg".into(), ..Default::default() },
            Recipe { title: "D".into(), ..Default::default() },
        ];
        let embedded = ImageLibrary::embedded_images(&recipes);
        assert_eq!(embedded.len(), 2);
        assert_eq!(embedded[0].kind, EmbeddedKind::Base64);
        assert_eq!(embedded[0].size, 26 * 3 / 4);
        assert_eq!(embedded[1].filename.as_deref(), Some("b.jpg"));
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let library = ImageLibrary::new(dir.path());
        assert!(library.list().await.unwrap().is_empty());

        let filename = library
            .save_upload(png(20, 10, Rgba([200, 10, 10, 255])), "linsen-dal")
            .await
            .unwrap();
        assert!(filename.starts_with("linsen-dal_") && filename.ends_with(".jpg"));

        std::fs::create_dir_all(dir.path().join("src/assets")).unwrap();
        std::fs::write(dir.path().join("src/assets/hero.PNG"), png(2, 2, Rgba([0, 0, 0, 255]))).unwrap();
        std::fs::write(dir.path().join("src/assets/notes.txt"), "x").unwrap();

        let images = library.list().await.unwrap();
        assert_eq!(images.len(), 2);
        assert!(images.iter().any(|i| i.url == format!("/recipe-images/{}", filename)));
        assert!(images.iter().any(|i| i.url == "/assets/hero.PNG"));
        assert_eq!(image_url(""), "");
    }
}
