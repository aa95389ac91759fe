//! Category catalog for face lookup.
//!
//! A `Category` is a named pool of distinct face references. The
//! `CategoryCatalog` stores every category a game can be started with and
//! is read-only to the rest of the engine once built.
//!
//! ## Example
//!
//! ```
//! use memory_match::cards::{Category, CategoryCatalog};
//!
//! let mut catalog = CategoryCatalog::new();
//! catalog.register(Category::new("Shapes", ["circle", "square", "triangle"]));
//!
//! let shapes = catalog.get("Shapes").unwrap();
//! assert_eq!(shapes.len(), 3);
//! assert!(catalog.get("shapes").is_none()); // case-sensitive
//! ```

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::card::FaceRef;
use crate::core::Result;

/// File extensions accepted as face images when loading from disk.
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "gif"];

/// Colour-code faces shipped with the built-in categories.
/// Eighteen distinct faces cover the largest (6x6) board.
const DEFAULT_FACES: [&str; 18] = [
    "#E74C3C", "#2ECC71", "#3498DB", "#9B59B6", "#F1C40F", "#E67E22",
    "#1ABC9C", "#ECF0F1", "#95A5A6", "#D35400", "#2980B9", "#27AE60",
    "#8E44AD", "#2C3E50", "#16A085", "#C0392B", "#F39C12", "#7F8C8D",
];

/// Names of the built-in categories.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["Animals", "Nature", "Food"];

/// A named pool of face references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    faces: Vec<FaceRef>,
}

impl Category {
    /// Create a category. Duplicate faces are dropped, first occurrence wins.
    pub fn new<I, F>(name: impl Into<String>, faces: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FaceRef>,
    {
        let mut seen = FxHashSet::default();
        let faces = faces
            .into_iter()
            .map(Into::into)
            .filter(|face: &FaceRef| seen.insert(face.clone()))
            .collect();

        Self {
            name: name.into(),
            faces,
        }
    }

    /// Load a category from a directory of images.
    ///
    /// Faces are the `.jpg`, `.png` and `.gif` files directly inside `dir`,
    /// sorted by path so the pool order is stable across platforms.
    pub fn from_dir(name: impl Into<String>, dir: impl AsRef<Path>) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let faces: Vec<FaceRef> = paths
            .iter()
            .map(|p| FaceRef::new(p.to_string_lossy()))
            .collect();
        Ok(Self::new(name, faces))
    }

    /// The distinct faces in this category.
    #[must_use]
    pub fn faces(&self) -> &[FaceRef] {
        &self.faces
    }

    /// Number of distinct faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Check if the category has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Registry of categories keyed by (case-sensitive) name.
#[derive(Clone, Debug, Default)]
pub struct CategoryCatalog {
    categories: FxHashMap<String, Category>,
}

impl CategoryCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the three built-in colour categories.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for name in DEFAULT_CATEGORIES {
            catalog.register(Category::new(name, DEFAULT_FACES));
        }
        catalog
    }

    /// Load one category per subdirectory of `root`.
    ///
    /// Subdirectories with no images are skipped.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self> {
        let mut catalog = Self::new();
        for entry in std::fs::read_dir(root.as_ref())? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let category = Category::from_dir(name, &path)?;
            if !category.is_empty() {
                catalog.register(category);
            }
        }
        Ok(catalog)
    }

    /// Register a category, replacing any with the same name.
    pub fn register(&mut self, category: Category) {
        self.categories.insert(category.name.clone(), category);
    }

    /// Get a category by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Check if a category is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Category names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterate over all categories.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }
}
