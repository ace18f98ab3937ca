//! Static extension → category table used by the `BY_TYPE` algorithm.
//!
//! Every category maps to a target subdirectory, possibly nested
//! (e.g. `Documents/Word`). Extensions that are not in the table fall into
//! [`Category::Other`].
//!
//! # Examples
//!
//! ```
//! use restruct::file_category::{Category, CategoryMapper};
//!
//! let mapper = CategoryMapper::default();
//! assert_eq!(mapper.categorize(Some("jpg")), Category::Images);
//! assert_eq!(mapper.categorize(Some("DOCX")), Category::Word);
//! assert_eq!(mapper.categorize(Some("unknownext")).dir_name(), "Other");
//! ```

use std::collections::HashMap;

/// A target category for `BY_TYPE` grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Images,
    Word,
    Pdf,
    Text,
    Excel,
    PowerPoint,
    Python,
    JavaScript,
    Web,
    Java,
    C,
    Cpp,
    Headers,
    Data,
    Archives,
    WindowsExecutables,
    UnixExecutables,
    MacExecutables,
    Audio,
    Video,
    Config,
    Databases,
    Fonts,
    /// Unknown or missing extension.
    Other,
}

impl Category {
    /// Returns the subdirectory, relative to the session base, for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use restruct::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Text.dir_name(), "Documents/Text");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Word => "Documents/Word",
            Category::Pdf => "Documents/PDF",
            Category::Text => "Documents/Text",
            Category::Excel => "Documents/Excel",
            Category::PowerPoint => "Documents/PowerPoint",
            Category::Python => "Code/Python",
            Category::JavaScript => "Code/JavaScript",
            Category::Web => "Code/Web",
            Category::Java => "Code/Java",
            Category::C => "Code/C",
            Category::Cpp => "Code/C++",
            Category::Headers => "Code/Headers",
            Category::Data => "Code/Data",
            Category::Archives => "Archives",
            Category::WindowsExecutables => "Executables/Windows",
            Category::UnixExecutables => "Executables/Unix",
            Category::MacExecutables => "Executables/Mac",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Config => "Config",
            Category::Databases => "Databases",
            Category::Fonts => "Fonts",
            Category::Other => "Other",
        }
    }
}

/// Maps file extensions to categories.
///
/// Lookups are case-insensitive. The table can be extended at runtime with
/// [`CategoryMapper::add_extension_mapping`].
#[derive(Debug, Clone)]
pub struct CategoryMapper {
    extension_map: HashMap<String, Category>,
}

impl CategoryMapper {
    /// Creates a mapper with the standard table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        let table: &[(Category, &[&str])] = &[
            (
                Category::Images,
                &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg", "webp", "ico"],
            ),
            (Category::Word, &["doc", "docx", "odt"]),
            (Category::Pdf, &["pdf"]),
            (Category::Text, &["txt", "rtf"]),
            (Category::Excel, &["xls", "xlsx", "csv", "ods"]),
            (Category::PowerPoint, &["ppt", "pptx", "odp"]),
            (Category::Python, &["py"]),
            (Category::JavaScript, &["js"]),
            (Category::Web, &["html", "css"]),
            (Category::Java, &["java"]),
            (Category::C, &["c"]),
            (Category::Cpp, &["cpp"]),
            (Category::Headers, &["h"]),
            (Category::Data, &["json", "xml"]),
            (Category::Archives, &["zip", "rar", "tar", "gz", "7z"]),
            (Category::WindowsExecutables, &["exe", "dll", "bat"]),
            (Category::UnixExecutables, &["sh"]),
            (Category::MacExecutables, &["app"]),
            (Category::Audio, &["mp3", "wav", "ogg", "flac", "aac"]),
            (Category::Video, &["mp4", "avi", "mkv", "mov", "wmv"]),
            (Category::Config, &["ini", "yaml", "yml", "toml", "conf"]),
            (Category::Databases, &["db", "sqlite", "sql"]),
            (Category::Fonts, &["ttf", "otf", "woff", "woff2"]),
        ];

        for (category, extensions) in table {
            for ext in *extensions {
                self.add_extension_mapping(ext, *category);
            }
        }
    }

    /// Adds or overrides a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Maps a file extension (without the dot) to a category, if known.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Determines the category for an optional extension, defaulting to `Other`.
    pub fn categorize(&self, ext: Option<&str>) -> Category {
        ext.and_then(|e| self.extension_to_category(e))
            .unwrap_or(Category::Other)
    }
}

impl Default for CategoryMapper {
    fn default() -> Self {
        Self::new()
    }
}
