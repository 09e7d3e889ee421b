use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Excel,
    Pdf,
    Json,
}

impl FileType {
    pub const ALL: [FileType; 4] = [Self::Csv, Self::Excel, Self::Pdf, Self::Json];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Determines the type from a file name's extension.
    pub fn from_filename(filename: &str) -> Result<Self, ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::MissingFilename);
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        Self::from_extension(extension).ok_or_else(|| ValidationError::UnsupportedType {
            extension: if extension.is_empty() {
                "unknown".to_string()
            } else {
                extension.to_lowercase()
            },
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "excel" => Ok(Self::Excel),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(FileType::from_extension("CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_extension("Pdf"), Some(FileType::Pdf));
    }

    #[test]
    fn test_excel_variants() {
        assert_eq!(FileType::from_extension("xlsx"), Some(FileType::Excel));
        assert_eq!(FileType::from_extension("xls"), Some(FileType::Excel));
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(FileType::from_filename("data.csv"), Ok(FileType::Csv));
        assert_eq!(FileType::from_filename("report.final.JSON"), Ok(FileType::Json));
    }

    #[test]
    fn test_from_filename_unsupported() {
        assert_eq!(
            FileType::from_filename("setup.exe"),
            Err(ValidationError::UnsupportedType {
                extension: "exe".to_string()
            })
        );
        assert_eq!(
            FileType::from_filename("README"),
            Err(ValidationError::UnsupportedType {
                extension: "unknown".to_string()
            })
        );
    }

    #[test]
    fn test_from_filename_empty() {
        assert_eq!(
            FileType::from_filename("  "),
            Err(ValidationError::MissingFilename)
        );
    }

    #[test]
    fn test_str_round_trip() {
        for file_type in FileType::ALL {
            assert_eq!(file_type.as_str().parse::<FileType>(), Ok(file_type));
        }
        assert!("docx".parse::<FileType>().is_err());
    }
}
