//! Persistence for the settings files under `~/.yieldscope`.
//! A stored struct implements Serialize and Deserialize from serde and picks
//! either TOML or YAML as its on-disk format.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::{de::DeserializeOwned, Serialize};

pub enum FileFormat {
    TOML,
    YAML,
}

pub trait DiskStorageInterface
where
    Self: Sized + Debug + Default + Serialize + DeserializeOwned,
{
    const FILE_NAME: &'static str;
    const FORMAT: FileFormat;

    /// Directory holding every settings file
    fn dir() -> crate::Result<PathBuf> {
        let dirs = BaseDirs::new().ok_or(crate::Error::BaseDirsFailed)?;
        Ok(dirs.home_dir().join(".yieldscope"))
    }

    /// Get the path to the file
    fn path() -> crate::Result<PathBuf> {
        let path = Self::dir()?
            .join(Self::FILE_NAME)
            .with_extension(match Self::FORMAT {
                FileFormat::TOML => "toml".to_string(),
                FileFormat::YAML => "yaml".to_string(),
            });
        Ok(path)
    }

    /// Load the content from the file if it exists otherwise return the default value
    fn load() -> crate::Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &Path) -> crate::Result<Self> {
        let path = path.to_path_buf();

        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| crate::Error::FileReadFailed(path.clone(), e))?;

            match Self::FORMAT {
                FileFormat::TOML => {
                    toml::from_str(&content).map_err(|e| crate::Error::TomlParsingFailed(path, e))
                }
                FileFormat::YAML => serde_yaml::from_str(&content)
                    .map_err(|e| crate::Error::YamlParsingFailed(path, e)),
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save content to a file, creating the directories and file as necessary
    fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> crate::Result<()> {
        let path = path.to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| crate::Error::CreateDirAllFailed(path.clone(), e))?;
        }

        let content = match Self::FORMAT {
            FileFormat::TOML => toml::to_string_pretty(self)
                .map_err(|e| crate::Error::TomlFormattingFailed(format!("{self:?}"), e))?,
            FileFormat::YAML => serde_yaml::to_string(self)
                .map_err(|e| crate::Error::YamlFormattingFailed(format!("{self:?}"), e))?,
        };

        fs::write(&path, content).map_err(|e| crate::Error::FileWriteFailed(path, e))?;

        Ok(())
    }
}
