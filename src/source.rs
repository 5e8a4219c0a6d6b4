//! Reading the four GMS grid exports from disk

use crate::Error;
use std::path::{Path, PathBuf};

/// Locations of the four files making up a GMS grid export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    /// grid geometry (origin and cell sizes)
    pub xyz: PathBuf,
    /// per-cell material ids
    pub mat: PathBuf,
    /// per-cell top elevations
    pub top: PathBuf,
    /// per-cell bottom elevations and active flags
    pub bot: PathBuf,
}

impl SourcePaths {
    pub fn new<P: Into<PathBuf>>(xyz: P, mat: P, top: P, bot: P) -> Self {
        Self {
            xyz: xyz.into(),
            mat: mat.into(),
            top: top.into(),
            bot: bot.into(),
        }
    }
}

/// Raw text of the four exports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSources {
    pub xyz: String,
    pub mat: String,
    pub top: String,
    pub bot: String,
}

impl GridSources {
    pub fn new<S: Into<String>>(xyz: S, mat: S, top: S, bot: S) -> Self {
        Self {
            xyz: xyz.into(),
            mat: mat.into(),
            top: top.into(),
            bot: bot.into(),
        }
    }

    /// Read all four files. The reads run concurrently and this returns once all of them
    /// have finished; the first failure (in `xyz, mat, top, bot` order) is returned.
    pub fn read(paths: &SourcePaths) -> Result<Self, Error> {
        let ((xyz, mat), (top, bot)) = rayon::join(
            || rayon::join(|| read_source(&paths.xyz), || read_source(&paths.mat)),
            || rayon::join(|| read_source(&paths.top), || read_source(&paths.bot)),
        );

        Ok(Self {
            xyz: xyz?,
            mat: mat?,
            top: top?,
            bot: bot?,
        })
    }
}

fn read_source(path: &Path) -> Result<String, Error> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("read {} bytes from {}", text.len(), path.display());

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let dir = std::env::temp_dir().join("gms2mesh_missing_source");
        let paths = SourcePaths::new(
            dir.join("xyz.txt"),
            dir.join("mat.txt"),
            dir.join("top.txt"),
            dir.join("bot.txt"),
        );

        match GridSources::read(&paths) {
            Err(Error::Read { path, .. }) => assert_eq!(path, dir.join("xyz.txt")),
            other => panic!("expected a read error, got {:?}", other),
        }
    }

    #[test]
    fn reads_all_four() {
        let dir = std::env::temp_dir().join("gms2mesh_read_sources");
        std::fs::create_dir_all(&dir).unwrap();

        let names = ["xyz.txt", "mat.txt", "top.txt", "bot.txt"];
        for name in names {
            std::fs::write(dir.join(name), format!("header\n{}\n", name)).unwrap();
        }

        let paths = SourcePaths::new(
            dir.join(names[0]),
            dir.join(names[1]),
            dir.join(names[2]),
            dir.join(names[3]),
        );
        let sources = GridSources::read(&paths).unwrap();

        assert_eq!(sources.xyz, "header\nxyz.txt\n");
        assert_eq!(sources.mat, "header\nmat.txt\n");
        assert_eq!(sources.top, "header\ntop.txt\n");
        assert_eq!(sources.bot, "header\nbot.txt\n");
    }
}
