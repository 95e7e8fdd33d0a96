//! Static file serving.

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Serves files from a directory tree.
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the file system.
    ///
    /// Returns `None` when the path would leave the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let path = if path == "/" { "/index.html" } else { path };

        let mut relative = PathBuf::new();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(self.root.join(relative))
    }

    /// Streams the file at `path` to `conn`, or answers 404.
    pub fn serve<W: Write>(&self, conn: &mut W, path: &str) -> anyhow::Result<()> {
        let Some(abspath) = self.resolve(path) else {
            debug!(path, "path escapes the file root");
            Response::not_found().send(conn)?;
            return Ok(());
        };

        let file = match File::open(&abspath) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Response::not_found().send(conn)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata()?;
        if !metadata.is_file() {
            Response::not_found().send(conn)?;
            return Ok(());
        }

        let content_type = mime_guess::from_path(&abspath).first_or_octet_stream();

        ResponseBuilder::new(StatusCode::Ok)
            .header("content-type", content_type.essence_str())
            .body_reader(file, Some(metadata.len()))
            .build()
            .send(conn)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_stays_under_root() {
        let files = FileServer::new("www");

        assert_eq!(files.resolve("/"), Some(PathBuf::from("www/index.html")));
        assert_eq!(files.resolve("/a/./b.txt"), Some(PathBuf::from("www/a/b.txt")));
        assert_eq!(files.resolve("/a/../b.txt"), Some(PathBuf::from("www/b.txt")));
        assert_eq!(files.resolve("/../etc/passwd"), None);
    }
}
