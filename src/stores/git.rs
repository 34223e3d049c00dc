use std::path::Path;

use tracing::info;
use ureq::unversioned::multipart::Form;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{Commit, DownloadUrl, FileStats, RepositoryFile};

use super::record;

/// Commit history and working files of one repository at a time.
pub struct GitStore<'a> {
    api: &'a ApiClient,
    pub commits: Vec<Commit>,
    pub commit_files: Vec<String>,
    pub repository_files: Vec<RepositoryFile>,
    pub current_commit: Option<Commit>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<'a> GitStore<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            commits: Vec::new(),
            commit_files: Vec::new(),
            repository_files: Vec::new(),
            current_commit: None,
            loading: false,
            error: None,
        }
    }

    fn track<T>(
        &mut self,
        default: &str,
        call: impl FnOnce(&ApiClient) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let api = self.api;
        self.loading = true;
        self.error = None;
        let result = call(api);
        self.loading = false;
        record(&mut self.error, result, default)
    }

    /// Uploads `files` as one commit, then reloads the history.
    pub fn create_commit<P: AsRef<Path>>(
        &mut self,
        repo_id: i64,
        message: &str,
        files: &[P],
    ) -> Result<serde_json::Value, ApiError> {
        if message.trim().is_empty() {
            return record(
                &mut self.error,
                Err(ApiError::Validation("Commit message is required".into())),
                "Failed to create commit",
            );
        }

        let response = self.track("Failed to create commit", |api| {
            let form = files
                .iter()
                .try_fold(Form::new().text("message", message), |form, path| {
                    form.file("files", path.as_ref())
                })?;
            api.post_multipart(&format!("/git/repositories/{repo_id}/commit"), form)
        })?;

        info!(repo_id, files = files.len(), "commit created");
        // A failed refetch only sets `error`; the commit itself landed.
        let _ = self.fetch_commit_history(repo_id);
        Ok(response)
    }

    pub fn fetch_commit_history(&mut self, repo_id: i64) -> Result<&[Commit], ApiError> {
        self.commits = self.track("Failed to fetch commit history", |api| {
            api.get(&format!("/git/repositories/{repo_id}/commits"))
        })?;
        Ok(&self.commits)
    }

    pub fn fetch_commit(&mut self, hash: &str) -> Result<&Commit, ApiError> {
        let commit: Commit =
            self.track("Failed to fetch commit", |api| api.get(&format!("/git/commits/{hash}")))?;
        Ok(self.current_commit.insert(commit))
    }

    pub fn fetch_commit_files(&mut self, hash: &str) -> Result<&[String], ApiError> {
        self.commit_files = self.track("Failed to fetch commit files", |api| {
            api.get(&format!("/git/commits/{hash}/files"))
        })?;
        Ok(&self.commit_files)
    }

    pub fn fetch_repository_files(&mut self, repo_id: i64) -> Result<&[RepositoryFile], ApiError> {
        self.repository_files = self.track("Failed to fetch repository files", |api| {
            api.get(&format!("/git/repositories/{repo_id}/files"))
        })?;
        Ok(&self.repository_files)
    }

    /// Uploads one file under `file_path`, then reloads the file list.
    pub fn add_file_to_repository(
        &mut self,
        repo_id: i64,
        file: &Path,
        file_path: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self.track("Failed to add file to repository", |api| {
            let form = Form::new().file("file", file)?.text("filePath", file_path);
            api.post_multipart(&format!("/git/repositories/{repo_id}/files"), form)
        })?;

        let _ = self.fetch_repository_files(repo_id);
        Ok(response)
    }

    /// Deletes a file, then reloads the file list.
    pub fn delete_file_from_repository(
        &mut self,
        repo_id: i64,
        file_name: &str,
        file_path: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self.track("Failed to delete file from repository", |api| {
            api.delete(
                &format!("/git/repositories/{repo_id}/files"),
                &[("fileName", file_name), ("filePath", file_path)],
            )
        })?;

        let _ = self.fetch_repository_files(repo_id);
        Ok(response)
    }

    /// Raw file contents; writing them somewhere is up to the caller.
    pub fn download_file(
        &mut self,
        repo_id: i64,
        file_name: &str,
        file_path: &str,
    ) -> Result<Vec<u8>, ApiError> {
        self.track("Failed to download file", |api| {
            api.get_bytes(
                &format!("/git/repositories/{repo_id}/files/download"),
                &[("fileName", file_name), ("filePath", file_path)],
            )
        })
    }

    pub fn get_file_download_url(
        &mut self,
        repo_id: i64,
        file_name: &str,
        file_path: &str,
    ) -> Result<String, ApiError> {
        let url: DownloadUrl = self.track("Failed to get file download URL", |api| {
            api.get_with(
                &format!("/git/repositories/{repo_id}/files/url"),
                &[("fileName", file_name), ("filePath", file_path)],
            )
        })?;
        Ok(url.download_url)
    }

    pub fn clear_state(&mut self) {
        self.commits.clear();
        self.commit_files.clear();
        self.repository_files.clear();
        self.current_commit = None;
        self.error = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn file_exists(&self, file_name: &str, file_path: &str) -> bool {
        self.get_file_by_name_and_path(file_name, file_path).is_some()
    }

    pub fn get_file_by_name_and_path(&self, file_name: &str, file_path: &str) -> Option<&RepositoryFile> {
        self.repository_files.iter().find(|f| f.file_name == file_name && f.file_path == file_path)
    }

    pub fn get_files_by_path(&self, prefix: &str) -> Vec<&RepositoryFile> {
        self.repository_files.iter().filter(|f| f.file_path.starts_with(prefix)).collect()
    }

    pub fn get_file_stats(&self) -> FileStats {
        self.repository_files.iter().fold(FileStats::default(), |mut stats, file| {
            stats.total_files += 1;
            stats.total_size += file.size;
            *stats.file_types.entry(file.extension().to_string()).or_default() += 1;
            stats
        })
    }
}
