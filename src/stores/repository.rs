use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{Commit, NewRepository, Repository, RepositoryFile};

use super::record;

pub struct RepositoryStore<'a> {
    api: &'a ApiClient,
    pub repositories: Vec<Repository>,
    pub public_repositories: Vec<Repository>,
    pub repo_files: Vec<RepositoryFile>,
    pub commits: Vec<Commit>,
    pub error: Option<String>,
}

impl<'a> RepositoryStore<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            repositories: Vec::new(),
            public_repositories: Vec::new(),
            repo_files: Vec::new(),
            commits: Vec::new(),
            error: None,
        }
    }

    pub fn fetch_repositories(&mut self) -> Result<(), ApiError> {
        let repos = record(&mut self.error, self.api.get("/repositories"), "Failed to fetch repositories")?;
        self.repositories = repos;
        Ok(())
    }

    pub fn fetch_public_repositories(&mut self) -> Result<(), ApiError> {
        let repos = record(
            &mut self.error,
            self.api.get("/repositories/public"),
            "Failed to fetch public repositories",
        )?;
        self.public_repositories = repos;
        Ok(())
    }

    /// Creates the repository, then reloads the user's list.
    pub fn create_repository(&mut self, repo: &NewRepository<'_>) -> Result<Repository, ApiError> {
        let created =
            record(&mut self.error, self.api.post("/repositories", repo), "Failed to create repository")?;
        // The refetch records its own error; the create already succeeded.
        let _ = self.fetch_repositories();
        Ok(created)
    }

    pub fn fetch_repository_files(&mut self, repo_id: i64) -> Result<(), ApiError> {
        let files = record(
            &mut self.error,
            self.api.get(&format!("/repositories/{repo_id}/files")),
            "Failed to fetch files",
        )?;
        self.repo_files = files;
        Ok(())
    }

    pub fn fetch_commits(&mut self, repo_id: i64) -> Result<(), ApiError> {
        let commits = record(
            &mut self.error,
            self.api.get(&format!("/git/repositories/{repo_id}/commits")),
            "Failed to fetch commits",
        )?;
        self.commits = commits;
        Ok(())
    }
}
