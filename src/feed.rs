//! Dashboard feed: paginated posts with likes and comments.

use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{Comment, LikeResponse, NewComment, NewPost, Page, Post};

pub const PAGE_SIZE: u32 = 10;

pub struct Feed<'a> {
    api: &'a ApiClient,
    pub posts: Vec<Post>,
    pub current_page: u32,
    pub total_pages: u32,
    pub error: Option<String>,
}

impl<'a> Feed<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api, posts: Vec::new(), current_page: 0, total_pages: 0, error: None }
    }

    pub fn fetch_posts(&mut self, page: u32) -> Result<(), ApiError> {
        let page_param = page.to_string();
        let size_param = PAGE_SIZE.to_string();
        let result: Result<Page<Post>, _> =
            self.api.get_with("/posts", &[("page", page_param.as_str()), ("size", size_param.as_str())]);

        match result {
            Ok(page) => {
                debug!(number = page.number, total = page.total_pages, "fetched posts");
                self.posts = page.content;
                self.current_page = page.number;
                self.total_pages = page.total_pages;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch posts");
                self.error = Some("Failed to fetch posts".to_string());
                Err(e)
            }
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page.saturating_add(1) < self.total_pages
    }

    /// True when the last fetch asked for a page the server says is past the end.
    pub fn is_past_end(&self) -> bool {
        self.current_page > 0 && self.current_page >= self.total_pages
    }

    /// Returns `false` without a request when the control is disabled.
    pub fn previous_page(&mut self) -> Result<bool, ApiError> {
        if !self.can_go_previous() {
            return Ok(false);
        }
        self.fetch_posts(self.current_page - 1).map(|()| true)
    }

    pub fn next_page(&mut self) -> Result<bool, ApiError> {
        if !self.can_go_next() {
            return Ok(false);
        }
        self.fetch_posts(self.current_page.saturating_add(1)).map(|()| true)
    }

    /// Jumps to a page within the range reported by the last fetch.
    pub fn goto_page(&mut self, page: u32) -> Result<(), ApiError> {
        if page == self.current_page {
            return Ok(());
        }
        if page >= self.total_pages {
            return Err(ApiError::Validation(format!(
                "Page {} does not exist (there are {} pages)",
                page + 1,
                self.total_pages
            )));
        }
        self.fetch_posts(page)
    }

    /// Publishes a post and reloads the first page.
    pub fn create_post(&mut self, title: &str, content: &str) -> Result<(), ApiError> {
        if title.trim().is_empty() || content.trim().is_empty() {
            let msg = "Please fill in both title and content".to_string();
            self.error = Some(msg.clone());
            return Err(ApiError::Validation(msg));
        }

        if let Err(e) = self.api.post::<_, serde_json::Value>("/posts", &NewPost { title, content }) {
            warn!(error = %e, "failed to create post");
            self.error = Some("Failed to create post".to_string());
            return Err(e);
        }

        self.fetch_posts(0)
    }

    /// Toggles the like flag; the returned flag is the server's.
    pub fn toggle_like(&mut self, post_id: i64) -> Result<bool, ApiError> {
        let response: LikeResponse = self
            .api
            .post_empty(&format!("/posts/{post_id}/like"))
            .inspect_err(|e| warn!(post_id, error = %e, "failed to like/unlike post"))?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            apply_like(post, response.liked);
        }
        Ok(response.liked)
    }

    /// Blank comments are ignored without a request.
    pub fn add_comment(&mut self, post_id: i64, content: &str) -> Result<Option<Comment>, ApiError> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let comment: Comment = self
            .api
            .post(&format!("/posts/{post_id}/comments"), &NewComment { content })
            .inspect_err(|e| warn!(post_id, error = %e, "failed to add comment"))?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.comments.push(comment.clone());
        }
        Ok(Some(comment))
    }

    /// Replaces the cached comments of `post_id` with the server's list.
    pub fn fetch_comments(&mut self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        let comments: Vec<Comment> = self
            .api
            .get(&format!("/posts/{post_id}/comments"))
            .inspect_err(|e| warn!(post_id, error = %e, "failed to fetch comments"))?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.comments.clone_from(&comments);
        }
        Ok(comments)
    }
}

/// Applies the server's like flag to the local copy, moving the count by one.
pub fn apply_like(post: &mut Post, liked: bool) {
    post.liked = liked;
    post.like_count += if liked { 1 } else { -1 };
}
