use anyhow::{Result, bail};
use vault_client::feed::Feed;
use vault_client::models::Post;
use vault_client::{ApiClient, Route};

use super::{enter, fail, separator};

/// `page` is 1-based here; the API counts from zero.
pub fn show(api: &ApiClient, page: u32) -> Result<()> {
    enter(api, Route::Dashboard)?;
    let mut feed = Feed::new(api);

    feed.fetch_posts(page.saturating_sub(1)).map_err(|e| fail(&e, feed.error.as_deref()))?;
    if feed.is_past_end() {
        bail!("Page {page} does not exist (there are {} pages)", feed.total_pages);
    }

    if feed.posts.is_empty() {
        println!("No posts yet. Start the conversation with `vault post <title> <content>`.");
        return Ok(());
    }

    for post in &feed.posts {
        print_post(post);
    }

    separator(70);
    println!("Page {} of {}", feed.current_page + 1, feed.total_pages.max(1));
    if feed.can_go_previous() {
        println!("  previous: vault feed --page {}", feed.current_page);
    }
    if feed.can_go_next() {
        println!("  next:     vault feed --page {}", feed.current_page + 2);
    }
    Ok(())
}

pub fn post(api: &ApiClient, title: &str, content: &str) -> Result<()> {
    enter(api, Route::Dashboard)?;
    let mut feed = Feed::new(api);
    feed.create_post(title, content).map_err(|e| fail(&e, feed.error.as_deref()))?;

    println!("Published \"{title}\".");
    if let Some(newest) = feed.posts.first() {
        println!();
        print_post(newest);
    }
    Ok(())
}

pub fn like(api: &ApiClient, post_id: i64) -> Result<()> {
    enter(api, Route::Dashboard)?;
    let mut feed = Feed::new(api);
    let liked = feed.toggle_like(post_id).map_err(|e| fail(&e, None))?;
    println!("{} post #{post_id}.", if liked { "Liked" } else { "Unliked" });
    Ok(())
}

pub fn comment(api: &ApiClient, post_id: i64, content: &str) -> Result<()> {
    enter(api, Route::Dashboard)?;
    let mut feed = Feed::new(api);
    match feed.add_comment(post_id, content).map_err(|e| fail(&e, None))? {
        Some(c) => println!("Commented on post #{post_id} as {}.", c.author_username),
        None => println!("Nothing to post: the comment is empty."),
    }
    Ok(())
}

pub fn comments(api: &ApiClient, post_id: i64) -> Result<()> {
    enter(api, Route::Dashboard)?;
    let mut feed = Feed::new(api);
    let comments = feed.fetch_comments(post_id).map_err(|e| fail(&e, None))?;

    if comments.is_empty() {
        println!("No comments on post #{post_id}.");
    }
    for c in &comments {
        println!("{}  {}", c.author_username, date(&c.created_at));
        println!("    {}", c.content);
    }
    Ok(())
}

fn print_post(post: &Post) {
    let heart = if post.liked { "♥" } else { "♡" };
    println!(
        "#{:<5} {}  by {} on {}  {heart} {}  {} comments",
        post.id,
        post.title,
        post.author_username,
        date(&post.created_at),
        post.like_count,
        post.comments.len()
    );
    for line in post.content.lines() {
        println!("       {line}");
    }
    for c in &post.comments {
        println!("       └ {}: {}", c.author_username, c.content);
    }
    println!();
}

fn date(timestamp: &str) -> &str {
    timestamp.split_once('T').map_or(timestamp, |(day, _)| day)
}
