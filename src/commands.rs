//! Terminal front end: runs one command against the view-models and prints
//! the result followed by any queued notices.

use std::io::Write;

use crate::api::models::{Comment, FitnessTask, Post};
use crate::config::{AdminCommand, Command};
use crate::nav::Route;
use crate::notice::{Notice, NoticeLevel};
use crate::quotes;
use crate::state::AppContext;
use crate::views::admin::AdminView;
use crate::views::comments::CommentsView;
use crate::views::drawer::NavDrawer;
use crate::views::feed::FeedView;
use crate::views::fitness::FitnessView;
use crate::views::verify::{EmailVerificationView, ResendVerificationView};
use crate::views::SyncState;

const BAR_WIDTH: usize = 20;

pub async fn run<W: Write>(ctx: &AppContext, command: Command, out: &mut W) -> anyhow::Result<()> {
    let needs_login = !matches!(
        command,
        Command::Login { .. }
            | Command::Logout
            | Command::Whoami
            | Command::Quote
            | Command::VerifyEmail { .. }
            | Command::ResendVerification { .. }
    );
    if needs_login && !ctx.session.reader().is_authenticated() {
        writeln!(out, "Not logged in. Run `vetsoc login <username> <password>` first.")?;
        return Ok(());
    }

    match command {
        Command::Login { username, password } => {
            match ctx.session.login(&ctx.client, &username, &password).await {
                Ok(()) => writeln!(out, "Logged in as {}", username)?,
                Err(e) => ctx.notifier.push(e.notice("Login failed")),
            }
        }
        Command::Logout => {
            let mut drawer = NavDrawer::new(ctx);
            drawer.logout(&ctx.session).await?;
            writeln!(out, "Logged out")?;
        }
        Command::Whoami => {
            let mut drawer = NavDrawer::new(ctx);
            match ctx.session.reader().username() {
                Some(username) => {
                    drawer.sync_profile_pic().await;
                    writeln!(out, "{} [{}]", username, drawer.badge().unwrap_or("veteran"))?;
                    if !drawer.profile_pic().is_empty() {
                        writeln!(out, "avatar: {}", drawer.profile_pic())?;
                    }
                }
                None => writeln!(out, "Not logged in")?,
            }
            let menu: Vec<_> = drawer.menu().into_iter().map(|(label, _)| label).collect();
            writeln!(out, "menu: {}", menu.join(" | "))?;
        }
        Command::Feed { topics } => {
            let mut feed = FeedView::new(ctx);
            feed.load().await;
            feed.load_trending().await;
            if !topics.is_empty() {
                for topic in &topics {
                    feed.toggle_topic(topic);
                }
                feed.apply_filter().await;
            }
            render_feed(&feed, out)?;
        }
        Command::Like { post_id } => {
            let mut feed = FeedView::new(ctx);
            feed.load().await;
            let state = feed.toggle_like(&post_id).await;
            match feed.post(&post_id) {
                Some(post) => writeln!(
                    out,
                    "{} {} ({} likes)",
                    if feed.is_liked(&post_id) { "Liked" } else { "Unliked" },
                    post_id,
                    post.likes
                )?,
                None if state == SyncState::Synced => writeln!(out, "No post {}", post_id)?,
                None => {}
            }
        }
        Command::Comments { post_id } => {
            let mut view = CommentsView::new(ctx, post_id);
            view.load().await;
            if view.comments().is_empty() {
                writeln!(out, "No comments yet.")?;
            }
            for comment in view.comments() {
                render_comment(comment, view.can_delete(comment), out)?;
            }
        }
        Command::Comment { post_id, text } => {
            let mut view = CommentsView::new(ctx, post_id);
            view.set_draft(text);
            if view.add_comment().await {
                if let Some(comment) = view.comments().last() {
                    render_comment(comment, true, out)?;
                }
            }
        }
        Command::DeletePost { post_id } => {
            let mut feed = FeedView::new(ctx);
            feed.load().await;
            if feed.post(&post_id).is_none() {
                writeln!(out, "No post {}", post_id)?;
            } else {
                feed.delete_post(&post_id).await;
            }
        }
        Command::Fitness => {
            let mut view = FitnessView::new(ctx);
            if let Some(hint) = view.admin_hint() {
                writeln!(out, "{}", hint)?;
            } else {
                view.load().await;
                view.load_quote(chrono::Local::now().date_naive()).await;
                render_fitness(&view, out)?;
            }
        }
        Command::FitnessToggle { task_id } => {
            let mut view = FitnessView::new(ctx);
            view.load().await;
            view.toggle_task(&task_id).await;
            render_fitness(&view, out)?;
        }
        Command::FitnessAdd { description } => {
            let mut view = FitnessView::new(ctx);
            view.load().await;
            view.set_draft(description);
            view.add_task().await;
            render_fitness(&view, out)?;
        }
        Command::FitnessDelete { task_id } => {
            let mut view = FitnessView::new(ctx);
            view.load().await;
            view.delete_task(&task_id).await;
            render_fitness(&view, out)?;
        }
        Command::Quote => {
            let quote =
                quotes::daily_quote(ctx.store.as_ref(), chrono::Local::now().date_naive()).await?;
            writeln!(out, "\"{}\"\n  - {}", quote.text, quote.author)?;
        }
        Command::VerifyEmail { token } => {
            let mut view = EmailVerificationView::new(ctx);
            view.verify(token.as_deref()).await;
            writeln!(out, "{}", view.message())?;
            if view.can_request_new_link() {
                writeln!(out, "Request a new link with `vetsoc resend-verification <email>`.")?;
            }
        }
        Command::ResendVerification { email } => {
            let mut view = ResendVerificationView::new(ctx);
            view.set_email(email);
            view.submit().await;
            writeln!(out, "{}", view.message())?;
        }
        Command::Admin(admin) => {
            let view = AdminView::new(ctx);
            match admin {
                AdminCommand::DeleteUser { username } => view.delete_user(&username).await,
                AdminCommand::DeleteGroup { group_id } => view.delete_group(&group_id).await,
                AdminCommand::DeleteGroupPost { group_id, post_id } => {
                    view.delete_group_post(&group_id, &post_id).await
                }
            };
        }
    }

    if ctx.navigator.current() == Some(Route::Login) && needs_login {
        writeln!(out, "Session expired. Please log in again.")?;
    }
    for notice in ctx.notifier.drain() {
        render_notice(&notice, out)?;
    }
    Ok(())
}

fn render_feed<W: Write>(feed: &FeedView, out: &mut W) -> std::io::Result<()> {
    if feed.load_failed() {
        writeln!(out, "Failed to load posts. Please try again later.")?;
        return Ok(());
    }
    if !feed.selected_topics().is_empty() {
        writeln!(out, "Filtered by: {}", feed.selected_topics().join(", "))?;
    }
    if feed.posts().is_empty() {
        writeln!(out, "No posts available.")?;
    }
    for post in feed.posts() {
        render_post(post, feed.is_liked(&post.post_id), feed.can_delete(post), out)?;
    }

    let trending = feed.trending();
    if !trending.topics.is_empty() {
        writeln!(out, "Trending topics: {}", trending.topics.join(", "))?;
    }
    if !trending.keywords.is_empty() {
        writeln!(out, "Trending keywords: {}", trending.keywords.join(", "))?;
    }
    Ok(())
}

fn render_post<W: Write>(post: &Post, liked: bool, deletable: bool, out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "[{}] {} at {}{}",
        post.post_id,
        post.author,
        post.timestamp,
        if deletable { " (can delete)" } else { "" }
    )?;
    writeln!(out, "  {}", post.content)?;
    for image in post.displayable_images() {
        writeln!(out, "  image: {}", image)?;
    }
    let tags: Vec<String> = post.topics.iter().map(|t| format!("#{}", t)).collect();
    writeln!(
        out,
        "  {} {} {} Likes",
        tags.join(" "),
        if liked { "<3" } else { "</3" },
        post.likes
    )?;
    Ok(())
}

fn render_comment<W: Write>(comment: &Comment, deletable: bool, out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "[{}] {}: {}{}",
        comment.comment_id,
        comment.author.as_deref().unwrap_or("(deleted)"),
        comment.content,
        if deletable { " (yours)" } else { "" }
    )
}

fn render_fitness<W: Write>(view: &FitnessView, out: &mut W) -> std::io::Result<()> {
    if let Some(quote) = view.quote() {
        writeln!(out, "\"{}\" - {}", quote.text, quote.author)?;
    }
    writeln!(out, "{}", progress_bar(view.progress()))?;
    for task in view.tasks() {
        render_task(task, out)?;
    }
    Ok(())
}

fn render_task<W: Write>(task: &FitnessTask, out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "[{}] {} ({})",
        if task.is_finished { "x" } else { " " },
        task.description,
        task.task_id
    )
}

pub fn progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

fn render_notice<W: Write>(notice: &Notice, out: &mut W) -> std::io::Result<()> {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    };
    match notice.description {
        Some(ref description) if !description.is_empty() => {
            writeln!(out, "{}: {} - {}", tag, notice.title, description)
        }
        _ => writeln!(out, "{}: {}", tag, notice.title),
    }
}
