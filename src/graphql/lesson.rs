//! Lesson queries, creation, and bookmarking.

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::auth::{require_viewer, Credentials};
use crate::error::{AppError, AppResult, OptionExt};
use crate::models::Lesson;
use crate::pagination::Page;
use crate::scalars::LessonDate;
use crate::store::Database;

const MAX_TITLE_LENGTH: usize = 160;

#[derive(InputObject, Debug)]
pub struct CreateLessonInput {
    pub title: String,
    pub meta: String,
    pub category: Vec<String>,
    pub start_date: LessonDate,
    pub end_date: LessonDate,
    pub video: String,
    pub duration: f64,
}

/// Field checks beyond what the scalar types already enforce. The
/// messages surface directly in the lesson editor.
fn verify_lesson_input(input: &CreateLessonInput) -> AppResult<()> {
    if input.title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::InvalidInput(
            "title must not exceed 160 characters in length".to_string(),
        ));
    }
    if input.category.is_empty() {
        return Err(AppError::InvalidInput(
            "please add at least one category".to_string(),
        ));
    }
    if input.meta.is_empty() {
        return Err(AppError::InvalidInput(
            "please add a brief description to provide students with context about this lesson"
                .to_string(),
        ));
    }
    if input.video.is_empty() {
        return Err(AppError::InvalidInput("please add a video".to_string()));
    }
    Ok(())
}

#[derive(Default)]
pub struct LessonQuery;

#[Object]
impl LessonQuery {
    /// Fetch a lesson by id.
    async fn lesson(&self, ctx: &Context<'_>, id: String) -> Result<Lesson> {
        let db = ctx.data_unchecked::<Database>();
        Ok(db.lessons.get(&id)?.or_not_found("lesson")?)
    }

    /// All lessons, paged in creation order.
    async fn all_lessons(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Lesson>> {
        let db = ctx.data_unchecked::<Database>();
        let lessons = db.lessons.find(|_| true)?;
        Ok(Page::paginate(lessons, page, limit))
    }

    /// First lesson whose title contains the search term,
    /// case-insensitively.
    async fn lesson_title(&self, ctx: &Context<'_>, title: String) -> Result<Lesson> {
        let db = ctx.data_unchecked::<Database>();
        let needle = title.to_lowercase();
        let matches = db
            .lessons
            .find(|lesson| lesson.title.to_lowercase().contains(&needle))?;
        Ok(matches.into_iter().next().or_not_found("lesson")?)
    }
}

#[derive(Default)]
pub struct LessonMutation;

#[Object]
impl LessonMutation {
    /// Create a lesson owned by the viewer.
    async fn create_lesson(&self, ctx: &Context<'_>, input: CreateLessonInput) -> Result<Lesson> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        verify_lesson_input(&input)?;

        let lesson = Lesson {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            meta: input.meta,
            category: input.category,
            start_date: input.start_date,
            end_date: input.end_date,
            video: input.video,
            duration: input.duration,
            creator: viewer.id,
        };
        Ok(db.lessons.insert(lesson)?)
    }

    /// Delete a lesson, returning the removed document.
    async fn delete_lesson(&self, ctx: &Context<'_>, id: String) -> Result<Lesson> {
        let db = ctx.data_unchecked::<Database>();
        require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        Ok(db.lessons.remove(&id)?.or_not_found("lesson")?)
    }

    /// Toggle a lesson in the viewer's bookmarks.
    ///
    /// Returns `"bookmarked"` or `"unbookmarked"` depending on the state
    /// after the toggle.
    async fn bookmark_lesson(&self, ctx: &Context<'_>, id: String) -> Result<String> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        db.lessons.get(&id)?.or_not_found("lesson")?;

        let updated = db
            .users
            .update(&viewer.id, |user| {
                match user.bookmarks.iter().position(|b| b == &id) {
                    Some(index) => {
                        user.bookmarks.remove(index);
                    }
                    None => user.bookmarks.push(id.clone()),
                }
            })?
            .or_not_found("user")?;

        Ok(if updated.bookmarks.contains(&id) {
            "bookmarked".to_string()
        } else {
            "unbookmarked".to_string()
        })
    }
}
