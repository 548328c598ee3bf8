//! Playlist queries and plan management.
//!
//! A playlist's plan is an ordered mix of lessons and quizzes. Plan
//! items arrive as id references and are resolved against the store at
//! write time, so a stored plan never points at a missing document.

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::auth::{require_viewer, Credentials};
use crate::error::{AppError, AppResult, OptionExt};
use crate::models::{PlanItem, Playlist};
use crate::pagination::Page;
use crate::store::Database;

/// How many playlists the related sidebar shows.
const RELATED_LIMIT: usize = 3;

#[derive(InputObject, Debug)]
pub struct PlanItemInput {
    /// Id of a lesson to place at this position.
    pub lesson_id: Option<String>,
    /// Id of a quiz to place at this position.
    pub quiz_id: Option<String>,
}

#[derive(InputObject, Debug)]
pub struct CreatePlaylistInput {
    pub name: String,
    pub public: bool,
    pub plan: Vec<PlanItemInput>,
}

#[derive(InputObject, Debug)]
pub struct UpdatePlaylistInput {
    pub name: Option<String>,
    pub public: Option<bool>,
    pub plan: Option<Vec<PlanItemInput>>,
}

fn resolve_plan(db: &Database, items: Vec<PlanItemInput>) -> AppResult<Vec<PlanItem>> {
    let mut plan = Vec::with_capacity(items.len());
    for item in items {
        let resolved = match (item.lesson_id, item.quiz_id) {
            (Some(lesson_id), None) => {
                PlanItem::Lesson(db.lessons.get(&lesson_id)?.or_not_found("lesson")?)
            }
            (None, Some(quiz_id)) => {
                PlanItem::Quiz(db.quizzes.get(&quiz_id)?.or_not_found("quiz")?)
            }
            _ => {
                return Err(AppError::InvalidInput(
                    "plan items take exactly one of lessonId or quizId".to_string(),
                ))
            }
        };
        plan.push(resolved);
    }
    Ok(plan)
}

#[derive(Default)]
pub struct PlaylistQuery;

#[Object]
impl PlaylistQuery {
    /// Fetch a playlist by id.
    async fn playlist(&self, ctx: &Context<'_>, id: String) -> Result<Playlist> {
        let db = ctx.data_unchecked::<Database>();
        Ok(db.playlists.get(&id)?.or_not_found("playlist")?)
    }

    /// All playlists, paged in creation order.
    async fn all_playlists(
        &self,
        ctx: &Context<'_>,
        page: i32,
        limit: i32,
    ) -> Result<Page<Playlist>> {
        let db = ctx.data_unchecked::<Database>();
        let playlists = db.playlists.find(|_| true)?;
        Ok(Page::paginate(playlists, page, limit))
    }

    /// Public playlists containing the given lesson or quiz. Falls back
    /// to the newest public playlists when none match.
    async fn related_plans(&self, ctx: &Context<'_>, id: String) -> Result<Vec<Playlist>> {
        let db = ctx.data_unchecked::<Database>();

        let related = db
            .playlists
            .find(|playlist| playlist.public && playlist.plan.iter().any(|item| item.id() == id))?;
        if !related.is_empty() {
            return Ok(related.into_iter().take(RELATED_LIMIT).collect());
        }

        let mut fallback = db.playlists.find(|playlist| playlist.public)?;
        fallback.reverse();
        Ok(fallback.into_iter().take(RELATED_LIMIT).collect())
    }
}

#[derive(Default)]
pub struct PlaylistMutation;

#[Object]
impl PlaylistMutation {
    /// Create a playlist owned by the viewer.
    async fn create_playlist(
        &self,
        ctx: &Context<'_>,
        input: CreatePlaylistInput,
    ) -> Result<Playlist> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        let plan = resolve_plan(db, input.plan)?;

        let playlist = Playlist {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            creator: viewer.id,
            public: input.public,
            plan,
        };
        Ok(db.playlists.insert(playlist)?)
    }

    /// Update a playlist's name, visibility, or plan.
    async fn update_playlist(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdatePlaylistInput,
    ) -> Result<Playlist> {
        let db = ctx.data_unchecked::<Database>();
        require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        let plan = match input.plan {
            Some(items) => Some(resolve_plan(db, items)?),
            None => None,
        };

        let updated = db
            .playlists
            .update(&id, |playlist| {
                if let Some(name) = input.name {
                    playlist.name = name;
                }
                if let Some(public) = input.public {
                    playlist.public = public;
                }
                if let Some(plan) = plan {
                    playlist.plan = plan;
                }
            })?
            .or_not_found("playlist")?;
        Ok(updated)
    }

    /// Delete a playlist, reporting whether a document was removed.
    async fn delete_playlist(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let db = ctx.data_unchecked::<Database>();
        require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        Ok(db.playlists.remove(&id)?.is_some())
    }
}
