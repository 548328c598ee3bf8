//! GraphQL schema: merged roots and resolver modules.

mod article;
mod lesson;
mod playlist;
mod quiz;
mod user;
mod viewer;

pub use article::CreateArticleInput;
pub use lesson::CreateLessonInput;
pub use playlist::{CreatePlaylistInput, PlanItemInput, UpdatePlaylistInput};
pub use quiz::CreateQuizInput;
pub use viewer::{LogInInput, Viewer};

use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::clients::{GoogleClient, OpenAiClient, StripeClient};
use crate::store::Database;

#[derive(MergedObject, Default)]
pub struct Query(
    viewer::ViewerQuery,
    user::UserQuery,
    lesson::LessonQuery,
    playlist::PlaylistQuery,
    quiz::QuizQuery,
    article::ArticleQuery,
);

#[derive(MergedObject, Default)]
pub struct Mutation(
    viewer::ViewerMutation,
    user::UserMutation,
    lesson::LessonMutation,
    playlist::PlaylistMutation,
    quiz::QuizMutation,
    article::ArticleMutation,
);

pub type AppSchema = Schema<Query, Mutation, EmptySubscription>;

/// Build the schema with its long-lived context data.
///
/// Request-scoped data (the loader set, credentials, and the cookie
/// sink) is attached per request by the HTTP handler.
pub fn build_schema(
    db: Database,
    google: GoogleClient,
    stripe: StripeClient,
    openai: OpenAiClient,
) -> AppSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(db)
        .data(google)
        .data(stripe)
        .data(openai)
        .finish()
}
