//! Quiz queries, creation, and assisted generation.

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::auth::{require_viewer, Credentials};
use crate::clients::OpenAiClient;
use crate::error::OptionExt;
use crate::models::{Question, Quiz};
use crate::pagination::Page;
use crate::store::Database;

#[derive(InputObject, Debug)]
pub struct CreateQuizInput {
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Default)]
pub struct QuizQuery;

#[Object]
impl QuizQuery {
    /// Fetch a quiz by id.
    async fn quiz(&self, ctx: &Context<'_>, id: String) -> Result<Quiz> {
        let db = ctx.data_unchecked::<Database>();
        Ok(db.quizzes.get(&id)?.or_not_found("quiz")?)
    }

    /// All quizzes, paged in creation order.
    async fn all_quizzes(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Quiz>> {
        let db = ctx.data_unchecked::<Database>();
        let quizzes = db.quizzes.find(|_| true)?;
        Ok(Page::paginate(quizzes, page, limit))
    }
}

#[derive(Default)]
pub struct QuizMutation;

#[Object]
impl QuizMutation {
    /// Create a quiz owned by the viewer.
    async fn create_quiz(&self, ctx: &Context<'_>, input: CreateQuizInput) -> Result<Quiz> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        let quiz = Quiz {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            creator: viewer.id,
            questions: input.questions,
        };
        Ok(db.quizzes.insert(quiz)?)
    }

    /// Delete a quiz, returning the removed document.
    async fn delete_quiz(&self, ctx: &Context<'_>, id: String) -> Result<Quiz> {
        let db = ctx.data_unchecked::<Database>();
        require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        Ok(db.quizzes.remove(&id)?.or_not_found("quiz")?)
    }

    /// Draft quiz questions with the OpenAI assistant.
    ///
    /// Returns the assistant's JSON as an unparsed string for the quiz
    /// editor to load.
    async fn generate_quiz(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "numMCQuestions")] mc_questions: i32,
        #[graphql(name = "numTFQuestions")] tf_questions: i32,
        subject: String,
    ) -> Result<String> {
        let db = ctx.data_unchecked::<Database>();
        require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        let openai = ctx.data_unchecked::<OpenAiClient>();
        Ok(openai
            .generate_quiz(mc_questions, tf_questions, &subject)
            .await?)
    }
}
