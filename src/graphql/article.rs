//! Article queries and publishing.

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::auth::{require_viewer, Credentials};
use crate::error::OptionExt;
use crate::models::{Article, ArticleContent};
use crate::pagination::Page;
use crate::store::Database;

#[derive(InputObject, Debug)]
pub struct CreateArticleInput {
    pub title: String,
    pub content: ArticleContent,
}

#[derive(Default)]
pub struct ArticleQuery;

#[Object]
impl ArticleQuery {
    /// Fetch an article by id.
    async fn article(&self, ctx: &Context<'_>, id: String) -> Result<Article> {
        let db = ctx.data_unchecked::<Database>();
        Ok(db.articles.get(&id)?.or_not_found("article")?)
    }

    /// All articles, paged in creation order.
    async fn all_articles(
        &self,
        ctx: &Context<'_>,
        page: i32,
        limit: i32,
    ) -> Result<Page<Article>> {
        let db = ctx.data_unchecked::<Database>();
        let articles = db.articles.find(|_| true)?;
        Ok(Page::paginate(articles, page, limit))
    }
}

#[derive(Default)]
pub struct ArticleMutation;

#[Object]
impl ArticleMutation {
    /// Publish an article owned by the viewer.
    async fn create_article(
        &self,
        ctx: &Context<'_>,
        input: CreateArticleInput,
    ) -> Result<Article> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        let article = Article {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            content: input.content,
            creator: viewer.id,
        };
        Ok(db.articles.insert(article)?)
    }

    /// Delete an article, returning the removed document.
    async fn delete_article(&self, ctx: &Context<'_>, id: String) -> Result<Article> {
        let db = ctx.data_unchecked::<Database>();
        require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        Ok(db.articles.remove(&id)?.or_not_found("article")?)
    }
}
