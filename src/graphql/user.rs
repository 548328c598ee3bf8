//! User profiles, payment syncing, and bookmark management.

use async_graphql::{ComplexObject, Context, Object, Result};

use crate::auth::{require_viewer, Credentials};
use crate::clients::StripeClient;
use crate::error::{AppError, OptionExt};
use crate::loaders::Loaders;
use crate::models::{Article, Lesson, PaymentPackage, Playlist, Quiz, User};
use crate::pagination::Page;
use crate::store::Database;

#[ComplexObject]
impl User {
    /// Playlists this user created.
    async fn playlists(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Playlist>> {
        let loaders = ctx.data_unchecked::<Loaders>();
        let playlists = loaders.playlists_by_creator.load(self.id.clone()).await?;
        Ok(Page::paginate(playlists, page, limit))
    }

    /// Lessons this user created.
    async fn lessons(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Lesson>> {
        let loaders = ctx.data_unchecked::<Loaders>();
        let lessons = loaders.lessons_by_creator.load(self.id.clone()).await?;
        Ok(Page::paginate(lessons, page, limit))
    }

    /// Quizzes this user created.
    async fn quizzes(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Quiz>> {
        let loaders = ctx.data_unchecked::<Loaders>();
        let quizzes = loaders.quizzes_by_creator.load(self.id.clone()).await?;
        Ok(Page::paginate(quizzes, page, limit))
    }

    /// Articles this user created.
    async fn articles(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Article>> {
        let loaders = ctx.data_unchecked::<Loaders>();
        let articles = loaders.articles_by_creator.load(self.id.clone()).await?;
        Ok(Page::paginate(articles, page, limit))
    }

    /// Lessons this user bookmarked. Bookmarks whose lesson has since
    /// been deleted are skipped.
    async fn bookmarks(&self, ctx: &Context<'_>) -> Result<Vec<Lesson>> {
        let loaders = ctx.data_unchecked::<Loaders>();
        let lessons = loaders
            .lessons_by_id
            .load_many(self.bookmarks.clone())
            .await?;
        Ok(lessons.into_iter().flatten().collect())
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Fetch a user profile by id.
    async fn user(&self, ctx: &Context<'_>, id: String) -> Result<User> {
        let db = ctx.data_unchecked::<Database>();
        Ok(db.users.get(&id)?.or_not_found("user")?)
    }

    /// All user profiles, paged.
    async fn all_users(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<User>> {
        let db = ctx.data_unchecked::<Database>();
        let users = db.users.find(|_| true)?;
        Ok(Page::paginate(users, page, limit))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Sync the viewer's payment profile from Stripe.
    ///
    /// Looks the viewer up as a Stripe customer by contact email. With no
    /// customer the profile is reset to the inactive package; otherwise
    /// the customer id and their first subscription are stored.
    async fn add_payment(&self, ctx: &Context<'_>) -> Result<User> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;
        let stripe = ctx.data_unchecked::<StripeClient>();

        let updated = match stripe.find_customer_by_email(&viewer.contact).await? {
            None => db.users.update(&viewer.id, |user| {
                user.payment_id = None;
                user.package = Some(PaymentPackage::inactive());
            })?,
            Some(customer) => {
                let package = stripe
                    .customer_package(&customer.id)
                    .await?
                    .map(|sub| PaymentPackage {
                        amount: sub.amount,
                        cadence: sub.cadence,
                        status: sub.status,
                        since: sub.since,
                        trial_end: sub.trial_end,
                    })
                    .unwrap_or_else(PaymentPackage::inactive);
                db.users.update(&viewer.id, |user| {
                    user.payment_id = Some(customer.id);
                    user.package = Some(package);
                })?
            }
        };

        Ok(updated.or_not_found("user")?)
    }

    /// Remove every bookmark on the viewer's profile.
    async fn delete_all_bookmarks(&self, ctx: &Context<'_>) -> Result<String> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        if viewer.bookmarks.is_empty() {
            return Err(AppError::InvalidInput("no bookmarks to delete".to_string()).into());
        }
        db.users.update(&viewer.id, |user| user.bookmarks.clear())?;
        Ok("Bookmarks deleted".to_string())
    }
}
