//! Viewer sign-in, sign-out, and Stripe account linking.

use async_graphql::{ComplexObject, Context, InputObject, Object, Result, SimpleObject};

use crate::auth::{require_viewer, session_token, CookieSink, Credentials};
use crate::clients::{GoogleClient, GoogleProfile, StripeClient};
use crate::error::{AppResult, OptionExt};
use crate::loaders::Loaders;
use crate::models::{Playlist, User};
use crate::pagination::Page;
use crate::store::Database;

/// The account a request is acting as.
///
/// All fields are optional so the same shape can answer anonymous
/// requests; `did_request` tells the client the log-in attempt itself
/// completed.
#[derive(SimpleObject, Debug, Clone, Default)]
#[graphql(complex)]
pub struct Viewer {
    pub id: Option<String>,
    pub token: Option<String>,
    pub avatar: Option<String>,
    pub payment_id: Option<String>,
    pub did_request: bool,
}

impl Viewer {
    fn for_user(user: &User) -> Self {
        Self {
            id: Some(user.id.clone()),
            token: Some(user.token.clone()),
            avatar: Some(user.avatar.clone()),
            payment_id: user.payment_id.clone(),
            did_request: true,
        }
    }

    fn anonymous() -> Self {
        Self {
            did_request: true,
            ..Self::default()
        }
    }
}

#[ComplexObject]
impl Viewer {
    /// Playlists created by the signed-in viewer.
    async fn playlists(&self, ctx: &Context<'_>, page: i32, limit: i32) -> Result<Page<Playlist>> {
        let Some(id) = &self.id else {
            return Ok(Page::empty());
        };
        let loaders = ctx.data_unchecked::<Loaders>();
        let playlists = loaders.playlists_by_creator.load(id.clone()).await?;
        Ok(Page::paginate(playlists, page, limit))
    }
}

#[derive(InputObject, Debug)]
pub struct LogInInput {
    /// OAuth code returned by Google's consent screen.
    pub code: Option<String>,
}

#[derive(InputObject, Debug)]
pub struct ConnectStripeInput {
    /// OAuth code returned by Stripe Connect.
    pub code: String,
}

#[derive(Default)]
pub struct ViewerQuery;

#[Object]
impl ViewerQuery {
    /// Google consent screen URL for starting a sign-in.
    async fn auth_url(&self, ctx: &Context<'_>) -> Result<String> {
        let google = ctx.data_unchecked::<GoogleClient>();
        Ok(google.auth_url()?)
    }
}

#[derive(Default)]
pub struct ViewerMutation;

#[Object]
impl ViewerMutation {
    /// Sign in with a Google OAuth code, or restore the session from the
    /// viewer cookie when no code is given.
    async fn log_in(&self, ctx: &Context<'_>, input: Option<LogInInput>) -> Result<Viewer> {
        let db = ctx.data_unchecked::<Database>();
        let cookies = ctx.data_unchecked::<CookieSink>();
        let token = session_token();

        let code = input.and_then(|input| input.code);
        let user = match code {
            Some(code) => {
                let google = ctx.data_unchecked::<GoogleClient>();
                let profile = google.log_in(&code).await?;
                let user = upsert_google_user(db, profile, token)?;
                cookies.set_viewer(user.id.clone()).await;
                Some(user)
            }
            None => {
                let credentials = ctx.data_unchecked::<Credentials>();
                log_in_via_cookie(db, credentials, token, cookies).await?
            }
        };

        Ok(match user {
            Some(user) => Viewer::for_user(&user),
            None => Viewer::anonymous(),
        })
    }

    /// Clear the viewer cookie.
    async fn log_out(&self, ctx: &Context<'_>) -> Result<Viewer> {
        let cookies = ctx.data_unchecked::<CookieSink>();
        cookies.clear_viewer().await;
        Ok(Viewer::anonymous())
    }

    /// Link the viewer's Stripe account through a Connect OAuth code.
    async fn connect_stripe(&self, ctx: &Context<'_>, input: ConnectStripeInput) -> Result<Viewer> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        let stripe = ctx.data_unchecked::<StripeClient>();
        let account_id = stripe.connect(&input.code).await?;

        let updated = db
            .users
            .update(&viewer.id, |user| user.payment_id = Some(account_id))?
            .or_not_found("user")?;
        Ok(Viewer::for_user(&updated))
    }

    /// Unlink the viewer's Stripe account.
    async fn disconnect_stripe(&self, ctx: &Context<'_>) -> Result<Viewer> {
        let db = ctx.data_unchecked::<Database>();
        let viewer = require_viewer(db, ctx.data_unchecked::<Credentials>())?;

        let updated = db
            .users
            .update(&viewer.id, |user| user.payment_id = None)?
            .or_not_found("user")?;
        Ok(Viewer::for_user(&updated))
    }
}

/// Refresh an existing profile from Google, or create one on first
/// sign-in. Every log-in rotates the session token.
fn upsert_google_user(db: &Database, profile: GoogleProfile, token: String) -> AppResult<User> {
    let updated = db.users.update(&profile.id, |user| {
        user.token = token.clone();
        user.name = profile.name.clone();
        user.avatar = profile.avatar.clone();
        user.contact = profile.email.clone();
    })?;

    match updated {
        Some(user) => Ok(user),
        None => {
            let user = User {
                id: profile.id,
                name: profile.name,
                avatar: profile.avatar,
                contact: profile.email,
                token,
                payment_id: None,
                package: None,
                watched: Vec::new(),
                bookmarks: Vec::new(),
            };
            db.users.insert(user).map_err(Into::into)
        }
    }
}

/// Restore a session from the signed viewer cookie, rotating the token.
/// A cookie pointing at a vanished user is cleared.
async fn log_in_via_cookie(
    db: &Database,
    credentials: &Credentials,
    token: String,
    cookies: &CookieSink,
) -> AppResult<Option<User>> {
    let Some(viewer_id) = credentials.viewer.as_deref() else {
        return Ok(None);
    };

    let updated = db.users.update(viewer_id, |user| user.token = token.clone())?;
    if updated.is_none() {
        cookies.clear_viewer().await;
    }
    Ok(updated)
}
