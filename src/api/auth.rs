//! `/api/auth`: login, logout and the current principal.
//!
//! Login and logout are plain routes because they set the session cookie;
//! they are documented through [`Router::document`].

use std::sync::Arc;

use crate::config::Server as ServerConfig;
use crate::module::Module;
use crate::principal::Principal;
use crate::procedure::{Empty, Meta, Procedure};
use crate::rate_limit::RateLimiter;
use crate::router::{Context, Router};
use crate::service::auth::{self, Credentials, Session};
use crate::{Result, response};

const TAG: &str = "auth";

pub struct Me;

impl Procedure for Me {
    fn meta() -> Meta {
        Meta::get("/api/auth/me")
            .summary("The authenticated user with their role and permissions")
            .tag(TAG)
    }

    type Input = Empty;
    type Output = Principal;

    async fn handle(ctx: Context, _input: Empty) -> Result<Principal> {
        let (_conn, principal) = ctx.authenticate().await?;
        Ok(principal)
    }
}

async fn login(ctx: Context, limiter: Arc<RateLimiter>) -> Result<response::HttpResponse> {
    if let Some(addr) = ctx.remote_addr {
        limiter.check(addr.ip())?;
    }
    let creds: Credentials = ctx.json()?;
    let conn = ctx.connection().await?;
    let session = auth::login(&conn, &ctx.config.auth, &creds).await?;

    let mut resp = response::ok(&session)?;
    let cookie = crate::auth::session_cookie(&ctx.config.auth, &session.access_token);
    response::set_cookie(&mut resp, &cookie)?;
    Ok(resp)
}

async fn logout(ctx: Context) -> Result<response::HttpResponse> {
    let mut resp = response::no_content();
    response::set_cookie(&mut resp, &crate::auth::clear_cookie(&ctx.config.auth))?;
    Ok(resp)
}

/// Authentication routes. Login attempts are throttled per client IP.
pub struct AuthModule {
    limiter: Arc<RateLimiter>,
}

impl AuthModule {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(
                config.login_rate_limit,
                config.login_rate_window_secs,
            )),
        }
    }
}

impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn routes(&self, router: &mut Router) {
        let limiter = Arc::clone(&self.limiter);
        router.post("/api/auth/login", move |ctx| {
            let limiter = Arc::clone(&limiter);
            async move {
                limiter.cleanup();
                login(ctx, limiter).await
            }
        });
        router.document::<Credentials, Session>(
            Meta::post("/api/auth/login")
                .summary("Exchange credentials for a bearer token and session cookie")
                .tag(TAG),
        );

        router.post("/api/auth/logout", logout);
        router.document::<Empty, ()>(
            Meta::post("/api/auth/logout")
                .summary("Clear the session cookie")
                .tag(TAG)
                .status(204),
        );

        router.procedure::<Me>();
    }
}
