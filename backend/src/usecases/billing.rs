use std::{collections::HashMap, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Duration, TimeZone, Utc};
use crates::{
    domain::{
        entities::dj_users::DjUserEntity,
        repositories::{dj_users::DjUserRepository, notifications::NotificationRepository},
        value_objects::{
            checkout::{
                CancelSubscriptionDto, CheckoutMetadata, CheckoutSessionDto, CreateCheckoutModel,
                META_USER_ID, StartTrialModel,
            },
            enums::{billing_periods::BillingPeriod, subscription_plans::SubscriptionPlan},
            notifications::SystemNotification,
            plans::PlanState,
            user_metadata::MetadataPatch,
        },
    },
    payments::stripe_client::{
        CheckoutSession, CheckoutSessionRequest, StripeCheckoutSession, StripeClient, StripeEvent,
        StripeInvoice, StripeSubscription,
    },
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::plan_cache::PlanCache;

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const EVENT_CHECKOUT_EXPIRED: &str = "checkout.session.expired";
pub const EVENT_ASYNC_PAYMENT_FAILED: &str = "checkout.session.async_payment_failed";
pub const EVENT_INVOICE_PAID: &str = "invoice.paid";
pub const EVENT_INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";
pub const EVENT_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// `billing_reason` of the invoice Stripe raises when a subscription rolls
/// into a new period, including the first charge after a trial.
pub const BILLING_REASON_CYCLE: &str = "subscription_cycle";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AnyResult<CheckoutSession>;

    async fn cancel_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AnyResult<CheckoutSession> {
        self.create_checkout_session(&request).await
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription> {
        self.cancel_subscription(subscription_id).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        self.verify_webhook_signature(payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("userId does not match the signed-in user")]
    Forbidden,
    #[error("unsupported plan: {0}")]
    InvalidPlan(String),
    #[error("unsupported billing period: {0}")]
    InvalidPeriod(String),
    #[error("email is required")]
    MissingEmail,
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("user not found")]
    UserNotFound,
    #[error("no active subscription to cancel")]
    NoActiveSubscription,
    #[error("the free trial has already been used")]
    TrialAlreadyUsed,
    #[error("an active plan is already in place")]
    AlreadySubscribed,
    #[error("invalid redeem code")]
    InvalidRedeemCode,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::Forbidden | BillingError::InvalidRedeemCode => StatusCode::FORBIDDEN,
            BillingError::InvalidPlan(_)
            | BillingError::InvalidPeriod(_)
            | BillingError::MissingEmail
            | BillingError::InvalidSignature => StatusCode::BAD_REQUEST,
            BillingError::UserNotFound | BillingError::NoActiveSubscription => {
                StatusCode::NOT_FOUND
            }
            BillingError::TrialAlreadyUsed | BillingError::AlreadySubscribed => {
                StatusCode::CONFLICT
            }
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::Forbidden => "FORBIDDEN",
            BillingError::InvalidPlan(_) => "INVALID_PLAN",
            BillingError::InvalidPeriod(_) => "INVALID_PERIOD",
            BillingError::MissingEmail => "MISSING_EMAIL",
            BillingError::InvalidSignature => "INVALID_SIGNATURE",
            BillingError::UserNotFound => "USER_NOT_FOUND",
            BillingError::NoActiveSubscription => "NO_ACTIVE_SUBSCRIPTION",
            BillingError::TrialAlreadyUsed => "TRIAL_ALREADY_USED",
            BillingError::AlreadySubscribed => "ALREADY_SUBSCRIBED",
            BillingError::InvalidRedeemCode => "INVALID_REDEEM_CODE",
            BillingError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

/// Prices and entitlements the billing flows need from configuration.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub monthly_price_cents: i64,
    pub yearly_price_cents: i64,
    pub currency: String,
    pub trial_days: i64,
    /// Lowercase hex SHA-256 digests of accepted lifetime codes.
    pub redeem_code_digests: Vec<String>,
}

impl BillingSettings {
    fn price_for(&self, period: BillingPeriod) -> Option<(i64, &'static str)> {
        let interval = period.stripe_interval()?;
        match period {
            BillingPeriod::Monthly => Some((self.monthly_price_cents, interval)),
            BillingPeriod::Yearly => Some((self.yearly_price_cents, interval)),
            BillingPeriod::Weekly | BillingPeriod::Unlimited => None,
        }
    }

    fn accepts_code(&self, code: &str) -> bool {
        let digest = hex::encode(Sha256::digest(code.as_bytes()));
        self.redeem_code_digests
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(&digest))
    }
}

pub struct BillingUseCase {
    stripe: Arc<dyn StripeGateway + Send + Sync>,
    users: Arc<dyn DjUserRepository + Send + Sync>,
    notifications: Arc<dyn NotificationRepository + Send + Sync>,
    plan_cache: Arc<PlanCache>,
    settings: BillingSettings,
}

impl BillingUseCase {
    pub fn new(
        stripe: Arc<dyn StripeGateway + Send + Sync>,
        users: Arc<dyn DjUserRepository + Send + Sync>,
        notifications: Arc<dyn NotificationRepository + Send + Sync>,
        plan_cache: Arc<PlanCache>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            stripe,
            users,
            notifications,
            plan_cache,
            settings,
        }
    }

    fn ensure_caller(caller_id: Uuid, body_user_id: Uuid) -> UseCaseResult<()> {
        if caller_id == body_user_id {
            return Ok(());
        }
        let err = BillingError::Forbidden;
        warn!(
            %caller_id,
            %body_user_id,
            status = err.status_code().as_u16(),
            "billing: body userId does not match token"
        );
        Err(err)
    }

    async fn load_user(&self, user_id: Uuid) -> UseCaseResult<DjUserEntity> {
        let user = self.users.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, baas_error = ?err, "billing: failed to load user");
            BillingError::Internal(err)
        })?;
        user.ok_or_else(|| {
            let err = BillingError::UserNotFound;
            warn!(%user_id, status = err.status_code().as_u16(), "billing: unknown user");
            err
        })
    }

    async fn notify(&self, user_id: Uuid, notice: SystemNotification) {
        let title = notice.title();
        if let Err(err) = self
            .notifications
            .create(notice.to_insert(user_id, Utc::now()))
            .await
        {
            error!(%user_id, title, db_error = ?err, "billing: failed to store notification");
        }
    }

    pub async fn create_checkout_session(
        &self,
        caller_id: Uuid,
        model: CreateCheckoutModel,
    ) -> UseCaseResult<CheckoutSessionDto> {
        Self::ensure_caller(caller_id, model.user_id)?;

        match SubscriptionPlan::parse(&model.plan) {
            Some(SubscriptionPlan::Pro) => {}
            _ => {
                let err = BillingError::InvalidPlan(model.plan.clone());
                warn!(%caller_id, status = err.status_code().as_u16(), "billing: {err}");
                return Err(err);
            }
        }
        let period = BillingPeriod::parse(&model.period);
        let Some((period, (unit_amount, interval))) =
            period.and_then(|p| self.settings.price_for(p).map(|price| (p, price)))
        else {
            let err = BillingError::InvalidPeriod(model.period.clone());
            warn!(%caller_id, status = err.status_code().as_u16(), "billing: {err}");
            return Err(err);
        };

        // A subscription that is set to end at period end may be bought again.
        let user = self.load_user(model.user_id).await?;
        let current = PlanState::from_metadata(&user.user_metadata, Utc::now());
        let lifetime = current.plan == Some(SubscriptionPlan::Lifetime);
        if current.is_premium() && (lifetime || !current.cancelled) {
            let err = BillingError::AlreadySubscribed;
            warn!(
                %caller_id,
                plan = ?current.plan,
                status = err.status_code().as_u16(),
                "billing: checkout requested on an active plan"
            );
            return Err(err);
        }

        let email = model.email.or(user.email);
        let metadata = CheckoutMetadata {
            user_id: model.user_id,
            plan: SubscriptionPlan::Pro,
            period,
            email: email.clone(),
            name: model.name.clone(),
            trial: false,
        };
        let request = CheckoutSessionRequest {
            product_name: format!("Hey DJ Pro ({period})"),
            unit_amount,
            currency: self.settings.currency.clone(),
            interval: interval.to_string(),
            customer_email: email,
            trial_period_days: None,
            metadata: metadata.to_pairs(),
        };

        let session = self
            .stripe
            .create_checkout_session(request)
            .await
            .map_err(|err| {
                error!(%caller_id, stripe_error = ?err, "billing: checkout session failed");
                BillingError::Internal(err)
            })?;

        info!(%caller_id, session_id = %session.id, period = %period, "billing: checkout session created");
        Ok(CheckoutSessionDto {
            id: session.id,
            url: session.url,
        })
    }

    pub async fn start_trial(
        &self,
        caller_id: Uuid,
        model: StartTrialModel,
    ) -> UseCaseResult<CheckoutSessionDto> {
        Self::ensure_caller(caller_id, model.user_id)?;
        let user = self.load_user(model.user_id).await?;

        if user.user_metadata.trial_used() {
            let err = BillingError::TrialAlreadyUsed;
            warn!(%caller_id, status = err.status_code().as_u16(), "billing: trial already used");
            return Err(err);
        }
        if PlanState::from_metadata(&user.user_metadata, Utc::now()).is_premium() {
            let err = BillingError::AlreadySubscribed;
            warn!(%caller_id, status = err.status_code().as_u16(), "billing: trial requested on a paid plan");
            return Err(err);
        }

        let email = model.email.or(user.email);
        let metadata = CheckoutMetadata {
            user_id: user.id,
            plan: SubscriptionPlan::Trial,
            period: BillingPeriod::Weekly,
            email: email.clone(),
            name: user.user_metadata.dj_name.clone(),
            trial: true,
        };
        let request = CheckoutSessionRequest {
            product_name: "Hey DJ Pro (monthly)".to_string(),
            unit_amount: self.settings.monthly_price_cents,
            currency: self.settings.currency.clone(),
            interval: "month".to_string(),
            customer_email: email,
            trial_period_days: Some(self.settings.trial_days),
            metadata: metadata.to_pairs(),
        };

        let session = self
            .stripe
            .create_checkout_session(request)
            .await
            .map_err(|err| {
                error!(%caller_id, stripe_error = ?err, "billing: trial checkout failed");
                BillingError::Internal(err)
            })?;

        info!(%caller_id, session_id = %session.id, "billing: trial checkout created");
        Ok(CheckoutSessionDto {
            id: session.id,
            url: session.url,
        })
    }

    /// Only signature failures surface as errors; problems applying a verified
    /// event are logged and acknowledged so Stripe does not keep retrying.
    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> UseCaseResult<()> {
        let Some(signature) = signature else {
            let err = BillingError::InvalidSignature;
            warn!(status = err.status_code().as_u16(), "billing: webhook without stripe-signature");
            return Err(err);
        };
        let event = self
            .stripe
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(reason = %err, status = 400, "billing: webhook signature rejected");
                BillingError::InvalidSignature
            })?;

        info!(event_id = ?event.id, event_type = %event.type_, "billing: webhook received");

        match event.type_.as_str() {
            EVENT_CHECKOUT_COMPLETED | EVENT_CHECKOUT_EXPIRED | EVENT_ASYNC_PAYMENT_FAILED => {
                match event.data_object::<StripeCheckoutSession>() {
                    Some(session) => self.apply_checkout_event(&event.type_, session).await,
                    None => warn!(event_id = ?event.id, "billing: checkout event without a session"),
                }
            }
            EVENT_INVOICE_PAID | EVENT_INVOICE_PAYMENT_FAILED => {
                match event.data_object::<StripeInvoice>() {
                    Some(invoice) => self.apply_invoice_event(&event.type_, invoice).await,
                    None => warn!(event_id = ?event.id, "billing: invoice event without an invoice"),
                }
            }
            EVENT_SUBSCRIPTION_DELETED => match event.data_object::<StripeSubscription>() {
                Some(subscription) => {
                    if let Err(err) = self.end_subscription(&subscription).await {
                        error!(
                            subscription_id = %subscription.id,
                            baas_error = ?err,
                            "billing: failed to apply deleted subscription"
                        );
                    }
                }
                None => warn!(event_id = ?event.id, "billing: deletion event without a subscription"),
            },
            other => debug!(event_type = other, "billing: webhook event ignored"),
        }

        Ok(())
    }

    async fn apply_checkout_event(&self, event_type: &str, session: StripeCheckoutSession) {
        if event_type == EVENT_CHECKOUT_COMPLETED {
            match CheckoutMetadata::from_map(&session.metadata) {
                Ok(metadata) => {
                    if let Err(err) = self
                        .activate_checkout(&metadata, session.subscription, Utc::now())
                        .await
                    {
                        error!(
                            user_id = %metadata.user_id,
                            baas_error = ?err,
                            "billing: failed to apply completed checkout"
                        );
                    }
                }
                Err(reason) => {
                    warn!(session_id = ?session.id, %reason, "billing: completed checkout without usable metadata");
                }
            }
            return;
        }

        match metadata_user_id(&session.metadata) {
            Some(user_id) if event_type == EVENT_CHECKOUT_EXPIRED => {
                self.notify(user_id, SystemNotification::CheckoutExpired).await;
            }
            Some(user_id) => {
                self.notify(user_id, SystemNotification::PaymentFailed).await;
            }
            None => {
                warn!(session_id = ?session.id, "billing: checkout event without userId");
            }
        }
    }

    async fn apply_invoice_event(&self, event_type: &str, invoice: StripeInvoice) {
        let Some(subscription_id) = invoice.subscription_id().map(str::to_string) else {
            debug!(invoice_id = ?invoice.id, "billing: invoice outside a subscription ignored");
            return;
        };
        let Some(user_id) = invoice.subscription_metadata().and_then(metadata_user_id) else {
            warn!(invoice_id = ?invoice.id, %subscription_id, "billing: invoice without userId");
            return;
        };

        if event_type == EVENT_INVOICE_PAYMENT_FAILED {
            self.notify(user_id, SystemNotification::PaymentFailed).await;
            return;
        }
        if invoice.billing_reason.as_deref() != Some(BILLING_REASON_CYCLE) {
            debug!(
                invoice_id = ?invoice.id,
                billing_reason = ?invoice.billing_reason,
                "billing: invoice is not a renewal"
            );
            return;
        }

        if let Err(err) = self
            .renew_subscription(user_id, &subscription_id, &invoice, Utc::now())
            .await
        {
            error!(%user_id, %subscription_id, baas_error = ?err, "billing: failed to apply renewal");
        }
    }

    /// Moves the expiry to the end of the period a renewal invoice paid for.
    /// A trial that converts becomes a monthly pro plan.
    pub async fn renew_subscription(
        &self,
        user_id: Uuid,
        subscription_id: &str,
        invoice: &StripeInvoice,
        now: DateTime<Utc>,
    ) -> AnyResult<Option<DjUserEntity>> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            warn!(%user_id, %subscription_id, "billing: renewal for an unknown user");
            return Ok(None);
        };
        let metadata = &user.user_metadata;

        if metadata.subscription_id.as_deref() != Some(subscription_id) {
            warn!(
                %user_id,
                %subscription_id,
                stored = ?metadata.subscription_id,
                "billing: renewal for a subscription the user no longer holds"
            );
            return Ok(None);
        }
        if metadata.subscription_plan == Some(SubscriptionPlan::Lifetime) {
            debug!(%user_id, %subscription_id, "billing: renewal ignored on a lifetime plan");
            return Ok(None);
        }

        let period = renewal_period(invoice.subscription_metadata(), metadata.subscription_period);
        let Some(expires) = invoice
            .period_end()
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .or_else(|| period.expiry_from(metadata.subscription_expires.unwrap_or(now)))
        else {
            warn!(%user_id, %subscription_id, "billing: renewal without a period end");
            return Ok(None);
        };

        let was_premium = PlanState::from_metadata(metadata, now).is_premium();
        let mut patch = MetadataPatch::renew_plan(period, expires, subscription_id);
        if metadata.subscription_start.is_none() {
            patch = patch.set("subscription_start", now.to_rfc3339());
        }

        let user = self.users.update_metadata(user_id, patch).await?;
        self.plan_cache.invalidate(user_id).await;
        if !was_premium {
            self.notify(user_id, SystemNotification::SubscriptionActivated { period })
                .await;
        }

        info!(%user_id, %subscription_id, period = %period, expires = %expires, "billing: subscription renewed");
        Ok(Some(user))
    }

    /// Stripe has ended the subscription for good, so the plan it paid for goes too.
    async fn end_subscription(&self, subscription: &StripeSubscription) -> AnyResult<()> {
        let subscription_id = subscription.id.as_str();
        let Some(user_id) = metadata_user_id(&subscription.metadata) else {
            warn!(%subscription_id, "billing: deleted subscription without userId");
            return Ok(());
        };
        let Some(user) = self.users.find_by_id(user_id).await? else {
            warn!(%user_id, %subscription_id, "billing: deleted subscription for an unknown user");
            return Ok(());
        };
        if user.user_metadata.subscription_id.as_deref() != Some(subscription_id) {
            debug!(%user_id, %subscription_id, "billing: deleted subscription is not the current one");
            return Ok(());
        }

        let lifetime = user.user_metadata.subscription_plan == Some(SubscriptionPlan::Lifetime);
        let patch = if lifetime {
            MetadataPatch::new()
                .clear("subscription_id")
                .clear("subscription_cancelled")
        } else {
            MetadataPatch::clear_subscription()
        };
        let was_premium = PlanState::from_metadata(&user.user_metadata, Utc::now()).is_premium();

        self.users.update_metadata(user_id, patch).await?;
        self.plan_cache.invalidate(user_id).await;
        if was_premium && !lifetime {
            self.notify(user_id, SystemNotification::SubscriptionExpired)
                .await;
        }

        info!(%user_id, %subscription_id, lifetime, "billing: subscription ended");
        Ok(())
    }

    /// Writes the purchased plan onto the user's metadata and tells them about it.
    pub async fn activate_checkout(
        &self,
        metadata: &CheckoutMetadata,
        subscription_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AnyResult<DjUserEntity> {
        let user_id = metadata.user_id;
        let plan = if metadata.trial {
            SubscriptionPlan::Trial
        } else {
            metadata.plan
        };

        let (period, expires, notice) = match plan {
            SubscriptionPlan::Trial => (
                BillingPeriod::Weekly,
                Some(now + Duration::days(self.settings.trial_days)),
                SystemNotification::TrialStarted {
                    days: self.settings.trial_days,
                },
            ),
            SubscriptionPlan::Pro => (
                metadata.period,
                metadata.period.expiry_from(now),
                SystemNotification::SubscriptionActivated {
                    period: metadata.period,
                },
            ),
            SubscriptionPlan::Lifetime => (
                BillingPeriod::Unlimited,
                None,
                SystemNotification::LifetimeUnlocked,
            ),
        };

        let mut patch = MetadataPatch::activate_plan(plan, period, now, expires, subscription_id)
            .set("plan_source", "stripe");
        if plan == SubscriptionPlan::Trial {
            patch = patch.set("trial_used", true);
        }

        let user = self.users.update_metadata(user_id, patch).await?;
        self.plan_cache.invalidate(user_id).await;
        self.notify(user_id, notice).await;

        info!(%user_id, plan = %plan, period = %period, expires = ?expires, "billing: plan activated");
        Ok(user)
    }

    pub async fn check_user_exists(&self, email: &str) -> UseCaseResult<bool> {
        let email = email.trim();
        if email.is_empty() {
            return Err(BillingError::MissingEmail);
        }
        let user = self.users.find_by_email(email).await.map_err(|err| {
            error!(baas_error = ?err, "billing: user lookup by email failed");
            BillingError::Internal(err)
        })?;
        Ok(user.is_some())
    }

    /// Stops renewal at period end. The plan stays until the expiry sweep clears it.
    pub async fn cancel_subscription(
        &self,
        caller_id: Uuid,
        user_id: Uuid,
    ) -> UseCaseResult<CancelSubscriptionDto> {
        Self::ensure_caller(caller_id, user_id)?;
        let user = self.load_user(user_id).await?;

        let Some(subscription_id) = user.user_metadata.subscription_id.clone() else {
            let err = BillingError::NoActiveSubscription;
            warn!(%user_id, status = err.status_code().as_u16(), "billing: nothing to cancel");
            return Err(err);
        };

        let subscription = self
            .stripe
            .cancel_subscription(&subscription_id)
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, stripe_error = ?err, "billing: cancel failed");
                BillingError::Internal(err)
            })?;

        let ends_at = subscription
            .period_end()
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .or(user.user_metadata.subscription_expires);

        if let Err(err) = self
            .users
            .update_metadata(user_id, MetadataPatch::mark_cancelled())
            .await
        {
            error!(%user_id, baas_error = ?err, "billing: cancelled at Stripe but metadata write failed");
        }
        self.plan_cache.invalidate(user_id).await;
        self.notify(user_id, SystemNotification::SubscriptionCancelled { ends_at })
            .await;

        info!(%user_id, %subscription_id, ends_at = ?ends_at, "billing: subscription set to cancel");
        Ok(CancelSubscriptionDto {
            success: true,
            canceled: subscription.cancel_at_period_end,
            ends_at,
        })
    }

    /// Grants lifetime access for a code whose SHA-256 is configured.
    pub async fn redeem_code(&self, caller_id: Uuid, code: &str) -> UseCaseResult<PlanState> {
        let code = code.trim();
        if code.is_empty() || !self.settings.accepts_code(code) {
            let err = BillingError::InvalidRedeemCode;
            warn!(%caller_id, status = err.status_code().as_u16(), "billing: redeem code rejected");
            return Err(err);
        }

        let user = self.load_user(caller_id).await?;
        let now = Utc::now();
        if user.user_metadata.subscription_plan == Some(SubscriptionPlan::Lifetime) {
            return Ok(PlanState::from_metadata(&user.user_metadata, now));
        }

        // A running Stripe subscription id is kept so it can still be cancelled.
        let patch = MetadataPatch::activate_plan(
            SubscriptionPlan::Lifetime,
            BillingPeriod::Unlimited,
            now,
            None,
            user.user_metadata.subscription_id.clone(),
        )
        .set("plan_source", "redeem_code");

        let user = self
            .users
            .update_metadata(caller_id, patch)
            .await
            .map_err(|err| {
                error!(%caller_id, baas_error = ?err, "billing: failed to grant lifetime plan");
                BillingError::Internal(err)
            })?;

        let state = self.plan_cache.prime(&user).await;
        self.notify(caller_id, SystemNotification::LifetimeUnlocked)
            .await;
        info!(%caller_id, "billing: lifetime plan redeemed");
        Ok(state)
    }
}

fn metadata_user_id(metadata: &HashMap<String, String>) -> Option<Uuid> {
    metadata
        .get(META_USER_ID)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Trial subscriptions are billed monthly once they convert.
fn renewal_period(
    subscription_metadata: Option<&HashMap<String, String>>,
    stored: Option<BillingPeriod>,
) -> BillingPeriod {
    let purchased = subscription_metadata
        .and_then(|map| CheckoutMetadata::from_map(map).ok())
        .map(|metadata| {
            if metadata.trial {
                BillingPeriod::Monthly
            } else {
                metadata.period
            }
        });

    match purchased.or(stored) {
        Some(period @ (BillingPeriod::Monthly | BillingPeriod::Yearly)) => period,
        _ => BillingPeriod::Monthly,
    }
}
