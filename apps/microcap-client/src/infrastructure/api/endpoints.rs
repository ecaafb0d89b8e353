//! Typed endpoint operations.

use async_trait::async_trait;

use super::client::ApiClient;
use super::decode::DateStrategy;
use super::request::ApiRequest;
use super::types::{Ack, DeviceRegistration, LoginRequest, TokenResponse};
use crate::application::ports::{AccountGateway, RealtimeTokenProvider, WatchlistGateway};
use crate::domain::content::{
    AnalysisHub, EventCatalyst, PLAIN_DATE_FIELDS, PerformanceRecord, Scorecard, StockIdea,
    WatchlistAction, WatchlistUpdate, sort_newest_first,
};
use crate::error::ApiError;

impl ApiClient {
    /// `GET picks/daily`
    pub async fn fetch_daily_picks(&self) -> Result<Vec<StockIdea>, ApiError> {
        self.call(ApiRequest::get("picks/daily")).await
    }

    /// `GET picks/performance`
    pub async fn fetch_performance_history(&self) -> Result<Vec<PerformanceRecord>, ApiError> {
        self.call(ApiRequest::get("picks/performance")).await
    }

    /// Performance history summarized for display.
    pub async fn fetch_scorecard(&self) -> Result<Scorecard, ApiError> {
        self.fetch_performance_history()
            .await
            .map(Scorecard::from_records)
    }

    /// `GET watchlist`
    pub async fn fetch_watchlist(&self) -> Result<Vec<String>, ApiError> {
        self.call(ApiRequest::get("watchlist")).await
    }

    /// `POST watchlist` with `{ticker, action}`.
    pub async fn update_watchlist(
        &self,
        ticker: &str,
        action: WatchlistAction,
    ) -> Result<Ack, ApiError> {
        let update = WatchlistUpdate::new(ticker, action);
        self.call(ApiRequest::post("watchlist", &update)?).await
    }

    /// `GET analysis/hub/{ticker}`. Fundamentals dates are plain
    /// `YYYY-MM-DD`.
    ///
    /// The ticker is percent-encoded as a single path segment.
    pub async fn fetch_analysis_hub(&self, ticker: &str) -> Result<AnalysisHub, ApiError> {
        let segment = urlencoding::encode(ticker.trim());
        let request = ApiRequest::get(format!("analysis/hub/{segment}"))
            .with_date_strategy(DateStrategy::PlainDate {
                fields: PLAIN_DATE_FIELDS,
            });
        self.call(request).await
    }

    /// `GET config/realtime_token`
    pub async fn fetch_realtime_token(&self) -> Result<String, ApiError> {
        let response: TokenResponse = self.call(ApiRequest::get("config/realtime_token")).await?;
        Ok(response.token)
    }

    /// `POST user/register_device` with the push token.
    pub async fn register_device(&self, device_token: &str) -> Result<Ack, ApiError> {
        let body = DeviceRegistration {
            token: device_token,
        };
        self.call(ApiRequest::post("user/register_device", &body)?)
            .await
    }

    /// `DELETE user/account`, then log out.
    pub async fn delete_account(&self) -> Result<Ack, ApiError> {
        let ack = self.call(ApiRequest::delete("user/account")).await?;
        self.session().logout();
        Ok(ack)
    }

    /// `GET events/latest`, newest first.
    pub async fn fetch_latest_events(&self) -> Result<Vec<EventCatalyst>, ApiError> {
        let mut events: Vec<EventCatalyst> = self.call(ApiRequest::get("events/latest")).await?;
        sort_newest_first(&mut events);
        Ok(events)
    }

    /// `POST auth/login` with `{email}`. The one call made without a session.
    pub async fn login(&self, email: &str) -> Result<String, ApiError> {
        let body = LoginRequest { email };
        let response: TokenResponse = self
            .call_anonymous(ApiRequest::post("auth/login", &body)?)
            .await?;
        Ok(response.token)
    }
}

#[async_trait]
impl RealtimeTokenProvider for ApiClient {
    async fn fetch_realtime_token(&self) -> Result<String, ApiError> {
        Self::fetch_realtime_token(self).await
    }
}

#[async_trait]
impl AccountGateway for ApiClient {
    async fn exchange_login(&self, identifier: &str) -> Result<String, ApiError> {
        self.login(identifier).await
    }

    async fn remove_account(&self) -> Result<(), ApiError> {
        self.delete_account().await.map(|_| ())
    }
}

#[async_trait]
impl WatchlistGateway for ApiClient {
    async fn load_watchlist(&self) -> Result<Vec<String>, ApiError> {
        self.fetch_watchlist().await
    }

    async fn apply_watchlist_update(&self, update: &WatchlistUpdate) -> Result<(), ApiError> {
        self.update_watchlist(&update.ticker, update.action)
            .await
            .map(|_| ())
    }
}
