// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pulse: daily wellness check-ins
//!
//! This crate provides the backend API for recording one check-in per user
//! per day (energy, sleep, mood, fatigue and pain) and reading them back for
//! the dashboard, plus the session state used by signed-in clients.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{CheckinStore, ProfileStore};
use services::{CheckinService, GoTrueClient, ProfileLoader};
use std::sync::Arc;
use time_utils::Clock;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth_client: GoTrueClient,
    pub profiles: ProfileLoader,
    pub checkins: CheckinService,
}

impl AppState {
    /// Wire services over one store backend.
    pub fn new<S>(config: Config, store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: ProfileStore + CheckinStore + 'static,
    {
        let auth_client = GoTrueClient::new(&config.auth_url, config.auth_anon_key.clone());
        let profiles = ProfileLoader::new(
            store.clone(),
            clock.clone(),
            config.profile_retry_policy(),
        );
        let checkins = CheckinService::new(store, clock);

        Self {
            config,
            auth_client,
            profiles,
            checkins,
        }
    }
}
