//! In-memory copy of `system_config`.
//!
//! Loaded once at startup and updated in place when an administrator edits a
//! key, so request handlers never hit the database for these values. Every
//! accessor falls back to the static `AppConfig` (or a built-in default) when
//! the key is missing or unparsable.

use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::models::system::entities::KnownSettingKey;

static DYNAMIC_CONFIG: OnceLock<RwLock<DynamicConfigCache>> = OnceLock::new();

pub const DEFAULT_TRANSFER_MIN_AMOUNT: i64 = 1;
pub const DEFAULT_TRANSFER_MAX_AMOUNT: i64 = 1_000_000;
pub const DEFAULT_TRANSFER_MAX_RECIPIENTS: i64 = 20;
pub const DEFAULT_INITIAL_BALANCE: i64 = 0;

#[derive(Debug, Default)]
struct DynamicConfigCache {
    settings: HashMap<String, String>,
    initialized: bool,
}

/// Transfer limits read together for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    pub min_amount: i64,
    pub max_amount: i64,
    pub max_recipients: i64,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            min_amount: DEFAULT_TRANSFER_MIN_AMOUNT,
            max_amount: DEFAULT_TRANSFER_MAX_AMOUNT,
            max_recipients: DEFAULT_TRANSFER_MAX_RECIPIENTS,
        }
    }
}

pub struct DynamicConfig;

impl DynamicConfig {
    /// Replaces the whole cache, called at startup
    pub async fn init(settings: Vec<(String, String)>) {
        let cache = DYNAMIC_CONFIG.get_or_init(|| RwLock::new(DynamicConfigCache::default()));

        let mut guard = cache.write().await;
        guard.settings.clear();
        for (key, value) in settings {
            guard.settings.insert(key, value);
        }
        guard.initialized = true;

        tracing::info!(
            "Dynamic config loaded with {} settings",
            guard.settings.len()
        );
    }

    pub async fn update(key: &str, value: &str) {
        let cache = DYNAMIC_CONFIG.get_or_init(|| RwLock::new(DynamicConfigCache::default()));
        let mut guard = cache.write().await;
        guard.settings.insert(key.to_string(), value.to_string());
        tracing::debug!("Dynamic config updated: {} = {}", key, value);
    }

    async fn get_string(key: KnownSettingKey) -> Option<String> {
        let cache = DYNAMIC_CONFIG.get()?;
        let guard = cache.read().await;
        guard.settings.get(key.as_str()).cloned()
    }

    async fn get_i64(key: KnownSettingKey) -> Option<i64> {
        Self::get_string(key)
            .await
            .and_then(|v| v.trim().parse().ok())
    }

    pub async fn system_name() -> String {
        Self::get_string(KnownSettingKey::SystemName)
            .await
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| AppConfig::get().app.system_name.clone())
    }

    /// Minutes
    pub async fn access_token_expiry() -> i64 {
        Self::get_i64(KnownSettingKey::AccessTokenExpiry)
            .await
            .filter(|v| *v > 0)
            .unwrap_or_else(|| AppConfig::get().jwt.access_token_expiry)
    }

    /// Days
    pub async fn refresh_token_expiry() -> i64 {
        AppConfig::get().jwt.refresh_token_expiry
    }

    /// Days
    pub async fn refresh_token_remember_me_expiry() -> i64 {
        AppConfig::get().jwt.refresh_token_remember_me_expiry
    }

    pub async fn initial_balance() -> i64 {
        Self::get_i64(KnownSettingKey::InitialBalance)
            .await
            .filter(|v| *v >= 0)
            .unwrap_or(DEFAULT_INITIAL_BALANCE)
    }

    pub async fn transfer_limits() -> TransferLimits {
        let defaults = TransferLimits::default();
        TransferLimits {
            min_amount: Self::get_i64(KnownSettingKey::TransferMinAmount)
                .await
                .filter(|v| *v > 0)
                .unwrap_or(defaults.min_amount),
            max_amount: Self::get_i64(KnownSettingKey::TransferMaxAmount)
                .await
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_amount),
            max_recipients: Self::get_i64(KnownSettingKey::TransferMaxRecipients)
                .await
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_recipients),
        }
    }

    pub async fn is_initialized() -> bool {
        match DYNAMIC_CONFIG.get() {
            Some(cache) => cache.read().await.initialized,
            None => false,
        }
    }
}
