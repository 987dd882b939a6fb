use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::services::system::DynamicConfig;
use crate::storage::Storage;
use crate::utils::password::{generate_password, hash_password};
use crate::utils::rut::normalize_rut;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_ADMIN_RUT: &str = "11111111-1";
const DEFAULT_ADMIN_EMAIL: &str = "admin@bancarizate.cl";
const FALLBACK_CACHE: &str = "moka";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

async fn try_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let Some(constructor) = get_object_cache_plugin(name) else {
        warn!("Cache backend '{}' not found in registry", name);
        return None;
    };

    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// Configured backend, falling back to the in-memory one
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = try_cache(cache_type).await {
        return Ok(cache);
    }

    if cache_type != FALLBACK_CACHE {
        warn!("Falling back to {} (in-memory) cache", FALLBACK_CACHE);
        if let Some(cache) = try_cache(FALLBACK_CACHE).await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

async fn init_dynamic_config(storage: &Arc<dyn Storage>) {
    match storage.list_all_settings().await {
        Ok(settings) => {
            let settings_vec: Vec<(String, String)> =
                settings.into_iter().map(|s| (s.key, s.value)).collect();
            DynamicConfig::init(settings_vec).await;
        }
        Err(e) => {
            warn!(
                "Failed to load dynamic config from database: {}, using defaults",
                e
            );
            DynamicConfig::init(vec![]).await;
        }
    }
}

/// Account created on an empty database. `password` is still plain text.
fn admin_account(rut: Option<&str>, password: String) -> Result<NewUser, &'static str> {
    let rut = normalize_rut(rut.unwrap_or(DEFAULT_ADMIN_RUT))?;

    Ok(NewUser {
        rut,
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        password_hash: password,
        role: UserRole::Admin,
        first_name: "Administrador".to_string(),
        last_name: "Bancarizate".to_string(),
        phone: None,
        balance: 0,
        institution_id: None,
        course_id: None,
    })
}

async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let admin_rut = std::env::var("ADMIN_RUT").ok();
    let mut admin = match admin_account(admin_rut.as_deref(), password) {
        Ok(admin) => admin,
        Err(e) => {
            warn!("Invalid ADMIN_RUT: {}, skipping admin seed", e);
            return;
        }
    };

    admin.password_hash = match hash_password(&admin.password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    match storage.create_user(admin).await {
        Ok(user) => {
            info!(
                "Default admin account created successfully (ID: {}, RUT: {})",
                user.id, user.rut
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// Storage, dynamic settings, admin seed and cache, in that order
pub async fn prepare_server_startup() -> StartupContext {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    init_dynamic_config(&storage).await;

    seed_admin(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    StartupContext { storage, cache }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_account_defaults() {
        let admin = admin_account(None, "Segura2025".to_string()).unwrap();
        assert_eq!(admin.rut, DEFAULT_ADMIN_RUT);
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.balance, 0);
    }

    #[test]
    fn test_admin_account_normalizes_rut() {
        let admin = admin_account(Some("12.345.678-5"), "Segura2025".to_string()).unwrap();
        assert_eq!(admin.rut, "12345678-5");
        assert!(admin_account(Some("12.345.678-9"), String::new()).is_err());
    }
}
