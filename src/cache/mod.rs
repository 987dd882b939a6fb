//! Pluggable object cache.
//!
//! Backends register themselves at load time through
//! [`declare_object_cache_plugin!`](crate::declare_object_cache_plugin) and are
//! picked by name from `cache.type`.

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

/// Registers a cache backend under `$name`.
///
/// `$ty` must expose `fn new() -> Result<Self, String>`.
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    let fut: $crate::cache::register::BoxedObjectCacheFuture = Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::BancarizateError::cache_connection)?;
                        Ok::<Box<dyn $crate::cache::ObjectCache>, $crate::errors::BancarizateError>(
                            Box::new(cache),
                        )
                    });
                    fut
                }),
            );
        }
    };
}
