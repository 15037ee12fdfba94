pub mod store;
pub use store::{LibraryStore, SettingsStore, TenantStore, UserStore};
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod library_repo;
pub use library_repo::LibraryRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod memory;

use std::sync::Arc;

use sqlx::PgPool;

/// Os stores que a aplicação consome, já atrás das traits.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tenants: Arc<dyn TenantStore>,
    pub library: Arc<dyn LibraryStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            tenants: Arc::new(TenantRepository::new(pool.clone())),
            library: Arc::new(LibraryRepository::new(pool.clone())),
            settings: Arc::new(SettingsRepository::new(pool)),
        }
    }

    /// Todas as traits sobre o mesmo `MemoryStore`, para que usuários e escolas fiquem coerentes.
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            tenants: Arc::new(store.clone()),
            library: Arc::new(store.clone()),
            settings: Arc::new(store),
        }
    }
}
