use std::sync::Arc;

use anyhow::Context;

use stockbook_core::StoreCode;
use stockbook_directory::{
    CachedVendorDirectory, EmployeeDirectory, InMemoryDirectory, ItemCatalog, SafetyStockConfig,
    StoreDirectory, VendorDirectory,
};
use stockbook_infra::{
    InMemoryStore, MovementStore, OrderService, OrderStore, PostgresStore, StockService,
    TaskLedgerService, TaskStore,
};
use stockbook_orders::TaxRate;

/// Runtime configuration for the service wiring.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub head_office: StoreCode,
    pub tax_rate: TaxRate,
    /// When set, movements/orders/tasks persist to Postgres; otherwise
    /// everything lives in one in-memory store (dev/tests).
    pub database_url: Option<String>,
}

impl ServiceConfig {
    /// Read configuration from the environment: `HEAD_OFFICE` (default
    /// `HQ`), `TAX_BASIS_POINTS` (default `700`, i.e. 7%), `DATABASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let head_office = std::env::var("HEAD_OFFICE").unwrap_or_else(|_| "HQ".to_string());
        let head_office = StoreCode::new(head_office).context("HEAD_OFFICE")?;

        let tax_basis_points = match std::env::var("TAX_BASIS_POINTS") {
            Ok(raw) => raw.parse::<u32>().context("TAX_BASIS_POINTS")?,
            Err(_) => 700,
        };

        Ok(Self {
            head_office,
            tax_rate: TaxRate::from_basis_points(tax_basis_points),
            database_url: std::env::var("DATABASE_URL").ok(),
        })
    }

    pub fn in_memory(head_office: StoreCode, tax_rate: TaxRate) -> Self {
        Self {
            head_office,
            tax_rate,
            database_url: None,
        }
    }
}

type DynMovements = Arc<dyn MovementStore>;
type DynOrders = Arc<dyn OrderStore>;
type DynTasks = Arc<dyn TaskStore>;
type DynCatalog = Arc<dyn ItemCatalog>;
type DynStores = Arc<dyn StoreDirectory>;

/// Engine services plus the directory reads the handlers need.
pub struct AppServices {
    pub stock: StockService<DynMovements, DynCatalog, DynStores>,
    pub orders: OrderService<DynMovements, DynOrders, DynCatalog, DynStores>,
    pub tasks: TaskLedgerService<DynTasks>,
    pub employees: Arc<dyn EmployeeDirectory>,
    pub stores: DynStores,
    pub vendors: Arc<dyn VendorDirectory>,
}

/// Wire the engine services over either store backend.
pub async fn build_services(
    config: ServiceConfig,
    directory: Arc<InMemoryDirectory>,
) -> anyhow::Result<AppServices> {
    let (movements, orders, tasks): (DynMovements, DynOrders, DynTasks) =
        match &config.database_url {
            Some(url) => {
                let pool = sqlx::PgPool::connect(url)
                    .await
                    .context("connecting to DATABASE_URL")?;
                let store = Arc::new(PostgresStore::new(pool));
                store.migrate().await.context("running migrations")?;
                (store.clone(), store.clone(), store)
            }
            None => {
                let store = Arc::new(InMemoryStore::new());
                (store.clone(), store.clone(), store)
            }
        };

    let catalog: DynCatalog = directory.clone();
    let stores: DynStores = directory.clone();
    // Vendor lookups sit on request paths but change rarely upstream.
    let vendors = Arc::new(CachedVendorDirectory::new(
        directory.clone(),
        std::time::Duration::from_secs(300),
    ));

    Ok(AppServices {
        stock: StockService::new(
            movements.clone(),
            catalog.clone(),
            stores.clone(),
            SafetyStockConfig::new(),
        ),
        orders: OrderService::new(
            movements,
            orders,
            catalog,
            stores.clone(),
            config.head_office,
            config.tax_rate,
        ),
        tasks: TaskLedgerService::new(tasks),
        employees: directory,
        stores,
        vendors,
    })
}
