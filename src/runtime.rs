use anyhow::Context;
use tracing::info;

use crate::config::Settings;
use crate::handlers::api;
use crate::service::day_service::DayService;
use crate::store::DayStore;

pub fn open_service(settings: &Settings) -> anyhow::Result<DayService> {
    let store = DayStore::open(&settings.db_location)
        .with_context(|| format!("Unable to load store at {}", settings.db_location.display()))?
        .with_fact_policy(settings.fact_policy);
    info!(
        "Loaded {} day records from {} (fact policy: {})",
        store.len(),
        settings.db_location.display(),
        store.fact_policy()
    );
    Ok(DayService::new(store))
}

pub async fn run_api(settings: Settings) -> anyhow::Result<()> {
    let service = open_service(&settings)?;
    let routes = api::routes(service);

    info!("Day store listening on http://{}", settings.bind_addr);
    warp::serve(routes).run(settings.bind_addr).await;
    Ok(())
}
