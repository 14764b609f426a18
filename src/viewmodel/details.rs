use std::sync::{Arc, RwLock};

use tracing::Instrument;

use crate::device::alerts::{Alert, AlertSurface};
use crate::device::maps::MapLauncher;
use crate::recipes::model::Recipe;
use crate::telemetry;
use crate::telemetry::ops::details::Phase as DetailsPhase;

use super::observable::{Property, ViewModelBase};

pub struct RecipeDetailsViewModel {
    base: ViewModelBase,
    recipe: RwLock<Arc<Recipe>>,
    maps: Arc<dyn MapLauncher>,
    alerts: Arc<dyn AlertSurface>,
}

fn details_title(recipe: &Recipe) -> String {
    format!("{} Details", recipe.name)
}

impl RecipeDetailsViewModel {
    pub fn new(recipe: Arc<Recipe>, maps: Arc<dyn MapLauncher>, alerts: Arc<dyn AlertSurface>) -> Self {
        let base = ViewModelBase::new(details_title(&recipe));
        Self { base, recipe: RwLock::new(recipe), maps, alerts }
    }

    pub fn base(&self) -> &ViewModelBase {
        &self.base
    }

    pub fn recipe(&self) -> Arc<Recipe> {
        self.recipe.read().expect("recipe lock poisoned").clone()
    }

    /// Swaps the shown recipe; same instance is a no-op.
    pub fn set_recipe(&self, recipe: Arc<Recipe>) {
        let title = details_title(&recipe);
        {
            let mut current = self.recipe.write().expect("recipe lock poisoned");
            if Arc::ptr_eq(&current, &recipe) {
                return;
            }
            *current = recipe;
        }
        self.base.notify(Property::Recipe);
        self.base.set_title(title);
    }

    /// Opens the recipe's position in the maps app; returns what was opened.
    pub async fn open_map(&self) -> Option<String> {
        let log = telemetry::details();
        let recipe = self.recipe();
        let opened = self
            .maps
            .open(recipe.coordinates(), &recipe.name)
            .instrument(log.span_kv(&DetailsPhase::OpenMap, [("recipe", recipe.name.clone())]))
            .await;

        match opened {
            Ok(target) => Some(target),
            Err(err) => {
                log.error(format!("Unable to launch maps: {err}"));
                self.alerts.show_alert(Alert::ok("Error, no Maps app!", err.to_string())).await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::alerts::MockAlerts;
    use crate::device::maps::OsmLinkMaps;
    use crate::recipes::model::sample;

    fn vm(recipe: Recipe, alerts: &Arc<MockAlerts>) -> RecipeDetailsViewModel {
        RecipeDetailsViewModel::new(Arc::new(recipe), Arc::new(OsmLinkMaps::default()), alerts.clone())
    }

    #[test]
    fn title_follows_recipe() {
        let alerts = Arc::new(MockAlerts::default());
        let details = vm(sample("Tarte", 48.85, 2.35), &alerts);
        assert_eq!(details.base().title(), "Tarte Details");

        let mut rx = details.base().subscribe();
        let paella = Arc::new(sample("Paella", 39.47, -0.38));
        details.set_recipe(paella.clone());
        details.set_recipe(paella);
        assert_eq!(details.base().title(), "Paella Details");
        assert_eq!(rx.try_recv().unwrap(), Property::Recipe);
        assert_eq!(rx.try_recv().unwrap(), Property::Title);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn open_map_returns_link() {
        let alerts = Arc::new(MockAlerts::default());
        let details = vm(sample("Tarte", 48.85, 2.35), &alerts);
        let link = details.open_map().await.unwrap();
        assert!(link.contains("mlat=48.85"));
        assert!(alerts.shown().is_empty());
    }

    #[tokio::test]
    async fn open_map_failure_alerts() {
        let alerts = Arc::new(MockAlerts::default());
        let details = vm(sample("Nowhere", 120.0, 0.0), &alerts);
        assert!(details.open_map().await.is_none());
        let shown = alerts.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Error, no Maps app!");
        assert!(shown[0].message.starts_with("unable to open maps"));
    }
}
