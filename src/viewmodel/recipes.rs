use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::device::alerts::{Alert, AlertSurface};
use crate::device::camera::Camera;
use crate::device::location::{Location, LocationProvider, LocationResolver};
use crate::device::permissions::{Permission, PermissionAuthority, PermissionsManager};
use crate::error::CookbookError;
use crate::geo::{self, DistanceUnit};
use crate::recipes::fetch::RecipeSource;
use crate::recipes::model::Recipe;
use crate::telemetry::{self, ctx::{LogCtx, OpMarker}};
use crate::telemetry::ops::closest::Phase as ClosestPhase;
use crate::telemetry::ops::refresh::Phase as RefreshPhase;
use crate::telemetry::ops::tag::Phase as TagPhase;
use crate::vision::{Classifier, Prediction};

use super::observable::{ObservableList, Property, ViewModelBase};

/// Everything the recipe list screen needs from the outside world.
#[derive(Clone)]
pub struct RecipeServices {
    pub source: Arc<dyn RecipeSource>,
    pub location: Arc<dyn LocationProvider>,
    pub permissions: Arc<dyn PermissionAuthority>,
    pub alerts: Arc<dyn AlertSurface>,
    pub camera: Arc<dyn Camera>,
    pub classifier: Option<Arc<dyn Classifier>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    /// Another refresh was in flight.
    Dropped,
    Loaded(usize),
    Failed(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct ClosestRecipe {
    pub recipe: Recipe,
    pub distance: f64,
    pub unit: &'static str,
    pub origin: Location,
}

pub struct RecipesViewModel {
    base: ViewModelBase,
    recipes: ObservableList<Arc<Recipe>>,
    services: RecipeServices,
    permissions: PermissionsManager,
    resolver: LocationResolver,
    unit: DistanceUnit,
}

impl RecipesViewModel {
    pub fn new(services: RecipeServices, resolver: LocationResolver) -> Self {
        let base = ViewModelBase::new("Recipes");
        let recipes = ObservableList::new(Property::Recipes, base.sender());
        let permissions = PermissionsManager::new(services.permissions.clone(), services.alerts.clone());
        Self { base, recipes, services, permissions, resolver, unit: DistanceUnit::Miles }
    }

    /// Unit for reported distances; miles unless changed.
    pub fn with_unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn base(&self) -> &ViewModelBase {
        &self.base
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Property> {
        self.base.subscribe()
    }

    pub fn recipes(&self) -> Vec<Arc<Recipe>> {
        self.recipes.snapshot()
    }

    pub fn recipe(&self, index: usize) -> Option<Arc<Recipe>> {
        self.recipes.get(index)
    }

    /// Re-fetches the list. Dropped while a previous refresh is running; on
    /// failure the current list stays as it was.
    pub async fn refresh(&self) -> RefreshOutcome {
        let log = telemetry::refresh();
        let Some(_busy) = self.base.try_begin_busy() else {
            log.info("refresh already in flight, dropped");
            return RefreshOutcome::Dropped;
        };

        let fetched = self
            .services
            .source
            .fetch_recipes()
            .instrument(log.span(&RefreshPhase::Fetch))
            .await;

        match fetched {
            Ok(recipes) => {
                let count = recipes.len();
                let _s = log.span(&RefreshPhase::Publish).entered();
                self.recipes.replace_all(recipes.into_iter().map(Arc::new));
                log.loaded(count);
                RefreshOutcome::Loaded(count)
            }
            Err(err) => {
                self.report(&log, "Unable to get recipes", &err).await;
                RefreshOutcome::Failed(err.to_string())
            }
        }
    }

    /// Ranks the current list against the device position and announces the winner.
    pub async fn get_closest(&self) -> Option<ClosestRecipe> {
        let log = telemetry::closest();
        if self.base.is_busy() {
            log.info("refresh in flight, closest skipped");
            return None;
        }
        if self.recipes.is_empty() {
            log.info("no recipes to rank");
            return None;
        }

        match self.find_closest(&log).instrument(log.root_span()).await {
            Ok(Some(hit)) => {
                log.hit(&hit.recipe.name, hit.distance, hit.unit);
                let message = format!("{} at {}", hit.recipe.name, hit.recipe.location);
                self.services.alerts.show_alert(Alert::ok("Closest recipe", message)).await;
                Some(hit)
            }
            Ok(None) => {
                self.services
                    .alerts
                    .show_alert(Alert::ok("No recipe found", "Something went wrong !"))
                    .await;
                None
            }
            // the settings prompt was already shown
            Err(CookbookError::PermissionDenied(_)) => None,
            Err(err) => {
                self.report(&log, "Unable to query location", &err).await;
                None
            }
        }
    }

    async fn find_closest(&self, log: &LogCtx<telemetry::ops::closest::Closest>) -> Result<Option<ClosestRecipe>, CookbookError> {
        let granted = self
            .permissions
            .request_permissions(&[Permission::Location])
            .instrument(log.span(&ClosestPhase::Permission))
            .await;
        if !granted {
            return Err(CookbookError::PermissionDenied(vec![Permission::Location]));
        }

        let here = self
            .resolver
            .resolve(self.services.location.as_ref())
            .instrument(log.span(&ClosestPhase::Locate))
            .await?;

        let snapshot = self.recipes.snapshot();
        let _s = log.span_kv(&ClosestPhase::Rank, [("candidates", snapshot.len().to_string())]).entered();
        Ok(geo::closest(&snapshot, here.coordinates(), self.unit, |r| r.coordinates()).map(|(r, distance)| {
            ClosestRecipe {
                recipe: Recipe::clone(r),
                distance,
                unit: self.unit.suffix(),
                origin: here.clone(),
            }
        }))
    }

    /// Photographs a dish and asks the classifier what it is.
    pub async fn get_by_picture(&self) -> Option<Prediction> {
        let log = telemetry::tag();
        match self.classify_photo(&log).instrument(log.root_span()).await {
            Ok(Some(p)) => {
                let message = format!("Show {} recipes? ({:.1}% sure)", p.tag, p.probability * 100.0);
                self.services.alerts.show_alert(Alert::ok("Looks tasty!", message)).await;
                Some(p)
            }
            Ok(None) => {
                self.services
                    .alerts
                    .show_alert(Alert::ok("No tag found", "The picture did not match any known dish"))
                    .await;
                None
            }
            // the settings prompt was already shown
            Err(CookbookError::PermissionDenied(_)) => None,
            Err(err) => {
                self.report(&log, "Unable to get tags", &err).await;
                None
            }
        }
    }

    async fn classify_photo(&self, log: &LogCtx<telemetry::ops::tag::Tag>) -> Result<Option<Prediction>, CookbookError> {
        if !self.services.camera.is_available() {
            return Err(CookbookError::CameraUnavailable);
        }
        let granted = self
            .permissions
            .request_permissions(&[Permission::Camera])
            .instrument(log.span(&TagPhase::Permission))
            .await;
        if !granted {
            return Err(CookbookError::PermissionDenied(vec![Permission::Camera]));
        }
        let classifier = self
            .services
            .classifier
            .as_ref()
            .ok_or_else(|| CookbookError::Config("image classifier is not configured".into()))?;

        let image = self
            .services
            .camera
            .take_photo()
            .instrument(log.span(&TagPhase::Capture))
            .await?;
        let size = image.len();
        classifier
            .classify(image)
            .instrument(log.span_kv(&TagPhase::Classify, [("bytes", size.to_string())]))
            .await
    }

    /// Logs the failure and turns it into a single acknowledgement alert.
    async fn report<O: OpMarker>(&self, log: &LogCtx<O>, context: &str, err: &CookbookError) {
        log.error_kv(
            &format!("{context}: {err}"),
            [("network", err.is_network().to_string()), ("retryable", err.is_retryable().to_string())],
        );
        self.services.alerts.show_alert(Alert::ok("Error!", err.to_string())).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::device::alerts::MockAlerts;
    use crate::device::camera::MockCamera;
    use crate::device::location::MockLocationProvider;
    use crate::device::permissions::MockPermissions;
    use crate::recipes::fetch::MockRecipeSource;
    use crate::recipes::model::{self, sample};
    use crate::vision::MockClassifier;

    struct Harness {
        vm: RecipesViewModel,
        source: Arc<MockRecipeSource>,
        alerts: Arc<MockAlerts>,
        perms: Arc<MockPermissions>,
        location: Arc<MockLocationProvider>,
    }

    struct Setup {
        source: MockRecipeSource,
        perms: MockPermissions,
        location: MockLocationProvider,
        camera: MockCamera,
        classifier: Option<MockClassifier>,
        alert_answer: usize,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                source: MockRecipeSource::new(),
                perms: MockPermissions::granted(),
                location: MockLocationProvider::at(0.0, 0.0),
                camera: MockCamera::missing(),
                classifier: None,
                alert_answer: 0,
            }
        }
    }

    fn harness(setup: Setup) -> Harness {
        let source = Arc::new(setup.source);
        let alerts = Arc::new(MockAlerts::answering(setup.alert_answer));
        let perms = Arc::new(setup.perms);
        let location = Arc::new(setup.location);
        let services = RecipeServices {
            source: source.clone(),
            location: location.clone(),
            permissions: perms.clone(),
            alerts: alerts.clone(),
            camera: Arc::new(setup.camera),
            classifier: setup.classifier.map(|c| Arc::new(c) as Arc<dyn Classifier>),
        };
        let resolver = LocationResolver::new(Duration::from_secs(600), Duration::from_millis(200));
        Harness { vm: RecipesViewModel::new(services, resolver), source, alerts, perms, location }
    }

    fn names(vm: &RecipesViewModel) -> Vec<String> {
        vm.recipes().iter().map(|r| r.name.clone()).collect()
    }

    fn drain(rx: &mut broadcast::Receiver<Property>) -> Vec<Property> {
        let mut out = Vec::new();
        while let Ok(p) = rx.try_recv() {
            out.push(p);
        }
        out
    }

    #[tokio::test]
    async fn refresh_loads_tarte_from_feed() {
        let h = harness(Setup::default());
        let body = r#"[{"Name":"Tarte","Location":"Paris","Details":"...","Image":"http://x/i.png","Population":0,"Latitude":48.85,"Longitude":2.35}]"#;
        h.source.push_response(model::from_json(body.as_bytes()));

        assert_eq!(h.vm.refresh().await, RefreshOutcome::Loaded(1));
        assert_eq!(h.vm.recipes().len(), 1);
        assert_eq!(h.vm.recipe(0).unwrap().name, "Tarte");
        assert!(h.vm.base().is_not_busy());
        assert!(h.alerts.shown().is_empty());
    }

    #[tokio::test]
    async fn refresh_replaces_list_in_server_order() {
        let h = harness(Setup::default());
        h.source.push_response(Ok(vec![sample("a", 0.0, 0.0), sample("b", 1.0, 1.0)]));
        h.source.push_response(Ok(vec![sample("z", 0.0, 0.0), sample("y", 0.0, 0.0), sample("z", 0.0, 0.0)]));

        h.vm.refresh().await;
        assert_eq!(names(&h.vm), vec!["a", "b"]);
        h.vm.refresh().await;
        assert_eq!(names(&h.vm), vec!["z", "y", "z"]);
        assert_eq!(h.source.calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_list_and_alerts() {
        let h = harness(Setup::default());
        h.source.push_response(Ok(vec![sample("keep", 0.0, 0.0)]));
        h.source.push_response(model::from_json(b"{broken"));
        h.vm.refresh().await;

        let outcome = h.vm.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed(ref m) if m.starts_with("invalid recipe data")));
        assert_eq!(names(&h.vm), vec!["keep"]);
        assert!(h.vm.base().is_not_busy());

        let shown = h.alerts.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Error!");
        assert_eq!(shown[0].actions, vec!["OK"]);
        assert!(shown[0].message.starts_with("invalid recipe data"));
    }

    #[tokio::test]
    async fn network_failure_releases_busy_flag() {
        let h = harness(Setup::default());
        // empty queue -> Timeout
        assert!(matches!(h.vm.refresh().await, RefreshOutcome::Failed(_)));
        assert!(h.vm.base().is_not_busy());
        assert_eq!(h.alerts.shown()[0].message, "request timed out");
    }

    #[tokio::test]
    async fn overlapping_refresh_is_dropped() {
        let h = harness(Setup { source: MockRecipeSource::gated(), ..Setup::default() });
        h.source.push_response(Ok(vec![sample("first", 0.0, 0.0)]));
        h.source.push_response(Ok(vec![sample("second", 0.0, 0.0)]));

        let (first, second) = tokio::join!(h.vm.refresh(), async {
            h.source.wait_entered().await;
            assert!(h.vm.base().is_busy());
            let second = h.vm.refresh().await;
            h.source.release();
            second
        });

        assert_eq!(first, RefreshOutcome::Loaded(1));
        assert_eq!(second, RefreshOutcome::Dropped);
        assert_eq!(h.source.calls(), 1);
        assert_eq!(names(&h.vm), vec!["first"]);
    }

    #[tokio::test]
    async fn refresh_publishes_changes() {
        let h = harness(Setup::default());
        let mut rx = h.vm.subscribe();
        h.source.push_response(Ok(vec![sample("a", 0.0, 0.0)]));
        h.vm.refresh().await;
        assert_eq!(
            drain(&mut rx),
            vec![Property::IsBusy, Property::IsNotBusy, Property::Recipes, Property::IsBusy, Property::IsNotBusy]
        );
    }

    #[tokio::test]
    async fn closest_picks_nearest_and_announces_it() {
        let h = harness(Setup::default());
        h.source.push_response(Ok(vec![sample("origin", 0.0, 0.0), sample("far", 10.0, 10.0), sample("near", 1.0, 1.0)]));
        h.vm.refresh().await;

        let hit = h.vm.get_closest().await.unwrap();
        assert_eq!(hit.recipe.name, "origin");
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.unit, "mi");

        let shown = h.alerts.shown();
        assert_eq!(shown.last().unwrap().title, "Closest recipe");
        assert_eq!(shown.last().unwrap().message, "origin at origin town");
    }

    #[tokio::test]
    async fn closest_in_kilometers() {
        let h = harness(Setup::default());
        h.source.push_response(Ok(vec![sample("near", 0.0, 1.0)]));
        let vm = h.vm.with_unit(DistanceUnit::Kilometers);
        vm.refresh().await;

        let hit = vm.get_closest().await.unwrap();
        assert_eq!(hit.unit, "km");
        assert!((hit.distance - 111.2).abs() < 0.5, "{}", hit.distance);
    }

    #[tokio::test]
    async fn closest_on_empty_list_does_nothing() {
        let h = harness(Setup::default());
        assert!(h.vm.get_closest().await.is_none());
        assert!(h.alerts.shown().is_empty());
        assert!(h.perms.requested().is_empty());
        assert_eq!(h.location.current_calls(), 0);
    }

    #[tokio::test]
    async fn closest_without_permission_prompts_for_settings() {
        let h = harness(Setup { perms: MockPermissions::default(), alert_answer: 0, ..Setup::default() });
        h.source.push_response(Ok(vec![sample("a", 0.0, 0.0)]));
        h.vm.refresh().await;

        assert!(h.vm.get_closest().await.is_none());
        let shown = h.alerts.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Feature(s) unavailable");
        assert_eq!(h.perms.settings_opened(), 1);
        assert_eq!(h.location.current_calls(), 0);
    }

    #[tokio::test]
    async fn closest_without_fix_reports_error() {
        let h = harness(Setup { location: MockLocationProvider { hang: true, ..MockLocationProvider::default() }, ..Setup::default() });
        h.source.push_response(Ok(vec![sample("a", 0.0, 0.0)]));
        h.vm.refresh().await;

        assert!(h.vm.get_closest().await.is_none());
        let shown = h.alerts.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Error!");
        assert!(shown[0].message.starts_with("location unavailable"));
        assert!(h.vm.base().is_not_busy());
    }

    #[tokio::test]
    async fn closest_is_skipped_while_refreshing() {
        let h = harness(Setup { source: MockRecipeSource::gated(), ..Setup::default() });
        h.source.push_response(Ok(vec![sample("a", 0.0, 0.0)]));
        h.source.release();
        h.vm.refresh().await;

        h.source.push_response(Ok(vec![sample("b", 0.0, 0.0)]));
        let (_, during) = tokio::join!(h.vm.refresh(), async {
            h.source.wait_entered().await;
            let during = h.vm.get_closest().await;
            h.source.release();
            during
        });
        assert!(during.is_none());
        assert!(h.alerts.shown().is_empty());
    }

    #[tokio::test]
    async fn picture_without_camera_alerts() {
        let h = harness(Setup::default());
        assert!(h.vm.get_by_picture().await.is_none());
        let shown = h.alerts.shown();
        assert_eq!(shown[0].title, "Error!");
        assert_eq!(shown[0].message, "no camera detected");
    }

    #[tokio::test]
    async fn picture_is_tagged_by_classifier() {
        let h = harness(Setup {
            camera: MockCamera::with_image(b"jpeg"),
            classifier: Some(MockClassifier::tagging("tarte", 0.93)),
            ..Setup::default()
        });
        let p = h.vm.get_by_picture().await.unwrap();
        assert_eq!(p.tag, "tarte");
        let shown = h.alerts.shown();
        assert_eq!(shown[0].title, "Looks tasty!");
        assert_eq!(shown[0].message, "Show tarte recipes? (93.0% sure)");
    }

    #[tokio::test]
    async fn picture_without_camera_permission_prompts_for_settings() {
        let h = harness(Setup {
            perms: MockPermissions::default(),
            alert_answer: 1,
            camera: MockCamera::with_image(b"jpeg"),
            classifier: Some(MockClassifier::tagging("tarte", 0.93)),
            ..Setup::default()
        });
        assert!(h.vm.get_by_picture().await.is_none());
        assert_eq!(h.perms.requested(), vec![vec![Permission::Camera]]);
        let shown = h.alerts.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Feature(s) unavailable");
        assert_eq!(h.perms.settings_opened(), 0);
    }

    #[tokio::test]
    async fn picture_without_classifier_is_config_error() {
        let h = harness(Setup { camera: MockCamera::with_image(b"jpeg"), ..Setup::default() });
        assert!(h.vm.get_by_picture().await.is_none());
        assert_eq!(
            h.alerts.shown()[0].message,
            "configuration error: image classifier is not configured"
        );
    }
}
