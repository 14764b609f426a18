use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use url::Url;
use clap::Args;

use crate::config::AppConfig;
use crate::device::alerts::{AlertSurface, ConsoleAlerts};
use crate::device::camera::FileCamera;
use crate::device::location::{FixedLocationProvider, LocationResolver};
use crate::device::maps::OsmLinkMaps;
use crate::device::permissions::{Permission, StaticPermissions};
use crate::geo::{self, Coordinates, DistanceUnit};
use crate::output::types::Meta;
use crate::telemetry::{self};
use crate::viewmodel::details::RecipeDetailsViewModel;
use crate::viewmodel::recipes::{RecipeServices, RecipesViewModel, RefreshOutcome};
use crate::vision::{Classifier, CustomVisionClassifier};

pub mod fetch;
pub mod model;
pub mod types;

use fetch::WebRecipeSource;

/// Settings shared by every subcommand.
pub struct Session {
    pub cfg: AppConfig,
    pub assume_yes: bool,
}

/// Per-command device stand-ins.
#[derive(Default)]
struct DeviceOpts {
    position: Option<Coordinates>,
    denied: Vec<Permission>,
    image: Option<PathBuf>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl Session {
    fn alerts(&self) -> Arc<dyn AlertSurface> {
        Arc::new(ConsoleAlerts { assume_yes: self.assume_yes })
    }

    fn view_model(&self, opts: DeviceOpts) -> Result<RecipesViewModel> {
        let services = self.services(opts)?;
        let resolver = LocationResolver::new(self.cfg.location_max_age, self.cfg.location_timeout)
            .with_accuracy(self.cfg.location_accuracy);
        Ok(RecipesViewModel::new(services, resolver))
    }

    fn services(&self, opts: DeviceOpts) -> Result<RecipeServices> {
        let source = WebRecipeSource::new(&self.cfg.recipes_url, self.cfg.http_timeout)
            .context("build http client")?;
        let services = RecipeServices {
            source: Arc::new(source),
            location: Arc::new(FixedLocationProvider::new(opts.position)),
            permissions: Arc::new(StaticPermissions::new(opts.denied)),
            alerts: self.alerts(),
            camera: Arc::new(FileCamera { path: opts.image }),
            classifier: opts.classifier,
        };
        Ok(services)
    }

    fn meta(&self, started: Instant) -> Meta {
        Meta { duration_ms: Some(started.elapsed().as_millis()), source: Some(self.cfg.recipes_url.clone()) }
    }
}

/// Refreshes the list. None when the refresh failed; the user has already
/// been alerted then, so callers just stop.
async fn load(vm: &RecipesViewModel) -> Result<Option<usize>> {
    let mut changes = vm.subscribe();
    let outcome = vm.refresh().await;
    while let Ok(property) = changes.try_recv() {
        tracing::debug!(?property, not_busy = vm.base().is_not_busy(), "view model changed");
    }
    match outcome {
        RefreshOutcome::Loaded(n) => Ok(Some(n)),
        RefreshOutcome::Failed(_) => Ok(None),
        RefreshOutcome::Dropped => bail!("a refresh is already running"),
    }
}

fn latitude(raw: &str) -> Result<f64, String> {
    let v: f64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    if geo::is_latitude(v) { Ok(v) } else { Err(format!("{raw} is not a latitude in [-90, 90]")) }
}

fn longitude(raw: &str) -> Result<f64, String> {
    let v: f64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    if geo::is_longitude(v) { Ok(v) } else { Err(format!("{raw} is not a longitude in [-180, 180]")) }
}

/// cookbook list
#[derive(Args)]
pub struct ListCmd {
    /// Show at most this many recipes
    #[arg(long)]
    pub limit: Option<usize>,
    /// Print the fetched feed back as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

pub async fn list(session: &Session, args: ListCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::refresh();
    let _g = log.root_span_kv([("url", session.cfg.recipes_url.clone())]).entered();

    let vm = session.view_model(DeviceOpts::default())?;
    if load(&vm).await?.is_none() {
        return Ok(());
    }

    if args.raw {
        let recipes: Vec<model::Recipe> = vm.recipes().iter().map(|r| model::Recipe::clone(r)).collect();
        println!("{}", model::to_json(&recipes)?);
        return Ok(());
    }

    let rows: Vec<types::RecipeRow> = vm
        .recipes()
        .iter()
        .take(args.limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(i, r)| types::RecipeRow {
            index: i + 1,
            name: r.name.clone(),
            location: r.location.clone(),
            latitude: r.latitude,
            longitude: r.longitude,
        })
        .collect();

    log.info(format!("🍽️  {}:", vm.base().title()));
    for row in &rows {
        log.info(format!("[{}] {} — {} ({:.4}, {:.4})", row.index, row.name, row.location, row.latitude, row.longitude));
    }
    if telemetry::config::json_mode() {
        let list = types::RecipeList { count: rows.len(), recipes: rows };
        log.result(&list, Some(session.meta(started)))?;
    }
    Ok(())
}

/// cookbook closest --lat <deg> --lon <deg>
#[derive(Args)]
pub struct ClosestCmd {
    /// Device latitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lon", value_parser = latitude)]
    pub lat: Option<f64>,
    /// Device longitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lat", value_parser = longitude)]
    pub lon: Option<f64>,
    /// Behave as if the location permission was refused
    #[arg(long, default_value_t = false)]
    pub deny_location: bool,
    /// Report the distance in kilometers instead of miles
    #[arg(long, default_value_t = false)]
    pub km: bool,
}

pub async fn closest(session: &Session, args: ClosestCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::closest();
    let _g = log.root_span_kv([
        ("lat", format!("{:?}", args.lat)),
        ("lon", format!("{:?}", args.lon)),
        ("deny_location", args.deny_location.to_string()),
    ]).entered();

    let position = args.lat.zip(args.lon).map(|(lat, lon)| Coordinates::new(lat, lon));
    let denied = if args.deny_location { vec![Permission::Location] } else { Vec::new() };
    let unit = if args.km { DistanceUnit::Kilometers } else { DistanceUnit::Miles };
    let vm = session.view_model(DeviceOpts { position, denied, ..DeviceOpts::default() })?.with_unit(unit);
    if load(&vm).await?.is_none() {
        return Ok(());
    }

    let hit = vm.get_closest().await;
    log.result(&hit, Some(session.meta(started)))?;
    Ok(())
}

/// cookbook details <index>... [--map]
#[derive(Args)]
pub struct DetailsCmd {
    /// 1-based positions as shown by `list`
    #[arg(required = true, num_args = 1..)]
    pub indices: Vec<usize>,
    /// Also open each recipe location on a map
    #[arg(long, default_value_t = false)]
    pub map: bool,
}

pub async fn details(session: &Session, args: DetailsCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::details();
    let _g = log.root_span_kv([("indices", format!("{:?}", args.indices)), ("map", args.map.to_string())]).entered();

    let vm = session.view_model(DeviceOpts::default())?;
    let Some(count) = load(&vm).await? else {
        return Ok(());
    };
    let mut picked = Vec::with_capacity(args.indices.len());
    for &index in &args.indices {
        let Some(recipe) = index.checked_sub(1).and_then(|i| vm.recipe(i)) else {
            bail!("no recipe at position {} (have {})", index, count);
        };
        picked.push(recipe);
    }

    let feed = Url::parse(&session.cfg.recipes_url).ok();
    // one page, re-pointed at each recipe in turn
    let mut page: Option<RecipeDetailsViewModel> = None;
    let mut results = Vec::with_capacity(picked.len());
    for recipe in picked {
        let details = match page.take() {
            Some(details) => {
                details.set_recipe(recipe.clone());
                details
            }
            None => RecipeDetailsViewModel::new(recipe.clone(), Arc::new(OsmLinkMaps::default()), session.alerts()),
        };

        let image = recipe
            .image_url(feed.as_ref())
            .map(|u| u.to_string())
            .unwrap_or_else(|| recipe.image.clone());
        log.info(format!("📖 {}", details.base().title()));
        log.info(format!("   {} — {}", recipe.location, recipe.details));
        log.info(format!("   image: {image}"));

        let map = if args.map { details.open_map().await } else { None };
        if let Some(link) = &map {
            log.info(format!("🗺️  {link}"));
        }
        results.push(types::RecipeDetails {
            title: details.base().title(),
            recipe: model::Recipe::clone(&recipe),
            image: Some(image).filter(|i| !i.is_empty()),
            map,
        });
        page = Some(details);
    }

    if telemetry::config::json_mode() {
        log.result(&results, Some(session.meta(started)))?;
    }
    Ok(())
}

/// cookbook tag <image>
#[derive(Args)]
pub struct TagCmd {
    /// Photo of the dish
    pub image: PathBuf,
    /// Behave as if the camera permission was refused
    #[arg(long, default_value_t = false)]
    pub deny_camera: bool,
}

pub async fn tag(session: &Session, args: TagCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::tag();
    let _g = log.root_span_kv([("image", args.image.display().to_string())]).entered();

    let classifier = match CustomVisionClassifier::from_config(&session.cfg.vision, session.cfg.http_timeout) {
        Ok(c) => Some(Arc::new(c) as Arc<dyn Classifier>),
        Err(e) => {
            log.warn(format!("vision disabled: {e}"));
            None
        }
    };
    let denied = if args.deny_camera { vec![Permission::Camera] } else { Vec::new() };
    let vm = session.view_model(DeviceOpts { image: Some(args.image), denied, classifier, ..DeviceOpts::default() })?;
    let prediction = vm.get_by_picture().await;
    log.result(&prediction, Some(session.meta(started)))?;
    Ok(())
}
