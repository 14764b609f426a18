use serde::Serialize;

use super::model::Recipe;

#[derive(Serialize)]
pub struct RecipeRow { pub index: usize, pub name: String, pub location: String, pub latitude: f64, pub longitude: f64 }

#[derive(Serialize)]
pub struct RecipeList { pub count: usize, pub recipes: Vec<RecipeRow> }

#[derive(Serialize)]
pub struct RecipeDetails {
    pub title: String,
    pub recipe: Recipe,
    /// Image reference resolved against the feed URL when relative.
    pub image: Option<String>,
    pub map: Option<String>,
}
