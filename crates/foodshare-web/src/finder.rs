use axum::extract::{Query, State};
use axum::response::Html;
use foodshare_warehouse::{FinderFilter, ALL_OPTION};
use serde::Deserialize;

use crate::render;
use crate::{AppState, WebError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FinderQuery {
    location: Option<String>,
    food_type: Option<String>,
    meal_type: Option<String>,
}

pub(crate) async fn find(
    State(state): State<AppState>,
    Query(query): Query<FinderQuery>,
) -> Result<Html<String>, WebError> {
    let filter = FinderFilter::from_selections(
        query.location.as_deref().unwrap_or(ALL_OPTION),
        query.food_type.as_deref().unwrap_or(ALL_OPTION),
        query.meal_type.as_deref().unwrap_or(ALL_OPTION),
    );

    let lookup = filter.clone();
    let (options, found) = state
        .run(move |warehouse| (warehouse.finder_options(), warehouse.find_listings(&lookup)))
        .await?;

    let mut body = String::new();
    match options {
        Ok(options) => {
            body.push_str(r#"<form class="inline" method="GET" action="/find">"#);
            body.push_str(&selector("location", "Location", &options.locations, filter.location.as_deref()));
            body.push_str(&selector("food_type", "Food type", &options.food_types, filter.food_type.as_deref()));
            body.push_str(&selector("meal_type", "Meal type", &options.meal_types, filter.meal_type.as_deref()));
            body.push_str(r#"<button class="btn" type="submit">Search</button></form>"#);
        }
        Err(error) => body.push_str(&render::error_banner(&error.to_string())),
    }

    match found {
        Ok((result, _)) if result.is_empty() => {
            body.push_str(&render::empty_state("No listings match the selected filters."));
        }
        Ok((result, _)) => {
            body.push_str(&format!(
                r#"<p style="margin-bottom:0.5rem">{} listing(s), soonest expiry first.</p>"#,
                result.row_count
            ));
            body.push_str(r#"<div class="card">"#);
            body.push_str(&render::table(&result));
            body.push_str("</div>");
        }
        Err(error) => body.push_str(&render::error_banner(&error.to_string())),
    }

    Ok(render::page("Find Food", &body))
}

/// Selector with the `All` sentinel first.
fn selector(name: &str, label: &str, values: &[String], selected: Option<&str>) -> String {
    let options = std::iter::once((ALL_OPTION, ALL_OPTION))
        .chain(values.iter().map(|value| (value.as_str(), value.as_str())));
    format!(
        r#"<div class="form-group"><label for="{name}">{label}</label>{select}</div>"#,
        label = render::escape(label),
        select = render::select(name, options, Some(selected.unwrap_or(ALL_OPTION))),
    )
}
