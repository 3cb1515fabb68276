//! Listing manager pages: one form per action, post-redirect-get on submit.

use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use foodshare_warehouse::models::parse_date;
use foodshare_warehouse::{
    FoodType, Listing, ListingOption, ListingUpdate, MealType, NewListing, ProviderOption,
    WarehouseError,
};
use log::{info, warn};
use serde::Deserialize;

use crate::render::{self, escape};
use crate::{AppState, WebError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Add,
    Update,
    Delete,
}

impl Action {
    const ALL: [Self; 3] = [Self::Add, Self::Update, Self::Delete];

    fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("update") => Self::Update,
            Some("delete") => Self::Delete,
            _ => Self::Add,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add listing",
            Self::Update => "Update listing",
            Self::Delete => "Delete listing",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ManageQuery {
    action: Option<String>,
    food_id: Option<String>,
    notice: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddForm {
    provider_id: String,
    food_name: String,
    quantity: String,
    expiry_date: String,
    location: String,
    food_type: String,
    meal_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateForm {
    food_id: String,
    food_name: String,
    quantity: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteForm {
    food_id: String,
}

enum FormData {
    Add(Result<Vec<ProviderOption>, WarehouseError>),
    Update {
        options: Result<Vec<ListingOption>, WarehouseError>,
        current: Result<Option<Listing>, WarehouseError>,
    },
    Delete(Result<Vec<ListingOption>, WarehouseError>),
}

pub(crate) async fn manage(
    State(state): State<AppState>,
    Query(query): Query<ManageQuery>,
) -> Result<Html<String>, WebError> {
    let action = Action::from_query(query.action.as_deref());
    let requested = query.food_id.as_deref().and_then(|id| id.trim().parse::<i64>().ok());

    let data = state
        .run(move |warehouse| match action {
            Action::Add => FormData::Add(warehouse.provider_options()),
            Action::Update => {
                let options = warehouse.listing_options();
                let food_id = requested.or_else(|| {
                    options
                        .as_ref()
                        .ok()
                        .and_then(|options| options.first().map(|option| option.food_id))
                });
                let current = match food_id {
                    Some(food_id) => warehouse.get_listing(food_id),
                    None => Ok(None),
                };
                FormData::Update { options, current }
            }
            Action::Delete => FormData::Delete(warehouse.listing_options()),
        })
        .await?;

    let mut body = tabs(action);
    if let Some(message) = query.notice.as_deref() {
        body.push_str(&render::notice(message));
    }
    if let Some(message) = query.error.as_deref() {
        body.push_str(&render::error_banner(message));
    }

    let form = match data {
        FormData::Add(providers) => providers.map(|providers| add_form(&providers)),
        FormData::Update { options, current } => {
            options.and_then(|options| current.map(|current| update_form(&options, current.as_ref())))
        }
        FormData::Delete(options) => options.map(|options| delete_form(&options, requested)),
    };
    match form {
        Ok(form) => body.push_str(&form),
        Err(error) => body.push_str(&render::error_banner(&error.to_string())),
    }

    Ok(render::page("Manage Listings", &body))
}

pub(crate) async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddForm>,
) -> Result<Redirect, WebError> {
    let outcome = match parse_new_listing(&form) {
        Ok(listing) => {
            state
                .run(move |warehouse| {
                    warehouse
                        .insert_listing(&listing)
                        .map(|food_id| format!("Listing {food_id} ({}) added.", listing.food_name.trim()))
                })
                .await?
        }
        Err(error) => Err(error),
    };
    Ok(redirect(Action::Add, None, outcome))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Form(form): Form<UpdateForm>,
) -> Result<Redirect, WebError> {
    let food_id = parse_id(&form.food_id).ok();
    let outcome = match parse_update(&form) {
        Ok(update) => {
            state
                .run(move |warehouse| {
                    warehouse
                        .update_listing(&update)
                        .map(|()| format!("Listing {} updated.", update.food_id))
                })
                .await?
        }
        Err(error) => Err(error),
    };
    Ok(redirect(Action::Update, food_id, outcome))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, WebError> {
    let outcome = match parse_id(&form.food_id) {
        Ok(food_id) => {
            state
                .run(move |warehouse| {
                    warehouse
                        .delete_listing(food_id)
                        .map(|()| format!("Listing {food_id} deleted."))
                })
                .await?
        }
        Err(error) => Err(error),
    };
    Ok(redirect(Action::Delete, None, outcome))
}

fn redirect(action: Action, food_id: Option<i64>, outcome: Result<String, WarehouseError>) -> Redirect {
    let mut location = format!("/manage?action={}", action.as_str());
    if let Some(food_id) = food_id {
        location.push_str(&format!("&food_id={food_id}"));
    }
    match outcome {
        Ok(message) => {
            info!("{message}");
            location.push_str("&notice=");
            location.push_str(&urlencoding::encode(&message));
        }
        Err(error) => {
            warn!("{} failed: {error}", action.label());
            location.push_str("&error=");
            location.push_str(&urlencoding::encode(&error.to_string()));
        }
    }
    Redirect::to(&location)
}

fn parse_id(value: &str) -> Result<i64, WarehouseError> {
    value
        .trim()
        .parse()
        .map_err(|_| WarehouseError::InvalidInput(format!("'{}' is not a listing id", value.trim())))
}

fn parse_integer(field: &str, value: &str) -> Result<i64, WarehouseError> {
    value
        .trim()
        .parse()
        .map_err(|_| WarehouseError::InvalidInput(format!("{field} must be a whole number")))
}

fn parse_new_listing(form: &AddForm) -> Result<NewListing, WarehouseError> {
    Ok(NewListing {
        provider_id: parse_integer("provider", &form.provider_id)?,
        food_name: form.food_name.clone(),
        quantity: parse_integer("quantity", &form.quantity)?,
        expiry_date: parse_date(&form.expiry_date)?,
        location: form.location.clone(),
        food_type: form.food_type.parse::<FoodType>()?,
        meal_type: form.meal_type.parse::<MealType>()?,
    })
}

fn parse_update(form: &UpdateForm) -> Result<ListingUpdate, WarehouseError> {
    Ok(ListingUpdate {
        food_id: parse_id(&form.food_id)?,
        food_name: form.food_name.clone(),
        quantity: parse_integer("quantity", &form.quantity)?,
    })
}

fn tabs(current: Action) -> String {
    let links: String = Action::ALL
        .iter()
        .map(|action| {
            let class = if *action == current { r#" class="active""# } else { "" };
            format!(
                r#"<a href="/manage?action={}"{class}>{}</a>"#,
                action.as_str(),
                action.label()
            )
        })
        .collect();
    format!(r#"<div class="tabs">{links}</div>"#)
}

fn add_form(providers: &[ProviderOption]) -> String {
    let provider_labels: Vec<(String, String)> = providers
        .iter()
        .map(|provider| (provider.provider_id.to_string(), provider.name.clone()))
        .collect();
    let food_types = FoodType::ALL.map(|kind| (kind.as_str(), kind.as_str()));
    let meal_types = MealType::ALL.map(|kind| (kind.as_str(), kind.as_str()));

    format!(
        r#"<form class="card" method="POST" action="/manage/add">
<div class="form-group"><label for="provider_id">Provider</label>{providers}</div>
<div class="form-group"><label for="food_name">Food name</label><input type="text" name="food_name" id="food_name" required></div>
<div class="form-group"><label for="quantity">Quantity</label><input type="number" name="quantity" id="quantity" min="1" value="1" required></div>
<div class="form-group"><label for="expiry_date">Expiry date</label><input type="date" name="expiry_date" id="expiry_date" required></div>
<div class="form-group"><label for="location">Location</label><input type="text" name="location" id="location" required></div>
<div class="form-group"><label for="food_type">Food type</label>{food_types}</div>
<div class="form-group"><label for="meal_type">Meal type</label>{meal_types}</div>
<button class="btn" type="submit">Add listing</button></form>"#,
        providers = render::select(
            "provider_id",
            provider_labels
                .iter()
                .map(|(id, name)| (id.as_str(), name.as_str())),
            None,
        ),
        food_types = render::select("food_type", food_types, None),
        meal_types = render::select("meal_type", meal_types, None),
    )
}

fn listing_selector(options: &[ListingOption], selected: Option<i64>) -> String {
    let labels: Vec<(String, String)> = options
        .iter()
        .map(|option| (option.food_id.to_string(), option.label()))
        .collect();
    let selected = selected.map(|id| id.to_string());
    render::select(
        "food_id",
        labels.iter().map(|(id, label)| (id.as_str(), label.as_str())),
        selected.as_deref(),
    )
}

fn update_form(options: &[ListingOption], current: Option<&Listing>) -> String {
    if options.is_empty() {
        return render::empty_state("There are no listings to update.");
    }
    let Some(current) = current else {
        return render::empty_state("That listing no longer exists.");
    };

    format!(
        r#"<form class="inline" method="GET" action="/manage"><input type="hidden" name="action" value="update">
<div class="form-group"><label for="food_id">Listing</label>{selector}</div><button class="btn" type="submit">Load</button></form>
<form class="card" method="POST" action="/manage/update"><input type="hidden" name="food_id" value="{food_id}">
<div class="form-group"><label for="food_name">Food name</label><input type="text" name="food_name" id="food_name" value="{food_name}" required></div>
<div class="form-group"><label for="quantity">Quantity</label><input type="number" name="quantity" id="quantity" min="1" value="{quantity}" required></div>
<button class="btn" type="submit">Update listing</button></form>"#,
        selector = listing_selector(options, Some(current.food_id)),
        food_id = current.food_id,
        food_name = escape(current.food_name.as_deref().unwrap_or_default()),
        quantity = current.quantity.unwrap_or(1),
    )
}

fn delete_form(options: &[ListingOption], selected: Option<i64>) -> String {
    if options.is_empty() {
        return render::empty_state("There are no listings to delete.");
    }
    format!(
        r#"<form class="card" method="POST" action="/manage/delete">
<div class="form-group"><label for="food_id">Listing</label>{selector}</div>
<button class="btn btn-danger" type="submit">Delete listing</button></form>"#,
        selector = listing_selector(options, selected),
    )
}
