use axum::extract::{Query, State};
use axum::response::Html;
use foodshare_warehouse::{ReportParams, WarehouseError};
use serde::Deserialize;

use crate::render::{self, escape};
use crate::{AppState, WebError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    city: Option<String>,
}

pub(crate) async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, WebError> {
    let (cities, sections) = state
        .run(move |warehouse| {
            let cities = warehouse.provider_cities();
            let selected = query
                .city
                .filter(|city| !city.trim().is_empty())
                .or_else(|| cities.as_ref().ok().and_then(|cities| cities.first().cloned()));
            let params = ReportParams { city: selected };
            (cities.map(|cities| (cities, params.clone())), warehouse.dashboard(&params))
        })
        .await?;

    let mut body = String::new();
    match cities {
        Ok((cities, params)) => body.push_str(&city_selector(&cities, params.city())),
        Err(error) => body.push_str(&render::error_banner(&error.to_string())),
    }

    body.push_str(r#"<div class="grid">"#);
    for section in &sections {
        match &section.outcome {
            Ok(report) => body.push_str(&render::report_card(report)),
            Err(error) => body.push_str(&failed_card(section.report.title(), error)),
        }
    }
    body.push_str("</div>");

    Ok(render::page("Dashboard", &body))
}

fn city_selector(cities: &[String], selected: Option<&str>) -> String {
    format!(
        r#"<form class="inline" method="GET" action="/"><div class="form-group"><label for="city">Provider city</label>{select}</div><button class="btn" type="submit">Show</button></form>"#,
        select = render::select(
            "city",
            cities.iter().map(|city| (city.as_str(), city.as_str())),
            selected,
        ),
    )
}

fn failed_card(title: &str, error: &WarehouseError) -> String {
    format!(
        r#"<div class="card"><h3>{}</h3>{}</div>"#,
        escape(title),
        render::error_banner(&error.to_string())
    )
}
