use axum::extract::State;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;

use crate::render::{self, escape};
use crate::{AppState, WebError};

const PLACEHOLDER: &str = "SELECT * FROM food_listings LIMIT 10";

#[derive(Debug, Deserialize)]
pub(crate) struct QueryForm {
    #[serde(default)]
    sql: String,
}

pub(crate) async fn query_form() -> Html<String> {
    render::page("Run SQL", &editor(""))
}

pub(crate) async fn run_query(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<Html<String>, WebError> {
    let sql = form.sql.clone();
    let outcome = state.run(move |warehouse| warehouse.run_adhoc(&sql)).await?;

    let mut body = editor(&form.sql);
    match outcome {
        Ok((result, _)) if result.is_empty() => {
            body.push_str(&render::empty_state("The query returned no rows."));
        }
        Ok((result, cache_hit)) => {
            body.push_str(&format!(
                r#"<p style="margin-bottom:0.5rem">{} row(s){}</p>"#,
                result.row_count,
                if cache_hit { " (cached)" } else { "" }
            ));
            body.push_str(r#"<div class="card">"#);
            body.push_str(&render::table(&result));
            body.push_str("</div>");
        }
        Err(error) => body.push_str(&render::error_banner(&error.to_string())),
    }

    Ok(render::page("Run SQL", &body))
}

fn editor(sql: &str) -> String {
    format!(
        r#"<form method="POST" action="/query" style="margin-bottom:1.25rem">
<div class="form-group"><label for="sql">SELECT query</label><textarea name="sql" id="sql" rows="6" placeholder="{placeholder}">{sql}</textarea></div>
<button class="btn" type="submit">Run</button></form>"#,
        placeholder = escape(PLACEHOLDER),
        sql = escape(sql),
    )
}
