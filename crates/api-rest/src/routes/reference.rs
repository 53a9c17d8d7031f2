use crate::error::ApiResult;
use api_shared::{BandDto, ReferenceBandsQuery, ReferenceBandsRes};
use axum::extract::Query;
use axum::Json;
use cellcount_core::{reference_bands, Gender, Panel};

#[utoipa::path(
    get,
    path = "/reference-bands",
    params(ReferenceBandsQuery),
    responses(
        (status = 200, description = "Reference bands for every cell type of the panel", body = ReferenceBandsRes),
        (status = 400, description = "Unknown gender or panel", body = api_shared::ErrorRes)
    )
)]
/// Look up the normal percentage ranges for an age, gender and panel.
///
/// Every parameter is optional; missing age and gender fall back to the unspecified
/// bands, a missing panel to the white cell differential.
#[axum::debug_handler]
pub async fn reference_bands_handler(
    Query(query): Query<ReferenceBandsQuery>,
) -> ApiResult<Json<ReferenceBandsRes>> {
    let gender: Gender = query.gender.as_deref().unwrap_or("").parse()?;
    let panel: Panel = match query.panel.as_deref() {
        Some(p) => p.parse()?,
        None => Panel::default(),
    };

    let table = reference_bands(query.age, gender, panel);
    let bands = panel
        .cell_types()
        .iter()
        .filter_map(|cell| table.get(cell).map(|band| BandDto::new(*cell, *band)))
        .collect();

    Ok(Json(ReferenceBandsRes {
        panel: panel.name().to_string(),
        age: query.age,
        gender: gender.name().to_string(),
        bands,
    }))
}
